//! 极简 ECS：实体是下标，组件是并行数组，系统是自由函数。

pub mod components;
pub mod registry;
pub mod systems;

pub use components::{
    CameraComponent, Entity, Light, ParametricAnimator, RotationAnimator, SineAnimator, Transform,
    facing_rotation,
};
pub use registry::{EcsError, Registry};
pub use systems::{Clock, step, update_animations, update_transforms};
