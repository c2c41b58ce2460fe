use std::rc::Rc;

use thiserror::Error;

use crate::ecs::components::{
    CameraComponent, Entity, Light, ParametricAnimator, RotationAnimator, SineAnimator, Transform,
};
use crate::mesh::Mesh;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EcsError {
    /// 父实体必须先于子实体创建，按下标顺序更新时父矩阵才已就绪
    #[error("实体 {child} 的父实体 {parent} 尚未创建")]
    ParentNotCreated { child: Entity, parent: Entity },
}

/// 动画系统一次需要的可变组件
pub struct AnimatedMut<'a> {
    pub transform: &'a mut Transform,
    pub sine: Option<&'a SineAnimator>,
    pub rotation: Option<&'a RotationAnimator>,
    pub parametric: Option<&'a mut ParametricAnimator>,
}

/// 并行数组存储。实体只增不减，销毁只清空槽位。
#[derive(Default)]
pub struct Registry {
    transforms: Vec<Transform>,
    meshes: Vec<Option<Rc<Mesh>>>,
    lights: Vec<Option<Light>>,
    sine_animators: Vec<Option<SineAnimator>>,
    rotation_animators: Vec<Option<RotationAnimator>>,
    parametric_animators: Vec<Option<ParametricAnimator>>,
    cameras: Vec<Option<CameraComponent>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_entity(&mut self) -> Entity {
        let id = Entity(self.transforms.len() as u32);
        self.transforms.push(Transform::default());
        self.meshes.push(None);
        self.lights.push(None);
        self.sine_animators.push(None);
        self.rotation_animators.push(None);
        self.parametric_animators.push(None);
        self.cameras.push(None);
        id
    }

    /// 清空槽位，下标不回收
    pub fn destroy_entity(&mut self, entity: Entity) {
        let i = entity.index();
        self.transforms[i] = Transform::default();
        self.meshes[i] = None;
        self.lights[i] = None;
        self.sine_animators[i] = None;
        self.rotation_animators[i] = None;
        self.parametric_animators[i] = None;
        self.cameras[i] = None;
    }

    pub fn entity_count(&self) -> usize {
        self.transforms.len()
    }

    pub fn entities(&self) -> impl Iterator<Item = Entity> + use<> {
        (0..self.transforms.len() as u32).map(Entity)
    }

    pub fn transform(&self, entity: Entity) -> &Transform {
        &self.transforms[entity.index()]
    }

    pub fn transform_mut(&mut self, entity: Entity) -> &mut Transform {
        &mut self.transforms[entity.index()]
    }

    pub fn set_parent(&mut self, child: Entity, parent: Option<Entity>) -> Result<(), EcsError> {
        if let Some(parent) = parent
            && parent >= child
        {
            return Err(EcsError::ParentNotCreated { child, parent });
        }
        self.transforms[child.index()].parent = parent;
        Ok(())
    }

    pub fn mesh(&self, entity: Entity) -> Option<&Rc<Mesh>> {
        self.meshes[entity.index()].as_ref()
    }

    pub fn set_mesh(&mut self, entity: Entity, mesh: Option<Rc<Mesh>>) {
        self.meshes[entity.index()] = mesh;
    }

    pub fn light(&self, entity: Entity) -> Option<&Light> {
        self.lights[entity.index()].as_ref()
    }

    pub fn set_light(&mut self, entity: Entity, light: Option<Light>) {
        self.lights[entity.index()] = light;
    }

    pub fn sine_animator(&self, entity: Entity) -> Option<&SineAnimator> {
        self.sine_animators[entity.index()].as_ref()
    }

    pub fn set_sine_animator(&mut self, entity: Entity, anim: Option<SineAnimator>) {
        self.sine_animators[entity.index()] = anim;
    }

    pub fn rotation_animator(&self, entity: Entity) -> Option<&RotationAnimator> {
        self.rotation_animators[entity.index()].as_ref()
    }

    pub fn set_rotation_animator(&mut self, entity: Entity, anim: Option<RotationAnimator>) {
        self.rotation_animators[entity.index()] = anim;
    }

    pub fn parametric_animator(&self, entity: Entity) -> Option<&ParametricAnimator> {
        self.parametric_animators[entity.index()].as_ref()
    }

    pub fn set_parametric_animator(&mut self, entity: Entity, anim: Option<ParametricAnimator>) {
        self.parametric_animators[entity.index()] = anim;
    }

    pub fn camera(&self, entity: Entity) -> Option<&CameraComponent> {
        self.cameras[entity.index()].as_ref()
    }

    pub fn set_camera(&mut self, entity: Entity, camera: Option<CameraComponent>) {
        self.cameras[entity.index()] = camera;
    }

    pub fn animated_mut(&mut self, entity: Entity) -> AnimatedMut<'_> {
        let i = entity.index();
        AnimatedMut {
            transform: &mut self.transforms[i],
            sine: self.sine_animators[i].as_ref(),
            rotation: self.rotation_animators[i].as_ref(),
            parametric: self.parametric_animators[i].as_mut(),
        }
    }

    /// 带网格的实体及其网格
    pub fn renderables(&self) -> impl Iterator<Item = (Entity, &Transform, &Rc<Mesh>)> {
        self.entities()
            .zip(&self.transforms)
            .zip(&self.meshes)
            .filter_map(|((e, t), m)| m.as_ref().map(|m| (e, t, m)))
    }

    /// 带光源的实体，按下标顺序
    pub fn lights(&self) -> impl Iterator<Item = (Entity, &Transform, &Light)> {
        self.entities()
            .zip(&self.transforms)
            .zip(&self.lights)
            .filter_map(|((e, t), l)| l.as_ref().map(|l| (e, t, l)))
    }

    pub(crate) fn transforms_mut(&mut self) -> &mut [Transform] {
        &mut self.transforms
    }
}
