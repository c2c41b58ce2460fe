//! 软件光栅化的 ECS 场景沙盒：程序化过山车、树、样条动画与多光源着色。

pub mod app;
pub mod assets;
pub mod camera;
pub mod config;
pub mod ecs;
pub mod framebuffer;
pub mod generate;
pub mod lights;
pub mod mesh;
pub mod rasterizer;
pub mod renderer;
pub mod scene;
pub mod spline;
pub mod sweep;
pub mod texture;
pub mod vertex;

pub use app::{App, AppError, AppOptions};
pub use config::SceneConfig;
pub use renderer::Shading;
