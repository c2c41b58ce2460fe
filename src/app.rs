use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use thiserror::Error;

use crate::assets::MeshCache;
use crate::camera::Camera;
use crate::config::SceneConfig;
use crate::ecs::{Clock, Entity, Registry, systems};
use crate::framebuffer::FrameBuffer;
use crate::lights::{LightBlock, collect_lights};
use crate::renderer::{Renderer, Shading};
use crate::scene::{Scene, SceneError};

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Scene(#[from] SceneError),
    #[error("无法创建输出目录 {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("无法保存帧 {path}: {source}")]
    SaveFrame {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug, Clone)]
pub struct AppOptions {
    pub frames: usize,
    /// 每帧的固定时间步长（秒）
    pub dt: f32,
    pub out_dir: PathBuf,
    pub width: usize,
    pub height: usize,
    pub ssaa: usize,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            frames: 60,
            dt: 1.0 / 30.0,
            out_dir: PathBuf::from("frames"),
            width: 1024,
            height: 720,
            ssaa: 2,
        }
    }
}

/// 每累计一秒打印一次帧率
#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
}

impl FpsCounter {
    fn tick(&mut self, frame_time: Duration) {
        self.elapsed += frame_time;
        self.frames += 1;
        if self.elapsed >= Duration::from_secs(1) {
            debug!("fps: {:.1}", self.frames as f64 / self.elapsed.as_secs_f64());
            *self = Self::default();
        }
    }
}

pub struct App {
    pub registry: Registry,
    pub scene: Scene,
    cache: MeshCache,
    renderer: Renderer,
    clock: Clock,
    free_camera: Camera,
    follow: Option<(Entity, f32)>,
    shading: Shading,
    options: AppOptions,
}

impl App {
    pub fn new(config: &SceneConfig, options: AppOptions) -> Result<Self, AppError> {
        let mut registry = Registry::new();
        let mut cache = MeshCache::new();
        let scene = Scene::load(config, &mut cache, &mut registry)?;

        let aspect = options.width as f32 / options.height.max(1) as f32;
        let cam = &config.camera;
        let free_camera = Camera::new(cam.position.into(), cam.yaw, cam.pitch, cam.fov, aspect);

        let follow = config.follow.and_then(|index| {
            let entity = scene.entity(index);
            match entity.and_then(|e| registry.camera(e).map(|c| (e, c.fov))) {
                Some(found) => Some(found),
                None => {
                    warn!("对象 {index} 没有相机组件，使用自由相机");
                    None
                }
            }
        });

        let scale = options.ssaa.max(1);
        let mut renderer =
            Renderer::new(free_camera, options.width * scale, options.height * scale);
        renderer.ambient = config.ambient;

        Ok(Self {
            registry,
            scene,
            cache,
            renderer,
            clock: Clock::default(),
            free_camera,
            follow,
            shading: config.shading,
            options,
        })
    }

    pub fn set_shading(&mut self, shading: Shading) {
        self.shading = shading;
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn mesh_cache(&self) -> &MeshCache {
        &self.cache
    }

    /// 推进一帧并收集光源
    pub fn update(&mut self) -> LightBlock {
        systems::step(&mut self.registry, &mut self.clock, self.options.dt);
        collect_lights(&self.registry)
    }

    /// 当前帧使用的相机：跟随实体或自由相机
    pub fn active_camera(&self) -> Camera {
        let aspect = self.options.width as f32 / self.options.height.max(1) as f32;
        match self.follow {
            Some((entity, fov)) => {
                Camera::mounted(&self.registry.transform(entity).matrix, fov, aspect)
            }
            None => self.free_camera,
        }
    }

    /// 渲染并降采样，返回最终分辨率的帧
    pub fn render(&mut self, lights: &LightBlock) -> FrameBuffer {
        self.renderer.set_camera(self.active_camera());
        self.renderer.clear();
        let drawn = self.renderer.render_scene(&self.registry, lights, self.shading);
        debug!(
            "t = {:.2}s: {drawn} 个三角形，{} 盏灯",
            self.clock.total, lights.count
        );
        self.renderer.framebuffer.ssaa(self.options.ssaa)
    }

    /// 跑完所有帧，每帧保存为 `frame_XXXX.png`
    pub fn run(&mut self) -> Result<Vec<PathBuf>, AppError> {
        let out_dir = self.options.out_dir.clone();
        fs::create_dir_all(&out_dir).map_err(|source| AppError::OutputDir {
            path: out_dir.clone(),
            source,
        })?;
        info!(
            "开始渲染 {} 帧，{}x{}，SSAA {}x，着色 {:?}",
            self.options.frames,
            self.options.width,
            self.options.height,
            self.options.ssaa,
            self.shading
        );

        let mut fps = FpsCounter::default();
        let mut saved = Vec::with_capacity(self.options.frames);
        for frame in 0..self.options.frames {
            let start = Instant::now();
            let lights = self.update();
            let image = self.render(&lights);
            let path = frame_path(&out_dir, frame);
            image
                .save_to_image(&path)
                .map_err(|source| AppError::SaveFrame {
                    path: path.clone(),
                    source,
                })?;
            debug!("已保存 {}", path.display());
            saved.push(path);
            fps.tick(start.elapsed());
        }
        info!("渲染完成，输出目录 {}", out_dir.display());
        Ok(saved)
    }
}

pub fn frame_path(dir: &Path, frame: usize) -> PathBuf {
    dir.join(format!("frame_{frame:04}.png"))
}
