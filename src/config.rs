//! JSON 场景文件。
//!
//! 每个对象的组件都是显式的 `Option`，缺省字段表示"没有这个组件"，
//! 不再用零值当哨兵。向量一律写成 `[x, y, z]` 数组。

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use cgmath::Vector3 as Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ecs::{
    CameraComponent, Light, ParametricAnimator, RotationAnimator, SineAnimator, Transform,
};
use crate::renderer::Shading;
use crate::sweep::SweepSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("无法读取场景文件 {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("场景文件格式错误: {0}")]
    Json(#[from] serde_json::Error),
}

fn one() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_ambient() -> f32 {
    0.15
}

fn default_intensity() -> f32 {
    1.0
}

fn default_fov() -> f32 {
    45.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// 程序化生成器的随机种子
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub camera: FreeCameraConfig,
    /// 跟随的对象下标（该对象需要带 camera 组件）
    #[serde(default)]
    pub follow: Option<usize>,
    #[serde(default)]
    pub shading: Shading,
    #[serde(default = "default_ambient")]
    pub ambient: f32,
    #[serde(default)]
    pub objects: Vec<ObjectConfig>,
    /// 生成的对象追加在 objects 之后
    #[serde(default)]
    pub generators: Vec<GeneratorConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeCameraConfig {
    pub position: [f32; 3],
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
    #[serde(default = "default_fov")]
    pub fov: f32,
}

impl Default for FreeCameraConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 20.0, 60.0],
            yaw: -90.0,
            pitch: -15.0,
            fov: default_fov(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mesh: Option<MeshSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform: Option<TransformConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub light: Option<LightConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sine: Option<SineConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<RotationConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parametric: Option<ParametricConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<CameraConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeshSource {
    /// 目录 + 文件名，纹理相对于该目录查找
    File { path: PathBuf, name: String },
    Sweep(SweepConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepConfig {
    pub points: Vec<[f32; 3]>,
    pub radius: f32,
    pub path_segments: usize,
    pub circle_segments: usize,
    #[serde(default = "one")]
    pub color: [f32; 3],
}

impl From<&SweepConfig> for SweepSpec {
    fn from(cfg: &SweepConfig) -> Self {
        SweepSpec::new(
            to_points(&cfg.points),
            cfg.radius,
            cfg.path_segments,
            cfg.circle_segments,
        )
        .with_color(cfg.color.into())
    }
}

impl From<&SweepSpec> for SweepConfig {
    fn from(spec: &SweepSpec) -> Self {
        Self {
            points: spec.points.iter().map(|&p| p.into()).collect(),
            radius: spec.radius,
            path_segments: spec.path_segments,
            circle_segments: spec.circle_segments,
            color: spec.color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransformConfig {
    #[serde(default)]
    pub position: [f32; 3],
    /// 欧拉角（度）
    #[serde(default)]
    pub rotation: [f32; 3],
    #[serde(default = "one")]
    pub scale: [f32; 3],
    /// 父对象在最终对象列表中的下标，必须小于自身下标
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: one(),
            parent: None,
        }
    }
}

impl TransformConfig {
    pub fn at(position: Vec3<f32>) -> Self {
        Self {
            position: position.into(),
            ..Default::default()
        }
    }

    /// 父子关系由加载器单独建立
    pub fn to_transform(&self) -> Transform {
        Transform::new(self.position.into(), self.rotation.into(), self.scale.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    #[serde(default = "one")]
    pub color: [f32; 3],
    #[serde(default = "default_intensity")]
    pub intensity: f32,
}

impl From<&LightConfig> for Light {
    fn from(cfg: &LightConfig) -> Self {
        Light {
            color: cfg.color.into(),
            intensity: cfg.intensity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SineConfig {
    pub axis: [f32; 3],
    pub amplitude: f32,
    pub frequency: f32,
    #[serde(default)]
    pub phase: f32,
}

impl From<&SineConfig> for SineAnimator {
    fn from(cfg: &SineConfig) -> Self {
        SineAnimator {
            axis: cfg.axis.into(),
            amplitude: cfg.amplitude,
            frequency: cfg.frequency,
            phase: cfg.phase,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub axis: [f32; 3],
    pub rpm: f32,
}

impl From<&RotationConfig> for RotationAnimator {
    fn from(cfg: &RotationConfig) -> Self {
        RotationAnimator {
            axis: cfg.axis.into(),
            rpm: cfg.rpm,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametricConfig {
    pub points: Vec<[f32; 3]>,
    pub speed: f32,
    #[serde(default)]
    pub phase: f32,
}

impl From<&ParametricConfig> for ParametricAnimator {
    fn from(cfg: &ParametricConfig) -> Self {
        ParametricAnimator::new(to_points(&cfg.points), cfg.speed, cfg.phase)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    #[serde(default = "default_fov")]
    pub fov: f32,
}

impl From<&CameraConfig> for CameraComponent {
    fn from(cfg: &CameraConfig) -> Self {
        CameraComponent { fov: cfg.fov }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GeneratorConfig {
    Tree {
        position: [f32; 3],
        height: f32,
        base_width: f32,
        levels: i32,
        per_level: usize,
    },
    CoasterRails {
        points: Vec<[f32; 3]>,
        count: usize,
    },
    CoasterLights {
        points: Vec<[f32; 3]>,
        count: usize,
    },
}

pub fn to_points(points: &[[f32; 3]]) -> Vec<Vec3<f32>> {
    points.iter().map(|&p| p.into()).collect()
}

/// 内置演示场景的过山车控制点，首尾重合构成闭合轨道
pub const COASTER_POINTS: [[f32; 3]; 9] = [
    [30.0, 5.0, 0.0],
    [20.0, 8.0, 15.0],
    [0.0, 50.0, 20.0],
    [-20.0, 8.0, 15.0],
    [-30.0, 5.0, 0.0],
    [-20.0, 8.0, -15.0],
    [0.0, 12.0, -20.0],
    [20.0, 8.0, -15.0],
    [30.0, 5.0, 0.0],
];

impl SceneConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file = File::open(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// 内置的过山车场景：轨道、跟随相机的小车、10 盏沿轨道移动的灯、一棵树、10 根支柱
    pub fn demo() -> Self {
        let track: Vec<[f32; 3]> = COASTER_POINTS.to_vec();
        let objects = vec![
            ObjectConfig {
                mesh: Some(MeshSource::Sweep(SweepConfig {
                    points: track.clone(),
                    radius: 0.4,
                    path_segments: 3000,
                    circle_segments: 24,
                    color: [1.0, 0.0, 1.0],
                })),
                ..Default::default()
            },
            ObjectConfig {
                mesh: Some(MeshSource::File {
                    path: PathBuf::from("assets/Car"),
                    name: "Car.obj".to_string(),
                }),
                transform: Some(TransformConfig {
                    position: [0.0, 20.0, 0.0],
                    scale: [0.2, 0.2, 0.2],
                    ..Default::default()
                }),
                parametric: Some(ParametricConfig {
                    points: track.clone(),
                    speed: 0.5,
                    phase: 0.0,
                }),
                camera: Some(CameraConfig { fov: 45.0 }),
                ..Default::default()
            },
        ];
        let generators = vec![
            GeneratorConfig::CoasterLights {
                points: track.clone(),
                count: 10,
            },
            GeneratorConfig::Tree {
                position: [0.0, 0.0, 0.0],
                height: 3.0,
                base_width: 0.25,
                levels: 4,
                per_level: 7,
            },
            GeneratorConfig::CoasterRails {
                points: track,
                count: 10,
            },
        ];
        Self {
            seed: 0,
            camera: FreeCameraConfig::default(),
            follow: None,
            shading: Shading::default(),
            ambient: default_ambient(),
            objects,
            generators,
        }
    }
}
