use std::fmt;

use cgmath::{Deg, Matrix4 as Mat4, SquareMatrix, Vector3 as Vec3, Zero};

use crate::spline::{self, Wrap, normalize_or};

/// 实体只是并行组件数组中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(pub(crate) u32);

impl Entity {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3<f32>,
    /// 欧拉角（度），按 X→Y→Z 顺序应用
    pub rotation: Vec3<f32>,
    pub scale: Vec3<f32>,
    /// 正弦动画每帧重新计算的附加位移，不会累积到 position
    pub offset: Vec3<f32>,
    pub(crate) parent: Option<Entity>,
    /// 世界矩阵，每帧由变换系统重建
    pub matrix: Mat4<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::zero(),
            rotation: Vec3::zero(),
            scale: Vec3::new(1.0, 1.0, 1.0),
            offset: Vec3::zero(),
            parent: None,
            matrix: Mat4::identity(),
        }
    }
}

impl Transform {
    pub fn new(position: Vec3<f32>, rotation: Vec3<f32>, scale: Vec3<f32>) -> Self {
        Self {
            position,
            rotation,
            scale,
            ..Default::default()
        }
    }

    pub fn at(position: Vec3<f32>) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn parent(&self) -> Option<Entity> {
        self.parent
    }

    // translate * rotateX * rotateY * rotateZ * scale
    pub fn local_matrix(&self) -> Mat4<f32> {
        Mat4::from_translation(self.position + self.offset)
            * Mat4::from_angle_x(Deg(self.rotation.x))
            * Mat4::from_angle_y(Deg(self.rotation.y))
            * Mat4::from_angle_z(Deg(self.rotation.z))
            * Mat4::from_nonuniform_scale(self.scale.x, self.scale.y, self.scale.z)
    }

    /// 世界空间中的原点位置（取矩阵平移列）
    pub fn world_position(&self) -> Vec3<f32> {
        self.matrix.w.truncate()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub color: Vec3<f32>,
    pub intensity: f32,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            color: Vec3::new(1.0, 1.0, 1.0),
            intensity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SineAnimator {
    pub axis: Vec3<f32>,
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl SineAnimator {
    /// 只依赖总时间，同一时刻重复求值结果相同
    pub fn offset_at(&self, total_time: f32) -> Vec3<f32> {
        self.axis * ((total_time * self.frequency + self.phase).sin() * self.amplitude)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotationAnimator {
    pub axis: Vec3<f32>,
    /// 每分钟转数
    pub rpm: f32,
}

impl RotationAnimator {
    /// 本帧增加的角度（度）；6 = 360 / 60
    pub fn delta(&self, delta_time: f32) -> Vec3<f32> {
        self.axis * (self.rpm * 6.0 * delta_time)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParametricAnimator {
    pub points: Vec<Vec3<f32>>,
    pub speed: f32,
    /// 0..1，路径上的起始比例
    pub phase: f32,
    last_tangent: Vec3<f32>,
}

impl ParametricAnimator {
    pub fn new(points: Vec<Vec3<f32>>, speed: f32, phase: f32) -> Self {
        Self {
            points,
            speed,
            phase,
            last_tangent: Vec3::unit_x(),
        }
    }

    /// 当前时刻在路径上的全局参数，落在 [0, 段数)
    pub fn parameter_at(&self, total_time: f32) -> Option<f32> {
        if self.points.len() < 2 {
            return None;
        }
        let num_segments = (self.points.len() - 1) as f32;
        let t = (total_time * self.speed + num_segments * self.phase).rem_euclid(num_segments);
        Some(if t.is_finite() { t } else { 0.0 })
    }

    /// 求位置和单位切线；切线退化时沿用上一帧的方向
    pub fn advance(&mut self, total_time: f32) -> Option<(Vec3<f32>, Vec3<f32>)> {
        let global_t = self.parameter_at(total_time)?;
        let sample = spline::evaluate(&self.points, Wrap::detect(&self.points), global_t)?;
        self.last_tangent = normalize_or(sample.tangent, self.last_tangent);
        Some((sample.position, self.last_tangent))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraComponent {
    /// 垂直视角（度）
    pub fov: f32,
}

/// 把切线方向换算成 (pitch, yaw, 0) 欧拉角。
///
/// 水平切线时实体的 +X 恰好朝向行进方向。坡道上 pitch 绕局部 X 轴作用，
/// 只有航向接近 ±Z 时 +X 才会随坡度抬起，航向沿 ±X 时 +X 保持水平。
pub fn facing_rotation(tangent: Vec3<f32>) -> Vec3<f32> {
    let yaw = (-tangent.z).atan2(tangent.x).to_degrees();
    let pitch = tangent.y.clamp(-1.0, 1.0).asin().to_degrees();
    Vec3::new(pitch, yaw, 0.0)
}
