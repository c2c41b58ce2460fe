use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3, Vector4 as Vec4, Zero};

/// 网格顶点：位置、UV、法线
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub pos: Vec3<f32>,
    pub uv: Vec2<f32>,
    pub normal: Vec3<f32>,
}

impl Vertex {
    pub fn new(pos: Vec3<f32>, uv: Vec2<f32>, normal: Vec3<f32>) -> Self {
        Self { pos, uv, normal }
    }

    pub fn is_finite(&self) -> bool {
        self.pos.x.is_finite()
            && self.pos.y.is_finite()
            && self.pos.z.is_finite()
            && self.normal.x.is_finite()
            && self.normal.y.is_finite()
            && self.normal.z.is_finite()
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Vertex {
            pos: Vec3::zero(),
            uv: Vec2::zero(),
            normal: Vec3::new(0.0, 1.0, 0.0),
        }
    }
}

/// 三角形的面法线（按顶点绕序）
pub fn face_normal(v0: Vec3<f32>, v1: Vec3<f32>, v2: Vec3<f32>) -> Vec3<f32> {
    (v1 - v0).cross(v2 - v0)
}

// 顶点着色之后的裁剪空间顶点
#[derive(Debug, Clone, Copy)]
pub struct ClipSpaceVertex {
    pub position: Vec4<f32>,
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub uv: Vec2<f32>,
}

/// 光栅化阶段的 2D 点（带深度和插值属性）
#[derive(Debug, Clone, Copy)]
pub struct RasterPoint {
    pub pos: Vec2<f32>,
    pub z: f32,
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub uv: Vec2<f32>,
}

#[derive(Debug, Clone, Copy)]
pub struct RasterTriangle {
    pub vertices: [RasterPoint; 3],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn face_normal_follows_winding() {
        let n = face_normal(
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        );
        assert_eq!(n.normalize(), Vec3::new(0.0, 0.0, 1.0));
    }

    #[test]
    fn nan_vertices_are_reported() {
        let mut v = Vertex::default();
        assert!(v.is_finite());
        v.pos.y = f32::NAN;
        assert!(!v.is_finite());
    }
}
