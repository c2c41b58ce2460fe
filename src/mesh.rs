use std::rc::Rc;

use cgmath::Vector3 as Vec3;

use crate::sweep::{self, SweepSpec};
use crate::texture::Texture;
use crate::vertex::Vertex;

pub const DEFAULT_SHININESS: f32 = 32.0;

/// 创建后不可变的三角形网格（每三个顶点一个三角形），可被多个实体共享
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub color: Vec3<f32>,
    pub texture: Rc<Texture>,
    pub shininess: f32,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, color: Vec3<f32>, texture: Rc<Texture>) -> Self {
        Self {
            vertices,
            color,
            texture,
            shininess: DEFAULT_SHININESS,
        }
    }

    /// 没有顶点的网格，绘制时什么也不做
    pub fn empty(texture: Rc<Texture>) -> Self {
        Self::new(Vec::new(), Vec3::new(1.0, 1.0, 1.0), texture)
    }

    pub fn from_sweep(spec: &SweepSpec, texture: Rc<Texture>) -> Self {
        Self::new(sweep::build_sweep(spec), spec.color, texture)
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// 按三个一组遍历，多余的顶点被忽略
    pub fn triangles(&self) -> impl Iterator<Item = &[Vertex; 3]> {
        self.vertices.as_chunks::<3>().0.iter()
    }
}
