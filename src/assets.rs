//! 网格资源：OBJ 导入与按键缓存。
//!
//! 缓存里只保存 `Weak`，最后一个 `Rc` 释放后条目自然失效，下次查询时清除。

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use cgmath::{InnerSpace, Vector2 as Vec2, Vector3 as Vec3};
use log::{info, warn};
use thiserror::Error;

use crate::mesh::{DEFAULT_SHININESS, Mesh};
use crate::sweep::SweepSpec;
use crate::texture::Texture;
use crate::vertex::{Vertex, face_normal};

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("无法解析 OBJ 文件 {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("OBJ 文件 {0} 中没有三角形")]
    NoGeometry(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MeshKey {
    File { path: PathBuf, name: String },
    /// 全部扫掠参数的位模式，前缀定长，不会出现哈希碰撞
    Sweep(Vec<u64>),
}

impl MeshKey {
    pub fn file(path: &Path, name: &str) -> Self {
        MeshKey::File {
            path: path.to_path_buf(),
            name: name.to_string(),
        }
    }

    /// 依次为 radius、path_segments、circle_segments、color，之后是各控制点
    pub fn sweep(spec: &SweepSpec) -> Self {
        let mut bits = Vec::with_capacity(6 + spec.points.len() * 3);
        bits.push(spec.radius.to_bits() as u64);
        bits.push(spec.path_segments as u64);
        bits.push(spec.circle_segments as u64);
        for v in std::iter::once(&spec.color).chain(&spec.points) {
            bits.extend([v.x, v.y, v.z].map(|c| c.to_bits() as u64));
        }
        MeshKey::Sweep(bits)
    }
}

pub struct MeshCache {
    meshes: HashMap<MeshKey, Weak<Mesh>>,
    white: Rc<Texture>,
}

impl Default for MeshCache {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshCache {
    pub fn new() -> Self {
        Self {
            meshes: HashMap::new(),
            white: Rc::new(Texture::white()),
        }
    }

    /// 所有网格共享的白色纹理
    pub fn white_texture(&self) -> Rc<Texture> {
        Rc::clone(&self.white)
    }

    /// 命中且仍存活则直接返回；否则构建并登记
    pub fn get_or_insert_with<F>(&mut self, key: MeshKey, build: F) -> Rc<Mesh>
    where
        F: FnOnce(&Self) -> Rc<Mesh>,
    {
        if let Some(mesh) = self.get(&key) {
            return mesh;
        }
        let mesh = build(self);
        self.meshes.insert(key, Rc::downgrade(&mesh));
        mesh
    }

    pub fn get(&mut self, key: &MeshKey) -> Option<Rc<Mesh>> {
        match self.meshes.get(key).map(Weak::upgrade) {
            Some(Some(mesh)) => Some(mesh),
            Some(None) => {
                // 已过期
                self.meshes.remove(key);
                None
            }
            None => None,
        }
    }

    pub fn load_sweep(&mut self, spec: &SweepSpec) -> Rc<Mesh> {
        self.get_or_insert_with(MeshKey::sweep(spec), |cache| {
            Rc::new(Mesh::from_sweep(spec, cache.white_texture()))
        })
    }

    /// 读取 `dir/name`。失败时记录日志并返回空网格，失败结果不进缓存。
    pub fn load_file(&mut self, dir: &Path, name: &str) -> Rc<Mesh> {
        let key = MeshKey::file(dir, name);
        if let Some(mesh) = self.get(&key) {
            return mesh;
        }
        match load_obj(dir, name, &self.white) {
            Ok(mesh) => {
                info!("已加载模型 {}，顶点数 {}", dir.join(name).display(), mesh.vertex_count());
                let mesh = Rc::new(mesh);
                self.meshes.insert(key, Rc::downgrade(&mesh));
                mesh
            }
            Err(e) => {
                warn!("模型加载失败，使用空网格代替: {e}");
                Rc::new(Mesh::empty(self.white_texture()))
            }
        }
    }

    /// 仍被引用的网格数量
    pub fn live_count(&self) -> usize {
        self.meshes.values().filter(|w| w.strong_count() > 0).count()
    }

    pub fn purge(&mut self) {
        self.meshes.retain(|_, w| w.strong_count() > 0);
    }
}

fn load_texture(path: &Path, white: &Rc<Texture>) -> Rc<Texture> {
    match Texture::from_file(path) {
        Ok(tex) => {
            info!("已加载纹理 {}", path.display());
            Rc::new(tex)
        }
        Err(e) => {
            warn!("纹理加载失败 {}: {e}，使用白色纹理", path.display());
            Rc::clone(white)
        }
    }
}

pub fn load_obj(dir: &Path, name: &str, white: &Rc<Texture>) -> Result<Mesh, AssetError> {
    let path = dir.join(name);
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, materials) = tobj::load_obj(&path, &options).map_err(|source| AssetError::Obj {
        path: path.clone(),
        source,
    })?;
    let materials = materials.unwrap_or_else(|e| {
        warn!("材质读取失败 {}: {e}", path.display());
        Vec::new()
    });

    // 第一个带漫反射贴图的材质决定纹理和高光
    let mut texture = Rc::clone(white);
    let mut shininess = DEFAULT_SHININESS;
    if let Some(material) = materials.iter().find(|m| m.diffuse_texture.is_some()) {
        if let Some(tex_name) = &material.diffuse_texture {
            texture = load_texture(&dir.join(tex_name), white);
        }
        shininess = material
            .shininess
            .filter(|s| *s >= 1.0)
            .unwrap_or(DEFAULT_SHININESS);
    }

    let mut vertices = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let position = |i: usize| {
            Vec3::new(
                mesh.positions[3 * i],
                mesh.positions[3 * i + 1],
                mesh.positions[3 * i + 2],
            )
        };
        for face in mesh.indices.chunks_exact(3) {
            let idx = [face[0] as usize, face[1] as usize, face[2] as usize];
            let corners = idx.map(position);
            // 没有法线时使用面法线
            let flat = face_normal(corners[0], corners[1], corners[2]);
            let flat = if flat.magnitude2() > 0.0 {
                flat.normalize()
            } else {
                Vec3::unit_y()
            };
            for (k, &i) in idx.iter().enumerate() {
                let normal = if mesh.normals.len() >= 3 * (i + 1) {
                    Vec3::new(
                        mesh.normals[3 * i],
                        mesh.normals[3 * i + 1],
                        mesh.normals[3 * i + 2],
                    )
                } else {
                    flat
                };
                let uv = if mesh.texcoords.len() >= 2 * (i + 1) {
                    Vec2::new(mesh.texcoords[2 * i], mesh.texcoords[2 * i + 1])
                } else {
                    Vec2::new(0.0, 0.0)
                };
                vertices.push(Vertex::new(corners[k], uv, normal));
            }
        }
    }
    if vertices.is_empty() {
        return Err(AssetError::NoGeometry(path));
    }

    let mut mesh = Mesh::new(vertices, Vec3::new(1.0, 1.0, 1.0), texture);
    mesh.shininess = shininess;
    Ok(mesh)
}
