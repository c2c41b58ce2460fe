use cgmath::{ElementWise, InnerSpace, Vector2 as Vec2, Vector3 as Vec3};
use serde::{Deserialize, Serialize};

use crate::lights::LightData;
use crate::mesh::Mesh;
use crate::spline::normalize_or;

/// 高光强度，所有材质共用
const SPECULAR_STRENGTH: f32 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Shading {
    #[default]
    Phong,
    Toon,
    /// 法线可视化，不受光照影响
    Normal,
}

pub struct FragmentData<'a> {
    pub world_pos: Vec3<f32>,
    pub normal: Vec3<f32>,
    pub uv: Vec2<f32>,
    pub mesh: &'a Mesh,
    pub camera_pos: Vec3<f32>,
}

impl FragmentData<'_> {
    /// 网格颜色 × 纹理
    pub fn base_color(&self) -> Vec3<f32> {
        self.mesh.color.mul_element_wise(self.mesh.texture.sample(self.uv))
    }
}

// 定义 Shader 的通用行为
pub trait FragmentShader {
    // 输入插值后的片元数据，输出最终的颜色 (0.0 ~ 1.0 范围的 Vec3)
    fn shade(&self, data: &FragmentData) -> Vec3<f32>;
}

/// 点光源衰减 1 / (1 + 0.09d + 0.032d²)
pub fn attenuation(distance: f32) -> f32 {
    1.0 / (1.0 + 0.09 * distance + 0.032 * distance * distance)
}

/// 一帧内所有着色器共用的光照输入
#[derive(Clone, Copy)]
pub struct SceneLighting<'a> {
    pub lights: &'a [LightData],
    pub ambient: f32,
}

/// 单个光源对某片元的贡献：(漫反射系数, 高光系数, 光源颜色 × 强度 × 衰减)
struct LightTerm {
    diffuse: f32,
    specular: f32,
    radiance: Vec3<f32>,
}

fn light_term(light: &LightData, data: &FragmentData, normal: Vec3<f32>) -> Option<LightTerm> {
    let to_light = light.position() - data.world_pos;
    let distance = to_light.magnitude();
    if distance < 1e-6 {
        return None;
    }
    let light_dir = to_light / distance;
    let view_dir = normalize_or(data.camera_pos - data.world_pos, normal);
    let half_dir = normalize_or(light_dir + view_dir, normal);

    let diffuse = normal.dot(light_dir).max(0.0);
    let specular = if diffuse > 0.0 {
        normal.dot(half_dir).max(0.0).powf(data.mesh.shininess)
    } else {
        0.0
    };
    Some(LightTerm {
        diffuse,
        specular,
        radiance: light.color() * light.intensity * attenuation(distance),
    })
}

fn clamp_color(c: Vec3<f32>) -> Vec3<f32> {
    Vec3::new(c.x.clamp(0.0, 1.0), c.y.clamp(0.0, 1.0), c.z.clamp(0.0, 1.0))
}

//经典冯模型（Blinn 高光）
pub struct PhongShader<'a> {
    pub lighting: SceneLighting<'a>,
}

impl FragmentShader for PhongShader<'_> {
    fn shade(&self, data: &FragmentData) -> Vec3<f32> {
        let base_color = data.base_color();
        let normal = normalize_or(data.normal, Vec3::unit_y());

        let mut color = base_color * self.lighting.ambient;
        for light in self.lighting.lights {
            if let Some(term) = light_term(light, data, normal) {
                let specular = term.specular * SPECULAR_STRENGTH;
                let lit = base_color * term.diffuse + Vec3::new(1.0, 1.0, 1.0) * specular;
                color += lit.mul_element_wise(term.radiance);
            }
        }
        clamp_color(color)
    }
}

//非线性漫反射：卡通风格渲染
pub struct ToonShader<'a> {
    pub lighting: SceneLighting<'a>,
}

impl ToonShader<'_> {
    fn band(diffuse: f32) -> f32 {
        if diffuse > 0.6 {
            1.1
        } else if diffuse > 0.2 {
            0.8
        } else if diffuse > 0.0 {
            0.5
        } else {
            0.0
        }
    }
}

impl FragmentShader for ToonShader<'_> {
    fn shade(&self, data: &FragmentData) -> Vec3<f32> {
        let base_color = data.base_color();
        let normal = normalize_or(data.normal, Vec3::unit_y());
        let split_level = 4.0;

        let mut color = base_color * self.lighting.ambient;
        for light in self.lighting.lights {
            if let Some(term) = light_term(light, data, normal) {
                let specular =
                    (term.specular * SPECULAR_STRENGTH * split_level).floor() / split_level;
                let diffuse = base_color * Self::band(term.diffuse);
                let lit = diffuse + Vec3::new(1.0, 1.0, 1.0) * specular;
                color += lit.mul_element_wise(term.radiance);
            }
        }
        clamp_color(color)
    }
}

pub struct NormalDebugShader;

impl FragmentShader for NormalDebugShader {
    fn shade(&self, data: &FragmentData) -> Vec3<f32> {
        (normalize_or(data.normal, Vec3::unit_y()) + Vec3::new(1.0, 1.0, 1.0)) * 0.5
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::texture::Texture;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn red_mesh() -> Mesh {
        Mesh::new(Vec::new(), Vec3::new(1.0, 0.0, 0.0), Rc::new(Texture::white()))
    }

    fn light_at(position: [f32; 3], intensity: f32) -> LightData {
        LightData {
            position,
            _pad: 0.0,
            color: [1.0, 1.0, 1.0],
            intensity,
        }
    }

    fn fragment(mesh: &Mesh) -> FragmentData<'_> {
        FragmentData {
            world_pos: Vec3::new(0.0, 0.0, 0.0),
            normal: Vec3::new(0.0, 1.0, 0.0),
            uv: Vec2::new(0.0, 0.0),
            mesh,
            camera_pos: Vec3::new(0.0, 5.0, 5.0),
        }
    }

    #[test]
    fn attenuation_falls_off() {
        assert_relative_eq!(attenuation(0.0), 1.0);
        assert_relative_eq!(attenuation(10.0), 1.0 / 5.1, epsilon = 1e-6);
        assert!(attenuation(50.0) < attenuation(5.0));
    }

    #[test]
    fn unlit_surface_gets_only_ambient() {
        let mesh = red_mesh();
        let shader = PhongShader {
            lighting: SceneLighting {
                lights: &[],
                ambient: 0.2,
            },
        };
        assert_relative_eq!(shader.shade(&fragment(&mesh)), Vec3::new(0.2, 0.0, 0.0));
    }

    #[test]
    fn light_behind_surface_does_nothing() {
        let mesh = red_mesh();
        let below = [light_at([0.0, -2.0, 0.0], 5.0)];
        let above = [light_at([0.0, 2.0, 0.0], 5.0)];
        let dark = SceneLighting { lights: &below, ambient: 0.1 };
        let lit = SceneLighting { lights: &above, ambient: 0.1 };

        let phong_dark = PhongShader { lighting: dark }.shade(&fragment(&mesh));
        let phong_lit = PhongShader { lighting: lit }.shade(&fragment(&mesh));
        assert_relative_eq!(phong_dark, Vec3::new(0.1, 0.0, 0.0));
        assert!(phong_lit.x > phong_dark.x);

        let toon_dark = ToonShader { lighting: dark }.shade(&fragment(&mesh));
        let toon_lit = ToonShader { lighting: lit }.shade(&fragment(&mesh));
        assert_relative_eq!(toon_dark, Vec3::new(0.1, 0.0, 0.0));
        assert!(toon_lit.x > toon_dark.x);
    }

    #[test]
    fn multiple_lights_add_up() {
        let mesh = red_mesh();
        let one = [light_at([3.0, 3.0, 0.0], 0.2)];
        let two = [light_at([3.0, 3.0, 0.0], 0.2), light_at([-3.0, 3.0, 0.0], 0.2)];
        let shade = |lights: &[LightData]| {
            PhongShader {
                lighting: SceneLighting { lights, ambient: 0.0 },
            }
            .shade(&fragment(&mesh))
        };
        assert!(shade(&two).x > shade(&one).x);
    }

    #[test]
    fn normal_shader_maps_to_unit_cube() {
        let mesh = red_mesh();
        let color = NormalDebugShader.shade(&fragment(&mesh));
        assert_relative_eq!(color, Vec3::new(0.5, 1.0, 0.5));
    }
}
