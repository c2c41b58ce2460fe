use bytemuck::{Pod, Zeroable};
use cgmath::Vector3 as Vec3;

use crate::ecs::Registry;

pub const MAX_LIGHTS: usize = 128;

/// 与着色器 std140 布局一致的单个光源，32 字节对齐
#[repr(C, align(32))]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct LightData {
    pub position: [f32; 3],
    pub _pad: f32,
    pub color: [f32; 3],
    pub intensity: f32,
}

impl LightData {
    pub fn position(&self) -> Vec3<f32> {
        self.position.into()
    }

    pub fn color(&self) -> Vec3<f32> {
        self.color.into()
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct LightBlock {
    pub lights: [LightData; MAX_LIGHTS],
    pub count: i32,
    /// 补齐到 32 字节的整数倍
    pub _padding: [i32; 7],
}

impl Default for LightBlock {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl LightBlock {
    /// 上传缓冲区用的原始字节
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }

    pub fn active(&self) -> &[LightData] {
        let count = (self.count.max(0) as usize).min(MAX_LIGHTS);
        &self.lights[..count]
    }

    /// 满了返回 false
    pub fn push(&mut self, position: Vec3<f32>, color: Vec3<f32>, intensity: f32) -> bool {
        let count = self.count as usize;
        if count >= MAX_LIGHTS {
            return false;
        }
        self.lights[count] = LightData {
            position: position.into(),
            _pad: 0.0,
            color: color.into(),
            intensity,
        };
        self.count += 1;
        true
    }
}

/// 按实体下标收集光源，位置取世界矩阵的平移，超过上限的直接丢弃
pub fn collect_lights(registry: &Registry) -> LightBlock {
    let mut block = LightBlock::default();
    for (_, transform, light) in registry.lights() {
        if !block.push(transform.world_position(), light.color, light.intensity) {
            break;
        }
    }
    block
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::{Light, Transform, update_transforms};
    use std::mem::{align_of, size_of};

    #[test]
    fn layout_matches_uniform_block() {
        assert_eq!(size_of::<LightData>(), 32);
        assert_eq!(align_of::<LightData>(), 32);
        assert_eq!(size_of::<LightBlock>(), 32 * MAX_LIGHTS + 32);
        assert_eq!(LightBlock::default().as_bytes().len(), size_of::<LightBlock>());
    }

    #[test]
    fn collects_world_positions_in_index_order() {
        let mut reg = Registry::new();
        let parent = reg.create_entity();
        let lamp = reg.create_entity();
        *reg.transform_mut(parent) = Transform::at(Vec3::new(0.0, 5.0, 0.0));
        *reg.transform_mut(lamp) = Transform::at(Vec3::new(1.0, 0.0, 0.0));
        reg.set_parent(lamp, Some(parent)).unwrap();
        reg.set_light(
            lamp,
            Some(Light {
                color: Vec3::new(1.0, 0.5, 0.0),
                intensity: 2.0,
            }),
        );
        update_transforms(&mut reg);

        let block = collect_lights(&reg);
        assert_eq!(block.count, 1);
        let light = block.active()[0];
        assert_eq!(light.position(), Vec3::new(1.0, 5.0, 0.0));
        assert_eq!(light.color(), Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(light.intensity, 2.0);
    }

    #[test]
    fn extra_lights_are_dropped() {
        let mut reg = Registry::new();
        for i in 0..MAX_LIGHTS + 5 {
            let e = reg.create_entity();
            reg.transform_mut(e).position = Vec3::new(i as f32, 0.0, 0.0);
            reg.set_light(e, Some(Light::default()));
        }
        update_transforms(&mut reg);

        let block = collect_lights(&reg);
        assert_eq!(block.count as usize, MAX_LIGHTS);
        assert_eq!(block.active().len(), MAX_LIGHTS);
        assert_eq!(block.active()[MAX_LIGHTS - 1].position[0], (MAX_LIGHTS - 1) as f32);
    }
}
