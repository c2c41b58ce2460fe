use cgmath::{Vector3 as Vec3, Zero};
use log::trace;

use crate::ecs::components::facing_rotation;
use crate::ecs::registry::Registry;

/// 帧时钟
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Clock {
    pub total: f32,
    pub delta: f32,
}

impl Clock {
    pub fn tick(&mut self, delta: f32) {
        self.delta = delta;
        self.total += delta;
    }
}

/// 依次应用三种动画器：
/// 参数曲线直接覆盖位置和朝向，旋转在此基础上累加，正弦只写 offset。
pub fn update_animations(registry: &mut Registry, clock: &Clock) {
    for entity in registry.entities() {
        let anim = registry.animated_mut(entity);
        let transform = anim.transform;

        if let Some(parametric) = anim.parametric
            && let Some((position, tangent)) = parametric.advance(clock.total)
        {
            transform.position = position;
            transform.rotation = facing_rotation(tangent);
        }

        if let Some(rotation) = anim.rotation {
            transform.rotation += rotation.delta(clock.delta);
        }

        // 没有正弦动画器时清零，移除组件后不留残余位移
        transform.offset = match anim.sine {
            Some(sine) => sine.offset_at(clock.total),
            None => Vec3::zero(),
        };
    }
}

/// 按下标顺序重建世界矩阵；父实体下标总是更小，所以父矩阵已是本帧的结果
pub fn update_transforms(registry: &mut Registry) {
    let transforms = registry.transforms_mut();
    for i in 0..transforms.len() {
        let local = transforms[i].local_matrix();
        transforms[i].matrix = match transforms[i].parent {
            Some(parent) if parent.index() < i => transforms[parent.index()].matrix * local,
            _ => local,
        };
    }
}

/// 推进一帧：先动画后变换
pub fn step(registry: &mut Registry, clock: &mut Clock, delta: f32) {
    clock.tick(delta);
    update_animations(registry, clock);
    update_transforms(registry);
    trace!("t = {:.3}s, 实体数 {}", clock.total, registry.entity_count());
}
