use std::rc::Rc;

use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use thiserror::Error;

use crate::assets::MeshCache;
use crate::config::{GeneratorConfig, MeshSource, ObjectConfig, SceneConfig, to_points};
use crate::ecs::{EcsError, Entity, Registry};
use crate::generate::{self, TreeParams};
use crate::mesh::Mesh;
use crate::sweep::SweepSpec;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("对象 {child} 引用的父对象 {parent} 不在它之前")]
    Parent {
        child: usize,
        parent: usize,
        #[source]
        source: Option<EcsError>,
    },
}

/// 加载后的场景：对象下标到实体的映射
#[derive(Debug, Default)]
pub struct Scene {
    pub entities: Vec<Entity>,
}

/// 展开生成器，得到最终的对象列表（显式对象在前）
pub fn expand(config: &SceneConfig) -> Vec<ObjectConfig> {
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let mut objects = config.objects.clone();
    for generator in &config.generators {
        let generated = match generator {
            GeneratorConfig::Tree {
                position,
                height,
                base_width,
                levels,
                per_level,
            } => generate::tree(
                &mut rng,
                TreeParams {
                    position: (*position).into(),
                    height: *height,
                    base_width: *base_width,
                    levels: *levels,
                    per_level: *per_level,
                },
            ),
            GeneratorConfig::CoasterRails { points, count } => {
                generate::coaster_rails(&to_points(points), *count)
            }
            GeneratorConfig::CoasterLights { points, count } => {
                generate::coaster_lights(&to_points(points), *count)
            }
        };
        debug!("生成器 {generator:?} 产生 {} 个对象", generated.len());
        objects.extend(generated);
    }
    objects
}

impl Scene {
    pub fn load(
        config: &SceneConfig,
        cache: &mut MeshCache,
        registry: &mut Registry,
    ) -> Result<Self, SceneError> {
        let objects = expand(config);
        info!("正在加载 {} 个对象", objects.len());

        let mut scene = Scene::default();
        for (index, object) in objects.iter().enumerate() {
            let entity = scene.spawn(index, object, cache, registry)?;
            scene.entities.push(entity);
        }
        info!(
            "场景加载完成：实体 {}，网格 {}，光源 {}",
            registry.entity_count(),
            cache.live_count(),
            registry.lights().count()
        );
        Ok(scene)
    }

    /// 配置中第 `index` 个对象对应的实体
    pub fn entity(&self, index: usize) -> Option<Entity> {
        self.entities.get(index).copied()
    }

    fn spawn(
        &self,
        index: usize,
        object: &ObjectConfig,
        cache: &mut MeshCache,
        registry: &mut Registry,
    ) -> Result<Entity, SceneError> {
        let parent = match object.transform.as_ref().and_then(|t| t.parent) {
            Some(parent) => match self.entity(parent) {
                Some(entity) if parent < index => Some(entity),
                _ => {
                    return Err(SceneError::Parent {
                        child: index,
                        parent,
                        source: None,
                    });
                }
            },
            None => None,
        };

        let entity = registry.create_entity();
        if let Some(transform) = &object.transform {
            *registry.transform_mut(entity) = transform.to_transform();
        }
        registry
            .set_parent(entity, parent)
            .map_err(|e| SceneError::Parent {
                child: index,
                parent: parent.map_or(index, Entity::index),
                source: Some(e),
            })?;

        if let Some(source) = &object.mesh {
            registry.set_mesh(entity, Some(load_mesh(source, cache)));
        }
        registry.set_light(entity, object.light.as_ref().map(Into::into));
        registry.set_sine_animator(entity, object.sine.as_ref().map(Into::into));
        registry.set_rotation_animator(entity, object.rotation.as_ref().map(Into::into));
        registry.set_parametric_animator(entity, object.parametric.as_ref().map(Into::into));
        registry.set_camera(entity, object.camera.as_ref().map(Into::into));

        if object.parametric.is_some() && object.rotation.is_some() {
            warn!("对象 {index} 同时带有参数曲线和旋转动画，旋转只在每帧朝向基础上叠加本帧增量");
        }
        Ok(entity)
    }
}

fn load_mesh(source: &MeshSource, cache: &mut MeshCache) -> Rc<Mesh> {
    match source {
        MeshSource::File { path, name } => cache.load_file(path, name),
        MeshSource::Sweep(sweep) => cache.load_sweep(&SweepSpec::from(sweep)),
    }
}
