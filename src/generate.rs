//! 程序化生成器：只产出 `ObjectConfig`，网格由加载器统一构建。

use cgmath::{Deg, InnerSpace, Matrix3 as Mat3, Vector3 as Vec3};
use rand::Rng;

use crate::config::{
    LightConfig, MeshSource, ObjectConfig, ParametricConfig, SweepConfig, TransformConfig,
};
use crate::spline::{self, Wrap, normalize_or};

const LIGHT_BROWN: [f32; 3] = [0.76, 0.60, 0.42];
const DARK_BROWN: [f32; 3] = [0.36, 0.22, 0.12];
const LIGHT_GREEN: [f32; 3] = [0.12, 0.42, 0.16];
const DARK_GREEN: [f32; 3] = [0.55, 0.80, 0.35];

const BRANCH_PATH_SEGMENTS: usize = 10;
const LEAF_RADIUS_SCALE: f32 = 70.0;
const LEAF_THICKNESS: f32 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    pub position: Vec3<f32>,
    pub height: f32,
    pub base_width: f32,
    pub levels: i32,
    pub per_level: usize,
}

fn mix(a: [f32; 3], b: [f32; 3], t: f32) -> [f32; 3] {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
    ]
}

fn sweep_object(
    points: [Vec3<f32>; 2],
    radius: f32,
    circle_segments: usize,
    color: [f32; 3],
) -> ObjectConfig {
    ObjectConfig {
        mesh: Some(MeshSource::Sweep(SweepConfig {
            points: points.iter().map(|&p| p.into()).collect(),
            radius,
            path_segments: BRANCH_PATH_SEGMENTS,
            circle_segments,
            color,
        })),
        ..Default::default()
    }
}

/// 随机轴：方向与一个随机向量的叉积，平行时退回 fallback
fn random_axis<R: Rng>(rng: &mut R, dir: Vec3<f32>, fallback: Vec3<f32>) -> Vec3<f32> {
    let random = Vec3::new(
        rng.random_range(0..100) as f32,
        rng.random_range(0..100) as f32,
        rng.random_range(0..100) as f32,
    );
    let random = normalize_or(random, Vec3::unit_y());
    normalize_or(dir.cross(random), fallback)
}

fn random_turn<R: Rng>(rng: &mut R, dir: Vec3<f32>, fallback_axis: Vec3<f32>) -> Vec3<f32> {
    let axis = random_axis(rng, dir, fallback_axis);
    let angle = Deg(rng.random_range(-90..90) as f32);
    normalize_or(Mat3::from_axis_angle(axis, angle) * dir, dir)
}

/// 树：主干 + 每层 `per_level` 个分枝，最后一层是叶片圆盘。
///
/// 对象数 = `1 + Σ_{i=1}^{levels-1} per_level^i`，`levels <= 0` 时为空。
pub fn tree<R: Rng>(rng: &mut R, params: TreeParams) -> Vec<ObjectConfig> {
    let mut out = Vec::new();
    if params.levels <= 0 {
        return out;
    }
    let start = params.position;
    let end = start + Vec3::new(0.0, params.height, 0.0);
    let color = mix(LIGHT_BROWN, DARK_BROWN, rng.random_range(50..100) as f32 / 100.0);
    out.push(sweep_object([start, end], params.base_width, circle_segments(params.levels), color));
    let width = params.base_width * 0.5;
    branches(rng, start, end, width, params.levels - 1, params.per_level, &mut out);
    out
}

fn circle_segments(remaining: i32) -> usize {
    (3 + remaining * 3).max(3) as usize
}

fn branches<R: Rng>(
    rng: &mut R,
    start: Vec3<f32>,
    end: Vec3<f32>,
    width: f32,
    remaining: i32,
    per_level: usize,
    out: &mut Vec<ObjectConfig>,
) {
    if remaining <= 0 {
        return;
    }
    let segments = circle_segments(remaining);
    let parent_dir = normalize_or(end - start, Vec3::unit_y());
    let bark = mix(LIGHT_BROWN, DARK_BROWN, rng.random_range(50..100) as f32 / 100.0);

    for _ in 0..per_level {
        if remaining == 1 {
            // 叶片：在枝头放一个极短、半径很大的扫掠体
            let color = mix(LIGHT_GREEN, DARK_GREEN, rng.random_range(0..100) as f32 / 100.0);
            let tip = end - parent_dir * LEAF_THICKNESS;
            out.push(sweep_object([end, tip], width * LEAF_RADIUS_SCALE, segments, color));
            continue;
        }

        let length = (end - start).magnitude() * 0.5;
        let turned = random_turn(rng, parent_dir, Vec3::unit_x());
        let mut dir = random_turn(rng, turned, Vec3::unit_y());
        if dir.y < 0.0 {
            dir = -dir;
        }
        let branch_end = end + dir * length;
        out.push(sweep_object([end, branch_end], width, segments, bark));
        branches(rng, end, branch_end, width * 0.3, remaining - 1, per_level, out);
    }
}

/// 支柱：沿闭合轨道均匀取点，从地面竖到轨道高度
pub fn coaster_rails(points: &[Vec3<f32>], count: usize) -> Vec<ObjectConfig> {
    if points.len() < 2 {
        return Vec::new();
    }
    let num_segments = (points.len() - 1) as f32;
    (0..count)
        .filter_map(|i| {
            let t = num_segments * i as f32 / count as f32;
            spline::evaluate(points, Wrap::Cyclic, t)
        })
        .map(|sample| {
            let top = sample.position;
            let floor = Vec3::new(top.x, 0.0, top.z);
            ObjectConfig {
                transform: Some(TransformConfig::at(floor)),
                mesh: Some(MeshSource::Sweep(SweepConfig {
                    points: vec![[0.0, 0.0, 0.0], [0.0, top.y, 0.0]],
                    radius: 0.25,
                    path_segments: 10,
                    circle_segments: 20,
                    color: [0.7, 0.7, 0.7],
                })),
                ..Default::default()
            }
        })
        .collect()
}

/// 沿轨道均匀错开相位的白色点光源
pub fn coaster_lights(points: &[Vec3<f32>], count: usize) -> Vec<ObjectConfig> {
    if points.len() < 2 {
        return Vec::new();
    }
    let track: Vec<[f32; 3]> = points.iter().map(|&p| p.into()).collect();
    (0..count)
        .map(|i| ObjectConfig {
            light: Some(LightConfig {
                color: [1.0, 1.0, 1.0],
                intensity: 2.0,
            }),
            parametric: Some(ParametricConfig {
                points: track.clone(),
                speed: 0.5,
                phase: i as f32 / count as f32,
            }),
            ..Default::default()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::COASTER_POINTS;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn params(levels: i32, per_level: usize) -> TreeParams {
        TreeParams {
            position: Vec3::new(0.0, 0.0, 0.0),
            height: 3.0,
            base_width: 0.25,
            levels,
            per_level,
        }
    }

    fn expected_count(levels: i32, per_level: usize) -> usize {
        1 + (1..levels).map(|i| per_level.pow(i as u32)).sum::<usize>()
    }

    fn sweep(obj: &ObjectConfig) -> &SweepConfig {
        match &obj.mesh {
            Some(MeshSource::Sweep(s)) => s,
            other => panic!("应为扫掠网格: {other:?}"),
        }
    }

    #[test]
    fn tree_object_count() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert!(tree(&mut rng, params(0, 7)).is_empty());
        assert!(tree(&mut rng, params(-2, 7)).is_empty());
        assert_eq!(tree(&mut rng, params(1, 7)).len(), 1);
        for (levels, per_level) in [(2, 3), (3, 4), (4, 7)] {
            let objects = tree(&mut rng, params(levels, per_level));
            assert_eq!(objects.len(), expected_count(levels, per_level));
        }
    }

    #[test]
    fn same_seed_same_tree() {
        let a = tree(&mut ChaCha8Rng::seed_from_u64(42), params(3, 4));
        let b = tree(&mut ChaCha8Rng::seed_from_u64(42), params(3, 4));
        let c = tree(&mut ChaCha8Rng::seed_from_u64(43), params(3, 4));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn trunk_and_branches_follow_the_rules() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let objects = tree(&mut rng, params(3, 2));
        let trunk = sweep(&objects[0]);
        assert_eq!(trunk.points, vec![[0.0, 0.0, 0.0], [0.0, 3.0, 0.0]]);
        assert_eq!(trunk.radius, 0.25);
        assert_eq!(trunk.circle_segments, 12);
        assert_eq!(trunk.path_segments, 10);

        // 第一根分枝从主干顶端出发，长度减半，朝上
        let branch = sweep(&objects[1]);
        assert_eq!(branch.points[0], [0.0, 3.0, 0.0]);
        let start = Vec3::from(branch.points[0]);
        let end = Vec3::from(branch.points[1]);
        assert!(((end - start).magnitude() - 1.5).abs() < 1e-4);
        assert!(end.y >= start.y);
        assert_eq!(branch.radius, 0.125);
        assert_eq!(branch.circle_segments, 9);

        // 紧随其后的是它的叶片
        let leaf = sweep(&objects[2]);
        assert_eq!(leaf.points[0], branch.points[1]);
        assert!((leaf.radius - 0.125 * 0.3 * 70.0).abs() < 1e-4);
        assert_eq!(leaf.circle_segments, 6);
        for obj in &objects {
            for p in &sweep(obj).points {
                assert!(p.iter().all(|c| c.is_finite()));
            }
        }
    }

    #[test]
    fn rails_stand_on_the_floor() {
        let points: Vec<Vec3<f32>> = COASTER_POINTS.iter().map(|&p| p.into()).collect();
        let rails = coaster_rails(&points, 10);
        assert_eq!(rails.len(), 10);

        // 第 0 根在第一个控制点下方
        let first = &rails[0];
        assert_eq!(first.transform.as_ref().unwrap().position, [30.0, 0.0, 0.0]);
        assert_eq!(sweep(first).points, vec![[0.0, 0.0, 0.0], [0.0, 5.0, 0.0]]);
        for rail in &rails {
            let t = rail.transform.as_ref().unwrap();
            assert_eq!(t.position[1], 0.0);
            assert_eq!(sweep(rail).radius, 0.25);
            assert_eq!(sweep(rail).circle_segments, 20);
        }
        assert!(coaster_rails(&points[..1], 10).is_empty());
    }

    #[test]
    fn lights_are_spread_along_the_track() {
        let points: Vec<Vec3<f32>> = COASTER_POINTS.iter().map(|&p| p.into()).collect();
        let lights = coaster_lights(&points, 4);
        let phases: Vec<f32> = lights
            .iter()
            .map(|l| l.parametric.as_ref().unwrap().phase)
            .collect();
        assert_eq!(phases, vec![0.0, 0.25, 0.5, 0.75]);
        for l in &lights {
            assert_eq!(l.light.as_ref().unwrap().intensity, 2.0);
            assert_eq!(l.parametric.as_ref().unwrap().speed, 0.5);
            assert!(l.mesh.is_none());
        }
        assert!(coaster_lights(&[], 4).is_empty());
    }
}
