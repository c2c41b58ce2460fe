use std::f32::consts::TAU;

use cgmath::{InnerSpace, Matrix3 as Mat3, Vector2 as Vec2, Vector3 as Vec3, Zero};

use crate::spline::{self, Wrap, normalize_or};
use crate::vertex::{Vertex, face_normal};

/// 扫掠管道的生成参数
#[derive(Debug, Clone, PartialEq)]
pub struct SweepSpec {
    pub points: Vec<Vec3<f32>>,
    pub radius: f32,
    pub path_segments: usize,
    pub circle_segments: usize,
    pub color: Vec3<f32>,
}

impl SweepSpec {
    pub fn new(
        points: Vec<Vec3<f32>>,
        radius: f32,
        path_segments: usize,
        circle_segments: usize,
    ) -> Self {
        Self {
            points,
            radius,
            path_segments,
            circle_segments,
            color: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    pub fn with_color(mut self, color: Vec3<f32>) -> Self {
        self.color = color;
        self
    }
}

/// XZ 平面上的参考圆
pub fn reference_circle(segments: usize, radius: f32) -> Vec<Vec3<f32>> {
    (0..segments)
        .map(|i| {
            let angle = i as f32 * TAU / segments as f32;
            Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius)
        })
        .collect()
}

/// 某个采样点处的局部坐标系，列依次为 (normal, tangent, span)
fn frame_basis(tangent: Vec3<f32>) -> Mat3<f32> {
    // 切线与 up 接近平行时换一个参考轴
    let mut up = Vec3::unit_y();
    if tangent.dot(up).abs() > 0.99 {
        up = Vec3::unit_x();
    }
    let span = normalize_or(tangent.cross(up), Vec3::unit_z());
    let normal = normalize_or(span.cross(tangent), Vec3::unit_x());
    Mat3::from_cols(normal, tangent, span)
}

/// 每个采样点的单位切线：中间用中心差分，两端用前/后向差分，
/// 退化时沿用上一个切线
fn path_tangents(path: &[Vec3<f32>]) -> Vec<Vec3<f32>> {
    let last = path.len() - 1;
    let mut prev = Vec3::unit_z();
    (0..path.len())
        .map(|i| {
            let raw = if i == 0 {
                path[1] - path[0]
            } else if i == last {
                path[last] - path[last - 1]
            } else {
                path[i + 1] - path[i - 1]
            };
            prev = normalize_or(raw, prev);
            prev
        })
        .collect()
}

fn push_triangle(out: &mut Vec<Vertex>, tri: [Vec3<f32>; 3], fallback: Vec3<f32>) {
    let normal = normalize_or(face_normal(tri[0], tri[1], tri[2]), fallback);
    for pos in tri {
        out.push(Vertex::new(pos, Vec2::zero(), normal));
    }
}

/// 沿路径扫掠圆截面生成管道三角形（三个顶点一组）。
/// 少于两个控制点或圆截面少于 3 段时返回空。
pub fn build_sweep(spec: &SweepSpec) -> Vec<Vertex> {
    if spec.points.len() < 2 || spec.circle_segments < 3 {
        return Vec::new();
    }

    let wrap = Wrap::detect(&spec.points);
    let path = spline::subdivide(&spec.points, spec.path_segments.max(1), wrap);
    if path.len() < 2 {
        return Vec::new();
    }
    let circle = reference_circle(spec.circle_segments, spec.radius);
    let tangents = path_tangents(&path);

    // rings[i] 是以 path[i] 为圆心的截面
    let rings: Vec<Vec<Vec3<f32>>> = path
        .iter()
        .zip(&tangents)
        .map(|(center, tangent)| {
            let basis = frame_basis(*tangent);
            circle.iter().map(|p| basis * *p + *center).collect()
        })
        .collect();

    let n = spec.circle_segments;
    let mut vertices = Vec::with_capacity((rings.len() - 1) * n * 6);
    for i in 1..rings.len() {
        let (prev_ring, ring) = (&rings[i - 1], &rings[i]);
        for j in 0..n {
            let next_j = (j + 1) % n;
            let p0 = prev_ring[j];
            let p1 = ring[j];
            let p2 = ring[next_j];
            let p3 = prev_ring[next_j];

            // 截面退化（两个采样点重合）时用径向作为法线
            let radial = normalize_or(p0 - path[i - 1], Vec3::unit_y());

            // 从管道外侧看为逆时针
            push_triangle(&mut vertices, [p1, p0, p2], radial);
            push_triangle(&mut vertices, [p2, p0, p3], radial);
        }
    }
    vertices
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn straight(radius: f32, circle_segments: usize) -> SweepSpec {
        SweepSpec::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)],
            radius,
            8,
            circle_segments,
        )
    }

    #[test]
    fn short_paths_produce_nothing() {
        let mut spec = straight(1.0, 12);
        spec.points.truncate(1);
        assert!(build_sweep(&spec).is_empty());

        let spec = straight(1.0, 2);
        assert!(build_sweep(&spec).is_empty());
    }

    #[test]
    fn vertex_count_is_rings_times_segments_times_six() {
        let spec = straight(0.5, 12);
        // 8 段 → 9 个截面 → 8 圈四边形
        assert_eq!(build_sweep(&spec).len(), 8 * 12 * 6);
    }

    #[test]
    fn straight_tube_keeps_constant_radius() {
        let radius = 0.75;
        for v in build_sweep(&straight(radius, 16)) {
            let distance = (v.pos.y * v.pos.y + v.pos.z * v.pos.z).sqrt();
            assert_relative_eq!(distance, radius, epsilon = 1e-4);
        }
    }

    #[test]
    fn straight_tube_spans_the_whole_path() {
        let vertices = build_sweep(&straight(1.0, 8));
        let min_x = vertices.iter().map(|v| v.pos.x).fold(f32::MAX, f32::min);
        let max_x = vertices.iter().map(|v| v.pos.x).fold(f32::MIN, f32::max);
        assert_relative_eq!(min_x, 0.0, epsilon = 1e-4);
        assert_relative_eq!(max_x, 10.0, epsilon = 1e-4);
    }

    #[test]
    fn normals_point_away_from_the_axis() {
        for tri in build_sweep(&straight(1.0, 16)).chunks(3) {
            let center = (tri[0].pos + tri[1].pos + tri[2].pos) / 3.0;
            let outward = Vec3::new(0.0, center.y, center.z);
            assert!(tri[0].normal.dot(outward) > 0.0);
            // 绕序与法线一致，背面剔除才正确
            let winding = face_normal(tri[0].pos, tri[1].pos, tri[2].pos);
            assert!(winding.dot(tri[0].normal) > 0.0);
        }
    }

    #[test]
    fn vertical_path_does_not_degenerate() {
        let spec = SweepSpec::new(
            vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(0.0, 5.0, 0.0)],
            0.25,
            10,
            20,
        );
        let vertices = build_sweep(&spec);
        assert!(!vertices.is_empty());
        for v in &vertices {
            assert!(v.is_finite());
            let distance = (v.pos.x * v.pos.x + v.pos.z * v.pos.z).sqrt();
            assert_relative_eq!(distance, 0.25, epsilon = 1e-4);
        }
    }

    #[test]
    fn repeated_points_stay_finite() {
        let spec = SweepSpec::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(4.0, 1.0, 0.0),
                Vec3::new(4.0, 1.0, 0.0),
            ],
            0.5,
            40,
            12,
        );
        let vertices = build_sweep(&spec);
        assert!(!vertices.is_empty());
        assert!(vertices.iter().all(Vertex::is_finite));
    }

    #[test]
    fn fully_collapsed_path_stays_finite() {
        let p = Vec3::new(1.0, 2.0, 3.0);
        let spec = SweepSpec::new(vec![p, p], 0.3, 6, 8);
        assert!(build_sweep(&spec).iter().all(Vertex::is_finite));
    }

    #[test]
    fn closed_loop_connects_back_to_start() {
        let spec = SweepSpec::new(
            vec![
                Vec3::new(5.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 5.0),
                Vec3::new(-5.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, -5.0),
                Vec3::new(5.0, 0.0, 0.0),
            ],
            0.4,
            32,
            10,
        );
        let vertices = build_sweep(&spec);
        assert_eq!(vertices.len(), 32 * 10 * 6);
        assert!(vertices.iter().all(Vertex::is_finite));
    }

    #[test]
    fn reference_circle_lies_in_xz_plane() {
        for p in reference_circle(7, 2.0) {
            assert_relative_eq!(p.y, 0.0);
            assert_relative_eq!(p.magnitude(), 2.0, epsilon = 1e-5);
        }
    }
}
