use cgmath::{InnerSpace, Vector3 as Vec3};

/// 首尾两点距离小于该值时视为闭合路径
pub const CYCLIC_EPSILON: f32 = 0.001;
/// 切线长度低于该值视为退化
pub const DEGENERATE_EPSILON: f32 = 1e-4;

/// 控制点的取邻方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wrap {
    /// 闭合路径：下标对唯一点个数取模，p0 可以"借"路径末尾的点
    Cyclic,
    /// 开放路径：下标夹在 [0, len-1]，两端重复端点
    Clamped,
}

impl Wrap {
    pub fn detect(points: &[Vec3<f32>]) -> Self {
        if is_cyclic(points) {
            Wrap::Cyclic
        } else {
            Wrap::Clamped
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplineSample {
    pub position: Vec3<f32>,
    /// 未归一化的一阶导数
    pub tangent: Vec3<f32>,
}

pub fn is_cyclic(points: &[Vec3<f32>]) -> bool {
    match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            (*first - *last).magnitude() < CYCLIC_EPSILON
        }
        _ => false,
    }
}

/// 归一化；长度过小时返回 fallback，避免 NaN 扩散
pub fn normalize_or(v: Vec3<f32>, fallback: Vec3<f32>) -> Vec3<f32> {
    let len = v.magnitude();
    if len < DEGENERATE_EPSILON || !len.is_finite() {
        fallback
    } else {
        v / len
    }
}

// Catmull-Rom 位置，t=0 时经过 p1，t=1 时经过 p2
pub fn catmull_rom(
    p0: Vec3<f32>,
    p1: Vec3<f32>,
    p2: Vec3<f32>,
    p3: Vec3<f32>,
    t: f32,
) -> Vec3<f32> {
    let t2 = t * t;
    let t3 = t2 * t;
    (p1 * 2.0
        + (-p0 + p2) * t
        + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * t2
        + (-p0 + p1 * 3.0 - p2 * 3.0 + p3) * t3)
        * 0.5
}

// Catmull-Rom 一阶导数（切线方向，未归一化）
pub fn catmull_rom_tangent(
    p0: Vec3<f32>,
    p1: Vec3<f32>,
    p2: Vec3<f32>,
    p3: Vec3<f32>,
    t: f32,
) -> Vec3<f32> {
    let t2 = t * t;
    ((-p0 + p2)
        + (p0 * 4.0 - p1 * 10.0 + p2 * 8.0 - p3 * 2.0) * t
        + (-p0 * 3.0 + p1 * 9.0 - p2 * 9.0 + p3 * 3.0) * t2)
        * 0.5
}

/// 取第 seg 段的四个控制点
fn control_points(points: &[Vec3<f32>], seg: usize, wrap: Wrap) -> [Vec3<f32>; 4] {
    let num_segments = points.len() - 1;
    match wrap {
        Wrap::Cyclic => {
            // 最后一个点与第一个点重合，唯一点个数为 num_segments
            let n = num_segments as isize;
            let at = |i: isize| points[i.rem_euclid(n) as usize];
            let s = seg as isize;
            [at(s - 1), at(s), at(s + 1), at(s + 2)]
        }
        Wrap::Clamped => {
            let last = points.len() - 1;
            [
                points[seg.saturating_sub(1)],
                points[seg],
                points[(seg + 1).min(last)],
                points[(seg + 2).min(last)],
            ]
        }
    }
}

/// 在全局参数 global_t ∈ [0, 段数] 处求位置和切线。
/// 少于两个点时返回 None，调用方自行决定"不产生结果"。
pub fn evaluate(points: &[Vec3<f32>], wrap: Wrap, global_t: f32) -> Option<SplineSample> {
    if points.len() < 2 {
        return None;
    }
    let num_segments = points.len() - 1;
    let global_t = if global_t.is_finite() {
        global_t.clamp(0.0, num_segments as f32)
    } else {
        0.0
    };

    let seg = (global_t.floor() as usize).min(num_segments - 1);
    let local_t = global_t - seg as f32;

    let [p0, p1, p2, p3] = control_points(points, seg, wrap);
    Some(SplineSample {
        position: catmull_rom(p0, p1, p2, p3, local_t),
        tangent: catmull_rom_tangent(p0, p1, p2, p3, local_t),
    })
}

/// 按均匀参数步长把控制点细分成平滑曲线。
///
/// 闭合路径：`segments` 个采样，再把第一个采样追加到末尾闭合；
/// 开放路径：`segments + 1` 个采样，覆盖到终点。这里有意多取一个采样，
/// 只取 `segments` 个时管道会止于终点前一步。
pub fn subdivide(points: &[Vec3<f32>], segments: usize, wrap: Wrap) -> Vec<Vec3<f32>> {
    if points.len() < 2 {
        return points.to_vec();
    }
    let segments = segments.max(1);
    let num_segments = (points.len() - 1) as f32;

    let sample = |i: usize| {
        let global_t = i as f32 / segments as f32 * num_segments;
        evaluate(points, wrap, global_t).map(|s| s.position)
    };

    match wrap {
        Wrap::Cyclic => {
            let mut result: Vec<Vec3<f32>> = (0..segments).filter_map(sample).collect();
            if let Some(&first) = result.first() {
                result.push(first);
            }
            result
        }
        Wrap::Clamped => (0..=segments).filter_map(sample).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const TOLERANCE: f32 = 1e-5;

    fn loop_points() -> Vec<Vec3<f32>> {
        vec![
            Vec3::new(30.0, 5.0, 0.0),
            Vec3::new(0.0, 12.0, 20.0),
            Vec3::new(-30.0, 5.0, 0.0),
            Vec3::new(0.0, 8.0, -20.0),
            Vec3::new(30.0, 5.0, 0.0),
        ]
    }

    #[test]
    fn catmull_rom_passes_through_inner_points() {
        let p0 = Vec3::new(-1.0, 2.0, 0.5);
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(3.0, 1.0, -2.0);
        let p3 = Vec3::new(4.0, 4.0, 4.0);

        let start = catmull_rom(p0, p1, p2, p3, 0.0);
        let end = catmull_rom(p0, p1, p2, p3, 1.0);
        assert_relative_eq!(start, p1, epsilon = TOLERANCE);
        assert_relative_eq!(end, p2, epsilon = TOLERANCE);
    }

    #[test]
    fn tangent_matches_finite_difference() {
        let p0 = Vec3::new(-1.0, 2.0, 0.5);
        let p1 = Vec3::new(0.0, 0.0, 0.0);
        let p2 = Vec3::new(3.0, 1.0, -2.0);
        let p3 = Vec3::new(4.0, 4.0, 4.0);
        let t = 0.4;
        let h = 1e-3;

        let numeric =
            (catmull_rom(p0, p1, p2, p3, t + h) - catmull_rom(p0, p1, p2, p3, t - h)) / (2.0 * h);
        let analytic = catmull_rom_tangent(p0, p1, p2, p3, t);
        assert_relative_eq!(numeric, analytic, epsilon = 1e-2);
    }

    #[test]
    fn detects_closed_paths() {
        assert!(is_cyclic(&loop_points()));
        assert!(!is_cyclic(&[Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0)]));
        assert!(!is_cyclic(&[Vec3::new(0.0, 0.0, 0.0)]));
        assert_eq!(Wrap::detect(&loop_points()), Wrap::Cyclic);
    }

    #[test]
    fn evaluate_rejects_short_paths() {
        assert!(evaluate(&[], Wrap::Clamped, 0.0).is_none());
        assert!(evaluate(&[Vec3::new(1.0, 2.0, 3.0)], Wrap::Cyclic, 0.0).is_none());
    }

    #[test]
    fn evaluate_hits_control_points_at_integer_parameters() {
        let pts = loop_points();
        for (i, p) in pts.iter().enumerate() {
            let sample = evaluate(&pts, Wrap::Cyclic, i as f32).unwrap();
            assert_relative_eq!(sample.position, *p, epsilon = 1e-4);
        }
    }

    #[test]
    fn evaluate_clamps_out_of_range_parameters() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)];
        let before = evaluate(&pts, Wrap::Clamped, -3.0).unwrap();
        let after = evaluate(&pts, Wrap::Clamped, 7.0).unwrap();
        assert_relative_eq!(before.position, pts[0], epsilon = TOLERANCE);
        assert_relative_eq!(after.position, pts[1], epsilon = TOLERANCE);
    }

    #[test]
    fn clamped_two_point_path_interpolates() {
        let pts = vec![Vec3::new(0.0, 0.0, 0.0), Vec3::new(10.0, 0.0, 0.0)];
        let mid = evaluate(&pts, Wrap::Clamped, 0.5).unwrap();
        assert_relative_eq!(mid.position.x, 5.0, epsilon = TOLERANCE);
        assert!(mid.tangent.x > 0.0);
    }

    #[test]
    fn cyclic_tangent_is_continuous_at_the_seam() {
        let pts = loop_points();
        let n = (pts.len() - 1) as f32;
        let start = evaluate(&pts, Wrap::Cyclic, 0.0).unwrap();
        let end = evaluate(&pts, Wrap::Cyclic, n).unwrap();
        assert_relative_eq!(start.position, end.position, epsilon = 1e-4);
        assert_relative_eq!(start.tangent, end.tangent, epsilon = 1e-3);
    }

    #[test]
    fn cyclic_subdivision_closes_the_loop() {
        let smooth = subdivide(&loop_points(), 64, Wrap::Cyclic);
        assert_eq!(smooth.len(), 65);
        assert_eq!(smooth.first(), smooth.last());
    }

    #[test]
    fn clamped_subdivision_reaches_both_ends() {
        let pts = vec![
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(5.0, 2.0, 0.0),
            Vec3::new(10.0, 0.0, 0.0),
        ];
        let smooth = subdivide(&pts, 10, Wrap::Clamped);
        assert_eq!(smooth.len(), 11);
        assert_relative_eq!(smooth[0], pts[0], epsilon = TOLERANCE);
        assert_relative_eq!(smooth[10], pts[2], epsilon = TOLERANCE);
    }

    #[test]
    fn subdivide_returns_short_input_unchanged() {
        let single = vec![Vec3::new(1.0, 1.0, 1.0)];
        assert_eq!(subdivide(&single, 8, Wrap::Clamped), single);
    }

    #[test]
    fn normalize_or_falls_back_on_zero_vectors() {
        let fallback = Vec3::new(0.0, 0.0, 1.0);
        assert_eq!(normalize_or(Vec3::new(0.0, 0.0, 0.0), fallback), fallback);
        assert_relative_eq!(
            normalize_or(Vec3::new(3.0, 0.0, 4.0), fallback),
            Vec3::new(0.6, 0.0, 0.8),
            epsilon = TOLERANCE
        );
    }
}
