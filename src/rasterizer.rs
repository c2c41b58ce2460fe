use crate::vertex::RasterPoint;
use cgmath::{Vector2 as Vec2, Vector3 as Vec3, dot};

/// 返回 (u, v, w)，分别对应 p 相对于 vertices[0]、[1]、[2] 的权重
pub fn get_barycentric_coords(
    vertices: &[Vec2<f32>; 3],
    p: &Vec2<f32>,
) -> Option<(f32, f32, f32)> {
    let v0 = vertices[1] - vertices[0];
    let v1 = vertices[2] - vertices[0];
    let v2 = *p - vertices[0];

    let d00 = dot(v0, v0);
    let d01 = dot(v0, v1);
    let d11 = dot(v1, v1);
    let d20 = dot(v2, v0);
    let d21 = dot(v2, v1);

    let denom = d00 * d11 - d01 * d01;
    if denom.abs() < 1e-6 {
        return None; // 三角形面积为零，无法计算重心坐标
    }

    let v = (d11 * d20 - d01 * d21) / denom;
    let w = (d00 * d21 - d01 * d20) / denom;
    let u = 1.0 - v - w;

    Some((u, v, w))
}

pub fn interpolate_depth(points: &[RasterPoint; 3], bary: (f32, f32, f32)) -> f32 {
    let (u, v, w) = bary;
    points[0].z * u + points[1].z * v + points[2].z * w
}

/// 线性插值任意顶点属性
pub fn interpolate_vec3(
    points: &[RasterPoint; 3],
    bary: (f32, f32, f32),
    attr: impl Fn(&RasterPoint) -> Vec3<f32>,
) -> Vec3<f32> {
    let (u, v, w) = bary;
    attr(&points[0]) * u + attr(&points[1]) * v + attr(&points[2]) * w
}

pub fn interpolate_uv(points: &[RasterPoint; 3], bary: (f32, f32, f32)) -> Vec2<f32> {
    let (u, v, w) = bary;
    points[0].uv * u + points[1].uv * v + points[2].uv * w
}

/// 屏幕包围盒，夹到 [0, width-1] × [0, height-1]；完全在屏幕外时返回 None
pub fn get_box(
    vertices: &[Vec2<f32>; 3],
    width: usize,
    height: usize,
) -> Option<(usize, usize, usize, usize)> {
    let min_x = vertices.iter().map(|v| v.x).fold(f32::INFINITY, f32::min);
    let max_x = vertices.iter().map(|v| v.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = vertices.iter().map(|v| v.y).fold(f32::INFINITY, f32::min);
    let max_y = vertices.iter().map(|v| v.y).fold(f32::NEG_INFINITY, f32::max);

    let finite = [min_x, max_x, min_y, max_y].iter().all(|v| v.is_finite());
    if width == 0 || height == 0 || !finite {
        return None;
    }
    if max_x < 0.0 || max_y < 0.0 || min_x >= width as f32 || min_y >= height as f32 {
        return None;
    }

    Some((
        min_x.floor().max(0.0) as usize,
        min_y.floor().max(0.0) as usize,
        (max_x.ceil() as usize).min(width - 1),
        (max_y.ceil() as usize).min(height - 1),
    ))
}

pub fn is_inside_triangle(vertices: &[Vec2<f32>; 3], p: &Vec2<f32>) -> bool {
    let v0 = vertices[1] - vertices[0];
    let v1 = vertices[2] - vertices[1];
    let v2 = vertices[0] - vertices[2];

    let p0 = *p - vertices[0];
    let p1 = *p - vertices[1];
    let p2 = *p - vertices[2];

    let cross0 = v0.x * p0.y - v0.y * p0.x;
    let cross1 = v1.x * p1.y - v1.y * p1.x;
    let cross2 = v2.x * p2.y - v2.y * p2.x;

    (cross0 >= 0.0 && cross1 >= 0.0 && cross2 >= 0.0)
        || (cross0 <= 0.0 && cross1 <= 0.0 && cross2 <= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tri() -> [Vec2<f32>; 3] {
        [Vec2::new(0.0, 0.0), Vec2::new(4.0, 0.0), Vec2::new(0.0, 4.0)]
    }

    #[test]
    fn barycentric_weights_match_vertices() {
        let (u, v, w) = get_barycentric_coords(&tri(), &Vec2::new(4.0, 0.0)).unwrap();
        assert_relative_eq!(v, 1.0);
        assert_relative_eq!(u, 0.0);
        assert_relative_eq!(w, 0.0);

        let (u, v, w) = get_barycentric_coords(&tri(), &Vec2::new(1.0, 1.0)).unwrap();
        assert_relative_eq!(u + v + w, 1.0);
        assert_relative_eq!(v, 0.25);
        assert_relative_eq!(w, 0.25);

        let flat = [Vec2::new(0.0, 0.0), Vec2::new(1.0, 1.0), Vec2::new(2.0, 2.0)];
        assert!(get_barycentric_coords(&flat, &Vec2::new(1.0, 1.0)).is_none());
    }

    #[test]
    fn inside_test_accepts_both_windings() {
        let t = tri();
        let reversed = [t[2], t[1], t[0]];
        let p = Vec2::new(1.0, 1.0);
        assert!(is_inside_triangle(&t, &p));
        assert!(is_inside_triangle(&reversed, &p));
        assert!(!is_inside_triangle(&t, &Vec2::new(3.0, 3.0)));
    }

    #[test]
    fn box_is_clamped_to_screen() {
        let t = [Vec2::new(-5.0, 2.2), Vec2::new(3.5, -1.0), Vec2::new(20.0, 7.9)];
        assert_eq!(get_box(&t, 10, 6), Some((0, 0, 9, 5)));
        let off = [Vec2::new(-5.0, -5.0), Vec2::new(-1.0, -5.0), Vec2::new(-3.0, -1.0)];
        assert_eq!(get_box(&off, 10, 6), None);
    }
}
