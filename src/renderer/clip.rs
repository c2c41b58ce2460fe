use crate::vertex::ClipSpaceVertex;

/// w 小于该值的顶点视为在相机平面上或其后
const MIN_W: f32 = 1e-5;

pub trait Clipper {
    // 接收一个裁剪空间的三角形
    // 返回一个 Vec，其中包含裁剪后产生的零个、一个或多个三角形
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]>;
}

// 只做整体剔除：任何顶点越过相机平面，或三个顶点都在同一侧视锥面之外时丢弃
pub struct SimpleClipper;

impl Clipper for SimpleClipper {
    fn clip_triangle(&self, triangle: &[ClipSpaceVertex; 3]) -> Vec<[ClipSpaceVertex; 3]> {
        if triangle.iter().any(|v| v.position.w < MIN_W) {
            return vec![];
        }

        let outside = |f: fn(&ClipSpaceVertex) -> bool| triangle.iter().all(f);
        if outside(|v| v.position.x > v.position.w)
            || outside(|v| v.position.x < -v.position.w)
            || outside(|v| v.position.y > v.position.w)
            || outside(|v| v.position.y < -v.position.w)
            || outside(|v| v.position.z > v.position.w)
            || outside(|v| v.position.z < -v.position.w)
        {
            return vec![];
        }
        vec![*triangle]
    }
}
