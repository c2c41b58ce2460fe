use cgmath::{Deg, InnerSpace, Matrix4 as Mat4, Point3, Transform, Vector3 as Vec3};

pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;
/// 俯仰角上限，防止视线与 up 平行
pub const MAX_PITCH: f32 = 85.0;

#[derive(Debug, Clone, Copy)]
pub struct Frustum {
    mat: Mat4<f32>,
}

impl Frustum {
    /// `fovy` 为弧度
    #[rustfmt::skip]
    pub fn new(near: f32, aspect: f32, far: f32, fovy: f32) -> Self {
        let tan_half_fovy = (fovy / 2.0).tan();
        let a = 1.0 / (aspect * tan_half_fovy);
        let b = 1.0 / tan_half_fovy;
        let c = -(far + near) / (far - near);
        let d = -2.0 * far * near / (far - near);

        // projection
        let mat = Mat4::new(
            a,    0.0,   0.0,   0.0,
            0.0,  b,     0.0,   0.0,
            0.0,  0.0,   c,    -1.0,
            0.0,  0.0,   d,     0.0,
        );

        Self { mat }
    }

    pub fn perspective(fov: Deg<f32>, aspect: f32) -> Self {
        Self::new(NEAR_PLANE, aspect, FAR_PLANE, fov.0.to_radians())
    }

    pub fn get_mat(&self) -> &Mat4<f32> {
        &self.mat
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    frustum: Frustum,
    pub(crate) eye: Vec3<f32>,
    front: Vec3<f32>,
    up: Vec3<f32>,
}

impl Camera {
    /// 自由视角相机：位置 + 偏航/俯仰（度），俯仰限制在 ±MAX_PITCH
    pub fn new(position: Vec3<f32>, yaw: f32, pitch: f32, fov: f32, aspect: f32) -> Self {
        Self {
            frustum: Frustum::perspective(Deg(fov), aspect),
            eye: position,
            front: front_from(yaw, pitch.clamp(-MAX_PITCH, MAX_PITCH)),
            up: Vec3::unit_y(),
        }
    }

    /// 以实体的世界矩阵为视点：眼睛在实体原点，朝向局部 +X，上方为局部 +Y
    pub fn mounted(world: &Mat4<f32>, fov: f32, aspect: f32) -> Self {
        let eye = world.w.truncate();
        let front = world.transform_vector(Vec3::unit_x());
        let up = world.transform_vector(Vec3::unit_y());
        let front = if front.magnitude2() > 0.0 {
            front.normalize()
        } else {
            Vec3::new(0.0, 0.0, -1.0)
        };
        let up = if up.magnitude2() > 0.0 && front.cross(up).magnitude2() > 1e-8 {
            up.normalize()
        } else {
            Vec3::unit_y()
        };
        Self {
            frustum: Frustum::perspective(Deg(fov), aspect),
            eye,
            front,
            up,
        }
    }

    pub fn get_frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn position(&self) -> Vec3<f32> {
        self.eye
    }

    pub fn front(&self) -> Vec3<f32> {
        self.front
    }

    pub fn get_view_mat(&self) -> Mat4<f32> {
        let eye = Point3::new(self.eye.x, self.eye.y, self.eye.z);
        Mat4::look_at_rh(eye, eye + self.front, self.up)
    }

    pub fn get_view_proj_mat(&self) -> Mat4<f32> {
        self.frustum.get_mat() * self.get_view_mat()
    }
}

// yaw = -90 时看向 -Z
fn front_from(yaw: f32, pitch: f32) -> Vec3<f32> {
    let (yaw, pitch) = (yaw.to_radians(), pitch.to_radians());
    Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos()).normalize()
}
