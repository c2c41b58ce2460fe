pub mod clip;
pub mod fragment_shader;
pub mod vertex_shader;

use cgmath::{InnerSpace, Matrix, Matrix4 as Mat4, SquareMatrix, Vector2 as Vec2};
use log::trace;

use crate::camera::Camera;
use crate::ecs::Registry;
use crate::framebuffer::{BACKGROUND, FrameBuffer, pack_color};
use crate::lights::LightBlock;
use crate::mesh::Mesh;
use crate::rasterizer;
use crate::vertex::{ClipSpaceVertex, RasterPoint, RasterTriangle, face_normal};

pub use fragment_shader::{
    FragmentData, FragmentShader, NormalDebugShader, PhongShader, SceneLighting, Shading,
    ToonShader,
};

use self::clip::{Clipper, SimpleClipper};
use self::vertex_shader::{DefaultVertexShader, VertexShader, VertexShaderUniforms};

pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

pub struct Renderer {
    pub(crate) camera: Camera,
    pub framebuffer: FrameBuffer,
    pub(crate) viewport: Viewport,
    /// 环境光强度
    pub ambient: f32,
}

impl Renderer {
    pub fn new(camera: Camera, w: usize, h: usize) -> Self {
        let framebuffer = FrameBuffer::new(w, h);
        Self {
            camera,
            framebuffer,
            viewport: Viewport {
                x: 0,
                y: 0,
                w: w as i32,
                h: h as i32,
            },
            ambient: 0.15,
        }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    pub fn clear(&mut self) {
        self.framebuffer.clear(BACKGROUND);
    }

    /// 画出所有带网格的实体，返回实际光栅化的三角形数
    pub fn render_scene(
        &mut self,
        registry: &Registry,
        lights: &LightBlock,
        shading: Shading,
    ) -> usize {
        let lighting = SceneLighting {
            lights: lights.active(),
            ambient: self.ambient,
        };
        let fragment_shader: Box<dyn FragmentShader + '_> = match shading {
            Shading::Phong => Box::new(PhongShader { lighting }),
            Shading::Toon => Box::new(ToonShader { lighting }),
            Shading::Normal => Box::new(NormalDebugShader),
        };

        let mut drawn = 0;
        for (entity, transform, mesh) in registry.renderables() {
            let count = self.render_mesh(mesh, &transform.matrix, &*fragment_shader);
            trace!("实体 {entity}: {count}/{} 个三角形", mesh.vertex_count() / 3);
            drawn += count;
        }
        drawn
    }

    //完整渲染管线
    pub fn render_mesh(
        &mut self,
        mesh: &Mesh,
        model: &Mat4<f32>,
        fragment_shader: &dyn FragmentShader,
    ) -> usize {
        if mesh.is_empty() {
            return 0;
        }
        //统一运算矩阵，缩放为零等不可逆情况直接跳过
        let Some(normal_matrix) = model.invert().map(|m| m.transpose()) else {
            return 0;
        };
        let view_matrix = self.camera.get_view_mat();
        let proj_matrix = *self.camera.get_frustum().get_mat();
        let mvp_matrix = proj_matrix * view_matrix * model;

        // 初始化本次渲染所使用的模块
        let vertex_shader = DefaultVertexShader;
        let clipper = SimpleClipper;
        let uniforms = VertexShaderUniforms {
            model_matrix: model,
            mvp_matrix: &mvp_matrix,
            normal_matrix: &normal_matrix,
        };

        let mut drawn = 0;
        for triangle in mesh.triangles() {
            //管线阶段 1: 顶点着色
            let clip_space_triangle = vertex_shader.shade_triangle(triangle, &uniforms);

            //管线阶段 2: 背面剔除（按绕序求世界空间面法线）
            let [a, b, c] = clip_space_triangle.map(|v| v.world_pos);
            let view_dir = self.camera.eye - a;
            if view_dir.dot(face_normal(a, b, c)) <= 0.0 {
                continue;
            }

            //管线阶段 3: 裁剪
            for clipped in clipper.clip_triangle(&clip_space_triangle) {
                // 阶段 4: 屏幕映射
                let raster_triangle = self.viewport_transform(&clipped);
                // 阶段 5: 光栅化和像素着色
                self.rasterize_triangle(&raster_triangle, mesh, fragment_shader);
                drawn += 1;
            }
        }
        drawn
    }

    //视口变换
    fn viewport_transform(&self, clip_triangle: &[ClipSpaceVertex; 3]) -> RasterTriangle {
        let raster_vertices = clip_triangle.map(|clip_v| {
            // 透视除法
            let ndc_pos = clip_v.position / clip_v.position.w;

            // 转换到屏幕空间
            let screen_x =
                (ndc_pos.x + 1.0) * 0.5 * self.viewport.w as f32 + self.viewport.x as f32;
            let screen_y = self.viewport.h as f32 - (ndc_pos.y + 1.0) * 0.5 * self.viewport.h as f32
                + self.viewport.y as f32;

            RasterPoint {
                pos: Vec2::new(screen_x, screen_y),
                z: (ndc_pos.z + 1.0) * 0.5,
                world_pos: clip_v.world_pos,
                normal: clip_v.normal,
                uv: clip_v.uv,
            }
        });

        RasterTriangle {
            vertices: raster_vertices,
        }
    }

    // 进行光栅化
    pub fn rasterize_triangle(
        &mut self,
        triangle: &RasterTriangle,
        mesh: &Mesh,
        shader: &dyn FragmentShader,
    ) {
        let points = &triangle.vertices;
        let screen = [points[0].pos, points[1].pos, points[2].pos];
        let Some((min_x, min_y, max_x, max_y)) =
            rasterizer::get_box(&screen, self.framebuffer.width, self.framebuffer.height)
        else {
            return;
        };

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                if !rasterizer::is_inside_triangle(&screen, &p) {
                    continue;
                }
                let Some(bary) = rasterizer::get_barycentric_coords(&screen, &p) else {
                    continue;
                };

                // 插值所有属性
                let depth = rasterizer::interpolate_depth(points, bary);
                if depth >= self.framebuffer.depth[y * self.framebuffer.width + x] {
                    continue;
                }
                let fragment_data = FragmentData {
                    world_pos: rasterizer::interpolate_vec3(points, bary, |v| v.world_pos),
                    normal: rasterizer::interpolate_vec3(points, bary, |v| v.normal),
                    uv: rasterizer::interpolate_uv(points, bary),
                    mesh,
                    camera_pos: self.camera.eye,
                };

                let color = pack_color(shader.shade(&fragment_data));
                self.framebuffer.put_pixel(x, y, color, depth);
            }
        }
    }
}
