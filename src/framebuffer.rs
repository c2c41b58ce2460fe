use std::path::Path;

use cgmath::Vector3 as Vec3;

/// 背景色：与窗口版本一致的深蓝 (0.2, 0.2, 0.5)
pub const BACKGROUND: u32 = 0xFF333380;

/// 深度缓冲中的"无穷远"，NDC 深度总在 [0, 1]
const CLEAR_DEPTH: f32 = f32::INFINITY;

/// ARGB8888 颜色缓冲 + 深度缓冲
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
    pub depth: Vec<f32>,
}

/// 把 [0,1] 颜色打包成 ARGB
pub fn pack_color(color: Vec3<f32>) -> u32 {
    let channel = |c: f32| (c.clamp(0.0, 1.0) * 255.0) as u32;
    0xFF000000 | channel(color.x) << 16 | channel(color.y) << 8 | channel(color.z)
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        FrameBuffer {
            width,
            height,
            data: vec![BACKGROUND; width * height],
            depth: vec![CLEAR_DEPTH; width * height],
        }
    }

    pub fn clear(&mut self, color: u32) {
        self.data.fill(color);
        self.depth.fill(CLEAR_DEPTH);
    }

    /// 深度测试通过才写入
    pub fn put_pixel(&mut self, x: usize, y: usize, color: u32, depth: f32) {
        if x < self.width && y < self.height {
            let idx = y * self.width + x;
            if depth < self.depth[idx] {
                self.data[idx] = color;
                self.depth[idx] = depth;
            }
        }
    }

    pub fn get_pixel(&self, x: usize, y: usize) -> u32 {
        self.data[y * self.width + x]
    }

    /// 按 factor×factor 块取平均降采样
    pub fn ssaa(&self, factor: usize) -> Self {
        let factor = factor.max(1);
        if factor == 1 {
            return self.clone();
        }
        let new_width = self.width / factor;
        let new_height = self.height / factor;
        let mut new_data = vec![0; new_width * new_height];
        let count = (factor * factor) as u32;

        for y in 0..new_height {
            for x in 0..new_width {
                let (mut a, mut r, mut g, mut b) = (0u32, 0u32, 0u32, 0u32);
                for dy in 0..factor {
                    for dx in 0..factor {
                        let color = self.data[(y * factor + dy) * self.width + x * factor + dx];
                        a += (color >> 24) & 0xFF;
                        r += (color >> 16) & 0xFF;
                        g += (color >> 8) & 0xFF;
                        b += color & 0xFF;
                    }
                }
                new_data[y * new_width + x] =
                    (a / count) << 24 | (r / count) << 16 | (g / count) << 8 | b / count;
            }
        }

        Self {
            width: new_width,
            height: new_height,
            data: new_data,
            depth: vec![CLEAR_DEPTH; new_width * new_height],
        }
    }

    pub fn save_to_image(&self, path: &Path) -> Result<(), image::ImageError> {
        use image::{ImageBuffer, Rgba};

        let img = ImageBuffer::from_fn(self.width as u32, self.height as u32, |x, y| {
            let color = self.data[y as usize * self.width + x as usize];
            Rgba([
                ((color >> 16) & 0xFF) as u8,
                ((color >> 8) & 0xFF) as u8,
                (color & 0xFF) as u8,
                ((color >> 24) & 0xFF) as u8,
            ])
        });
        img.save(path)
    }
}
