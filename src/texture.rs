use cgmath::{Vector2 as Vec2, Vector3 as Vec3};
use std::path::Path;

pub struct Texture {
    pub width: usize,
    pub height: usize,
    pub data: Vec<u32>,
}

impl Texture {
    /// 纯白 1x1 纹理，没有贴图文件时的默认值
    pub fn white() -> Self {
        Self {
            width: 1,
            height: 1,
            data: vec![0xFFFFFFFF],
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, image::ImageError> {
        let img = image::open(path)?.to_rgba8();
        let (width, height) = img.dimensions();
        let mut data = Vec::with_capacity((width * height) as usize);

        for y in 0..height {
            for x in 0..width {
                let pixel = img.get_pixel(x, y);
                let color = ((pixel[0] as u32) << 24)
                    | ((pixel[1] as u32) << 16)
                    | ((pixel[2] as u32) << 8)
                    | (pixel[3] as u32);
                data.push(color);
            }
        }
        Ok(Texture {
            width: width as usize,
            height: height as usize,
            data,
        })
    }

    pub fn sample(&self, uv: Vec2<f32>) -> Vec3<f32> {
        let u = uv.x.rem_euclid(1.0);
        let v = uv.y.rem_euclid(1.0);

        let x = (u * self.width as f32) as usize;
        let y = ((1.0 - v) * self.height as f32) as usize; // 翻转V轴，UV(0,0)对应纹理左下角

        // 防止越界
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);

        self.get_pixel_color(x, y)
    }

    fn get_pixel_color(&self, x: usize, y: usize) -> Vec3<f32> {
        let color = self.data[y * self.width + x];
        Vec3::new(
            ((color >> 24) & 0xFF) as f32 / 255.0,
            ((color >> 16) & 0xFF) as f32 / 255.0,
            ((color >> 8) & 0xFF) as f32 / 255.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_texture_samples_white_everywhere() {
        let tex = Texture::white();
        for uv in [Vec2::new(0.0, 0.0), Vec2::new(0.5, 0.9), Vec2::new(-3.2, 7.5)] {
            assert_eq!(tex.sample(uv), Vec3::new(1.0, 1.0, 1.0));
        }
    }

    #[test]
    fn sample_flips_v() {
        // 上红下蓝
        let tex = Texture {
            width: 1,
            height: 2,
            data: vec![0xFF0000FF, 0x0000FFFF],
        };
        assert_eq!(tex.sample(Vec2::new(0.5, 0.9)), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(tex.sample(Vec2::new(0.5, 0.1)), Vec3::new(0.0, 0.0, 1.0));
    }
}
