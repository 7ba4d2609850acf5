//! 画像の縮小サンプリング

use image::imageops::FilterType;
use wordcard_common::color::Rgba;
use wordcard_common::{Error, ImageSampler, Result};

/// `image` クレートでデコードして縮小する
#[derive(Debug, Clone, Copy, Default)]
pub struct PixelSampler;

impl ImageSampler for PixelSampler {
    fn sample(&self, bytes: &[u8], size: u32) -> Result<Vec<Rgba>> {
        let img = image::load_from_memory(bytes).map_err(|e| Error::ImageDecode(e.to_string()))?;
        let small = img.resize_exact(size, size, FilterType::Triangle).to_rgba8();
        Ok(small.pixels().map(|p| p.0).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba as Pixel, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Pixel(color));
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        buffer.into_inner()
    }

    #[test]
    fn test_sample_solid_image() {
        let bytes = png_bytes(120, 80, [0, 174, 239, 255]);
        let pixels = PixelSampler.sample(&bytes, 50).unwrap();

        assert_eq!(pixels.len(), 2500);
        assert!(pixels.iter().all(|p| *p == [0, 174, 239, 255]));
    }

    #[test]
    fn test_sample_invalid_bytes() {
        let result = PixelSampler.sample(b"not an image", 50);
        assert!(matches!(result, Err(Error::ImageDecode(_))));
    }
}
