//! Turns uploaded bytes into the model's input tensor.
//!
//! The model was trained on RGB leaves resized to a square and scaled to
//! `[0, 1]`, laid out NHWC with a batch axis of one.

use image::imageops::FilterType;
use image::DynamicImage;
use ndarray::Array4;

use crate::error::{ApiError, Result};

pub const DEFAULT_INPUT_SIZE: u32 = 64;

/// Decode an image, sniffing the format from its magic bytes.
pub fn decode(bytes: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(bytes).map_err(|e| ApiError::ImageDecode(e.to_string()))
}

/// Resize to `size` x `size` (aspect ratio is not kept) and scale to `[0, 1]`.
pub fn to_input_tensor(image: &DynamicImage, size: u32) -> Array4<f32> {
    let rgb = image
        .resize_exact(size, size, FilterType::CatmullRom)
        .to_rgb8();
    let side = size as usize;

    Array4::from_shape_fn((1, side, side, 3), |(_, y, x, c)| {
        rgb.get_pixel(x as u32, y as u32)[c] as f32 / 255.0
    })
}

pub fn prepare(bytes: &[u8], size: u32) -> Result<Array4<f32>> {
    let image = decode(bytes)?;
    Ok(to_input_tensor(&image, size))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{ImageOutputFormat, Rgb, RgbImage, Rgba, RgbaImage};
    use std::io::Cursor;

    pub(crate) fn png_bytes(image: DynamicImage) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        image.write_to(&mut buf, ImageOutputFormat::Png).unwrap();
        buf.into_inner()
    }

    pub(crate) fn leaf_png(width: u32, height: u32) -> Vec<u8> {
        let img = RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, 120 + (y % 100) as u8, 40])
        });
        png_bytes(DynamicImage::ImageRgb8(img))
    }

    #[test]
    fn tensor_has_nhwc_shape() {
        let tensor = prepare(&leaf_png(300, 200), 64).unwrap();
        assert_eq!(tensor.shape(), &[1, 64, 64, 3]);
    }

    #[test]
    fn values_are_scaled_to_unit_range() {
        let tensor = prepare(&leaf_png(90, 90), DEFAULT_INPUT_SIZE).unwrap();
        assert!(tensor.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn solid_colours_map_to_extremes() {
        let white = RgbImage::from_pixel(10, 10, Rgb([255, 255, 255]));
        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(white), 4);
        assert!(tensor.iter().all(|v| (*v - 1.0).abs() < 1e-6));

        let black = RgbImage::from_pixel(10, 10, Rgb([0, 0, 0]));
        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(black), 4);
        assert!(tensor.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn channel_order_is_rgb() {
        let red = RgbImage::from_pixel(8, 8, Rgb([255, 0, 0]));
        let tensor = to_input_tensor(&DynamicImage::ImageRgb8(red), 2);
        assert!((tensor[[0, 1, 1, 0]] - 1.0).abs() < 1e-6);
        assert_eq!(tensor[[0, 1, 1, 1]], 0.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 0.0);
    }

    #[test]
    fn alpha_is_dropped() {
        let img = RgbaImage::from_pixel(5, 5, Rgba([0, 255, 0, 10]));
        let tensor = prepare(&png_bytes(DynamicImage::ImageRgba8(img)), 3).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 3, 3]);
        assert!((tensor[[0, 0, 0, 1]] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn grayscale_is_expanded_to_three_channels() {
        let img = image::GrayImage::from_pixel(6, 6, image::Luma([51]));
        let tensor = prepare(&png_bytes(DynamicImage::ImageLuma8(img)), 2).unwrap();
        assert_eq!(tensor.shape(), &[1, 2, 2, 3]);
        assert!(tensor.iter().all(|v| (*v - 0.2).abs() < 1e-6));
    }

    #[test]
    fn single_pixel_image_is_upscaled() {
        let tensor = prepare(&leaf_png(1, 1), 16).unwrap();
        assert_eq!(tensor.shape(), &[1, 16, 16, 3]);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let err = prepare(b"definitely not a png", 64).unwrap_err();
        assert!(matches!(err, ApiError::ImageDecode(_)));
        assert!(matches!(decode(&[]), Err(ApiError::ImageDecode(_))));
    }

    #[test]
    fn truncated_png_fails_to_decode() {
        let mut bytes = leaf_png(32, 32);
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(decode(&bytes), Err(ApiError::ImageDecode(_))));
    }
}
