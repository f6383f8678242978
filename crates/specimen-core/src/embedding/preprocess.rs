//! Image preprocessing for CLIP-family visual encoders.
//!
//! CLIP (and BioCLIP, which reuses its transforms) expects:
//! - Shortest side resized to the input size (bicubic), then center-cropped
//! - Channel order: RGB
//! - Per-channel normalization with the OpenAI CLIP mean/std
//! - Tensor layout: NCHW [batch, channels, height, width]

use image::DynamicImage;
use ndarray::Array4;

/// Number of color channels (RGB).
const CHANNELS: usize = 3;

/// CLIP normalization mean (per-channel, RGB).
const NORM_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];

/// CLIP normalization std (per-channel, RGB).
const NORM_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Preprocess an image for CLIP inference.
///
/// Resizes so the shortest side equals `image_size`, center-crops to a
/// square, converts to RGB, normalizes, and returns an NCHW tensor.
pub fn preprocess(image: &DynamicImage, image_size: u32) -> Array4<f32> {
    let (w, h) = (image.width().max(1), image.height().max(1));
    let scale = image_size as f32 / w.min(h) as f32;
    let new_w = ((w as f32 * scale).round() as u32).max(image_size);
    let new_h = ((h as f32 * scale).round() as u32).max(image_size);

    let resized = image.resize_exact(new_w, new_h, image::imageops::FilterType::CatmullRom);
    let left = (new_w - image_size) / 2;
    let top = (new_h - image_size) / 2;
    let rgb = resized.crop_imm(left, top, image_size, image_size).to_rgb8();

    let size = image_size as usize;
    let mut tensor = Array4::<f32>::zeros((1, CHANNELS, size, size));

    for (x, y, pixel) in rgb.enumerate_pixels() {
        for c in 0..CHANNELS {
            let val = pixel.0[c] as f32 / 255.0;
            tensor[[0, c, y as usize, x as usize]] = (val - NORM_MEAN[c]) / NORM_STD[c];
        }
    }

    tensor
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};

    #[test]
    fn test_preprocess_shape_landscape() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(640, 480));
        let tensor = preprocess(&img, 224);
        assert_eq!(tensor.shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_shape_portrait_and_tiny() {
        let img = DynamicImage::ImageRgb8(RgbImage::new(30, 900));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);

        let img = DynamicImage::ImageRgb8(RgbImage::new(1, 1));
        assert_eq!(preprocess(&img, 224).shape(), &[1, 3, 224, 224]);
    }

    #[test]
    fn test_preprocess_normalization() {
        let img =
            DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([255, 255, 255])));
        let tensor = preprocess(&img, 32);
        let expected_red = (1.0 - NORM_MEAN[0]) / NORM_STD[0];
        assert!((tensor[[0, 0, 5, 5]] - expected_red).abs() < 0.01);

        let img = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, image::Rgb([0, 0, 0])));
        let tensor = preprocess(&img, 32);
        let expected_blue = -NORM_MEAN[2] / NORM_STD[2];
        assert!((tensor[[0, 2, 5, 5]] - expected_blue).abs() < 0.01);
    }
}
