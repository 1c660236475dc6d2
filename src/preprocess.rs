use anyhow::{Context, Result};
use image::GrayImage;

// 3x3 smoothing kernel (5/13 center, 1/13 neighbors); the sharpness boost
// interpolates against it.
const SMOOTH_KERNEL: [f32; 9] = [
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    5.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
    1.0 / 13.0,
];

const CONTRAST_FACTOR: f32 = 2.0;
const SHARPNESS_FACTOR: f32 = 2.0;
const BLUR_SIGMA: f32 = 0.5;

/// Fixed legibility recipe for handwritten prescriptions: grayscale, 2x
/// contrast boost, 2x sharpness boost, slight Gaussian blur. Returns the
/// processed image re-encoded as PNG.
pub fn enhance_for_legibility(bytes: &[u8]) -> Result<Vec<u8>> {
    let image =
        image::load_from_memory(bytes).with_context(|| "failed to decode uploaded image")?;
    let gray = image.to_luma8();
    let contrasted = enhance_contrast(&gray, CONTRAST_FACTOR);
    let sharpened = enhance_sharpness(&contrasted, SHARPNESS_FACTOR);
    let blurred = image::imageops::blur(&sharpened, BLUR_SIGMA);
    encode_png(blurred)
}

/// Interpolate every pixel away from the image mean.
fn enhance_contrast(image: &GrayImage, factor: f32) -> GrayImage {
    let mut sum = 0u64;
    for pixel in image.pixels() {
        sum += pixel[0] as u64;
    }
    let count = (image.width() as u64).saturating_mul(image.height() as u64).max(1);
    let mean = (sum as f32 / count as f32).round();

    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let value = mean + (pixel[0] as f32 - mean) * factor;
        pixel[0] = value.clamp(0.0, 255.0) as u8;
    }
    output
}

/// Interpolate every pixel away from its smoothed neighborhood.
fn enhance_sharpness(image: &GrayImage, factor: f32) -> GrayImage {
    let smooth: GrayImage = image::imageops::filter3x3(image, &SMOOTH_KERNEL);
    let mut output = image.clone();
    for (pixel, base) in output.pixels_mut().zip(smooth.pixels()) {
        let value = base[0] as f32 + (pixel[0] as f32 - base[0] as f32) * factor;
        pixel[0] = value.clamp(0.0, 255.0) as u8;
    }
    output
}

fn encode_png(image: GrayImage) -> Result<Vec<u8>> {
    let mut buffer = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageLuma8(image)
        .write_to(&mut buffer, image::ImageFormat::Png)
        .with_context(|| "failed to encode preprocessed image")?;
    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_png() -> Vec<u8> {
        let mut img = GrayImage::new(8, 8);
        for (x, y, pixel) in img.enumerate_pixels_mut() {
            pixel[0] = (100 + x * 8 + y) as u8;
        }
        let mut buffer = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageLuma8(img)
            .write_to(&mut buffer, image::ImageFormat::Png)
            .unwrap();
        buffer.into_inner()
    }

    #[test]
    fn recipe_outputs_grayscale_png_with_same_dimensions() {
        let processed = enhance_for_legibility(&sample_png()).unwrap();
        let decoded = image::load_from_memory(&processed).unwrap();
        assert_eq!(decoded.width(), 8);
        assert_eq!(decoded.height(), 8);
        assert_eq!(decoded.color(), image::ColorType::L8);
    }

    #[test]
    fn contrast_boost_pushes_values_away_from_mean() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, image::Luma([100]));
        img.put_pixel(1, 0, image::Luma([150]));
        let boosted = enhance_contrast(&img, 2.0);
        assert_eq!(boosted.get_pixel(0, 0)[0], 75);
        assert_eq!(boosted.get_pixel(1, 0)[0], 175);
    }

    #[test]
    fn contrast_boost_clamps_extremes() {
        let mut img = GrayImage::new(2, 1);
        img.put_pixel(0, 0, image::Luma([0]));
        img.put_pixel(1, 0, image::Luma([255]));
        let boosted = enhance_contrast(&img, 2.0);
        assert_eq!(boosted.get_pixel(0, 0)[0], 0);
        assert_eq!(boosted.get_pixel(1, 0)[0], 255);
    }

    #[test]
    fn rejects_undecodable_bytes() {
        assert!(enhance_for_legibility(b"not an image").is_err());
    }
}
