//! Preprocessing variants for OCR legibility.
//!
//! Produces an ordered sequence of alternate renderings of one source
//! image; the attempt multiplexer tries them in sequence and stops at
//! the first that yields a date, so order matters. If the advanced
//! transform path errors, a reduced infallible fallback sequence is
//! used instead - variant generation never fails outright.

use image::imageops::FilterType;
use image::{DynamicImage, GrayImage};
use imageproc::contrast::{adaptive_threshold, otsu_level, threshold, ThresholdType};
use imageproc::filter::{bilateral_filter, filter3x3, median_filter};
use imageproc::distance_transform::Norm;
use imageproc::morphology::close;
use thiserror::Error;

/// 3x3 sharpening convolution kernel.
const SHARPEN_KERNEL: [i32; 9] = [-1, -1, -1, -1, 9, -1, -1, -1, -1];

/// Local window radius for adaptive thresholding (11px window).
const ADAPTIVE_BLOCK_RADIUS: u32 = 5;

/// Minimum dimension for the advanced transform path; smaller images
/// fall back to the reduced sequence.
const MIN_ADVANCED_DIM: u32 = 8;

#[derive(Debug, Error)]
pub enum VariantError {
    #[error("image too small for advanced preprocessing ({width}x{height})")]
    TooSmall { width: u32, height: u32 },
}

/// One alternate rendering of a source image.
pub struct Variant {
    pub name: &'static str,
    pub image: DynamicImage,
}

impl Variant {
    fn gray(name: &'static str, image: GrayImage) -> Self {
        Self {
            name,
            image: DynamicImage::ImageLuma8(image),
        }
    }
}

/// Generate the ordered variant sequence for one image.
///
/// Tries the 8-variant advanced sequence first; on error falls back to
/// the reduced 3-variant sequence, which always yields at least one
/// variant.
pub fn generate_variants(source: &DynamicImage) -> Vec<Variant> {
    match advanced_variants(source) {
        Ok(variants) => variants,
        Err(e) => {
            tracing::warn!("advanced preprocessing unavailable: {}, using basic variants", e);
            basic_variants(source)
        }
    }
}

/// The full 8-variant sequence, canonical order.
fn advanced_variants(source: &DynamicImage) -> Result<Vec<Variant>, VariantError> {
    let gray = source.to_luma8();
    let (width, height) = gray.dimensions();
    if width < MIN_ADVANCED_DIM || height < MIN_ADVANCED_DIM {
        return Err(VariantError::TooSmall { width, height });
    }

    let mut variants = Vec::with_capacity(8);

    // 1. Channel reduction, baseline.
    variants.push(Variant::gray("grayscale", gray.clone()));

    // 2. Local-window binarization, robust to uneven lighting.
    variants.push(Variant::gray(
        "adaptive_thresh",
        adaptive_threshold(&gray, ADAPTIVE_BLOCK_RADIUS),
    ));

    // 3. Global automatic binarization.
    let otsu = otsu_level(&gray);
    variants.push(Variant::gray(
        "otsu",
        threshold(&gray, otsu, ThresholdType::Binary),
    ));

    // 4. Noise removal followed by a sharpening convolution.
    let denoised = median_filter(&gray, 1, 1);
    let sharpened: GrayImage = filter3x3(&denoised, &SHARPEN_KERNEL);
    variants.push(Variant::gray("denoised_sharp", sharpened));

    // 5. Contrast stretch then sharpness boost.
    let boosted = DynamicImage::ImageLuma8(gray.clone())
        .adjust_contrast(60.0)
        .unsharpen(1.5, 3);
    variants.push(Variant::gray("high_contrast_sharp", boosted.to_luma8()));

    // 6. Closing fills small gaps in strokes, then Otsu.
    let morphed = close(&gray, Norm::LInf, 1);
    let morph_level = otsu_level(&morphed);
    variants.push(Variant::gray(
        "morphological",
        threshold(&morphed, morph_level, ThresholdType::Binary),
    ));

    // 7. Edge-preserving smoothing then Otsu.
    let smoothed = bilateral_filter(&gray, 9, 75.0, 75.0);
    let smooth_level = otsu_level(&smoothed);
    variants.push(Variant::gray(
        "bilateral",
        threshold(&smoothed, smooth_level, ThresholdType::Binary),
    ));

    // 8. 2x bicubic upscale helps small fonts, then Otsu.
    let upscaled = image::imageops::resize(&gray, width * 2, height * 2, FilterType::CatmullRom);
    let up_level = otsu_level(&upscaled);
    variants.push(Variant::gray(
        "upscaled",
        threshold(&upscaled, up_level, ThresholdType::Binary),
    ));

    Ok(variants)
}

/// Reduced fallback sequence. Infallible.
fn basic_variants(source: &DynamicImage) -> Vec<Variant> {
    let gray = source.to_luma8();
    vec![
        Variant {
            name: "original",
            image: source.clone(),
        },
        Variant::gray("grayscale_basic", gray.clone()),
        Variant::gray("enhanced_autocontrast", autocontrast(&gray)),
    ]
}

/// Linear histogram stretch: map the occupied intensity range to the
/// full 0..=255 range. Identity on constant images.
fn autocontrast(gray: &GrayImage) -> GrayImage {
    let (mut min, mut max) = (u8::MAX, u8::MIN);
    for pixel in gray.pixels() {
        let v = pixel.0[0];
        min = min.min(v);
        max = max.max(v);
    }
    if min >= max {
        return gray.clone();
    }
    let range = (max - min) as f32;
    let mut out = gray.clone();
    for pixel in out.pixels_mut() {
        let v = pixel.0[0];
        pixel.0[0] = (((v - min) as f32 / range) * 255.0).round() as u8;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Luma, RgbImage};

    fn test_image(width: u32, height: u32) -> DynamicImage {
        let mut img = RgbImage::from_pixel(width, height, image::Rgb([220, 220, 220]));
        // Some dark content so thresholding has both classes.
        for x in 0..width.min(10) {
            img.put_pixel(x, height / 2, image::Rgb([10, 10, 10]));
        }
        DynamicImage::ImageRgb8(img)
    }

    #[test]
    fn advanced_sequence_order_and_names() {
        let variants = generate_variants(&test_image(64, 64));
        let names: Vec<_> = variants.iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            [
                "grayscale",
                "adaptive_thresh",
                "otsu",
                "denoised_sharp",
                "high_contrast_sharp",
                "morphological",
                "bilateral",
                "upscaled",
            ]
        );
    }

    #[test]
    fn upscaled_variant_doubles_dimensions() {
        let variants = generate_variants(&test_image(32, 48));
        let upscaled = variants.last().unwrap();
        assert_eq!(upscaled.image.width(), 64);
        assert_eq!(upscaled.image.height(), 96);
    }

    #[test]
    fn tiny_image_falls_back_and_never_empty() {
        let variants = generate_variants(&test_image(4, 4));
        let names: Vec<_> = variants.iter().map(|v| v.name).collect();
        assert_eq!(
            names,
            ["original", "grayscale_basic", "enhanced_autocontrast"]
        );
        assert!(!variants.is_empty());
    }

    #[test]
    fn autocontrast_stretches_range() {
        let mut gray = GrayImage::from_pixel(4, 1, Luma([100]));
        gray.put_pixel(0, 0, Luma([150]));
        let stretched = autocontrast(&gray);
        assert_eq!(stretched.get_pixel(1, 0).0[0], 0);
        assert_eq!(stretched.get_pixel(0, 0).0[0], 255);
    }

    #[test]
    fn autocontrast_identity_on_constant_image() {
        let gray = GrayImage::from_pixel(4, 4, Luma([128]));
        let out = autocontrast(&gray);
        assert_eq!(out.get_pixel(2, 2).0[0], 128);
    }
}
