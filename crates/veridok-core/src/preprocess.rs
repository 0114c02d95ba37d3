//! Image variant generation for OCR.
//!
//! Low-quality photographs of identity documents rarely OCR well in
//! their original form. This module derives ten deterministic
//! grayscale variants of the source image; every variant is fed to
//! every OCR engine and the best-scoring combination wins.

use std::panic::{AssertUnwindSafe, catch_unwind};

use image::{DynamicImage, GrayImage, Luma};
use imageproc::contrast::{ThresholdType, adaptive_threshold, equalize_histogram, otsu_level, threshold};
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::{bilateral_filter, gaussian_blur_f32, median_filter, sharpen3x3};
use imageproc::morphology::close;
use tracing::{debug, warn};

/// A named preprocessing variant, same dimensions as the source.
pub type Variant = (&'static str, GrayImage);

/// Ordered transform table. Names are stable and appear in the
/// `extraction_method` of the final report.
const TRANSFORMS: &[(&str, fn(&GrayImage) -> GrayImage)] = &[
    ("grayscale", |g| g.clone()),
    ("denoise_sharpen", denoise_sharpen),
    ("clahe", |g| clahe(g, 3.0, 8)),
    ("otsu_threshold", otsu_threshold),
    ("adaptive_threshold", |g| adaptive_threshold(g, 5)),
    ("morph_close", morph_close),
    ("edge_enhanced", edge_enhanced),
    ("histogram_equalized", equalize_histogram),
    ("bilateral_filtered", |g| bilateral_filter(g, 9, 75.0, 75.0)),
    ("unsharp_masked", unsharp_mask),
];

/// Generate the ordered list of preprocessing variants.
///
/// A transform that panics is skipped and logged; the remaining
/// variants are still returned. The list is empty only for a
/// degenerate (zero-pixel) source, which callers treat as a hard
/// failure.
pub fn generate_variants(image: &DynamicImage) -> Vec<Variant> {
    let gray = image.to_luma8();
    if gray.width() == 0 || gray.height() == 0 {
        return Vec::new();
    }

    let mut variants = Vec::with_capacity(TRANSFORMS.len());
    for (name, transform) in TRANSFORMS {
        match catch_unwind(AssertUnwindSafe(|| transform(&gray))) {
            Ok(img) => variants.push((*name, img)),
            Err(_) => warn!("preprocessing variant {} failed, skipping", name),
        }
    }

    debug!("generated {} image variants", variants.len());
    variants
}

/// Median denoise followed by a 3x3 sharpening kernel.
fn denoise_sharpen(gray: &GrayImage) -> GrayImage {
    let denoised = median_filter(gray, 1, 1);
    sharpen3x3(&denoised)
}

/// Gaussian blur then global Otsu binarization.
fn otsu_threshold(gray: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, 1.1);
    let level = otsu_level(&blurred);
    threshold(&blurred, level, ThresholdType::Binary)
}

/// Otsu binarization followed by a morphological close, which fills
/// pinholes inside character strokes.
fn morph_close(gray: &GrayImage) -> GrayImage {
    let binary = otsu_threshold(gray);
    close(&binary, Norm::LInf, 1)
}

/// Blend Canny edges back into the grayscale image (0.8 / 0.2).
fn edge_enhanced(gray: &GrayImage) -> GrayImage {
    let edges = canny(gray, 50.0, 150.0);
    blend(gray, &edges, 0.8, 0.2)
}

/// Unsharp masking: amplify the difference against a Gaussian blur.
fn unsharp_mask(gray: &GrayImage) -> GrayImage {
    let blurred = gaussian_blur_f32(gray, 2.0);
    blend(gray, &blurred, 1.5, -0.5)
}

/// Per-pixel weighted blend of two equally sized images, clamped to u8.
fn blend(a: &GrayImage, b: &GrayImage, wa: f32, wb: f32) -> GrayImage {
    let mut out = GrayImage::new(a.width(), a.height());
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let va = a.get_pixel(x, y)[0] as f32;
        let vb = b.get_pixel(x, y)[0] as f32;
        *pixel = Luma([(va * wa + vb * wb).clamp(0.0, 255.0) as u8]);
    }
    out
}

/// Contrast-limited adaptive histogram equalization.
///
/// imageproc only ships global equalization, so the tiled variant is
/// built here: per-tile clipped histograms become lookup tables, and
/// each pixel is bilinearly interpolated between the four surrounding
/// tile tables.
fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    let grid = grid.min(width).min(height).max(1);
    let tile_w = width.div_ceil(grid);
    let tile_h = height.div_ceil(grid);

    // One 256-entry LUT per tile.
    let mut luts = vec![[0u8; 256]; (grid * grid) as usize];
    for ty in 0..grid {
        for tx in 0..grid {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = (x0 + tile_w).min(width);
            let y1 = (y0 + tile_h).min(height);

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x, y)[0] as usize] += 1;
                }
            }

            let pixels = ((x1 - x0) * (y1 - y0)).max(1);
            let clip = ((clip_limit * pixels as f32) / 256.0).max(1.0) as u32;

            // Clip the histogram and redistribute the excess uniformly.
            let mut excess = 0u32;
            for bin in hist.iter_mut() {
                if *bin > clip {
                    excess += *bin - clip;
                    *bin = clip;
                }
            }
            let bonus = excess / 256;
            for bin in hist.iter_mut() {
                *bin += bonus;
            }

            let lut = &mut luts[(ty * grid + tx) as usize];
            let mut cdf = 0u64;
            for (value, bin) in hist.iter().enumerate() {
                cdf += *bin as u64;
                lut[value] = ((cdf * 255) / pixels as u64).min(255) as u8;
            }
        }
    }

    let lut_at = |tx: u32, ty: u32, value: u8| -> f32 {
        let tx = tx.min(grid - 1);
        let ty = ty.min(grid - 1);
        luts[(ty * grid + tx) as usize][value as usize] as f32
    };

    let mut out = GrayImage::new(width, height);
    for (x, y, pixel) in out.enumerate_pixels_mut() {
        let value = gray.get_pixel(x, y)[0];

        // Position relative to tile centers.
        let fx = (x as f32 - tile_w as f32 / 2.0) / tile_w as f32;
        let fy = (y as f32 - tile_h as f32 / 2.0) / tile_h as f32;
        let tx0 = fx.floor().max(0.0) as u32;
        let ty0 = fy.floor().max(0.0) as u32;
        let dx = (fx - fx.floor()).clamp(0.0, 1.0);
        let dy = (fy - fy.floor()).clamp(0.0, 1.0);

        let top = lut_at(tx0, ty0, value) * (1.0 - dx) + lut_at(tx0 + 1, ty0, value) * dx;
        let bottom =
            lut_at(tx0, ty0 + 1, value) * (1.0 - dx) + lut_at(tx0 + 1, ty0 + 1, value) * dx;
        let blended = top * (1.0 - dy) + bottom * dy;

        *pixel = Luma([blended.clamp(0.0, 255.0) as u8]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::ImageBuffer;

    fn test_image() -> DynamicImage {
        let img: GrayImage = ImageBuffer::from_fn(64, 48, |x, y| {
            // Diagonal gradient with a dark band, enough structure for
            // every transform to have something to do.
            if y % 8 < 2 {
                Luma([20u8])
            } else {
                Luma([((x * 3 + y * 2) % 256) as u8])
            }
        });
        DynamicImage::ImageLuma8(img)
    }

    #[test]
    fn test_generates_all_ten_variants() {
        let variants = generate_variants(&test_image());
        assert_eq!(variants.len(), 10);

        let names: Vec<&str> = variants.iter().map(|(n, _)| *n).collect();
        assert_eq!(names[0], "grayscale");
        assert_eq!(names[3], "otsu_threshold");
        assert_eq!(names[9], "unsharp_masked");
    }

    #[test]
    fn test_variants_preserve_dimensions() {
        let image = test_image();
        for (name, variant) in generate_variants(&image) {
            assert_eq!(
                variant.dimensions(),
                (64, 48),
                "variant {} changed dimensions",
                name
            );
        }
    }

    #[test]
    fn test_variant_order_is_deterministic() {
        let a = generate_variants(&test_image());
        let b = generate_variants(&test_image());
        for ((name_a, img_a), (name_b, img_b)) in a.iter().zip(b.iter()) {
            assert_eq!(name_a, name_b);
            assert_eq!(img_a.as_raw(), img_b.as_raw());
        }
    }

    #[test]
    fn test_otsu_output_is_binary() {
        let variants = generate_variants(&test_image());
        let (_, otsu) = variants.iter().find(|(n, _)| *n == "otsu_threshold").unwrap();
        assert!(otsu.pixels().all(|p| p[0] == 0 || p[0] == 255));
    }

    #[test]
    fn test_clahe_stays_in_range() {
        let gray = test_image().to_luma8();
        let out = clahe(&gray, 3.0, 8);
        assert_eq!(out.dimensions(), gray.dimensions());
    }
}
