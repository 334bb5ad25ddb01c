use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use std::io::Cursor;
use thiserror::Error;

/// Sharpening strength applied after denoising. 1.0 leaves the image
/// untouched; 2.0 doubles the distance from the local average.
const SHARPEN_FACTOR: f32 = 2.0;

#[derive(Debug, Error)]
pub enum PreprocessError {
    #[error("Failed to encode processed image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Normalize a rendered page for OCR: grayscale, 3×3 median denoise, then
/// sharpen. Output dimensions always match the input. Pure, with no
/// failure modes.
pub fn normalize(img: &DynamicImage) -> GrayImage {
    let gray = img.to_luma8();
    let denoised = median3(&gray);
    sharpen(&denoised, SHARPEN_FACTOR)
}

/// Encode a processed raster as PNG bytes for handing to an OCR backend.
pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>, PreprocessError> {
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
    Ok(buf)
}

/// 3×3 median filter. Removes speckle noise without smearing text strokes
/// the way a box blur would. Borders use the clamped neighborhood.
fn median3(img: &GrayImage) -> GrayImage {
    let (w, h) = img.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let mut window = [0u8; 9];
        let mut n = 0;
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                window[n] = img.get_pixel(nx, ny)[0];
                n += 1;
            }
        }
        let window = &mut window[..n];
        window.sort_unstable();
        Luma([window[n / 2]])
    })
}

/// Unsharp-style enhancement: push each pixel away from its 3×3 mean by
/// `factor`, clamped to the valid range.
fn sharpen(img: &GrayImage, factor: f32) -> GrayImage {
    let (w, h) = img.dimensions();
    ImageBuffer::from_fn(w, h, |x, y| {
        let mut sum = 0u32;
        let mut n = 0u32;
        for ny in y.saturating_sub(1)..=(y + 1).min(h - 1) {
            for nx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
                sum += u32::from(img.get_pixel(nx, ny)[0]);
                n += 1;
            }
        }
        let smooth = sum as f32 / n as f32;
        let original = f32::from(img.get_pixel(x, y)[0]);
        let enhanced = smooth + factor * (original - smooth);
        Luma([enhanced.round().clamp(0.0, 255.0) as u8])
    })
}
