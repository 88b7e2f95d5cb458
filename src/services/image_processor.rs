// src/services/image_processor.rs
use crate::errors::BackdropError;
use image::{GenericImageView, ImageFormat as ImgFormat};
use std::collections::HashMap;

/// Dominant colors reported per image.
pub const PALETTE_SIZE: usize = 5;

/// Sample every Nth pixel; coarse but fast enough for uploads.
const SAMPLE_STRIDE: usize = 7;

/// Each RGB channel is quantized into buckets of this width.
const BUCKET_WIDTH: u32 = 32;

/// Luminance cutoffs excluding near-black shadows and near-white backdrops
/// from the tally.
const LUMA_FLOOR: f32 = 16.0;
const LUMA_CEILING: f32 = 240.0;

pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    pub fn validate_image(&self, data: &[u8]) -> Result<(u32, u32), BackdropError> {
        let img = image::load_from_memory(data)
            .map_err(|e| BackdropError::ImageProcessing(format!("Invalid image format: {}", e)))?;

        let (width, height) = img.dimensions();

        if width > 4096 || height > 4096 {
            return Err(BackdropError::ImageProcessing(
                "Image dimensions exceed 4096x4096".to_string(),
            ));
        }

        Ok((width, height))
    }

    pub fn resize_if_needed(&self, data: &[u8], max_size: u32) -> Result<Vec<u8>, BackdropError> {
        let img = image::load_from_memory(data)
            .map_err(|e| BackdropError::ImageProcessing(format!("Failed to load image: {}", e)))?;

        let (width, height) = img.dimensions();

        if width <= max_size && height <= max_size {
            return Ok(data.to_vec());
        }

        let ratio = (max_size as f32 / width.max(height) as f32).min(1.0);
        let new_width = (width as f32 * ratio) as u32;
        let new_height = (height as f32 * ratio) as u32;

        let resized = img.resize(new_width, new_height, image::imageops::FilterType::Lanczos3);

        let mut output = Vec::new();
        resized
            .write_to(&mut std::io::Cursor::new(&mut output), ImgFormat::Png)
            .map_err(|e| {
                BackdropError::ImageProcessing(format!("Failed to encode resized image: {}", e))
            })?;

        Ok(output)
    }

    /// Extract up to [`PALETTE_SIZE`] dominant colors, most frequent first.
    ///
    /// Pure function over the pixel buffer: strided sampling, per-channel
    /// quantization, luminance filtering, then a frequency tally with a
    /// deterministic tie-break so repeated calls return the same list.
    /// Any decode failure yields an empty palette rather than an error.
    pub fn extract_palette(&self, data: &[u8]) -> Vec<String> {
        let img = match image::load_from_memory(data) {
            Ok(img) => img,
            Err(_) => return Vec::new(),
        };

        let rgb = img.to_rgb8();
        let mut counts: HashMap<(u32, u32, u32), u32> = HashMap::new();

        for (i, pixel) in rgb.pixels().enumerate() {
            if i % SAMPLE_STRIDE != 0 {
                continue;
            }
            let [r, g, b] = pixel.0;
            let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
            if !(LUMA_FLOOR..=LUMA_CEILING).contains(&luma) {
                continue;
            }
            let bucket = (
                r as u32 / BUCKET_WIDTH,
                g as u32 / BUCKET_WIDTH,
                b as u32 / BUCKET_WIDTH,
            );
            *counts.entry(bucket).or_insert(0) += 1;
        }

        let mut buckets: Vec<_> = counts.into_iter().collect();
        buckets.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        buckets
            .into_iter()
            .take(PALETTE_SIZE)
            .map(|((r, g, b), _)| {
                // Report the bucket's center as the representative color.
                let half = BUCKET_WIDTH / 2;
                format!(
                    "#{:02x}{:02x}{:02x}",
                    r * BUCKET_WIDTH + half,
                    g * BUCKET_WIDTH + half,
                    b * BUCKET_WIDTH + half
                )
            })
            .collect()
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn encode_png(img: ImageBuffer<Rgb<u8>, Vec<u8>>) -> Vec<u8> {
        let mut bytes = Vec::new();
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut std::io::Cursor::new(&mut bytes), ImgFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn palette_is_deterministic() {
        let img = ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([200u8, 40, 40])
            } else {
                Rgb([40u8, 40, 200])
            }
        });
        let bytes = encode_png(img);
        let processor = ImageProcessor::new();

        let first = processor.extract_palette(&bytes);
        let second = processor.extract_palette(&bytes);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }

    #[test]
    fn palette_ranks_most_frequent_first() {
        // Three quarters red, one quarter green.
        let img = ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 48 {
                Rgb([200u8, 40, 40])
            } else {
                Rgb([40u8, 200, 40])
            }
        });
        let bytes = encode_png(img);
        let palette = ImageProcessor::new().extract_palette(&bytes);

        assert!(palette.len() >= 2);
        // Red bucket (200/32=6 -> center 0xd0) should lead.
        assert_eq!(palette[0], "#d03030");
    }

    #[test]
    fn palette_excludes_black_and_white_extremes() {
        let img = ImageBuffer::from_fn(64, 64, |x, _| {
            if x < 32 {
                Rgb([0u8, 0, 0])
            } else {
                Rgb([255u8, 255, 255])
            }
        });
        let bytes = encode_png(img);
        let palette = ImageProcessor::new().extract_palette(&bytes);
        assert!(palette.is_empty());
    }

    #[test]
    fn palette_of_garbage_bytes_is_empty() {
        let palette = ImageProcessor::new().extract_palette(b"definitely not an image");
        assert!(palette.is_empty());
    }

    #[test]
    fn validate_rejects_non_images() {
        let processor = ImageProcessor::new();
        assert!(processor.validate_image(b"nope").is_err());
    }

    #[test]
    fn resize_leaves_small_images_untouched() {
        let img = ImageBuffer::from_pixel(32, 32, Rgb([10u8, 20, 30]));
        let bytes = encode_png(img);
        let out = ImageProcessor::new().resize_if_needed(&bytes, 2048).unwrap();
        assert_eq!(out, bytes);
    }
}
