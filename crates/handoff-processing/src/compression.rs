//! Best-effort image compression.
//!
//! Images are shrunk to fit a maximum long edge and an output byte cap. Failure
//! here is never fatal: callers upload the original bytes instead.

use bytes::Bytes;
use image::imageops::FilterType;
use image::metadata::Orientation;
use image::{DynamicImage, GenericImageView, ImageDecoder, ImageFormat, ImageReader};
use std::io::Cursor;

use crate::media::normalize_mime_type;

/// JPEG/WebP quality ladder tried at each size before shrinking further.
const QUALITY_STEPS: [u8; 4] = [85, 70, 55, 40];
/// Each shrink keeps 75% of the previous dimensions.
const SHRINK_NUMERATOR: u32 = 3;
const SHRINK_DENOMINATOR: u32 = 4;
/// Give up once the long edge would drop below this.
const MIN_DIMENSION: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionPolicy {
    /// Maximum long-edge dimension in pixels
    pub max_dimension: u32,
    /// Maximum output size in bytes
    pub max_output_bytes: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum CompressionError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),

    #[error("Could not compress below {cap} bytes (smallest attempt: {smallest} bytes)")]
    CapUnreachable { cap: usize, smallest: usize },

    #[error("Compression task failed: {0}")]
    TaskFailed(String),
}

/// Output format for compressed images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Jpeg,
    Png,
    WebP,
}

impl OutputFormat {
    pub fn to_mime_type(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "image/jpeg",
            OutputFormat::Png => "image/png",
            OutputFormat::WebP => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpg",
            OutputFormat::Png => "png",
            OutputFormat::WebP => "webp",
        }
    }

    /// Keep the input's format where we can encode it; everything else becomes JPEG.
    fn negotiate(content_type: &str, detected: Option<ImageFormat>) -> Self {
        match detected {
            Some(ImageFormat::Jpeg) => return OutputFormat::Jpeg,
            Some(ImageFormat::Png) => return OutputFormat::Png,
            Some(ImageFormat::WebP) => return OutputFormat::WebP,
            _ => {}
        }
        match normalize_mime_type(content_type).as_str() {
            "image/png" => OutputFormat::Png,
            "image/webp" => OutputFormat::WebP,
            _ => OutputFormat::Jpeg,
        }
    }
}

/// Result of a successful compression.
#[derive(Debug, Clone)]
pub struct CompressedImage {
    pub data: Bytes,
    pub format: OutputFormat,
    pub width: u32,
    pub height: u32,
    /// The input already satisfied the policy and was returned untouched
    pub passthrough: bool,
}

/// Alpha detection used to decide whether a PNG may become a JPEG.
pub struct FormatSelector;

impl FormatSelector {
    /// Check if image has meaningful alpha channel (not fully opaque)
    pub fn has_meaningful_alpha(img: &DynamicImage) -> bool {
        if !img.color().has_alpha() {
            return false;
        }
        let rgba = img.to_rgba8();
        let (width, height) = img.dimensions();

        // Sample every 10th pixel
        for y in (0..height).step_by(10) {
            for x in (0..width).step_by(10) {
                if rgba.get_pixel(x, y)[3] < 255 {
                    return true;
                }
            }
        }
        false
    }
}

/// Main compression service
pub struct ImageCompressor;

impl ImageCompressor {
    /// Compress `data` to satisfy `policy`.
    ///
    /// CPU-bound; call from a blocking context.
    pub fn compress(
        data: &Bytes,
        content_type: &str,
        policy: &CompressionPolicy,
    ) -> Result<CompressedImage, CompressionError> {
        let detected = image::guess_format(data).ok();
        let img = Self::decode_upright(data)?;
        let (width, height) = img.dimensions();

        let mut format = OutputFormat::negotiate(content_type, detected);

        // Already compliant inputs in an encodable format are left alone.
        let encodable_input = matches!(
            detected,
            Some(ImageFormat::Jpeg) | Some(ImageFormat::Png) | Some(ImageFormat::WebP)
        );
        if encodable_input
            && width.max(height) <= policy.max_dimension
            && data.len() <= policy.max_output_bytes
        {
            return Ok(CompressedImage {
                data: data.clone(),
                format,
                width,
                height,
                passthrough: true,
            });
        }

        let has_alpha = FormatSelector::has_meaningful_alpha(&img);
        if format == OutputFormat::Jpeg && has_alpha && detected != Some(ImageFormat::Jpeg) {
            // JPEG would flatten transparency
            format = OutputFormat::Png;
        }

        let mut current = if width.max(height) > policy.max_dimension {
            img.resize(policy.max_dimension, policy.max_dimension, FilterType::Triangle)
        } else {
            img
        };
        let mut smallest = usize::MAX;

        loop {
            let (w, h) = current.dimensions();

            if format == OutputFormat::Png {
                let encoded = Self::compress_png(&current)?;
                smallest = smallest.min(encoded.len());
                if encoded.len() <= policy.max_output_bytes {
                    return Ok(Self::finished(encoded, format, w, h));
                }
                if !has_alpha {
                    // Opaque PNG that does not fit: lossy from here on
                    format = OutputFormat::Jpeg;
                    continue;
                }
            } else {
                for quality in QUALITY_STEPS {
                    let encoded = match format {
                        OutputFormat::WebP => Self::compress_webp(&current, quality)?,
                        _ => Self::compress_jpeg(&current, quality)?,
                    };
                    smallest = smallest.min(encoded.len());
                    if encoded.len() <= policy.max_output_bytes {
                        tracing::debug!(
                            width = w,
                            height = h,
                            quality = quality,
                            size_bytes = encoded.len(),
                            "Image compressed"
                        );
                        return Ok(Self::finished(encoded, format, w, h));
                    }
                }
            }

            let next_w = w * SHRINK_NUMERATOR / SHRINK_DENOMINATOR;
            let next_h = h * SHRINK_NUMERATOR / SHRINK_DENOMINATOR;
            if next_w.max(next_h) < MIN_DIMENSION || next_w == 0 || next_h == 0 {
                return Err(CompressionError::CapUnreachable {
                    cap: policy.max_output_bytes,
                    smallest,
                });
            }
            current = current.resize_exact(next_w, next_h, FilterType::Triangle);
        }
    }

    /// Decode and apply the EXIF orientation. Re-encoded output carries no
    /// EXIF, so the rotation has to be baked into the pixels.
    fn decode_upright(data: &Bytes) -> Result<DynamicImage, CompressionError> {
        let mut decoder = ImageReader::new(Cursor::new(data.as_ref()))
            .with_guessed_format()
            .map_err(|e| CompressionError::Decode(e.to_string()))?
            .into_decoder()
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        // Unreadable EXIF is treated as upright.
        let orientation = decoder.orientation().unwrap_or(Orientation::NoTransforms);

        let mut img = DynamicImage::from_decoder(decoder)
            .map_err(|e| CompressionError::Decode(e.to_string()))?;
        if orientation != Orientation::NoTransforms {
            tracing::debug!(orientation = ?orientation, "Applying EXIF orientation");
            img.apply_orientation(orientation);
        }
        Ok(img)
    }

    fn finished(data: Bytes, format: OutputFormat, width: u32, height: u32) -> CompressedImage {
        CompressedImage {
            data,
            format,
            width,
            height,
            passthrough: false,
        }
    }

    /// Compress to JPEG using mozjpeg
    fn compress_jpeg(img: &DynamicImage, quality: u8) -> Result<Bytes, CompressionError> {
        let rgb_img = img.to_rgb8();
        let (width, height) = rgb_img.dimensions();

        let mut comp = mozjpeg::Compress::new(mozjpeg::ColorSpace::JCS_RGB);
        comp.set_size(width as usize, height as usize);
        comp.set_quality(quality as f32);
        comp.set_progressive_mode();
        comp.set_optimize_coding(true);

        let mut comp = comp
            .start_compress(Vec::new())
            .map_err(|e| CompressionError::Encode(e.to_string()))?;
        comp.write_scanlines(&rgb_img)
            .map_err(|e| CompressionError::Encode(e.to_string()))?;
        let jpeg_data = comp
            .finish()
            .map_err(|e| CompressionError::Encode(e.to_string()))?;

        Ok(Bytes::from(jpeg_data))
    }

    /// Compress to PNG
    fn compress_png(img: &DynamicImage) -> Result<Bytes, CompressionError> {
        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);

        img.write_to(&mut cursor, ImageFormat::Png)
            .map_err(|e| CompressionError::Encode(e.to_string()))?;

        Ok(Bytes::from(buffer))
    }

    /// Compress to WebP
    fn compress_webp(img: &DynamicImage, quality: u8) -> Result<Bytes, CompressionError> {
        let (width, height) = img.dimensions();
        let rgba_img = img.to_rgba8();

        let encoder = webp::Encoder::from_rgba(&rgba_img, width, height);
        let webp_data = encoder.encode(quality as f32);

        Ok(Bytes::copy_from_slice(&webp_data))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use image::{Rgb, RgbImage, Rgba, RgbaImage};

    const MB: usize = 1024 * 1024;

    fn policy() -> CompressionPolicy {
        CompressionPolicy {
            max_dimension: 1920,
            max_output_bytes: MB,
        }
    }

    /// Deterministic noise so encoders cannot shrink it much.
    pub(crate) fn noisy_rgb(width: u32, height: u32) -> RgbImage {
        let mut state: u32 = 0x9E37_79B9;
        RgbImage::from_fn(width, height, |_, _| {
            state ^= state << 13;
            state ^= state >> 17;
            state ^= state << 5;
            let b = state.to_le_bytes();
            Rgb([b[0], b[1], b[2]])
        })
    }

    pub(crate) fn encode(img: DynamicImage, format: ImageFormat) -> Bytes {
        let mut buffer = Vec::new();
        img.write_to(&mut Cursor::new(&mut buffer), format).unwrap();
        Bytes::from(buffer)
    }

    #[test]
    fn test_output_format_to_mime_type() {
        assert_eq!(OutputFormat::Jpeg.to_mime_type(), "image/jpeg");
        assert_eq!(OutputFormat::Png.to_mime_type(), "image/png");
        assert_eq!(OutputFormat::WebP.to_mime_type(), "image/webp");
        assert_eq!(OutputFormat::WebP.extension(), "webp");
    }

    #[test]
    fn test_format_negotiation() {
        assert_eq!(
            OutputFormat::negotiate("image/png", Some(ImageFormat::Png)),
            OutputFormat::Png
        );
        assert_eq!(
            OutputFormat::negotiate("image/gif", Some(ImageFormat::Gif)),
            OutputFormat::Jpeg
        );
        // Detection wins over a wrong declaration
        assert_eq!(
            OutputFormat::negotiate("image/png", Some(ImageFormat::Jpeg)),
            OutputFormat::Jpeg
        );
        assert_eq!(OutputFormat::negotiate("image/webp", None), OutputFormat::WebP);
    }

    #[test]
    fn test_format_selector_has_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 128])));
        assert!(FormatSelector::has_meaningful_alpha(&img));
    }

    #[test]
    fn test_format_selector_no_alpha() {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(100, 100, Rgba([255, 0, 0, 255])));
        assert!(!FormatSelector::has_meaningful_alpha(&img));

        let rgb = DynamicImage::ImageRgb8(RgbImage::from_pixel(10, 10, Rgb([1, 2, 3])));
        assert!(!FormatSelector::has_meaningful_alpha(&rgb));
    }

    #[test]
    fn compliant_input_passes_through_untouched() {
        let data = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(640, 480, Rgb([10, 20, 30]))),
            ImageFormat::Jpeg,
        );
        let result = ImageCompressor::compress(&data, "image/jpeg", &policy()).unwrap();
        assert!(result.passthrough);
        assert_eq!(result.data, data);
        assert_eq!(result.format, OutputFormat::Jpeg);
    }

    #[test]
    fn oversized_dimensions_are_scaled_to_the_long_edge() {
        let data = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(3000, 1500, Rgb([200, 100, 50]))),
            ImageFormat::Jpeg,
        );
        let result = ImageCompressor::compress(&data, "image/jpeg", &policy()).unwrap();
        assert!(!result.passthrough);
        assert_eq!(result.width, 1920);
        assert_eq!(result.height, 960);
        assert!(result.data.len() <= MB);
    }

    #[test]
    fn oversized_noisy_image_fits_the_cap() {
        let data = encode(DynamicImage::ImageRgb8(noisy_rgb(2200, 1400)), ImageFormat::Png);
        assert!(data.len() > MB);

        let result = ImageCompressor::compress(&data, "image/png", &policy()).unwrap();
        assert!(result.data.len() <= MB);
        assert!(result.width.max(result.height) <= 1920);
        // Opaque PNG that could not fit is re-encoded lossy
        assert_eq!(result.format, OutputFormat::Jpeg);
    }

    /// Insert an APP1 EXIF segment holding only an Orientation tag right after SOI.
    fn with_exif_orientation(jpeg: &[u8], orientation: u8) -> Bytes {
        let mut exif = Vec::new();
        exif.extend_from_slice(b"Exif\0\0");
        // Big-endian TIFF header, first IFD at offset 8
        exif.extend_from_slice(&[b'M', b'M', 0x00, 0x2A, 0x00, 0x00, 0x00, 0x08]);
        // One entry: tag 0x0112 (Orientation), SHORT, count 1, value
        exif.extend_from_slice(&[0x00, 0x01]);
        exif.extend_from_slice(&[0x01, 0x12, 0x00, 0x03, 0x00, 0x00, 0x00, 0x01]);
        exif.extend_from_slice(&[0x00, orientation, 0x00, 0x00]);
        // No next IFD
        exif.extend_from_slice(&[0x00, 0x00, 0x00, 0x00]);

        let len = (exif.len() + 2) as u16;
        let mut out = Vec::with_capacity(jpeg.len() + exif.len() + 4);
        out.extend_from_slice(&jpeg[..2]);
        out.extend_from_slice(&[0xFF, 0xE1]);
        out.extend_from_slice(&len.to_be_bytes());
        out.extend_from_slice(&exif);
        out.extend_from_slice(&jpeg[2..]);
        Bytes::from(out)
    }

    #[test]
    fn rotated_phone_photo_stays_upright() {
        // Sensor-native landscape pixels tagged "rotate 90° clockwise to display"
        let landscape = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(3000, 2000, Rgb([90, 120, 150]))),
            ImageFormat::Jpeg,
        );
        let data = with_exif_orientation(&landscape, 6);

        let result = ImageCompressor::compress(&data, "image/jpeg", &policy()).unwrap();
        assert!(!result.passthrough);
        assert_eq!((result.width, result.height), (1280, 1920));

        let stored = image::load_from_memory(&result.data).unwrap();
        assert_eq!(stored.dimensions(), (1280, 1920));
    }

    #[test]
    fn unreachable_cap_is_an_error() {
        let data = encode(DynamicImage::ImageRgb8(noisy_rgb(800, 800)), ImageFormat::Jpeg);
        let tiny = CompressionPolicy {
            max_dimension: 1920,
            max_output_bytes: 16,
        };
        let err = ImageCompressor::compress(&data, "image/jpeg", &tiny).unwrap_err();
        assert!(matches!(err, CompressionError::CapUnreachable { cap: 16, .. }));
    }

    #[test]
    fn undecodable_input_is_an_error() {
        let data = Bytes::from_static(b"definitely not an image");
        let err = ImageCompressor::compress(&data, "image/jpeg", &policy()).unwrap_err();
        assert!(matches!(err, CompressionError::Decode(_)));
    }
}
