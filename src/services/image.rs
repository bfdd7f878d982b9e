use std::io::Cursor;

use base64::{engine::general_purpose, Engine};
use image::codecs::jpeg::JpegEncoder;
use image::{imageops::FilterType, GenericImageView};

use super::AnalysisError;

/// Long-edge bound for the payload sent to the inference endpoint.
pub const MAX_DIMENSION: u32 = 1024;
/// JPEG quality factor (0.7 on a 0-1 scale).
pub const JPEG_QUALITY: u8 = 70;

/// Downscaled, re-encoded photo ready for the request builder.
/// Consumed immediately; never retained past the request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    pub data: Vec<u8>,
    pub mime_type: &'static str,
}

impl EncodedImage {
    pub fn to_base64(&self) -> String {
        general_purpose::STANDARD.encode(&self.data)
    }
}

pub struct ImageNormalizer;

impl ImageNormalizer {
    /// Decode a raw photo, clamp the long edge to `MAX_DIMENSION` preserving
    /// aspect ratio (never upscales), and re-encode as JPEG at fixed quality.
    pub fn normalize(raw: &[u8]) -> Result<EncodedImage, AnalysisError> {
        let img = image::load_from_memory(raw)
            .map_err(|e| AnalysisError::ImageProcessing(format!("could not decode photo: {}", e)))?;

        let (width, height) = img.dimensions();
        log::debug!("📷 Decoded photo: {}x{}", width, height);

        let img = if width > MAX_DIMENSION || height > MAX_DIMENSION {
            img.resize(MAX_DIMENSION, MAX_DIMENSION, FilterType::Triangle)
        } else {
            img
        };

        // JPEG has no alpha channel
        let rgb = img.to_rgb8();

        let mut buffer = Vec::new();
        let mut cursor = Cursor::new(&mut buffer);
        JpegEncoder::new_with_quality(&mut cursor, JPEG_QUALITY)
            .encode_image(&rgb)
            .map_err(|e| AnalysisError::ImageProcessing(format!("could not encode JPEG: {}", e)))?;

        if buffer.is_empty() {
            return Err(AnalysisError::ImageProcessing(
                "encoder produced no bytes".to_string(),
            ));
        }

        let (w, h) = rgb.dimensions();
        log::debug!("📦 Encoded payload: {}x{}, {} bytes", w, h, buffer.len());

        Ok(EncodedImage {
            data: buffer,
            mime_type: "image/jpeg",
        })
    }
}
