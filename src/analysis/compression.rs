use std::io::Cursor;

use image::{DynamicImage, codecs::jpeg::JpegEncoder};
use ndarray::{Array2, Zip};

use crate::{
    config::{ARTIFACT_BLOCK_SIZE, COMPRESSION_SCALE, RECOMPRESS_QUALITY},
    error::{ForensicsError, Result},
    image_utils::RawImageBuffer,
    stats::{block_variance_dispersion, clamp01, saturate},
};

#[derive(Debug, Clone)]
pub struct CompressionResult {
    pub compression_score: f64,
    /// Population std of per-block variances of the error field.
    pub block_dispersion: f64,
    /// Per-pixel absolute luma difference after the JPEG round trip.
    pub error_map: Array2<f64>,
}

pub struct CompressionAnalyzer {
    quality: u8,
    block_size: usize,
    scale: f64,
}

impl CompressionAnalyzer {
    pub fn new(quality: u8) -> Self {
        Self {
            quality,
            block_size: ARTIFACT_BLOCK_SIZE,
            scale: COMPRESSION_SCALE,
        }
    }

    pub fn with_block_size(mut self, size: usize) -> Self {
        self.block_size = size;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Round-trips `original` through JPEG, aligns the result to the
    /// working buffer and measures how unevenly the error is spread.
    pub fn analyze(
        &self,
        original: &DynamicImage,
        working: &RawImageBuffer,
    ) -> Result<CompressionResult> {
        let recompressed = self.recompress_jpeg(original)?;
        let (width, height) = working.dimensions();
        let aligned = RawImageBuffer::aligned(&recompressed, width, height);

        let error_map = Zip::from(&working.luma())
            .and(&aligned.luma())
            .map_collect(|&a, &b| (a - b).abs());

        Ok(self.score_error_map(error_map))
    }

    pub fn score_error_map(&self, error_map: Array2<f64>) -> CompressionResult {
        let block_dispersion = block_variance_dispersion(&error_map, self.block_size);
        let compression_score = clamp01(saturate(block_dispersion / 255.0, self.scale));

        log::debug!("compression: block_dispersion={block_dispersion:.4}");

        CompressionResult {
            compression_score,
            block_dispersion,
            error_map,
        }
    }

    fn recompress_jpeg(&self, image: &DynamicImage) -> Result<DynamicImage> {
        let rgb = image.to_rgb8();
        let mut buffer = Cursor::new(Vec::new());

        let encoder = JpegEncoder::new_with_quality(&mut buffer, self.quality);
        rgb.write_with_encoder(encoder)
            .map_err(|e| ForensicsError::Encode(e.to_string()))?;

        decode_round_trip(&buffer.into_inner())
    }
}

/// Reads back our own JPEG output; failures count as `Encode`.
fn decode_round_trip(jpeg: &[u8]) -> Result<DynamicImage> {
    image::load_from_memory(jpeg)
        .map_err(|e| ForensicsError::Encode(format!("round trip unreadable: {e}")))
}

impl Default for CompressionAnalyzer {
    fn default() -> Self {
        Self::new(RECOMPRESS_QUALITY)
    }
}
