use std::path::Path;

use image::DynamicImage;
use ndarray::Array2;
use serde::Serialize;

use crate::{
    analysis::{
        color::ColorCorrelationAnalyzer,
        combiner::{HeuristicScores, ScoreCombiner},
        compression::CompressionAnalyzer,
        noise::NoiseAnalyzer,
        spectrum::{SpectralProfile, SpectrumAnalyzer},
    },
    config::{AnalysisConfig, FusionConfig},
    detection::{
        AiDetector, ConfidenceLevel, ExternalVerdict, guess_mime_type,
        fusion::{HybridFusion, HybridResult},
        run_detector,
    },
    error::Result,
    image_utils::{RawImageBuffer, decode_image},
    metadata::{ExifExtractor, MetadataResult},
};

pub mod analysis;
pub mod config;
pub mod detection;
pub mod error;
pub mod image_utils;
pub mod metadata;
pub mod report;
pub mod stats;

/// Per-heuristic scores and their weighted combination, all in [0, 1].
/// Higher means more natural.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ForensicMetrics {
    pub frequency: f64,
    pub noise: f64,
    pub compression: f64,
    pub color_corr: f64,
    pub forensic_score: f64,
    pub width: u32,
    pub height: u32,
}

/// Unnormalized statistics behind the scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RawStatistics {
    pub noise_std: f64,
    pub high_freq_std: f64,
    pub residual_entropy: f64,
    pub block_dispersion: f64,
    pub rg: f64,
    pub rb: f64,
    pub gb: f64,
}

#[derive(Debug, Clone)]
pub struct DetailedAnalysis {
    pub metrics: ForensicMetrics,
    pub statistics: RawStatistics,
    pub spectrum: SpectralProfile,
    pub residual_map: Array2<f64>,
    pub error_map: Array2<f64>,
}

#[derive(Debug, Clone)]
pub struct HybridAnalysis {
    pub local: DetailedAnalysis,
    pub metadata: MetadataResult,
    pub external: ExternalVerdict,
    pub result: HybridResult,
    pub confidence: ConfidenceLevel,
}

pub struct ForensicsAnalyzer {
    bytes: Vec<u8>,
    original: DynamicImage,
    filename: String,
    config: AnalysisConfig,
    fusion: FusionConfig,
}

impl ForensicsAnalyzer {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(&path)?;
        let filename = path
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "image".to_string());

        Ok(Self::from_bytes(&bytes)?.with_filename(filename))
    }

    /// Decodes `bytes` up front; unreadable input fails here.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let original = decode_image(bytes)?;

        Ok(Self {
            bytes: bytes.to_vec(),
            original,
            filename: "image".to_string(),
            config: AnalysisConfig::default(),
            fusion: FusionConfig::default(),
        })
    }

    pub fn with_config(mut self, config: AnalysisConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_fusion_config(mut self, fusion: FusionConfig) -> Self {
        self.fusion = fusion;
        self
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn analyze(&self) -> Result<ForensicMetrics> {
        Ok(self.analyze_detailed()?.metrics)
    }

    pub fn analyze_detailed(&self) -> Result<DetailedAnalysis> {
        self.config.validate()?;

        let working = RawImageBuffer::from_image(&self.original, self.config.max_dimension)?;
        let (width, height) = working.dimensions();
        log::debug!("working resolution {width}x{height}");

        let noise_analyzer =
            NoiseAnalyzer::with_config(self.config.noise.clone()).with_blur_sigma(self.config.blur_sigma);
        let compression_analyzer = CompressionAnalyzer::new(self.config.jpeg_quality)
            .with_block_size(self.config.block_size)
            .with_scale(self.config.compression_scale);

        let run_noise = || noise_analyzer.analyze(&working);
        let run_spectrum = || SpectrumAnalyzer::analyze(&working.luma());
        let run_compression = || compression_analyzer.analyze(&self.original, &working);
        let run_color = || ColorCorrelationAnalyzer::analyze(&working);

        let ((noise, spectrum), (compression, color)) = if self.config.parallel {
            rayon::join(
                || rayon::join(run_noise, run_spectrum),
                || rayon::join(run_compression, run_color),
            )
        } else {
            ((run_noise(), run_spectrum()), (run_compression(), run_color()))
        };
        let compression = compression?;

        let scores = HeuristicScores {
            frequency: noise.frequency_score,
            noise: noise.noise_score,
            compression: compression.compression_score,
            color_corr: color.color_corr_score,
        };
        let metrics = ScoreCombiner::new(self.config.weights.clone()).combine(scores, width, height);

        log::info!(
            "forensic score {:.4} (frequency {:.4}, noise {:.4}, compression {:.4}, color {:.4})",
            metrics.forensic_score,
            metrics.frequency,
            metrics.noise,
            metrics.compression,
            metrics.color_corr
        );

        Ok(DetailedAnalysis {
            metrics,
            statistics: RawStatistics {
                noise_std: noise.noise_std,
                high_freq_std: noise.high_freq_std,
                residual_entropy: noise.residual_entropy,
                block_dispersion: compression.block_dispersion,
                rg: color.rg,
                rb: color.rb,
                gb: color.gb,
            },
            spectrum,
            residual_map: noise.residual,
            error_map: compression.error_map,
        })
    }

    pub fn extract_metadata(&self) -> MetadataResult {
        ExifExtractor::extract(&self.bytes)
    }

    /// Local extraction and the optional external call run side by side;
    /// an external failure is reported, never propagated.
    ///
    /// The external call blocks on network I/O for up to its timeout, so it
    /// gets its own scoped thread instead of a rayon worker.
    pub fn hybrid_analysis(&self, detector: Option<&dyn AiDetector>) -> Result<HybridAnalysis> {
        let mime_type = guess_mime_type(&self.filename);

        let (local, external) = std::thread::scope(|scope| {
            let external =
                scope.spawn(|| run_detector(detector, &self.bytes, &self.filename, mime_type));
            let local = self.analyze_detailed();

            let external = external.join().unwrap_or_else(|_| {
                log::warn!("external detector thread panicked");
                ExternalVerdict::Failed {
                    error: "external detector panicked".to_string(),
                }
            });
            (local, external)
        });
        let local = local?;

        let metadata = self.extract_metadata();
        let result = HybridFusion::new(self.fusion.clone()).fuse(
            &local.metrics,
            metadata.has_metadata(),
            external.score(),
        );
        let confidence = ConfidenceLevel::from_percentage(result.final_ai_score);

        Ok(HybridAnalysis {
            local,
            metadata,
            external,
            result,
            confidence,
        })
    }
}

/// Forensic metrics of an encoded image with the default configuration.
pub fn analyze(image_bytes: &[u8]) -> Result<ForensicMetrics> {
    ForensicsAnalyzer::from_bytes(image_bytes)?.analyze()
}

/// Blends forensic metrics, metadata presence and an optional external
/// probability in [0, 1] with the default weights.
pub fn fuse(
    metrics: &ForensicMetrics,
    metadata_present: bool,
    external_ai_score: Option<f64>,
) -> HybridResult {
    HybridFusion::default().fuse(metrics, metadata_present, external_ai_score)
}
