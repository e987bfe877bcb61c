use ndarray::{Array2, Zip};

use crate::{
    config::{BLUR_SIGMA, NoiseConfig},
    image_utils::RawImageBuffer,
    stats::{clamp01, population_std, saturate},
};

const ENTROPY_BINS: usize = 64;
const ENTROPY_RANGE: (f64, f64) = (-0.2, 0.2);

#[derive(Debug, Clone)]
pub struct NoiseResult {
    pub noise_score: f64,
    pub frequency_score: f64,
    /// Population std of `gray - blurred`, in 8-bit units.
    pub noise_std: f64,
    /// Population std of the Laplacian response, in 8-bit units.
    pub high_freq_std: f64,
    pub residual_entropy: f64,
    pub residual: Array2<f64>,
}

pub struct NoiseAnalyzer {
    config: NoiseConfig,
    blur_sigma: f32,
}

impl NoiseAnalyzer {
    pub fn new() -> Self {
        Self::with_config(NoiseConfig::default())
    }

    pub fn with_config(config: NoiseConfig) -> Self {
        Self {
            config,
            blur_sigma: BLUR_SIGMA,
        }
    }

    pub fn with_blur_sigma(mut self, sigma: f32) -> Self {
        self.blur_sigma = sigma;
        self
    }

    pub fn analyze(&self, buffer: &RawImageBuffer) -> NoiseResult {
        let gray = buffer.luma();
        let blurred = buffer.blurred(self.blur_sigma).luma();
        let laplacian = buffer.high_pass_luma();

        self.score_fields(&gray, &blurred, &laplacian)
    }

    /// Scores precomputed luma, blurred luma and Laplacian fields of equal shape.
    pub fn score_fields(
        &self,
        gray: &Array2<f64>,
        blurred: &Array2<f64>,
        laplacian: &Array2<f64>,
    ) -> NoiseResult {
        let residual = Zip::from(gray)
            .and(blurred)
            .map_collect(|&g, &b| g - b);

        let noise_std = field_std(&residual);
        let high_freq_std = field_std(laplacian);

        let cfg = &self.config;
        let noise_score = clamp01(
            cfg.residual_weight * saturate(noise_std / 255.0, cfg.residual_scale)
                + cfg.high_freq_weight * saturate(high_freq_std / 255.0, cfg.high_freq_scale),
        );
        let frequency_score = clamp01(saturate(high_freq_std / 255.0, cfg.frequency_scale));

        let residual_entropy = residual_entropy(&residual);

        log::debug!(
            "noise: residual_std={noise_std:.4} laplacian_std={high_freq_std:.4} entropy={residual_entropy:.4}"
        );

        NoiseResult {
            noise_score,
            frequency_score,
            noise_std,
            high_freq_std,
            residual_entropy,
            residual,
        }
    }
}

impl Default for NoiseAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

fn field_std(field: &Array2<f64>) -> f64 {
    match field.as_slice() {
        Some(values) => population_std(values),
        None => population_std(&field.iter().copied().collect::<Vec<_>>()),
    }
}

/// Entropy of the normalized residual's density histogram. Samples outside
/// the histogram range are ignored.
pub fn residual_entropy(residual: &Array2<f64>) -> f64 {
    let (lo, hi) = ENTROPY_RANGE;
    let bin_width = (hi - lo) / ENTROPY_BINS as f64;
    let mut counts = [0usize; ENTROPY_BINS];
    let mut total = 0usize;

    for &value in residual {
        let v = value / 255.0;
        if !(lo..=hi).contains(&v) {
            continue;
        }
        let bin = (((v - lo) / bin_width) as usize).min(ENTROPY_BINS - 1);
        counts[bin] += 1;
        total += 1;
    }

    if total == 0 {
        return 0.0;
    }

    counts
        .iter()
        .map(|&c| c as f64 / (total as f64 * bin_width) + 1e-12)
        .map(|h| -h * h.ln())
        .sum()
}
