use crate::{
    image_utils::RawImageBuffer,
    stats::{clamp01, pearson_correlation},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorCorrelationResult {
    pub color_corr_score: f64,
    pub rg: f64,
    pub rb: f64,
    pub gb: f64,
}

pub struct ColorCorrelationAnalyzer;

impl ColorCorrelationAnalyzer {
    pub fn analyze(buffer: &RawImageBuffer) -> ColorCorrelationResult {
        let [r, g, b] = buffer.channels();
        Self::score_channels(&r, &g, &b)
    }

    /// Maps the mean pairwise correlation from [-1, 1] onto [0, 1].
    pub fn score_channels(r: &[f64], g: &[f64], b: &[f64]) -> ColorCorrelationResult {
        let rg = pearson_correlation(r, g);
        let rb = pearson_correlation(r, b);
        let gb = pearson_correlation(g, b);

        let average = (rg + rb + gb) / 3.0;
        let color_corr_score = clamp01(average * 0.5 + 0.5);

        log::debug!("color: rg={rg:.4} rb={rb:.4} gb={gb:.4}");

        ColorCorrelationResult {
            color_corr_score,
            rg,
            rb,
            gb,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn gray_ramp_is_fully_correlated() {
        let img = RgbImage::from_fn(16, 16, |x, y| {
            let v = (x * 16 + y) as u8;
            Rgb([v, v, v])
        });
        let result = ColorCorrelationAnalyzer::analyze(&RawImageBuffer::from_rgb(img).unwrap());

        assert!((result.color_corr_score - 1.0).abs() < 1e-9);
    }

    #[test]
    fn constant_channels_fall_back_to_midpoint() {
        let img = RgbImage::from_pixel(8, 8, Rgb([128, 128, 128]));
        let result = ColorCorrelationAnalyzer::analyze(&RawImageBuffer::from_rgb(img).unwrap());

        assert_eq!(result.rg, 0.0);
        assert_eq!(result.rb, 0.0);
        assert_eq!(result.gb, 0.0);
        assert_eq!(result.color_corr_score, 0.5);
    }

    #[test]
    fn anti_correlated_channels_score_low() {
        let r: Vec<f64> = (0..32).map(|i| i as f64).collect();
        let g: Vec<f64> = (0..32).map(|i| 31.0 - i as f64).collect();
        let b = vec![7.0; 32];

        let result = ColorCorrelationAnalyzer::score_channels(&r, &g, &b);

        assert!((result.rg + 1.0).abs() < 1e-9);
        assert_eq!(result.gb, 0.0);
        assert!((result.color_corr_score - 1.0 / 3.0).abs() < 1e-9);
    }
}
