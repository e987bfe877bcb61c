use ndarray::Array2;
use num_complex::Complex;
use rustfft::FftPlanner;
use serde::Serialize;

use crate::stats::clamp01;

const LOW_BAND: f64 = 0.25;
const MID_BAND: f64 = 0.6;

/// Share of log-magnitude spectral energy per radial band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SpectralProfile {
    pub low_energy: f64,
    pub mid_energy: f64,
    pub high_energy: f64,
    pub balance: f64,
    pub spectral_score: f64,
}

pub struct SpectrumAnalyzer;

impl SpectrumAnalyzer {
    pub fn analyze(luma: &Array2<f64>) -> SpectralProfile {
        let magnitude = Self::log_magnitude(luma);
        let (height, width) = magnitude.dim();

        let cy = (height / 2) as f64;
        let cx = (width / 2) as f64;
        let radius = |y: usize, x: usize| ((x as f64 - cx).powi(2) + (y as f64 - cy).powi(2)).sqrt();

        let max_r = magnitude
            .indexed_iter()
            .map(|((y, x), _)| radius(y, x))
            .fold(0.0f64, f64::max);

        let mut low = 0.0;
        let mut mid = 0.0;
        let mut high = 0.0;

        for ((y, x), &value) in magnitude.indexed_iter() {
            let r = radius(y, x);
            if r <= LOW_BAND * max_r {
                low += value;
            } else if r <= MID_BAND * max_r {
                mid += value;
            } else {
                high += value;
            }
        }

        let total = low + mid + high + 1e-8;
        let low_energy = low / total;
        let mid_energy = mid / total;
        let high_energy = high / total;

        let balance = (mid_energy + high_energy) / (low_energy + 1e-8);
        let spectral_score = clamp01(high_energy * 0.7 + (balance / (balance + 1.0)) * 0.3);

        log::debug!(
            "spectrum: low={low_energy:.4} mid={mid_energy:.4} high={high_energy:.4} balance={balance:.4}"
        );

        SpectralProfile {
            low_energy,
            mid_energy,
            high_energy,
            balance,
            spectral_score,
        }
    }

    /// `ln(1 + |F|)` of the 2-D DFT, zero frequency moved to the centre.
    pub fn log_magnitude(luma: &Array2<f64>) -> Array2<f64> {
        let (height, width) = luma.dim();
        if height == 0 || width == 0 {
            return Array2::zeros((height, width));
        }

        let mut data = luma.mapv(|v| Complex::new(v, 0.0));
        let mut planner = FftPlanner::<f64>::new();

        let row_fft = planner.plan_fft_forward(width);
        for mut row in data.rows_mut() {
            let mut buffer = row.to_vec();
            row_fft.process(&mut buffer);
            row.iter_mut().zip(buffer).for_each(|(dst, src)| *dst = src);
        }

        let col_fft = planner.plan_fft_forward(height);
        for mut col in data.columns_mut() {
            let mut buffer = col.to_vec();
            col_fft.process(&mut buffer);
            col.iter_mut().zip(buffer).for_each(|(dst, src)| *dst = src);
        }

        let mut shifted = Array2::zeros((height, width));
        for ((y, x), value) in data.indexed_iter() {
            let sy = (y + height / 2) % height;
            let sx = (x + width / 2) % width;
            shifted[[sy, sx]] = value.norm().ln_1p();
        }

        shifted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_field_concentrates_at_centre() {
        let field = Array2::from_elem((16, 16), 50.0);
        let magnitude = SpectrumAnalyzer::log_magnitude(&field);

        let dc = (50.0f64 * 256.0).ln_1p();
        assert!((magnitude[[8, 8]] - dc).abs() < 1e-6);
        assert!(magnitude[[0, 0]].abs() < 1e-6);
    }

    #[test]
    fn flat_field_has_no_high_band_energy() {
        let profile = SpectrumAnalyzer::analyze(&Array2::from_elem((32, 32), 100.0));

        assert!(profile.low_energy > 0.99);
        assert!(profile.high_energy < 1e-6);
        assert!((0.0..=1.0).contains(&profile.spectral_score));
    }

    #[test]
    fn fine_texture_moves_energy_outward() {
        let flat = SpectrumAnalyzer::analyze(&Array2::from_elem((32, 32), 100.0));
        let textured = SpectrumAnalyzer::analyze(&Array2::from_shape_fn((32, 32), |(y, x)| {
            if (x + y) % 2 == 0 { 200.0 } else { 10.0 }
        }));

        assert!(textured.high_energy > flat.high_energy);
        assert!(textured.spectral_score > flat.spectral_score);
    }

    #[test]
    fn band_fractions_sum_to_one() {
        let field = Array2::from_shape_fn((20, 24), |(y, x)| ((x * 7 + y * 13) % 31) as f64);
        let profile = SpectrumAnalyzer::analyze(&field);
        let sum = profile.low_energy + profile.mid_energy + profile.high_energy;
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
