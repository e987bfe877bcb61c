//! Numeric helpers shared by every heuristic. Nothing here touches images.

use ndarray::{Array2, s};
use statrs::statistics::Statistics;

/// Denominator floor below which a correlation is treated as undefined.
pub const CORRELATION_EPSILON: f64 = 1e-8;

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().mean()
}

/// sqrt(E[(x - mean)^2]); zero for an empty slice.
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().population_std_dev()
}

/// Pearson correlation of two equally long samples. Degenerate inputs
/// (constant channel, empty or mismatched slices) yield 0.
pub fn pearson_correlation(a: &[f64], b: &[f64]) -> f64 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }

    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut covariance = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;

    for (&x, &y) in a.iter().zip(b) {
        let da = x - mean_a;
        let db = y - mean_b;
        covariance += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let n = a.len() as f64;
    let denominator = ((var_a / n) * (var_b / n)).sqrt();

    if denominator < CORRELATION_EPSILON {
        return 0.0;
    }

    (covariance / n / denominator).clamp(-1.0, 1.0)
}

pub fn saturate(x: f64, scale: f64) -> f64 {
    (x * scale).tanh()
}

pub fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Variance of every full `block_size` x `block_size` tile, row-major.
/// Partial tiles along the right and bottom edges are skipped.
pub fn block_variances(field: &Array2<f64>, block_size: usize) -> Vec<f64> {
    let (height, width) = field.dim();
    let mut variances = Vec::new();

    if block_size == 0 {
        return variances;
    }

    let mut y = 0;
    while y + block_size <= height {
        let mut x = 0;
        while x + block_size <= width {
            let tile = field.slice(s![y..y + block_size, x..x + block_size]);
            variances.push(tile.var(0.0));
            x += block_size;
        }
        y += block_size;
    }

    variances
}

/// Spread of local error energy: population std of the per-tile variances.
pub fn block_variance_dispersion(field: &Array2<f64>, block_size: usize) -> f64 {
    let variances = block_variances(field, block_size);

    if variances.is_empty() {
        return 0.0;
    }

    population_std(&variances)
}
