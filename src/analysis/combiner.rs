use crate::{ForensicMetrics, config::ScoreWeights, stats::clamp01};

/// Per-heuristic scores, each already in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeuristicScores {
    pub frequency: f64,
    pub noise: f64,
    pub compression: f64,
    pub color_corr: f64,
}

pub struct ScoreCombiner {
    weights: ScoreWeights,
}

impl ScoreCombiner {
    pub fn new(weights: ScoreWeights) -> Self {
        Self { weights }
    }

    pub fn forensic_score(&self, scores: &HeuristicScores) -> f64 {
        let w = &self.weights;
        clamp01(
            w.frequency * scores.frequency
                + w.noise * scores.noise
                + w.compression * scores.compression
                + w.color * scores.color_corr,
        )
    }

    pub fn combine(&self, scores: HeuristicScores, width: u32, height: u32) -> ForensicMetrics {
        let forensic_score = self.forensic_score(&scores);

        ForensicMetrics {
            frequency: clamp01(scores.frequency),
            noise: clamp01(scores.noise),
            compression: clamp01(scores.compression),
            color_corr: clamp01(scores.color_corr),
            forensic_score,
            width,
            height,
        }
    }
}

impl Default for ScoreCombiner {
    fn default() -> Self {
        Self::new(ScoreWeights::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_sum_uses_fixed_weights() {
        let scores = HeuristicScores {
            frequency: 1.0,
            noise: 0.0,
            compression: 0.5,
            color_corr: 0.2,
        };
        let combined = ScoreCombiner::default().forensic_score(&scores);
        assert!((combined - (0.35 + 0.10 + 0.03)).abs() < 1e-12);
    }

    #[test]
    fn all_ones_saturate_at_one() {
        let scores = HeuristicScores {
            frequency: 1.0,
            noise: 1.0,
            compression: 1.0,
            color_corr: 1.0,
        };
        let metrics = ScoreCombiner::default().combine(scores, 10, 20);
        assert!((metrics.forensic_score - 1.0).abs() < 1e-12);
        assert!(metrics.forensic_score <= 1.0);
        assert_eq!((metrics.width, metrics.height), (10, 20));
    }

    #[test]
    fn custom_weights_are_injected() {
        let combiner = ScoreCombiner::new(ScoreWeights {
            frequency: 0.0,
            noise: 0.0,
            compression: 0.0,
            color: 1.0,
        });
        let scores = HeuristicScores {
            frequency: 0.9,
            noise: 0.9,
            compression: 0.9,
            color_corr: 0.25,
        };
        assert_eq!(combiner.forensic_score(&scores), 0.25);
    }
}
