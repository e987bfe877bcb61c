use serde::Serialize;

use crate::{ForensicMetrics, config::FusionConfig};

/// Per-component "suspicious" percentages shown next to the final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    #[serde(rename = "Sightengine")]
    pub sightengine: f64,
    #[serde(rename = "Frequency")]
    pub frequency: f64,
    #[serde(rename = "Noise")]
    pub noise: f64,
    #[serde(rename = "Compression")]
    pub compression: f64,
    #[serde(rename = "Color")]
    pub color: f64,
    #[serde(rename = "Metadata")]
    pub metadata: f64,
}

impl ScoreBreakdown {
    pub fn entries(&self) -> [(&'static str, f64); 6] {
        [
            ("Sightengine", self.sightengine),
            ("Frequency", self.frequency),
            ("Noise", self.noise),
            ("Compression", self.compression),
            ("Color", self.color),
            ("Metadata", self.metadata),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HybridResult {
    /// External AI likelihood in percent, when the detector answered.
    pub api_ai_score: Option<f64>,
    pub forensic_ai_pct: f64,
    pub metadata_adjustment: f64,
    /// `forensic_ai_pct + metadata_adjustment`, clamped to [0, 100].
    pub local_component: f64,
    /// Always in [0, 100].
    pub final_ai_score: f64,
    pub breakdown: ScoreBreakdown,
}

pub struct HybridFusion {
    config: FusionConfig,
}

impl HybridFusion {
    pub fn new(config: FusionConfig) -> Self {
        Self { config }
    }

    /// `external_ai_score` is the detector's probability in [0, 1], absent
    /// when the call was skipped or failed. A non-finite score counts as
    /// absent.
    pub fn fuse(
        &self,
        metrics: &ForensicMetrics,
        metadata_present: bool,
        external_ai_score: Option<f64>,
    ) -> HybridResult {
        let metadata_adjustment = if metadata_present {
            0.0
        } else {
            self.config.missing_metadata_penalty
        };

        let forensic_ai_pct = (1.0 - metrics.forensic_score) * 100.0;
        let local_component = clamp_pct(forensic_ai_pct + metadata_adjustment);

        let api_ai_score = external_ai_score
            .filter(|s| s.is_finite())
            .map(|s| s.clamp(0.0, 1.0) * 100.0);

        // The metadata penalty stays inside the local share on this path too.
        let final_ai_score = match api_ai_score {
            Some(api_pct) => clamp_pct(
                api_pct * self.config.external_weight + local_component * self.config.local_weight,
            ),
            None => local_component,
        };

        let breakdown = ScoreBreakdown {
            sightengine: api_ai_score.unwrap_or(0.0),
            frequency: (1.0 - metrics.frequency) * 100.0,
            noise: (1.0 - metrics.noise) * 100.0,
            compression: (1.0 - metrics.compression) * 100.0,
            color: (1.0 - metrics.color_corr) * 100.0,
            metadata: metadata_adjustment,
        };

        log::info!(
            "fusion: forensic_ai_pct={forensic_ai_pct:.2} metadata_adj={metadata_adjustment} api={api_ai_score:?} final={final_ai_score:.2}"
        );

        HybridResult {
            api_ai_score,
            forensic_ai_pct,
            metadata_adjustment,
            local_component,
            final_ai_score,
            breakdown,
        }
    }
}

impl Default for HybridFusion {
    fn default() -> Self {
        Self::new(FusionConfig::default())
    }
}

fn clamp_pct(x: f64) -> f64 {
    x.clamp(0.0, 100.0)
}
