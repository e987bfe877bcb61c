use std::time::Duration;

use crate::error::{ForensicsError, Result};

/// Longest side of the working image, in pixels.
pub const WORKING_RESOLUTION: u32 = 256;
pub const BLUR_SIGMA: f32 = 1.5;
pub const RECOMPRESS_QUALITY: u8 = 85;
pub const ARTIFACT_BLOCK_SIZE: usize = 8;
pub const COMPRESSION_SCALE: f64 = 8.0;

pub const SIGHTENGINE_ENDPOINT: &str = "https://api.sightengine.com/1.0/check.json";
pub const DETECTOR_TIMEOUT_SECS: u64 = 30;

pub const API_USER_VAR: &str = "API_USER";
pub const API_SECRET_VAR: &str = "API_SECRET";

/// Weights and saturation scales of the noise and frequency scores.
#[derive(Debug, Clone, PartialEq)]
pub struct NoiseConfig {
    pub residual_weight: f64,
    pub residual_scale: f64,
    pub high_freq_weight: f64,
    pub high_freq_scale: f64,
    pub frequency_scale: f64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            residual_weight: 0.55,
            residual_scale: 10.0,
            high_freq_weight: 0.45,
            high_freq_scale: 5.0,
            frequency_scale: 2.5,
        }
    }
}

/// Per-heuristic weights of the combined forensic score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreWeights {
    pub frequency: f64,
    pub noise: f64,
    pub compression: f64,
    pub color: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            frequency: 0.35,
            noise: 0.30,
            compression: 0.20,
            color: 0.15,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub max_dimension: u32,
    pub blur_sigma: f32,
    pub jpeg_quality: u8,
    pub block_size: usize,
    pub compression_scale: f64,
    pub noise: NoiseConfig,
    pub weights: ScoreWeights,
    pub parallel: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_dimension: WORKING_RESOLUTION,
            blur_sigma: BLUR_SIGMA,
            jpeg_quality: RECOMPRESS_QUALITY,
            block_size: ARTIFACT_BLOCK_SIZE,
            compression_scale: COMPRESSION_SCALE,
            noise: NoiseConfig::default(),
            weights: ScoreWeights::default(),
            parallel: true,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_dimension == 0 {
            return Err(ForensicsError::InvalidParameter(
                "max_dimension must be positive".into(),
            ));
        }

        if self.block_size == 0 {
            return Err(ForensicsError::InvalidParameter(
                "block_size must be positive".into(),
            ));
        }

        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ForensicsError::InvalidParameter(format!(
                "jpeg_quality must be between 1 and 100, got {}",
                self.jpeg_quality
            )));
        }

        if self.blur_sigma.is_nan() || self.blur_sigma <= 0.0 {
            return Err(ForensicsError::InvalidParameter(
                "blur_sigma must be positive".into(),
            ));
        }

        Ok(())
    }
}

/// How the local score, metadata penalty and external verdict are blended.
#[derive(Debug, Clone, PartialEq)]
pub struct FusionConfig {
    pub missing_metadata_penalty: f64,
    pub external_weight: f64,
    pub local_weight: f64,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            missing_metadata_penalty: 10.0,
            external_weight: 0.7,
            local_weight: 0.3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DetectorConfig {
    pub endpoint: String,
    pub models: String,
    pub timeout: Duration,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            endpoint: SIGHTENGINE_ENDPOINT.to_string(),
            models: "genai".to_string(),
            timeout: Duration::from_secs(DETECTOR_TIMEOUT_SECS),
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SightengineCredentials {
    pub api_user: String,
    pub api_secret: String,
}

impl SightengineCredentials {
    pub fn new(api_user: impl Into<String>, api_secret: impl Into<String>) -> Option<Self> {
        let api_user = api_user.into();
        let api_secret = api_secret.into();

        if api_user.trim().is_empty() || api_secret.trim().is_empty() {
            return None;
        }

        Some(Self {
            api_user,
            api_secret,
        })
    }

    /// Reads `API_USER` / `API_SECRET`. Missing credentials are not an
    /// error: the external call is simply skipped.
    pub fn from_env() -> Option<Self> {
        let api_user = std::env::var(API_USER_VAR).ok()?;
        let api_secret = std::env::var(API_SECRET_VAR).ok()?;
        Self::new(api_user, api_secret)
    }
}

impl std::fmt::Debug for SightengineCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SightengineCredentials")
            .field("api_user", &self.api_user)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AnalysisConfig::default().validate().is_ok());
    }

    #[test]
    fn default_weights_sum_to_one() {
        let w = ScoreWeights::default();
        let sum = w.frequency + w.noise + w.compression + w.color;
        assert!((sum - 1.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_parameters() {
        let zero_block = AnalysisConfig {
            block_size: 0,
            ..AnalysisConfig::default()
        };
        assert!(zero_block.validate().is_err());

        let bad_quality = AnalysisConfig {
            jpeg_quality: 0,
            ..AnalysisConfig::default()
        };
        assert!(bad_quality.validate().is_err());

        let bad_sigma = AnalysisConfig {
            blur_sigma: f32::NAN,
            ..AnalysisConfig::default()
        };
        assert!(bad_sigma.validate().is_err());
    }

    #[test]
    fn blank_credentials_are_absent() {
        assert!(SightengineCredentials::new("user", "").is_none());
        assert!(SightengineCredentials::new("  ", "secret").is_none());
        assert!(SightengineCredentials::new("user", "secret").is_some());
    }

    #[test]
    fn credentials_debug_hides_secret() {
        let creds = SightengineCredentials::new("user", "hunter2").unwrap();
        let shown = format!("{creds:?}");
        assert!(!shown.contains("hunter2"));
    }
}
