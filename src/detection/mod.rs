pub mod fusion;
pub mod sightengine;

use serde::{Deserialize, Serialize};

use crate::error::ExternalServiceError;

/// Display label for a final AI-likelihood percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceLevel {
    None,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ConfidenceLevel {
    pub fn from_percentage(score: f64) -> Self {
        match score {
            s if s < 20.0 => ConfidenceLevel::None,
            s if s < 40.0 => ConfidenceLevel::Low,
            s if s < 60.0 => ConfidenceLevel::Medium,
            s if s < 80.0 => ConfidenceLevel::High,
            _ => ConfidenceLevel::VeryHigh,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ConfidenceLevel::None => "Likely authentic",
            ConfidenceLevel::Low => "Probably authentic",
            ConfidenceLevel::Medium => "Inconclusive",
            ConfidenceLevel::High => "Probably AI-generated",
            ConfidenceLevel::VeryHigh => "Likely AI-generated",
        }
    }
}

/// An external model that estimates how likely an image is AI-generated.
pub trait AiDetector: Send + Sync {
    /// Probability in [0, 1] that the image is AI-generated.
    fn detect(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<f64, ExternalServiceError>;

    fn name(&self) -> &str;
}

/// Outcome of the optional external call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExternalVerdict {
    Score { ai_generated: f64 },
    Failed { error: String },
    Skipped,
}

impl ExternalVerdict {
    /// Scores that are not a finite probability become `Failed`.
    pub fn from_result(result: Result<f64, ExternalServiceError>) -> Self {
        match result.and_then(checked_probability) {
            Ok(ai_generated) => ExternalVerdict::Score { ai_generated },
            Err(e) => ExternalVerdict::Failed {
                error: e.to_string(),
            },
        }
    }

    pub fn score(&self) -> Option<f64> {
        match self {
            ExternalVerdict::Score { ai_generated } => Some(*ai_generated),
            _ => None,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, ExternalVerdict::Failed { .. })
    }
}

/// Runs `detector` if one is configured, turning any failure into a
/// `Failed` verdict.
pub fn run_detector(
    detector: Option<&dyn AiDetector>,
    bytes: &[u8],
    filename: &str,
    mime_type: &str,
) -> ExternalVerdict {
    let Some(detector) = detector else {
        log::debug!("no external detector configured, skipping");
        return ExternalVerdict::Skipped;
    };

    let result = detector
        .detect(bytes, filename, mime_type)
        .and_then(checked_probability);
    if let Err(ref e) = result {
        log::warn!("{} detector failed: {e}", detector.name());
    }

    ExternalVerdict::from_result(result)
}

fn checked_probability(score: f64) -> Result<f64, ExternalServiceError> {
    if (0.0..=1.0).contains(&score) {
        Ok(score)
    } else {
        Err(ExternalServiceError::MalformedResponse(format!(
            "score {score} is not a probability"
        )))
    }
}

/// Best-effort MIME type from the file extension.
pub fn guess_mime_type(filename: &str) -> &'static str {
    let ext = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        _ => "application/octet-stream",
    }
}
