pub mod visualization;

use serde::Serialize;

use crate::{
    ForensicMetrics, HybridAnalysis, RawStatistics,
    analysis::spectrum::SpectralProfile,
    detection::{ConfidenceLevel, ExternalVerdict, fusion::HybridResult},
};

#[derive(Serialize)]
pub struct JsonReport {
    pub final_ai_score: f64,
    pub confidence: ConfidenceLevel,
    pub verdict: &'static str,
    pub hybrid: HybridResult,
    pub forensic: ForensicMetrics,
    pub statistics: RawStatistics,
    pub spectrum: SpectralProfile,
    pub external: ExternalVerdict,
    pub metadata: MetadataReportSection,
}

#[derive(Serialize)]
pub struct MetadataReportSection {
    pub present: bool,
    pub tag_count: usize,
    pub camera_info: Option<String>,
    pub software: Option<String>,
    pub date_time: Option<String>,
}

impl From<&HybridAnalysis> for JsonReport {
    fn from(analysis: &HybridAnalysis) -> Self {
        let metadata = &analysis.metadata;

        Self {
            final_ai_score: analysis.result.final_ai_score,
            confidence: analysis.confidence,
            verdict: analysis.confidence.description(),
            hybrid: analysis.result.clone(),
            forensic: analysis.local.metrics,
            statistics: analysis.local.statistics,
            spectrum: analysis.local.spectrum,
            external: analysis.external.clone(),
            metadata: MetadataReportSection {
                present: metadata.has_metadata(),
                tag_count: metadata.all_tags.len(),
                camera_info: metadata
                    .camera_model
                    .clone()
                    .or_else(|| metadata.camera_make.clone()),
                software: metadata.software.clone(),
                date_time: metadata.date_time.clone(),
            },
        }
    }
}

impl JsonReport {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn to_json_compact(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
