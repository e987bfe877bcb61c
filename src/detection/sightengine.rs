use reqwest::blocking::multipart::{Form, Part};
use serde::Deserialize;

use super::AiDetector;
use crate::{
    config::{DetectorConfig, SightengineCredentials},
    error::ExternalServiceError,
};

/// Sightengine `genai` model over HTTP.
pub struct SightengineClient {
    config: DetectorConfig,
    credentials: SightengineCredentials,
    client: reqwest::blocking::Client,
}

impl SightengineClient {
    pub fn new(
        credentials: SightengineCredentials,
        config: DetectorConfig,
    ) -> Result<Self, ExternalServiceError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ExternalServiceError::Http(e.to_string()))?;

        Ok(Self {
            config,
            credentials,
            client,
        })
    }

    fn map_send_error(&self, e: reqwest::Error) -> ExternalServiceError {
        if e.is_timeout() {
            ExternalServiceError::Timeout {
                secs: self.config.timeout.as_secs(),
            }
        } else if e.is_connect() {
            ExternalServiceError::Connection(self.config.endpoint.clone())
        } else {
            ExternalServiceError::Http(e.to_string())
        }
    }
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    status: String,
    #[serde(rename = "type")]
    kind: Option<CheckType>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct CheckType {
    ai_generated: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: Option<String>,
}

/// Pulls the `type.ai_generated` probability out of a check response body.
fn parse_check_response(body: &str) -> Result<f64, ExternalServiceError> {
    let parsed: CheckResponse = serde_json::from_str(body)
        .map_err(|e| ExternalServiceError::MalformedResponse(e.to_string()))?;

    if parsed.status != "success" {
        let message = parsed
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| format!("status '{}'", parsed.status));
        return Err(ExternalServiceError::Rejected(message));
    }

    let score = parsed
        .kind
        .and_then(|t| t.ai_generated)
        .ok_or_else(|| ExternalServiceError::MalformedResponse("missing type.ai_generated".into()))?;

    if !score.is_finite() || !(0.0..=1.0).contains(&score) {
        return Err(ExternalServiceError::MalformedResponse(format!(
            "ai_generated out of range: {score}"
        )));
    }

    Ok(score)
}

impl AiDetector for SightengineClient {
    fn detect(
        &self,
        bytes: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<f64, ExternalServiceError> {
        let media = Part::bytes(bytes.to_vec())
            .file_name(filename.to_string())
            .mime_str(mime_type)
            .map_err(|e| ExternalServiceError::Http(e.to_string()))?;

        let form = Form::new()
            .text("models", self.config.models.clone())
            .text("api_user", self.credentials.api_user.clone())
            .text("api_secret", self.credentials.api_secret.clone())
            .part("media", media);

        log::debug!("posting {} bytes to {}", bytes.len(), self.config.endpoint);

        let response = self
            .client
            .post(&self.config.endpoint)
            .multipart(form)
            .send()
            .map_err(|e| self.map_send_error(e))?;

        let status = response.status();
        let body = response.text().map_err(|e| self.map_send_error(e))?;

        if !status.is_success() {
            return Err(ExternalServiceError::Status {
                status: status.as_u16(),
                body,
            });
        }

        parse_check_response(&body)
    }

    fn name(&self) -> &str {
        "Sightengine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_success_response() {
        let body = r#"{"status":"success","request":{"id":"req_1"},"type":{"ai_generated":0.93}}"#;
        assert_eq!(parse_check_response(body).unwrap(), 0.93);
    }

    #[test]
    fn failure_status_is_rejected() {
        let body = r#"{"status":"failure","error":{"type":"credentials_error","code":1,"message":"Incorrect API user or secret"}}"#;
        let err = parse_check_response(body).unwrap_err();
        assert_eq!(
            err,
            ExternalServiceError::Rejected("Incorrect API user or secret".into())
        );
    }

    #[test]
    fn missing_score_is_malformed() {
        let body = r#"{"status":"success","type":{}}"#;
        assert!(matches!(
            parse_check_response(body),
            Err(ExternalServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn out_of_range_score_is_malformed() {
        let body = r#"{"status":"success","type":{"ai_generated":1.7}}"#;
        assert!(matches!(
            parse_check_response(body),
            Err(ExternalServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn non_json_body_is_malformed() {
        assert!(matches!(
            parse_check_response("<html>502</html>"),
            Err(ExternalServiceError::MalformedResponse(_))
        ));
    }

    #[test]
    fn client_reports_its_name() {
        let creds = SightengineCredentials::new("user", "secret").unwrap();
        let client = SightengineClient::new(creds, DetectorConfig::default()).unwrap();
        assert_eq!(client.name(), "Sightengine");
    }
}
