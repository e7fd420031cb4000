use async_trait::async_trait;
use reqwest::{
    multipart::{Form, Part},
    Client,
};
use shared::{
    error::AnalysisError,
    protocol::{AnalysisResult, ANALYZE_FILE_FIELD, ANALYZE_PATH},
};
use tracing::{error, info};

use crate::{
    config::{normalize_base_url, ClientSettings},
    error::ConfigError,
    upload::UploadedFile,
    DocumentAnalyzer,
};

/// Talks to the external document-analysis service. One request per document.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_settings(settings: &ClientSettings) -> Result<Self, ConfigError> {
        let base_url = normalize_base_url(&settings.api_base_url)?;
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()
            .map_err(|err| ConfigError::HttpClient(err.to_string()))?;
        Ok(Self { http, base_url })
    }

    pub fn endpoint(&self) -> String {
        format!("{}{ANALYZE_PATH}", self.base_url)
    }

    pub async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, AnalysisError> {
        let bytes = tokio::fs::read(&file.path)
            .await
            .map_err(|err| AnalysisError::ReadFile {
                file_name: file.name.clone(),
                reason: err.to_string(),
            })?;

        let mut part = Part::bytes(bytes).file_name(file.name.clone());
        if !file.mime_type.is_empty() {
            part = part
                .mime_str(&file.mime_type)
                .map_err(|err| AnalysisError::ReadFile {
                    file_name: file.name.clone(),
                    reason: format!("unusable media type '{}': {err}", file.mime_type),
                })?;
        }
        let form = Form::new().part(ANALYZE_FILE_FIELD, part);

        let endpoint = self.endpoint();
        info!(
            file = %file.name,
            size_bytes = file.size_bytes,
            endpoint = %endpoint,
            "posting document for analysis"
        );

        let response = self
            .http
            .post(&endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|err| {
                error!(endpoint = %endpoint, "analysis request failed: {err}");
                AnalysisError::Network(err.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = status.as_u16(), "analysis service rejected document");
            return Err(AnalysisError::Remote {
                status: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| AnalysisError::Network(err.to_string()))?;
        let result: AnalysisResult = serde_json::from_slice(&body)
            .map_err(|err| AnalysisError::MalformedResponse(err.to_string()))?;

        info!(
            file = %file.name,
            key_clauses = result.analysis.key_clauses.len(),
            risks = result.analysis.risks.len(),
            next_steps = result.analysis.next_steps.len(),
            "analysis received"
        );
        Ok(result)
    }
}

#[async_trait]
impl DocumentAnalyzer for AnalysisClient {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, AnalysisError> {
        AnalysisClient::analyze(self, file).await
    }
}

#[cfg(test)]
#[path = "tests/client_tests.rs"]
mod tests;
