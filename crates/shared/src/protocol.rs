use serde::{Deserialize, Serialize};

/// Multipart field carrying the uploaded document.
pub const ANALYZE_FILE_FIELD: &str = "file";
pub const ANALYZE_PATH: &str = "/analyze/";

/// Body returned by `POST /analyze/` on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub filename: String,
    pub analysis: AnalysisFindings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisFindings {
    pub summary: String,
    pub key_clauses: Vec<String>,
    pub risks: Vec<String>,
    pub next_steps: Vec<String>,
}
