use chrono::{DateTime, Utc};
use shared::{
    domain::{AnalysisId, DocumentAnalysis},
    protocol::AnalysisResult,
};

use crate::upload::UploadedFile;

/// Merges the service response with local file metadata. Text passes through untouched.
pub fn assemble(file: &UploadedFile, result: AnalysisResult) -> DocumentAnalysis {
    assemble_at(file, result, Utc::now())
}

pub fn assemble_at(
    file: &UploadedFile,
    result: AnalysisResult,
    uploaded_at: DateTime<Utc>,
) -> DocumentAnalysis {
    let findings = result.analysis;
    DocumentAnalysis {
        id: AnalysisId::new_random(),
        file_name: file.name.clone(),
        file_size: file.size_bytes,
        upload_date: uploaded_at,
        summary: findings.summary,
        key_clauses: findings.key_clauses,
        risks: findings.risks,
        next_steps: findings.next_steps,
        analysis_complete: true,
    }
}
