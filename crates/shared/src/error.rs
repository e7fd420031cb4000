use thiserror::Error;

pub const UNSUPPORTED_TYPE_MESSAGE: &str =
    "Please upload a PDF or Word document (.pdf, .doc, .docx)";
pub const FILE_TOO_LARGE_MESSAGE: &str = "File size must be less than 10MB";

/// Rejections raised locally before any upload starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{}", UNSUPPORTED_TYPE_MESSAGE)]
    UnsupportedType { mime_type: String },
    #[error("{}", FILE_TOO_LARGE_MESSAGE)]
    FileTooLarge { size_bytes: u64, limit_bytes: u64 },
}

/// Failures of a single analysis attempt. All of them end the attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    #[error("could not reach the analysis service: {0}")]
    Network(String),
    #[error("analysis service returned {status} {status_text}")]
    Remote { status: u16, status_text: String },
    #[error("analysis service returned an unreadable response: {0}")]
    MalformedResponse(String),
    #[error("could not read '{file_name}': {reason}")]
    ReadFile { file_name: String, reason: String },
}

impl AnalysisError {
    /// Message shown on the error view.
    pub fn user_message(&self) -> String {
        match self {
            AnalysisError::Remote { status_text, .. } => format!("Analysis failed: {status_text}"),
            other => format!("Analysis failed: {other}"),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            AnalysisError::Remote { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_messages_match_upload_surface_copy() {
        let err = ValidationError::UnsupportedType {
            mime_type: "text/plain".into(),
        };
        assert_eq!(
            err.to_string(),
            "Please upload a PDF or Word document (.pdf, .doc, .docx)"
        );

        let err = ValidationError::FileTooLarge {
            size_bytes: 10_485_761,
            limit_bytes: 10_485_760,
        };
        assert_eq!(err.to_string(), "File size must be less than 10MB");
    }

    #[test]
    fn remote_failure_message_carries_status_text() {
        let err = AnalysisError::Remote {
            status: 500,
            status_text: "Internal Server Error".into(),
        };
        assert_eq!(err.user_message(), "Analysis failed: Internal Server Error");
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn transport_failure_message_is_prefixed() {
        let err = AnalysisError::Network("connection refused".into());
        assert_eq!(
            err.user_message(),
            "Analysis failed: could not reach the analysis service: connection refused"
        );
        assert_eq!(err.status(), None);
    }
}
