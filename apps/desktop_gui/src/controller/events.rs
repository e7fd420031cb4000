//! Backend-to-UI events and error modeling for the desktop GUI controller.

use std::path::PathBuf;

use client_core::Generation;
use shared::{
    error::{AnalysisError, ValidationError},
    protocol::AnalysisResult,
};

pub enum UiEvent {
    Info(String),
    Error(UiError),
    AnalysisTick {
        generation: Generation,
    },
    AnalysisFinished {
        generation: Generation,
        outcome: Result<AnalysisResult, AnalysisError>,
    },
    ReportSaved(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Validation,
    Transport,
    Remote,
    Export,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Upload,
    Analysis,
    Export,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Validation => "Invalid file",
        UiErrorCategory::Transport => "Connection problem",
        UiErrorCategory::Remote => "Service error",
        UiErrorCategory::Export => "Export failed",
        UiErrorCategory::Unknown => "Error",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    /// Classifies free-form failures (startup, queue, filesystem) by wording.
    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let message_lower = message.to_ascii_lowercase();
        let category = if message_lower.contains("please upload")
            || message_lower.contains("file size")
            || message_lower.contains("invalid")
            || message_lower.contains("not a regular file")
        {
            UiErrorCategory::Validation
        } else if message_lower.contains("timeout")
            || message_lower.contains("timed out")
            || message_lower.contains("connection")
            || message_lower.contains("network")
            || message_lower.contains("unreachable")
            || message_lower.contains("disconnect")
        {
            UiErrorCategory::Transport
        } else if context == UiErrorContext::Export
            || message_lower.contains("report")
            || message_lower.contains("save")
        {
            UiErrorCategory::Export
        } else {
            UiErrorCategory::Unknown
        };

        Self {
            category,
            context,
            message,
        }
    }

    pub fn from_validation(err: &ValidationError) -> Self {
        Self {
            category: UiErrorCategory::Validation,
            context: UiErrorContext::Upload,
            message: err.to_string(),
        }
    }

    pub fn from_analysis(err: &AnalysisError) -> Self {
        let category = match err {
            AnalysisError::Network(_) => UiErrorCategory::Transport,
            // Request and gateway timeouts say nothing about the document.
            _ if matches!(err.status(), Some(408 | 504)) => UiErrorCategory::Transport,
            AnalysisError::Remote { .. } | AnalysisError::MalformedResponse(_) => {
                UiErrorCategory::Remote
            }
            AnalysisError::ReadFile { .. } => UiErrorCategory::Validation,
        };
        Self {
            category,
            context: UiErrorContext::Analysis,
            message: err.user_message(),
        }
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}
