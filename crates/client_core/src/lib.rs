use async_trait::async_trait;
use shared::{error::AnalysisError, protocol::AnalysisResult};

pub mod assembler;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod orchestrator;
pub mod progress;
pub mod run;
pub mod upload;
pub mod validation;

pub use assembler::assemble;
pub use client::AnalysisClient;
pub use config::{load_settings, ClientSettings};
pub use error::{ConfigError, ExportError, TransitionError};
pub use export::{suggested_report_name, PdfReportExporter, ReportExporter};
pub use orchestrator::{
    AnalysisTicket, CompletionOutcome, Generation, Orchestrator, TickOutcome, ViewKind, ViewState,
};
pub use progress::{analysis_steps, StepCursor, STEP_INTERVAL};
pub use run::{AnalysisEvent, AnalysisEventSink, AnalysisRun};
pub use upload::UploadedFile;
pub use validation::{validate, ValidatedFile, MAX_UPLOAD_BYTES};

/// Seam between the orchestration layer and whatever performs the remote analysis.
#[async_trait]
pub trait DocumentAnalyzer: Send + Sync {
    async fn analyze(&self, file: &UploadedFile) -> Result<AnalysisResult, AnalysisError>;
}
