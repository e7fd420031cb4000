//! Backend commands queued from UI to backend worker.

use client_core::{Generation, UploadedFile};
use shared::domain::DocumentAnalysis;

pub enum BackendCommand {
    Analyze {
        generation: Generation,
        file: UploadedFile,
    },
    CancelAnalysis {
        generation: Generation,
    },
    ExportReport {
        analysis: Box<DocumentAnalysis>,
    },
}
