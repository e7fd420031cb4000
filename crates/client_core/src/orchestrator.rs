//! View orchestration: exactly one screen and its payload are live at a time.
//!
//! Every entry into the analyzing view gets a fresh [`Generation`]. Progress
//! ticks and request outcomes carry the generation they were started with and
//! are dropped when it no longer matches the live view.

use shared::{
    domain::{AnalysisStep, DocumentAnalysis},
    error::AnalysisError,
    protocol::AnalysisResult,
};
use tracing::{debug, info, warn};

use crate::{
    assembler::assemble,
    error::TransitionError,
    progress::{analysis_steps, completed_count, StepCursor},
    upload::UploadedFile,
    validation::ValidatedFile,
};

pub type Generation = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewKind {
    Upload,
    Analyzing,
    Results,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyzingView {
    generation: Generation,
    file: UploadedFile,
    steps: Vec<AnalysisStep>,
    cursor: StepCursor,
}

impl AnalyzingView {
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn file_name(&self) -> &str {
        &self.file.name
    }

    pub fn file(&self) -> &UploadedFile {
        &self.file
    }

    pub fn steps(&self) -> &[AnalysisStep] {
        &self.steps
    }

    pub fn completed_steps(&self) -> usize {
        completed_count(&self.steps)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Upload,
    Analyzing(AnalyzingView),
    Results(DocumentAnalysis),
    Error { message: String },
}

impl ViewState {
    pub fn kind(&self) -> ViewKind {
        match self {
            ViewState::Upload => ViewKind::Upload,
            ViewState::Analyzing(_) => ViewKind::Analyzing,
            ViewState::Results(_) => ViewKind::Results,
            ViewState::Error { .. } => ViewKind::Error,
        }
    }
}

/// Handed back on entering the analyzing view; whoever runs the request
/// reports the outcome under this generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisTicket {
    pub generation: Generation,
    pub file: UploadedFile,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Advanced,
    Exhausted,
    Stale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompletionOutcome {
    Completed,
    Failed,
    Stale,
}

#[derive(Debug)]
pub struct Orchestrator {
    state: ViewState,
    last_generation: Generation,
}

impl Default for Orchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl Orchestrator {
    pub fn new() -> Self {
        Self {
            state: ViewState::Upload,
            last_generation: 0,
        }
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn kind(&self) -> ViewKind {
        self.state.kind()
    }

    pub fn analyzing(&self) -> Option<&AnalyzingView> {
        match &self.state {
            ViewState::Analyzing(view) => Some(view),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&DocumentAnalysis> {
        match &self.state {
            ViewState::Results(analysis) => Some(analysis),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            ViewState::Error { message } => Some(message),
            _ => None,
        }
    }

    pub fn active_generation(&self) -> Option<Generation> {
        self.analyzing().map(AnalyzingView::generation)
    }

    pub fn begin_analysis(
        &mut self,
        file: ValidatedFile,
    ) -> Result<AnalysisTicket, TransitionError> {
        if !matches!(self.state, ViewState::Upload) {
            return Err(TransitionError::InvalidTransition {
                from: self.kind(),
                event: "begin analysis",
            });
        }

        self.last_generation += 1;
        let generation = self.last_generation;
        let file = file.into_inner();
        info!(generation, file = %file.name, "entering analyzing view");

        self.state = ViewState::Analyzing(AnalyzingView {
            generation,
            file: file.clone(),
            steps: analysis_steps(),
            cursor: StepCursor::new(),
        });
        Ok(AnalysisTicket { generation, file })
    }

    pub fn on_progress_tick(&mut self, generation: Generation) -> TickOutcome {
        match &mut self.state {
            ViewState::Analyzing(view) if view.generation == generation => {
                if view.cursor.advance(&mut view.steps) {
                    debug!(generation, step = view.cursor.position(), "progress step advanced");
                    TickOutcome::Advanced
                } else {
                    TickOutcome::Exhausted
                }
            }
            _ => {
                debug!(generation, "ignoring stale progress tick");
                TickOutcome::Stale
            }
        }
    }

    pub fn complete(
        &mut self,
        generation: Generation,
        outcome: Result<AnalysisResult, AnalysisError>,
    ) -> CompletionOutcome {
        let view = match &self.state {
            ViewState::Analyzing(view) if view.generation == generation => view,
            _ => {
                info!(generation, "ignoring analysis outcome for an abandoned attempt");
                return CompletionOutcome::Stale;
            }
        };

        match outcome {
            Ok(result) => {
                let record = assemble(&view.file, result);
                info!(generation, analysis_id = %record.id, "entering results view");
                self.state = ViewState::Results(record);
                CompletionOutcome::Completed
            }
            Err(err) => {
                warn!(generation, status = ?err.status(), "analysis failed: {err}");
                self.state = ViewState::Error {
                    message: err.user_message(),
                };
                CompletionOutcome::Failed
            }
        }
    }

    /// Returns to the upload view from anywhere, dropping all analysis state.
    /// Yields the generation that was abandoned if an analysis was in flight.
    pub fn start_over(&mut self) -> Option<Generation> {
        let abandoned = self.active_generation();
        if self.kind() != ViewKind::Upload {
            info!(from = ?self.kind(), "starting over");
        }
        self.state = ViewState::Upload;
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use shared::protocol::AnalysisFindings;

    use super::*;
    use crate::validation::validate;

    fn validated(name: &str, size_bytes: u64) -> ValidatedFile {
        validate(UploadedFile {
            name: name.to_string(),
            mime_type: "application/pdf".to_string(),
            size_bytes,
            path: PathBuf::from(name),
        })
        .expect("valid candidate")
    }

    fn nda_result() -> AnalysisResult {
        AnalysisResult {
            filename: "nda.pdf".to_string(),
            analysis: AnalysisFindings {
                summary: "S".to_string(),
                key_clauses: vec!["A".to_string()],
                risks: vec!["B".to_string()],
                next_steps: vec!["C".to_string()],
            },
        }
    }

    fn server_error() -> AnalysisError {
        AnalysisError::Remote {
            status: 500,
            status_text: "Internal Server Error".to_string(),
        }
    }

    #[test]
    fn starts_in_upload_view() {
        let orchestrator = Orchestrator::new();
        assert_eq!(orchestrator.kind(), ViewKind::Upload);
        assert!(orchestrator.analysis().is_none());
        assert!(orchestrator.error_message().is_none());
        assert!(orchestrator.active_generation().is_none());
    }

    #[test]
    fn entering_analysis_captures_name_and_resets_steps() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 2048))
            .expect("begin");

        let view = orchestrator.analyzing().expect("analyzing");
        assert_eq!(view.generation(), ticket.generation);
        assert_eq!(view.file_name(), "nda.pdf");
        assert_eq!(view.steps(), analysis_steps().as_slice());
        assert_eq!(ticket.file.size_bytes, 2048);
    }

    #[test]
    fn cannot_begin_twice() {
        let mut orchestrator = Orchestrator::new();
        orchestrator
            .begin_analysis(validated("nda.pdf", 10))
            .expect("begin");
        let err = orchestrator
            .begin_analysis(validated("other.pdf", 10))
            .expect_err("already analyzing");
        assert_eq!(
            err,
            TransitionError::InvalidTransition {
                from: ViewKind::Analyzing,
                event: "begin analysis",
            }
        );
        assert_eq!(
            orchestrator.analyzing().map(AnalyzingView::file_name),
            Some("nda.pdf")
        );
    }

    #[test]
    fn successful_outcome_assembles_record() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 2048))
            .expect("begin");

        let outcome = orchestrator.complete(ticket.generation, Ok(nda_result()));
        assert_eq!(outcome, CompletionOutcome::Completed);

        let record = orchestrator.analysis().expect("results");
        assert_eq!(record.file_name, "nda.pdf");
        assert_eq!(record.file_size, 2048);
        assert_eq!(record.summary, "S");
        assert_eq!(record.key_clauses, vec!["A".to_string()]);
        assert_eq!(record.risks, vec!["B".to_string()]);
        assert_eq!(record.next_steps, vec!["C".to_string()]);
        assert!(record.analysis_complete);
    }

    #[test]
    fn server_error_ends_in_error_view_without_record() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 2048))
            .expect("begin");

        let outcome = orchestrator.complete(ticket.generation, Err(server_error()));
        assert_eq!(outcome, CompletionOutcome::Failed);
        assert_eq!(orchestrator.kind(), ViewKind::Error);
        let message = orchestrator.error_message().expect("message");
        assert!(!message.is_empty());
        assert!(orchestrator.analysis().is_none());
    }

    #[test]
    fn start_over_clears_results_and_errors_idempotently() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 2048))
            .expect("begin");
        orchestrator.complete(ticket.generation, Ok(nda_result()));

        assert_eq!(orchestrator.start_over(), None);
        assert_eq!(orchestrator.state(), &ViewState::Upload);
        assert_eq!(orchestrator.start_over(), None);
        assert_eq!(orchestrator.state(), &ViewState::Upload);

        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 2048))
            .expect("begin again");
        orchestrator.complete(ticket.generation, Err(server_error()));
        orchestrator.start_over();
        assert_eq!(orchestrator.state(), &ViewState::Upload);
        assert!(orchestrator.analyzing().is_none());
        assert!(orchestrator.analysis().is_none());
        assert!(orchestrator.error_message().is_none());
    }

    #[test]
    fn ticks_advance_only_the_live_generation() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 10))
            .expect("begin");

        assert_eq!(
            orchestrator.on_progress_tick(ticket.generation + 1),
            TickOutcome::Stale
        );
        for _ in 0..6 {
            assert_eq!(
                orchestrator.on_progress_tick(ticket.generation),
                TickOutcome::Advanced
            );
            let view = orchestrator.analyzing().expect("analyzing");
            assert_eq!(view.steps().iter().filter(|step| step.current).count(), 1);
        }
        assert_eq!(
            orchestrator.on_progress_tick(ticket.generation),
            TickOutcome::Exhausted
        );
        assert_eq!(
            orchestrator.analyzing().map(AnalyzingView::completed_steps),
            Some(5)
        );

        orchestrator.complete(ticket.generation, Ok(nda_result()));
        assert_eq!(
            orchestrator.on_progress_tick(ticket.generation),
            TickOutcome::Stale
        );
        assert_eq!(orchestrator.kind(), ViewKind::Results);
    }

    #[test]
    fn outcome_may_arrive_mid_animation() {
        let mut orchestrator = Orchestrator::new();
        let ticket = orchestrator
            .begin_analysis(validated("nda.pdf", 10))
            .expect("begin");
        orchestrator.on_progress_tick(ticket.generation);

        assert_eq!(
            orchestrator.complete(ticket.generation, Ok(nda_result())),
            CompletionOutcome::Completed
        );
    }

    #[test]
    fn late_outcome_after_start_over_is_ignored() {
        let mut orchestrator = Orchestrator::new();
        let first = orchestrator
            .begin_analysis(validated("first.pdf", 10))
            .expect("begin");

        assert_eq!(orchestrator.start_over(), Some(first.generation));
        assert_eq!(
            orchestrator.complete(first.generation, Ok(nda_result())),
            CompletionOutcome::Stale
        );
        assert_eq!(orchestrator.state(), &ViewState::Upload);

        let second = orchestrator
            .begin_analysis(validated("second.pdf", 10))
            .expect("begin again");
        assert!(second.generation > first.generation);
        assert_eq!(
            orchestrator.complete(first.generation, Err(server_error())),
            CompletionOutcome::Stale
        );
        assert_eq!(
            orchestrator.analyzing().map(AnalyzingView::file_name),
            Some("second.pdf")
        );
        assert_eq!(
            orchestrator.on_progress_tick(first.generation),
            TickOutcome::Stale
        );
    }
}
