//! Drives one analysis attempt: the cosmetic ticker and the real request run
//! side by side, and both report back as [`AnalysisEvent`]s.

use std::{sync::Arc, time::Duration};

use shared::{error::AnalysisError, protocol::AnalysisResult};
use tokio::{
    sync::mpsc,
    task::{AbortHandle, JoinHandle},
};
use tracing::{error, info};

use crate::{
    orchestrator::Generation,
    progress::{spawn_ticker, STEP_COUNT},
    upload::UploadedFile,
    DocumentAnalyzer,
};

#[derive(Debug)]
pub enum AnalysisEvent {
    Tick {
        generation: Generation,
    },
    Finished {
        generation: Generation,
        outcome: Result<AnalysisResult, AnalysisError>,
    },
}

impl AnalysisEvent {
    pub fn generation(&self) -> Generation {
        match self {
            AnalysisEvent::Tick { generation } | AnalysisEvent::Finished { generation, .. } => {
                *generation
            }
        }
    }
}

pub trait AnalysisEventSink: Send + Sync + 'static {
    /// Returns `false` once nobody is listening any more.
    fn emit(&self, event: AnalysisEvent) -> bool;
}

impl AnalysisEventSink for mpsc::UnboundedSender<AnalysisEvent> {
    fn emit(&self, event: AnalysisEvent) -> bool {
        self.send(event).is_ok()
    }
}

pub struct AnalysisRun {
    generation: Generation,
    ticker: AbortHandle,
    request: JoinHandle<()>,
}

impl AnalysisRun {
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: AnalysisEventSink>(
        analyzer: Arc<dyn DocumentAnalyzer>,
        file: UploadedFile,
        generation: Generation,
        tick_interval: Duration,
        sink: S,
    ) -> Self {
        let sink = Arc::new(sink);

        let ticker = {
            let sink = Arc::clone(&sink);
            spawn_ticker(tick_interval, STEP_COUNT, move |_| {
                sink.emit(AnalysisEvent::Tick { generation })
            })
        }
        .abort_handle();

        let request = {
            let ticker = ticker.clone();
            tokio::spawn(async move {
                let outcome = analyzer.analyze(&file).await;
                ticker.abort();
                match &outcome {
                    Ok(_) => info!(generation, file = %file.name, "analysis run finished"),
                    Err(err) => error!(generation, file = %file.name, "analysis run failed: {err}"),
                }
                sink.emit(AnalysisEvent::Finished {
                    generation,
                    outcome,
                });
            })
        };

        Self {
            generation,
            ticker,
            request,
        }
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Stops the cosmetic ticker. The request keeps running; its outcome is
    /// still emitted and left to the receiver to discard.
    pub fn cancel(&self) {
        self.ticker.abort();
    }

    pub fn is_settled(&self) -> bool {
        self.request.is_finished()
    }
}

#[cfg(test)]
#[path = "tests/run_tests.rs"]
mod tests;
