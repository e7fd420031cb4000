//! Runtime bridge between UI command queue and backend event intake.

use std::{collections::HashMap, sync::Arc, thread};

use client_core::{
    suggested_report_name, AnalysisClient, AnalysisEvent, AnalysisEventSink, AnalysisRun,
    ClientSettings, DocumentAnalyzer, Generation, PdfReportExporter, ReportExporter,
};
use crossbeam_channel::{Receiver, Sender, TrySendError};
use shared::domain::DocumentAnalysis;

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::events::{UiError, UiErrorContext, UiEvent};

/// Forwards analysis events into the UI queue.
struct UiEventSink(Sender<UiEvent>);

impl AnalysisEventSink for UiEventSink {
    fn emit(&self, event: AnalysisEvent) -> bool {
        match event {
            AnalysisEvent::Tick { generation } => {
                match self.0.try_send(UiEvent::AnalysisTick { generation }) {
                    Ok(()) => true,
                    Err(TrySendError::Full(_)) => {
                        tracing::warn!(generation, "ui event queue full; dropping progress tick");
                        true
                    }
                    Err(TrySendError::Disconnected(_)) => false,
                }
            }
            // The outcome must not be lost to a full queue, nor block a runtime worker.
            AnalysisEvent::Finished {
                generation,
                outcome,
            } => match self.0.try_send(UiEvent::AnalysisFinished {
                generation,
                outcome,
            }) {
                Ok(()) => true,
                Err(TrySendError::Full(event)) => {
                    tracing::warn!(generation, "ui event queue full; deferring analysis outcome");
                    let tx = self.0.clone();
                    tokio::task::spawn_blocking(move || {
                        if tx.send(event).is_err() {
                            tracing::debug!(generation, "ui closed before analysis outcome");
                        }
                    });
                    true
                }
                Err(TrySendError::Disconnected(_)) => false,
            },
        }
    }
}

pub fn launch(settings: ClientSettings, cmd_rx: Receiver<BackendCommand>, ui_tx: Sender<UiEvent>) {
    start_backend_bridge(settings, cmd_rx, ui_tx);
}

fn start_backend_bridge(
    settings: ClientSettings,
    cmd_rx: Receiver<BackendCommand>,
    ui_tx: Sender<UiEvent>,
) {
    thread::spawn(move || {
        let _ = ui_tx.try_send(UiEvent::Info("Backend worker starting...".to_string()));
        let runtime = match tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
        {
            Ok(runtime) => runtime,
            Err(err) => {
                let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                    UiErrorContext::BackendStartup,
                    format!("backend worker startup failure: failed to build runtime: {err}"),
                )));
                tracing::error!("failed to build backend runtime: {err}");
                return;
            }
        };

        runtime.block_on(async move {
            let client = match AnalysisClient::from_settings(&settings) {
                Ok(client) => client,
                Err(err) => {
                    let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                        UiErrorContext::BackendStartup,
                        format!("backend worker startup failure: {err}"),
                    )));
                    tracing::error!("failed to build analysis client: {err}");
                    return;
                }
            };
            tracing::info!(endpoint = %client.endpoint(), "backend worker ready");
            let analyzer: Arc<dyn DocumentAnalyzer> = Arc::new(client);
            let _ = ui_tx.try_send(UiEvent::Info("Ready".to_string()));

            let mut runs: HashMap<Generation, AnalysisRun> = HashMap::new();
            while let Ok(cmd) = cmd_rx.recv() {
                runs.retain(|_, run| !run.is_settled());
                match cmd {
                    BackendCommand::Analyze { generation, file } => {
                        tracing::info!(generation, file = %file.name, "starting analysis run");
                        let run = AnalysisRun::spawn(
                            Arc::clone(&analyzer),
                            file,
                            generation,
                            settings.progress_interval(),
                            UiEventSink(ui_tx.clone()),
                        );
                        runs.insert(generation, run);
                    }
                    BackendCommand::CancelAnalysis { generation } => {
                        if let Some(run) = runs.remove(&generation) {
                            tracing::info!(generation, "analysis run abandoned");
                            run.cancel();
                        }
                    }
                    BackendCommand::ExportReport { analysis } => {
                        export_report(&analysis, &ui_tx).await;
                    }
                }
            }
            tracing::info!("ui command queue closed; backend worker exiting");
        });
    });
}

async fn export_report(analysis: &DocumentAnalysis, ui_tx: &Sender<UiEvent>) {
    let exporter = PdfReportExporter;
    let bytes = match exporter.export(analysis) {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::error!(analysis_id = %analysis.id, "failed to build report: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::Export,
                format!("Failed to build report: {err}"),
            )));
            return;
        }
    };

    let save_path = rfd::FileDialog::new()
        .set_file_name(suggested_report_name(analysis, exporter.extension()))
        .add_filter("PDF", &[exporter.extension()])
        .save_file();
    let Some(path) = save_path else {
        return;
    };

    match tokio::fs::write(&path, bytes).await {
        Ok(()) => {
            tracing::info!(path = %path.display(), "saved analysis report");
            let _ = ui_tx.try_send(UiEvent::ReportSaved(path));
        }
        Err(err) => {
            tracing::error!(path = %path.display(), "failed to save report: {err}");
            let _ = ui_tx.try_send(UiEvent::Error(UiError::from_message(
                UiErrorContext::Export,
                format!("Failed to save report to {}: {err}", path.display()),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use crossbeam_channel::bounded;
    use shared::protocol::{AnalysisFindings, AnalysisResult};

    use super::*;

    fn finished(generation: Generation) -> AnalysisEvent {
        AnalysisEvent::Finished {
            generation,
            outcome: Ok(AnalysisResult {
                filename: "nda.pdf".to_string(),
                analysis: AnalysisFindings {
                    summary: "S".to_string(),
                    key_clauses: Vec::new(),
                    risks: Vec::new(),
                    next_steps: Vec::new(),
                },
            }),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn outcome_survives_a_full_ui_queue() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        let sink = UiEventSink(ui_tx);
        assert!(sink.emit(AnalysisEvent::Tick { generation: 3 }));

        assert!(sink.emit(finished(3)));
        assert!(matches!(
            ui_rx.recv_timeout(Duration::from_secs(5)),
            Ok(UiEvent::AnalysisTick { generation: 3 })
        ));
        assert!(matches!(
            ui_rx.recv_timeout(Duration::from_secs(5)),
            Ok(UiEvent::AnalysisFinished { generation: 3, outcome: Ok(_) })
        ));
    }

    #[tokio::test]
    async fn closed_ui_queue_stops_the_run() {
        let (ui_tx, ui_rx) = bounded::<UiEvent>(1);
        drop(ui_rx);
        let sink = UiEventSink(ui_tx);
        assert!(!sink.emit(AnalysisEvent::Tick { generation: 1 }));
        assert!(!sink.emit(finished(1)));
    }
}
