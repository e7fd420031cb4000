use std::path::PathBuf;

use client_core::{
    progress::STEP_COUNT, validate, validation::ACCEPTED_EXTENSIONS, CompletionOutcome,
    Orchestrator, UploadedFile, ViewKind,
};
use crossbeam_channel::{Receiver, Sender};
use eframe::egui;
use shared::domain::{AnalysisStep, DocumentAnalysis};

use crate::backend_bridge::commands::BackendCommand;
use crate::controller::{
    events::{err_label, UiError, UiErrorCategory, UiErrorContext, UiEvent},
    orchestration::dispatch_backend_command,
};

const ACCENT: egui::Color32 = egui::Color32::from_rgb(30, 58, 138);
const SUCCESS: egui::Color32 = egui::Color32::from_rgb(21, 128, 61);
const DANGER: egui::Color32 = egui::Color32::from_rgb(185, 28, 28);

pub struct DesktopGuiApp {
    cmd_tx: Sender<BackendCommand>,
    ui_rx: Receiver<UiEvent>,
    orchestrator: Orchestrator,
    api_base_url: String,
    status: String,
    /// Inline message under the drop zone; never changes the view.
    upload_error: Option<UiError>,
    /// Classification of the failure behind the error view.
    last_failure: Option<UiError>,
    status_banner: Option<UiError>,
}

impl DesktopGuiApp {
    pub fn new(
        cmd_tx: Sender<BackendCommand>,
        ui_rx: Receiver<UiEvent>,
        api_base_url: String,
    ) -> Self {
        Self {
            cmd_tx,
            ui_rx,
            orchestrator: Orchestrator::new(),
            api_base_url,
            status: "Starting...".to_string(),
            upload_error: None,
            last_failure: None,
            status_banner: None,
        }
    }

    fn process_ui_events(&mut self) {
        while let Ok(event) = self.ui_rx.try_recv() {
            self.apply_ui_event(event);
        }
    }

    fn apply_ui_event(&mut self, event: UiEvent) {
        match event {
            UiEvent::Info(message) => {
                self.status = message;
            }
            UiEvent::Error(err) => {
                tracing::warn!(
                    category = ?err.category(),
                    context = ?err.context(),
                    "{}",
                    err.message()
                );
                self.status = err.message().to_string();
                self.status_banner = Some(err);
            }
            UiEvent::AnalysisTick { generation } => {
                self.orchestrator.on_progress_tick(generation);
            }
            UiEvent::AnalysisFinished {
                generation,
                outcome,
            } => {
                let failure = outcome.as_ref().err().map(UiError::from_analysis);
                match self.orchestrator.complete(generation, outcome) {
                    CompletionOutcome::Completed => {
                        self.status = "Analysis complete".to_string();
                        self.last_failure = None;
                    }
                    CompletionOutcome::Failed => {
                        self.status = "Analysis failed".to_string();
                        self.last_failure = failure;
                    }
                    CompletionOutcome::Stale => {}
                }
            }
            UiEvent::ReportSaved(path) => {
                self.status = format!("Saved report to {}", path.display());
            }
        }
    }

    fn submit_file(&mut self, path: PathBuf) {
        let file = match UploadedFile::from_path(&path) {
            Ok(file) => file,
            Err(err) => {
                self.upload_error = Some(UiError::from_message(
                    UiErrorContext::Upload,
                    format!("Could not open {}: {err}", path.display()),
                ));
                return;
            }
        };

        let validated = match validate(file) {
            Ok(validated) => validated,
            Err(err) => {
                tracing::info!(path = %path.display(), "rejected upload: {err}");
                self.upload_error = Some(UiError::from_validation(&err));
                return;
            }
        };

        self.upload_error = None;
        match self.orchestrator.begin_analysis(validated) {
            Ok(ticket) => {
                self.status = format!("Analyzing {}", ticket.file.name);
                dispatch_backend_command(
                    &self.cmd_tx,
                    BackendCommand::Analyze {
                        generation: ticket.generation,
                        file: ticket.file,
                    },
                    &mut self.status,
                );
            }
            Err(err) => tracing::warn!("{err}"),
        }
    }

    fn start_over(&mut self) {
        if let Some(generation) = self.orchestrator.start_over() {
            dispatch_backend_command(
                &self.cmd_tx,
                BackendCommand::CancelAnalysis { generation },
                &mut self.status,
            );
        }
        self.upload_error = None;
        self.last_failure = None;
        self.status = "Ready".to_string();
    }

    fn request_export(&mut self) {
        let Some(analysis) = self.orchestrator.analysis().cloned() else {
            return;
        };
        self.status = "Preparing report...".to_string();
        dispatch_backend_command(
            &self.cmd_tx,
            BackendCommand::ExportReport {
                analysis: Box::new(analysis),
            },
            &mut self.status,
        );
    }

    fn browse_for_file(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Documents", &ACCEPTED_EXTENSIONS)
            .pick_file()
        {
            self.submit_file(path);
        }
    }

    fn show_status_banner(&mut self, ui: &mut egui::Ui) {
        if let Some(banner) = self.status_banner.clone() {
            egui::Frame::NONE
                .fill(egui::Color32::from_rgb(111, 53, 53))
                .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(175, 96, 96)))
                .corner_radius(8.0)
                .inner_margin(egui::Margin::symmetric(10, 8))
                .show(ui, |ui| {
                    ui.horizontal_wrapped(|ui| {
                        ui.label(
                            egui::RichText::new(format!(
                                "{}: {}",
                                err_label(banner.category()),
                                banner.message()
                            ))
                            .color(egui::Color32::WHITE),
                        );
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            if ui.button("Dismiss").clicked() {
                                self.status_banner = None;
                            }
                        });
                    });
                });
            ui.add_space(8.0);
        }
    }

    fn show_status_bar(&self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_bar").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.small("Status:");
                ui.small(egui::RichText::new(&self.status).weak());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.small(egui::RichText::new(&self.api_base_url).weak());
                });
            });
        });
    }

    fn show_upload_view(&mut self, ctx: &egui::Context) {
        let hovering = ctx.input(|i| !i.raw.hovered_files.is_empty());
        let dropped = ctx.input(|i| i.raw.dropped_files.first().and_then(|file| file.path.clone()));
        if let Some(path) = dropped {
            self.submit_file(path);
            return;
        }

        let mut browse = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.1).clamp(12.0, 80.0));

            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(420.0, 640.0));
                self.show_status_banner(ui);

                ui.heading("Professional Document Analysis");
                ui.weak("Get a summary, key clauses, risks and next steps for any contract.");
                ui.add_space(16.0);

                let (fill, stroke) = if hovering {
                    (
                        ACCENT.gamma_multiply(0.25),
                        egui::Stroke::new(2.0, ACCENT),
                    )
                } else {
                    (
                        ui.visuals().faint_bg_color,
                        egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color),
                    )
                };

                let zone = egui::Frame::NONE
                    .fill(fill)
                    .stroke(stroke)
                    .corner_radius(14.0)
                    .inner_margin(egui::Margin::symmetric(24, 36))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        ui.vertical_centered(|ui| {
                            ui.label(
                                egui::RichText::new("Drop your document here")
                                    .strong()
                                    .size(20.0),
                            );
                            ui.add_space(4.0);
                            if ui.link("or browse files from your computer").clicked() {
                                browse = true;
                            }
                            ui.add_space(10.0);
                            ui.small("PDF, DOC, DOCX  |  Max 10MB");
                        });
                    });
                if zone.response.interact(egui::Sense::click()).clicked() {
                    browse = true;
                }

                if let Some(err) = &self.upload_error {
                    ui.add_space(10.0);
                    egui::Frame::NONE
                        .fill(DANGER.gamma_multiply(0.15))
                        .stroke(egui::Stroke::new(1.0, DANGER))
                        .corner_radius(8.0)
                        .inner_margin(egui::Margin::symmetric(12, 10))
                        .show(ui, |ui| {
                            ui.set_width(ui.available_width());
                            ui.label(egui::RichText::new(err.message()).color(DANGER));
                        });
                }
            });
        });

        if browse {
            self.browse_for_file();
        }
    }

    fn show_analyzing_view(&mut self, ctx: &egui::Context) {
        let Some(view) = self.orchestrator.analyzing().cloned() else {
            return;
        };

        let mut cancel = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.08).clamp(12.0, 60.0));

            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(420.0, 600.0));
                ui.heading("Analyzing Document");
                ui.weak(view.file_name());
                ui.add_space(16.0);

                egui::Frame::NONE
                    .fill(ui.visuals().faint_bg_color)
                    .corner_radius(12.0)
                    .inner_margin(egui::Margin::symmetric(18, 14))
                    .show(ui, |ui| {
                        ui.set_width(ui.available_width());
                        for step in view.steps() {
                            step_row(ui, step);
                        }
                    });

                ui.add_space(14.0);
                let completed = view.completed_steps();
                ui.add(
                    egui::ProgressBar::new(completed as f32 / STEP_COUNT as f32)
                        .fill(ACCENT)
                        .desired_height(8.0),
                );
                ui.small(format!("{completed} of {STEP_COUNT} steps completed"));

                ui.add_space(14.0);
                if ui.button("Cancel").clicked() {
                    cancel = true;
                }
            });
        });

        if cancel {
            self.start_over();
        }
    }

    fn show_results_view(&mut self, ctx: &egui::Context) {
        let Some(analysis) = self.orchestrator.analysis().cloned() else {
            return;
        };

        let mut export = false;
        let mut another = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    self.show_status_banner(ui);

                    ui.horizontal(|ui| {
                        if ui.button("< Analyze Another Document").clicked() {
                            another = true;
                        }
                        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                            let btn = egui::Button::new(
                                egui::RichText::new("Download Report").strong(),
                            )
                            .fill(ACCENT);
                            if ui.add(btn).clicked() {
                                export = true;
                            }
                        });
                    });
                    ui.add_space(10.0);

                    results_header(ui, &analysis);
                    ui.add_space(12.0);

                    section_card(ui, "AI Summary", |ui| {
                        ui.label(&analysis.summary);
                    });
                    section_card(ui, "Key Clauses & Important Points", |ui| {
                        item_list(ui, &analysis.key_clauses, ListStyle::Numbered);
                    });
                    section_card(ui, "Potential Risks & Concerns", |ui| {
                        item_list(ui, &analysis.risks, ListStyle::Warning);
                    });
                    section_card(ui, "Recommended Next Steps", |ui| {
                        item_list(ui, &analysis.next_steps, ListStyle::Numbered);
                    });
                });
        });

        if export {
            self.request_export();
        }
        if another {
            self.start_over();
        }
    }

    fn show_error_view(&mut self, ctx: &egui::Context) {
        let message = self
            .orchestrator
            .error_message()
            .unwrap_or("Analysis failed")
            .to_string();
        let category = self
            .last_failure
            .as_ref()
            .map(UiError::category)
            .unwrap_or(UiErrorCategory::Unknown);

        let mut retry = false;
        egui::CentralPanel::default().show(ctx, |ui| {
            let avail = ui.available_size();
            ui.add_space((avail.y * 0.15).clamp(18.0, 120.0));
            ui.vertical_centered(|ui| {
                ui.set_width(avail.x.clamp(380.0, 520.0));
                ui.label(egui::RichText::new("!").size(36.0).strong().color(DANGER));
                ui.heading("Analysis Failed");
                ui.small(egui::RichText::new(err_label(category)).weak());
                ui.add_space(6.0);
                ui.label(message);
                ui.add_space(16.0);
                if ui
                    .add(egui::Button::new("Try Again").min_size(egui::vec2(140.0, 32.0)))
                    .clicked()
                {
                    retry = true;
                }
            });
        });

        if retry {
            self.start_over();
        }
    }
}

fn step_row(ui: &mut egui::Ui, step: &AnalysisStep) {
    ui.horizontal(|ui| {
        if step.completed {
            ui.label(egui::RichText::new("✔").color(SUCCESS));
            ui.label(egui::RichText::new(&step.label).color(SUCCESS));
        } else if step.current {
            ui.add(egui::Spinner::new().size(14.0));
            ui.label(egui::RichText::new(&step.label).color(ACCENT).strong());
        } else {
            ui.label(egui::RichText::new("○").weak());
            ui.label(egui::RichText::new(&step.label).weak());
        }
    });
}

fn results_header(ui: &mut egui::Ui, analysis: &DocumentAnalysis) {
    egui::Frame::NONE
        .fill(ui.visuals().faint_bg_color)
        .corner_radius(12.0)
        .inner_margin(egui::Margin::symmetric(18, 14))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new("Analysis Complete").size(22.0).strong());
            ui.horizontal_wrapped(|ui| {
                ui.label(egui::RichText::new(&analysis.file_name).strong());
                ui.weak(human_readable_bytes(analysis.file_size));
                ui.weak(format!(
                    "Analyzed {}",
                    analysis
                        .upload_date
                        .with_timezone(&chrono::Local)
                        .format("%b %-d, %Y %H:%M")
                ));
            });
        });
}

fn section_card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::NONE
        .stroke(egui::Stroke::new(
            1.0,
            ui.visuals().widgets.noninteractive.bg_stroke.color,
        ))
        .corner_radius(12.0)
        .inner_margin(egui::Margin::symmetric(18, 14))
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(egui::RichText::new(title).size(17.0).strong());
            ui.add_space(6.0);
            add_contents(ui);
        });
    ui.add_space(10.0);
}

#[derive(Clone, Copy)]
enum ListStyle {
    Numbered,
    Warning,
}

fn item_list(ui: &mut egui::Ui, items: &[String], style: ListStyle) {
    if items.is_empty() {
        ui.weak("None identified.");
        return;
    }
    for (index, item) in items.iter().enumerate() {
        ui.horizontal_wrapped(|ui| {
            match style {
                ListStyle::Numbered => {
                    ui.label(
                        egui::RichText::new(format!("{}.", index + 1))
                            .color(ACCENT)
                            .strong(),
                    );
                }
                ListStyle::Warning => {
                    ui.label(egui::RichText::new("⚠").color(DANGER));
                }
            }
            ui.label(item);
        });
    }
}

fn human_readable_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        return format!("{bytes} B");
    }
    if bytes < MB {
        return format_scaled_unit(bytes, KB, "KB");
    }
    if bytes < GB {
        return format_scaled_unit(bytes, MB, "MB");
    }
    format_scaled_unit(bytes, GB, "GB")
}

fn format_scaled_unit(bytes: u64, unit_size: u64, unit_label: &str) -> String {
    let value = bytes as f64 / unit_size as f64;
    let value_text = format!("{value:.1}");
    let compact_value = value_text.strip_suffix(".0").unwrap_or(&value_text);
    format!("{compact_value} {unit_label}")
}

impl eframe::App for DesktopGuiApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.process_ui_events();
        self.show_status_bar(ctx);

        match self.orchestrator.kind() {
            ViewKind::Upload => self.show_upload_view(ctx),
            ViewKind::Analyzing => self.show_analyzing_view(ctx),
            ViewKind::Results => self.show_results_view(ctx),
            ViewKind::Error => self.show_error_view(ctx),
        }

        if self.orchestrator.kind() == ViewKind::Analyzing {
            ctx.request_repaint_after(std::time::Duration::from_millis(16));
        } else {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

#[cfg(test)]
#[path = "../tests/app_tests.rs"]
mod tests;
