use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{bail, Context, Result};
use clap::Parser;
use client_core::{
    load_settings, suggested_report_name, validate, AnalysisClient, AnalysisEvent, AnalysisRun,
    CompletionOutcome, Orchestrator, PdfReportExporter, ReportExporter, TickOutcome, UploadedFile,
};
use shared::domain::{AnalysisStep, DocumentAnalysis};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Analyze a legal document with the remote analysis service")]
struct Args {
    /// PDF or Word document to analyze.
    file: PathBuf,
    /// Overrides the analysis service base URL from settings and environment.
    #[arg(long)]
    api_base_url: Option<String>,
    /// Write a PDF report here. A directory gets the suggested file name.
    #[arg(long)]
    export: Option<PathBuf>,
    /// Print the assembled analysis record as JSON.
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let settings = load_settings()?.with_api_base_url(args.api_base_url.clone());
    let client = AnalysisClient::from_settings(&settings)?;
    tracing::info!(endpoint = %client.endpoint(), "analysis service configured");

    let uploaded = UploadedFile::from_path(&args.file)
        .with_context(|| format!("cannot open '{}'", args.file.display()))?;
    let validated = validate(uploaded)?;

    let mut orchestrator = Orchestrator::new();
    let ticket = orchestrator.begin_analysis(validated)?;
    eprintln!("Analyzing {}", ticket.file.name);

    let (tx, mut rx) = mpsc::unbounded_channel();
    let run = AnalysisRun::spawn(
        Arc::new(client),
        ticket.file,
        ticket.generation,
        settings.progress_interval(),
        tx,
    );

    loop {
        tokio::select! {
            event = rx.recv() => {
                let Some(event) = event else {
                    bail!("analysis ended without a result");
                };
                match event {
                    AnalysisEvent::Tick { generation } => {
                        if orchestrator.on_progress_tick(generation) == TickOutcome::Advanced {
                            if let Some(view) = orchestrator.analyzing() {
                                eprintln!("{}", progress_line(view.steps()));
                            }
                        }
                    }
                    AnalysisEvent::Finished { generation, outcome } => {
                        match orchestrator.complete(generation, outcome) {
                            CompletionOutcome::Completed => break,
                            CompletionOutcome::Failed => {
                                let message =
                                    orchestrator.error_message().unwrap_or("Analysis failed");
                                bail!("{message}");
                            }
                            CompletionOutcome::Stale => {}
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                orchestrator.start_over();
                run.cancel();
                bail!("analysis cancelled");
            }
        }
    }

    let Some(analysis) = orchestrator.analysis() else {
        bail!("analysis finished without a result");
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
    } else {
        print!("{}", render_report(analysis));
    }

    if let Some(target) = args.export.as_deref() {
        let exporter = PdfReportExporter;
        let path = export_target(target, analysis, exporter.extension());
        let bytes = exporter.export(analysis)?;
        tokio::fs::write(&path, bytes)
            .await
            .with_context(|| format!("failed to write report to '{}'", path.display()))?;
        eprintln!("Saved report to {}", path.display());
    }

    Ok(())
}

fn progress_line(steps: &[AnalysisStep]) -> String {
    let completed = steps.iter().filter(|step| step.completed).count();
    let current = steps
        .iter()
        .find(|step| step.current)
        .map(|step| step.label.as_str())
        .unwrap_or("Finishing up");
    format!("  [{completed}/{}] {current}...", steps.len())
}

fn export_target(target: &Path, analysis: &DocumentAnalysis, extension: &str) -> PathBuf {
    if target.is_dir() {
        target.join(suggested_report_name(analysis, extension))
    } else {
        target.to_path_buf()
    }
}

fn render_report(analysis: &DocumentAnalysis) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", analysis.file_name);
    let _ = writeln!(
        out,
        "{} bytes, analyzed {}",
        analysis.file_size,
        analysis.upload_date.format("%Y-%m-%d %H:%M UTC")
    );

    let _ = writeln!(out, "\nSummary\n{}", analysis.summary);
    render_section(&mut out, "Key Clauses", &analysis.key_clauses, true);
    render_section(&mut out, "Potential Risks", &analysis.risks, false);
    render_section(&mut out, "Recommended Next Steps", &analysis.next_steps, true);
    out
}

fn render_section(out: &mut String, title: &str, items: &[String], numbered: bool) {
    let _ = writeln!(out, "\n{title}");
    if items.is_empty() {
        let _ = writeln!(out, "  None identified.");
    }
    for (index, item) in items.iter().enumerate() {
        if numbered {
            let _ = writeln!(out, "  {}. {item}", index + 1);
        } else {
            let _ = writeln!(out, "  - {item}");
        }
    }
}
