//! Process command - verify a single document file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use veridok_core::{VerificationReport, VerificationStatus};

use super::{DocTypeArg, build_pipeline, load_config, load_document};

/// Arguments for the process command.
#[derive(Args)]
pub struct ProcessArgs {
    /// Input file (PDF or image)
    #[arg(required = true)]
    input: PathBuf,

    /// Declared document type
    #[arg(short, long, value_enum, default_value = "identity-card")]
    doc_type: DocTypeArg,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Model directory
    #[arg(short, long)]
    model_dir: Option<PathBuf>,

    /// Show confidence breakdown after the report
    #[arg(long)]
    show_confidence: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ProcessArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .unwrap(),
    );

    pb.set_message("Building OCR pipeline...");
    let pipeline = build_pipeline(config, args.model_dir.as_deref())?;

    pb.set_message("Verifying document...");
    let document = load_document(&args.input, args.doc_type.into())?;
    let report = pipeline.verify(&document)?;

    pb.finish_with_message("Done");

    let output = format_report(&report, args.format)?;
    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Combined confidence: {:.1}%  (OCR {:.1}%)",
            style("ℹ").blue(),
            report.confidence_score * 100.0,
            report.ocr_confidence * 100.0
        );
        println!(
            "{} Extraction method: {}",
            style("ℹ").blue(),
            report.extraction_method
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            report.processing_time_ms
        );
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}

pub(super) fn format_report(
    report: &VerificationReport,
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
        OutputFormat::Text => Ok(format_text(report)),
    }
}

fn format_text(report: &VerificationReport) -> String {
    let mut output = String::new();

    let status = match report.verification_status {
        VerificationStatus::Verified => style("VERIFIED").green(),
        VerificationStatus::PendingReview => style("PENDING_REVIEW").yellow(),
        VerificationStatus::Rejected => style("REJECTED").red(),
    };

    output.push_str(&format!("Document type: {}\n", report.document_type.tag()));
    output.push_str(&format!("Status: {}\n", status));
    output.push_str(&format!(
        "Confidence: {:.1}%\n",
        report.confidence_score * 100.0
    ));
    output.push_str(&format!("Authenticity: {:?}\n", report.authenticity));
    output.push_str(&format!(
        "Verified at: {}\n",
        report
            .verified_at
            .with_timezone(&chrono::Local)
            .format("%Y-%m-%d %H:%M:%S")
    ));
    if !report.page_chars.is_empty() {
        let counts: Vec<String> = report.page_chars.iter().map(|c| c.to_string()).collect();
        output.push_str(&format!("Page characters: {}\n", counts.join(", ")));
    }
    output.push('\n');

    if report.detected_fields.is_empty() {
        output.push_str("No fields detected.\n");
    } else {
        output.push_str("Fields:\n");
        for (name, value) in &report.detected_fields {
            let mark = match value.is_valid {
                Some(true) => " [valid]",
                Some(false) => " [INVALID]",
                None => "",
            };
            output.push_str(&format!("  {}: {}{}\n", name, value.normalized, mark));
        }
    }

    if !report.anomalies.is_empty() {
        output.push('\n');
        output.push_str("Anomalies:\n");
        for anomaly in &report.anomalies {
            output.push_str(&format!("  - {}\n", anomaly));
        }
    }

    output
}
