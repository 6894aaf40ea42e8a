//! OCR Structurer CLI - structure an OCR result or raw text file with an LLM agent.

use anyhow::Context;
use clap::Parser;
use ocr_structurer::ocr_input::InputDocument;
use ocr_structurer::outcome::ErrorResult;
use ocr_structurer::{output, FoundryClient, Outcome, Settings, Structurer};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ocr-structurer")]
#[command(about = "Structure OCR text into normalized JSON using a hosted LLM agent")]
#[command(version)]
struct Cli {
    /// OCR result JSON (with `status`/`text`/`file_path`) or a raw text file
    input: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present; its values take precedence over the environment
    dotenvy::dotenv_override().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "ocr_structurer=info".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    println!("=== OCR Text Structuring Agent ===\n");

    // Handled failures are printed, never turned into an exit code.
    if let Err(e) = run(&cli.input).await {
        error!("{:#}", e);
        println!("Error: {:#}", e);
        println!("\nDiagnostic trace:\n{:?}", e);
    }

    Ok(())
}

async fn run(input: &Path) -> anyhow::Result<()> {
    if !input.exists() {
        println!("Error: File not found: {}", input.display());
        return Ok(());
    }

    println!("Processing file: {}\n", input.display());

    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read input: {:?}", input))?;
    let document = InputDocument::detect(&content);

    let text_len = match &document {
        InputDocument::OcrResult(stage) => stage.text().chars().count(),
        InputDocument::RawText(text) => text.chars().count(),
    };
    println!("   Type: {}", document.label());
    println!("   Text length: {} characters\n", text_len);

    let settings = Settings::from_env();
    info!(
        "Using model {} via agent {}",
        settings.model, settings.agent_name
    );
    println!("   Model: {}\n", settings.model);
    let client = FoundryClient::from_env(&settings);
    let structurer = Structurer::new(client, settings);

    println!("Sending to agent for text extraction...");

    let source = input.to_string_lossy();
    let outcome = match &document {
        InputDocument::OcrResult(stage) => structurer.process_stage(stage, Some(&*source)).await,
        InputDocument::RawText(text) => structurer.structure_text(text, Some(&*source)).await,
    };

    match outcome {
        Outcome::Structured(structured) => {
            let lines = output::summary(&structured);
            let value = Value::Object(structured);

            println!("\n=== Structured JSON Output ===");
            println!("{}", serde_json::to_string_pretty(&value)?);

            let out = output::output_path(input);
            output::write_pretty(&out, &value)
                .with_context(|| format!("Failed to write output: {:?}", out))?;
            println!("\nStructured JSON saved to: {}", out.display());

            println!("\nSummary:");
            for (label, value) in lines {
                println!("   {}: {}", label, value);
            }
            println!("\nDone.");
        }
        Outcome::Failed(err) => print_failure(&err),
    }

    Ok(())
}

fn print_failure(err: &ErrorResult) {
    println!("\nFailed: {}", err.error);
    if let Some(details) = &err.error_details {
        println!("   Details: {}", details);
    }
    if let Some(raw) = &err.raw_response {
        println!("Raw response:\n{}", raw);
    }
}
