use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use healthlens::config::{AnalyzerConfig, APP_NAME, APP_VERSION};
use healthlens::models::{Gender, PatientContext};
use healthlens::pipeline::analysis::{LlmClient, OllamaClient};
use healthlens::pipeline::ReportProcessor;

#[derive(Parser, Debug)]
#[command(
    name = "healthlens",
    version,
    about = "Explain a lab report PDF in plain language."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Analyze one report and print the result as JSON.
    Analyze(AnalyzeArgs),
    /// List the models the Ollama service can run.
    Models {
        /// Ollama base URL (overrides HEALTHLENS_OLLAMA_URL).
        #[arg(long)]
        ollama_url: Option<String>,
    },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// Path to the report PDF.
    #[arg(short, long)]
    input: PathBuf,

    /// Patient name from the request form.
    #[arg(long)]
    name: String,

    #[arg(long)]
    age: u32,

    /// male, female or other.
    #[arg(long)]
    gender: Gender,

    #[arg(long)]
    phone: String,

    /// Model to run (overrides HEALTHLENS_MODEL).
    #[arg(long)]
    model: Option<String>,

    /// Ollama base URL (overrides HEALTHLENS_OLLAMA_URL).
    #[arg(long)]
    ollama_url: Option<String>,

    /// Analysis deadline in seconds (overrides HEALTHLENS_ANALYSIS_TIMEOUT_SECS).
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Write the JSON here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

// The blocking HTTP client must not be built or dropped inside the async
// runtime, so `main` stays synchronous and drives the runtime by hand.
fn main() -> anyhow::Result<()> {
    healthlens::init_tracing();
    let cli = Cli::parse();
    let config = AnalyzerConfig::from_env().context("Invalid HEALTHLENS_* environment")?;

    tracing::debug!(app = APP_NAME, version = APP_VERSION, "Starting");

    match cli.command {
        Command::Analyze(args) => analyze(args, config),
        Command::Models { ollama_url } => list_models(ollama_url, config),
    }
}

fn analyze(args: AnalyzeArgs, mut config: AnalyzerConfig) -> anyhow::Result<()> {
    if let Some(url) = args.ollama_url {
        config.ollama_url = url;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(secs) = args.timeout_secs {
        anyhow::ensure!(secs > 0, "--timeout-secs must be positive");
        config.analysis_timeout = Duration::from_secs(secs);
    }

    let bytes = std::fs::read(&args.input)
        .with_context(|| format!("Could not read {}", args.input.display()))?;
    let context = PatientContext {
        name: args.name,
        age: args.age,
        gender: args.gender,
        phone_number: args.phone,
    };

    let client = OllamaClient::new(&config.ollama_url, config.http_timeout_secs)
        .context("Could not build the Ollama client")?;
    let processor = ReportProcessor::from_config(&config, Arc::new(client));

    let runtime = tokio::runtime::Runtime::new().context("Could not start the async runtime")?;
    let outcome = runtime.block_on(processor.analyze(&bytes, &context));
    // An abandoned analysis call may still be running; do not wait for it.
    runtime.shutdown_background();
    let report = outcome.context("Report analysis failed")?;

    let json = serde_json::to_string_pretty(&report).context("Could not serialize the report")?;
    match args.output {
        Some(path) => {
            std::fs::write(&path, json)
                .with_context(|| format!("Could not write {}", path.display()))?;
            tracing::info!(path = %path.display(), "Report written");
        }
        None => println!("{json}"),
    }

    Ok(())
}

fn list_models(ollama_url: Option<String>, mut config: AnalyzerConfig) -> anyhow::Result<()> {
    if let Some(url) = ollama_url {
        config.ollama_url = url;
    }

    let client = OllamaClient::new(&config.ollama_url, config.http_timeout_secs)
        .context("Could not build the Ollama client")?;
    let models = client
        .list_models()
        .with_context(|| format!("Could not list models at {}", client.base_url()))?;

    for model in models {
        let marker = if model.starts_with(&config.model) { "*" } else { " " };
        println!("{marker} {model}");
    }

    Ok(())
}
