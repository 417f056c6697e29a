//! Command-line interface for newsgate.
//!
//! Provides commands for serving the REST API, generating and processing
//! articles, checking pipeline status, fact-checking claims and managing
//! published evidence.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::adapters::{GoogleFactCheckAdapter, NewsApiAdapter, OpenAiAdapter};
use crate::config::{self, ResolvedConfig};
use crate::core::PipelineOrchestrator;
use crate::domain::{Evidence, GenerationRequest};
use crate::store::ContentStore;

/// newsgate - AI news pipeline with fact-check gatekeeping
#[derive(Parser, Debug)]
#[command(name = "newsgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP server
    Serve {
        /// Address to bind to (defaults to the configured address)
        #[arg(short, long)]
        bind: Option<String>,
    },

    /// Generate an article and run the pipeline on it
    Generate {
        /// Prompt text
        prompt: String,

        #[arg(short, long, default_value = "0.7")]
        temperature: f64,

        #[arg(long, default_value = "256")]
        token_limit: u32,
    },

    /// List generated articles, newest first
    List {
        /// Maximum number of articles to show
        #[arg(short, long, default_value = "20")]
        limit: u32,
    },

    /// Process an article that has not been processed yet
    Process {
        /// Artifact ID (UUID)
        artifact_id: String,
    },

    /// Show the pipeline status of an article
    Status {
        /// Artifact ID (UUID)
        artifact_id: String,
    },

    /// Fact-check a claim and store the result
    FactCheck {
        /// Claim text
        claim: String,
    },

    /// Inspect or override published evidence
    Evidence {
        #[command(subcommand)]
        command: EvidenceCommands,
    },

    /// Show resolved configuration (debug)
    Config,
}

/// Evidence-related subcommands
#[derive(Subcommand, Debug)]
pub enum EvidenceCommands {
    /// Show the evidence of a published record
    Show {
        /// Published content ID (UUID)
        published_id: String,
    },

    /// Replace the evidence of a published record from a JSON file
    Set {
        /// Published content ID (UUID)
        published_id: String,

        /// JSON file holding an evidence object
        #[arg(short, long)]
        file: PathBuf,
    },
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let cfg = config::config()?;

        match self.command {
            Commands::Serve { bind } => {
                let bind = bind.unwrap_or_else(|| cfg.bind.clone());
                let orchestrator = Arc::new(build_orchestrator(cfg)?);
                crate::server::serve(orchestrator, &bind).await
            }
            Commands::Generate {
                prompt,
                temperature,
                token_limit,
            } => {
                let request = GenerationRequest::new(prompt)
                    .with_temperature(temperature)
                    .with_token_limit(token_limit);
                generate(cfg, &request).await
            }
            Commands::List { limit } => list_artifacts(cfg, limit),
            Commands::Process { artifact_id } => {
                let orchestrator = build_orchestrator(cfg)?;
                let summary = orchestrator.process_content(parse_id(&artifact_id)?).await?;
                print_json(&summary)
            }
            Commands::Status { artifact_id } => show_status(cfg, &artifact_id).await,
            Commands::FactCheck { claim } => {
                let orchestrator = build_orchestrator(cfg)?;
                let result = orchestrator.manual_fact_check(&claim).await?;
                print_json(&result)
            }
            Commands::Evidence { command } => execute_evidence(cfg, command),
            Commands::Config => show_config(cfg),
        }
    }
}

/// Wire the adapters and store from configuration
pub fn build_orchestrator(cfg: &ResolvedConfig) -> Result<PipelineOrchestrator> {
    let store = Arc::new(
        ContentStore::open(&cfg.database)
            .with_context(|| format!("Failed to open database: {}", cfg.database.display()))?,
    );

    let generator = OpenAiAdapter::from_env()
        .unwrap_or_else(|e| {
            warn!("{:#}; generation calls will fail", e);
            OpenAiAdapter::new("")
        })
        .with_endpoint(&cfg.generation.endpoint)
        .with_model(&cfg.generation.model)
        .with_system_prompt(&cfg.generation.system_prompt);

    let fact_source = GoogleFactCheckAdapter::from_env()
        .unwrap_or_else(|e| {
            warn!("{:#}; fact-checks will degrade to an error verdict", e);
            GoogleFactCheckAdapter::new("")
        })
        .with_endpoint(&cfg.fact_check_endpoint);

    let mut orchestrator = PipelineOrchestrator::new(
        store,
        Arc::new(generator),
        Arc::new(fact_source),
        cfg.pipeline_settings(),
    );

    if cfg.news.enabled {
        if let Ok(news) = NewsApiAdapter::from_env() {
            let news = news
                .with_endpoint(&cfg.news.endpoint)
                .with_page_size(cfg.news.page_size);
            orchestrator = orchestrator.with_news(Arc::new(news));
        }
    }

    Ok(orchestrator)
}

fn parse_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).with_context(|| format!("Invalid ID: {}", raw))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Generate an article and report what the pipeline did with it
async fn generate(cfg: &ResolvedConfig, request: &GenerationRequest) -> Result<()> {
    let orchestrator = build_orchestrator(cfg)?;
    let report = orchestrator.submit_prompt(request).await?;

    println!("{}", report.artifact.title);
    println!();
    println!("{}", report.artifact.body);
    println!();
    eprintln!("Artifact:  {}", report.artifact.id);
    eprintln!("State:     {:?}", report.state);
    if let Some(fact_check) = &report.fact_check {
        eprintln!("Rating:    {} ({:.1})", fact_check.textual_rating, fact_check.verification_score);
    }
    if let Some(processing) = &report.processing {
        let categories: Vec<&str> = processing.categories.iter().map(String::as_str).collect();
        eprintln!("Categories: {}", categories.join(", "));
        if let Some(published_id) = processing.published_content_id {
            eprintln!("Published: {}", published_id);
        }
    }
    for error in &report.errors {
        eprintln!("[stage error] {}", error);
    }

    Ok(())
}

fn list_artifacts(cfg: &ResolvedConfig, limit: u32) -> Result<()> {
    let store = ContentStore::open(&cfg.database)?;
    let artifacts = store.artifacts(limit)?;

    if artifacts.is_empty() {
        println!("No articles found");
        return Ok(());
    }

    println!("{:<38} {:<22} TITLE", "ARTIFACT ID", "CREATED");
    println!("{}", "-".repeat(90));

    for artifact in artifacts {
        println!(
            "{:<38} {:<22} {}",
            artifact.id,
            artifact.created_at.format("%Y-%m-%d %H:%M:%S"),
            artifact.title
        );
    }

    Ok(())
}

/// Show the pipeline status of an artifact
async fn show_status(cfg: &ResolvedConfig, raw_id: &str) -> Result<()> {
    let orchestrator = build_orchestrator(cfg)?;
    let status = orchestrator.artifact_status(parse_id(raw_id)?).await?;

    println!("Artifact ID: {}", status.artifact_id);
    println!("State: {:?}", status.run.state);
    println!("Started: {}", status.run.started_at);
    if let Some(finished) = status.run.finished_at {
        println!("Finished: {}", finished);
    }
    if let Some(id) = status.processed_content_id {
        println!("Processed: {}", id);
    }
    if let Some(id) = status.published_content_id {
        println!("Published: {}", id);
    }
    if let Some(error) = &status.run.last_error {
        println!("Last error: {}", error);
    }
    println!("\nStage statuses:");
    for (stage, stage_status) in &status.run.stage_statuses {
        println!("  {}: {:?}", stage, stage_status);
    }

    Ok(())
}

/// Execute evidence subcommands
fn execute_evidence(cfg: &ResolvedConfig, command: EvidenceCommands) -> Result<()> {
    let store = ContentStore::open(&cfg.database)?;

    match command {
        EvidenceCommands::Show { published_id } => {
            let id = parse_id(&published_id)?;
            let published = store
                .published(id)?
                .with_context(|| format!("Published content not found: {}", id))?;

            if published.manually_overridden {
                eprintln!("[evidence set by an operator]");
            }
            print_json(&published.evidence)
        }
        EvidenceCommands::Set { published_id, file } => {
            let id = parse_id(&published_id)?;
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("Failed to read evidence file: {}", file.display()))?;
            let evidence: Evidence = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse evidence file: {}", file.display()))?;

            let updated = store.override_evidence(id, &evidence)?;
            eprintln!("Evidence updated for {}", updated.id);
            print_json(&updated.evidence)
        }
    }
}

/// Show the resolved configuration (for debugging)
fn show_config(cfg: &ResolvedConfig) -> Result<()> {
    let key_state = |name: &str| {
        if std::env::var(name).is_ok() {
            "set"
        } else {
            "missing"
        }
    };

    println!("newsgate configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", cfg.home.display());
    println!("  Database: {}", cfg.database.display());
    println!("  Journal:  {}", cfg.journal_dir.display());
    println!();
    println!("Server bind: {}", cfg.bind);
    println!();
    println!("Generation:");
    println!("  Endpoint: {}", cfg.generation.endpoint);
    println!("  Model:    {}", cfg.generation.model);
    println!("  API key:  {}", key_state("OPENAI_API_KEY"));
    println!();
    println!("Fact-check:");
    println!("  Endpoint: {}", cfg.fact_check_endpoint);
    println!("  API key:  {}", key_state("GOOGLE_FACT_CHECK_API_KEY"));
    println!();
    println!("News corroboration:");
    println!("  Enabled:   {}", cfg.news.enabled);
    println!("  Endpoint:  {}", cfg.news.endpoint);
    println!("  Page size: {}", cfg.news.page_size);
    println!("  API key:   {}", key_state("NEWS_API_KEY"));
    println!();
    println!("Limits:");
    println!("  Max prompt:  {} bytes", cfg.limits.max_prompt_bytes);
    println!("  Max tokens:  {}", cfg.limits.max_token_limit);
    println!("  Max body:    {} bytes", cfg.limits.max_body_bytes);
    println!("  Timeout:     {}s", cfg.limits.stage_timeout_seconds);
    println!();
    println!("Categories: {}", cfg.keywords.categories().collect::<Vec<_>>().join(", "));

    Ok(())
}
