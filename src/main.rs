#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::uninlined_format_args)]

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use skillet::config::Config;
use skillet::{providers, repl};

fn parse_temperature(s: &str) -> std::result::Result<f64, String> {
    let t: f64 = s.parse().map_err(|e| format!("{e}"))?;
    if !(0.0..=2.0).contains(&t) {
        return Err("temperature must be between 0.0 and 2.0".to_string());
    }
    Ok(t)
}

/// skillet - coding agent that parses utensil calls out of streamed model
/// output.
#[derive(Parser, Debug)]
#[command(name = "skillet")]
#[command(version)]
#[command(about = "Coding agent driven by a line-oriented utensil protocol.", long_about = None)]
struct Cli {
    /// Task to run; omit to start the interactive REPL.
    task: Option<String>,

    /// Directory to load config.toml from.
    #[arg(long, global = true)]
    config_dir: Option<String>,

    /// Log at debug level.
    #[arg(long, global = true)]
    debug: bool,

    /// Override the configured model for this run.
    #[arg(long)]
    model: Option<String>,

    /// Override the sampling temperature (0.0-2.0).
    #[arg(long, value_parser = parse_temperature)]
    temperature: Option<f64>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the configured model catalog.
    Models,
    /// Show version, config path, and resolved settings.
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Install default crypto provider for Rustls TLS.
    // This prevents the error: "could not automatically determine the process-level CryptoProvider"
    // when both aws-lc-rs and ring features are available (or neither is explicitly selected).
    if let Err(e) = rustls::crypto::ring::default_provider().install_default() {
        eprintln!("Warning: Failed to install default crypto provider: {e:?}");
    }

    let cli = Cli::parse();

    if let Some(config_dir) = &cli.config_dir {
        if config_dir.trim().is_empty() {
            bail!("--config-dir cannot be empty");
        }
        std::env::set_var("SKILLET_CONFIG_DIR", config_dir);
    }

    // Initialize logging - respects RUST_LOG env var, defaults to INFO
    // (DEBUG with --debug).
    let default_filter = if cli.debug { "debug" } else { "info" };
    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("setting default subscriber failed");

    let mut config = Config::load_or_init().await?;

    if let Some(model) = &cli.model {
        if !config.models.contains_key(model) {
            bail!("Unknown model: {model}. Run 'skillet models' to list the catalog.");
        }
        config.default_model = Some(model.clone());
    }
    if let Some(temperature) = cli.temperature {
        config.default_temperature = temperature;
    }

    match cli.command {
        Some(Commands::Models) => {
            print_models(&config);
            Ok(())
        }
        Some(Commands::Status) => {
            print_status(&config);
            Ok(())
        }
        None => match cli.task {
            Some(task) => run_single_task(&config, &task).await,
            None => repl::run_session(&config).await,
        },
    }
}

async fn run_single_task(config: &Config, task: &str) -> Result<()> {
    let mut agent = repl::build_agent(config)?;
    let response = agent.run_task(task).await?;
    if !response.is_empty() {
        println!("\n{}\n", repl::colors::agent(format!("Agent: {response}")));
    }
    Ok(())
}

fn print_models(config: &Config) {
    println!("📋 Available Models");
    println!();
    let current = config.resolved_model();
    for (model_id, info) in &config.models {
        let marker = if *model_id == current { " ← current" } else { "" };
        println!("  {model_id}");
        println!("    {} - {}{marker}", info.display_name, info.description);
    }
    println!();
    println!("Switch with /model <id> inside the REPL, or set default_model in config.toml.");
}

fn print_status(config: &Config) {
    println!("🍳 skillet Status");
    println!();
    println!("Version:       {}", env!("CARGO_PKG_VERSION"));
    println!("Config:        {}", config.config_path.display());
    println!();
    println!("🤖 Model:          {}", config.resolved_model());
    println!("   Temperature:    {}", config.default_temperature);
    println!("   Max turns:      {}", config.agent.max_turns);
    println!("📊 Observability:  {}", config.observability.backend);
    println!(
        "🔑 API key:        {}",
        if providers::has_credential(config.api_key.as_deref()) {
            "configured"
        } else {
            "not set"
        }
    );
    if let Some(api_url) = &config.api_url {
        println!("🌐 API URL:        {api_url}");
    }
}
