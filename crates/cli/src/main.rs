use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cli::{export, server, watch};
use dashboard_core::config;
use dashboard_core::config::AppConfig;
use dashboard_core::markdown;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Scan { output, json } => run_scan(&cfg, output, json),
        Commands::Render { file } => run_render(&file),
        Commands::Serve { bind } => server::serve(&cfg, bind).await,
        Commands::Watch { output, debounce_ms } => {
            let workspace = cfg.workspace;
            tokio::task::spawn_blocking(move || {
                watch::watch_workspace(workspace, output, Duration::from_millis(debounce_ms))
            })
            .await?
        }
    }
}

#[derive(Parser)]
#[command(name = "workspace-dashboard")]
#[command(about = "Workspace snapshot generator and dashboard API", long_about = None)]
struct Cli {
    /// Path to config TOML
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan department workspaces and write the snapshot JSON
    Scan {
        /// Override the snapshot output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Output JSON summary
        #[arg(long)]
        json: bool,
    },
    /// Render a Markdown file to an HTML fragment on stdout
    Render {
        file: PathBuf,
    },
    /// Run the dashboard HTTP server
    Serve {
        /// Listen address, e.g. 0.0.0.0:3000
        #[arg(long)]
        bind: Option<String>,
    },
    /// Rescan and rewrite the snapshot whenever the workspace changes
    Watch {
        /// Override the snapshot output path
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Quiet period before a rescan starts
        #[arg(long, default_value_t = 500)]
        debounce_ms: u64,
    },
}

fn run_scan(cfg: &AppConfig, output: Option<PathBuf>, json: bool) -> Result<()> {
    let summary = export::run_export(&cfg.workspace, output.as_deref())?;
    if json {
        let summary_json = serde_json::json!({
            "status": "ok",
            "output": summary.output,
            "minified": summary.minified,
            "departments": summary.departments,
            "active_departments": summary.active_departments,
            "files": summary.files,
        });
        println!("{}", serde_json::to_string_pretty(&summary_json)?);
    } else {
        println!(
            "scan: {} departments ({} active), {} files -> {}",
            summary.departments,
            summary.active_departments,
            summary.files,
            summary.output.display()
        );
    }
    Ok(())
}

fn run_render(file: &Path) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("Failed to read {:?}", file))?;
    println!("{}", markdown::render(&text));
    Ok(())
}
