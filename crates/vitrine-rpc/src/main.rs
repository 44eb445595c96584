mod handlers;
mod protocol;
mod renderers;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use handlers::HandlerRegistry;
use protocol::parse_request;
use vitrine::{RegistryConfig, ThemeService};

#[derive(Parser, Debug)]
#[command(name = "vitrine-rpc", version, about = "JSON-RPC bridge to the vitrine theme registry")]
struct Args {
    /// Registry config file (default: ~/.vitrine/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the plugins root directory
    #[arg(long)]
    plugins_root: Option<PathBuf>,

    /// Override the registry data file
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Log filter used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // stdout carries JSON-RPC; logs go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &args.config {
        Some(path) => RegistryConfig::load(path).await?,
        None => RegistryConfig::load_default().await?,
    };
    if let Some(root) = args.plugins_root {
        config.plugins_root = root;
    }
    if let Some(data_file) = args.data_file {
        config.data_file = data_file;
    }

    let renderers = renderers::builtin(&config.fallback_theme);
    let service = ThemeService::open(config, renderers).await?;
    let registry = HandlerRegistry::new(Arc::new(service));
    info!("vitrine-rpc ready on stdio");

    let stdin = tokio::io::stdin();
    let mut reader = BufReader::new(stdin);
    let mut stdout = tokio::io::stdout();
    let mut line = String::new();

    loop {
        line.clear();
        let n = reader.read_line(&mut line).await?;
        if n == 0 {
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        let Some(output) = process_line(&registry, trimmed).await? else {
            continue;
        };
        stdout.write_all(output.as_bytes()).await?;
        stdout.write_all(b"\n").await?;
        stdout.flush().await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}

/// Handle one input line; `None` when nothing should be written back
/// (a lone notification, or a batch made only of notifications).
async fn process_line(registry: &HandlerRegistry, line: &str) -> anyhow::Result<Option<String>> {
    let requests = match parse_request(line) {
        Ok(requests) => requests,
        Err(response) => return Ok(Some(serde_json::to_string(&response)?)),
    };

    let is_batch = line.starts_with('[');
    let mut responses = registry.handle_all(&requests).await;

    let output = match responses.len() {
        0 => None,
        1 if !is_batch => Some(serde_json::to_string(&responses.remove(0))?),
        _ => Some(serde_json::to_string(&responses)?),
    };
    Ok(output)
}
