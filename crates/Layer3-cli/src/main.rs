//! Armory CLI - Main entry point
//!
//! - `armory serve`: MCP stdio 서버 (스키마 기반 프론트엔드)
//! - 나머지 서브커맨드: 직접 호출 프론트엔드

mod cli;

use armory_foundation::BridgeConfig;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Armory - plugin registration and async execution bridge for a C2 backend
#[derive(Parser, Debug)]
#[command(name = "armory")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (default: ~/.config/armory/armory.json + .armory/armory.json)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Backend base URL (overrides env and config)
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Backend API token (overrides env and config)
    #[arg(long, global = true)]
    api_token: Option<String>,

    /// Workspace root containing Skills/ and server/
    #[arg(short, long, global = true)]
    workspace: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the tool surface over MCP (JSON-RPC on stdin/stdout)
    Serve,

    /// List available tools and their argument schemas
    Tools,

    /// Call a tool with JSON arguments (schema-validated)
    Call {
        /// Tool name (e.g. list_plugins)
        tool: String,

        /// JSON object of arguments
        #[arg(default_value = "{}")]
        arguments: String,
    },

    /// Compile and register a plugin from a Rust source file
    Register {
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        description: String,

        /// Path to the plugin's lib.rs
        #[arg(long)]
        source: PathBuf,

        /// Category (Discovery/Credential/Post-Ex)
        #[arg(long)]
        category: Option<String>,

        /// Parameter as name:type[=default] (type: string, int, bool)
        #[arg(long = "param", value_parser = cli::parse_param)]
        params: Vec<armory_core::PluginParam>,
    },

    /// Run a registered plugin on an endpoint (returns a task id)
    Run {
        /// Endpoint UUID
        uuid: String,

        plugin_id: String,

        /// Plugin arguments (JSON string for wasm plugins)
        #[arg(default_value = "")]
        args: String,
    },

    /// Fetch the result of a plugin run
    Result {
        task_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Initialize logging (stdout은 MCP 스트림 전용)
    let log_level = if args.debug { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();

    let config = load_config(&args)?;

    cli::run(args.command, &config).await
}

/// 설정 파일 → 환경 변수 → CLI 플래그 순으로 적용
fn load_config(args: &Args) -> anyhow::Result<BridgeConfig> {
    let mut config = match &args.config {
        Some(path) => BridgeConfig::load_from(path)?,
        None => BridgeConfig::load()?,
    };

    if let Some(url) = &args.backend_url {
        config = config.base_url(url.clone());
    }
    if let Some(token) = &args.api_token {
        config = config.api_token(token.clone());
    }
    if let Some(root) = &args.workspace {
        config = config.workspace_root(root.clone());
    }

    config.validate()?;
    Ok(config)
}
