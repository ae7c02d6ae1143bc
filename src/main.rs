use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use avatar_gateway::api::health;
use avatar_gateway::{ApiServer, ApiState, ChatPipeline, Config};

/// Avatar Gateway - chat backend for a talking, lip-synced avatar
#[derive(Parser)]
#[command(name = "avatar-gateway", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Config file path (defaults to the user config directory)
    #[arg(short, long, env = "AVATAR_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Report credentials and external binaries; fails if anything is missing
    Check,
    /// Answer one message through the full pipeline and print the response
    Say {
        /// Message to answer
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity; RUST_LOG wins when set
    let filter = match cli.verbose {
        0 => "info,avatar_gateway=info",
        1 => "info,avatar_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    tracing::debug!(?config, "loaded configuration");

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Check => check(&config).await,
        Command::Say { text } => say(&config, &text).await,
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        openai = config.api_keys.openai.is_some(),
        elevenlabs = config.api_keys.elevenlabs.is_some(),
        voice = %config.tts.voice_id,
        model = %config.llm.model,
        "API keys configured"
    );
    if !config.api_keys.is_complete() {
        tracing::warn!("API keys missing, chat will answer with a reminder");
    }

    let port = config.server.port;
    let state = ApiState::from_config(Arc::new(config))?;
    ApiServer::new(Arc::new(state), port).run().await?;

    Ok(())
}

async fn check(config: &Config) -> anyhow::Result<()> {
    let report = health::check(config).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    if !report.is_ready() {
        anyhow::bail!("gateway is not ready: missing API keys or binaries");
    }
    Ok(())
}

async fn say(config: &Config, text: &str) -> anyhow::Result<()> {
    let pipeline = ChatPipeline::from_config(config)?;
    let response = pipeline.respond(Some(text)).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}
