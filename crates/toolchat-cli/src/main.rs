use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use toolchat_agents::{HealthReporter, ProviderRegistry, ToolRegistry};
use toolchat_config::{AppConfig, ConfigLoader};
use toolchat_gateway::{AppState, GatewayServer};
use toolchat_security::RedactingWriter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "toolchat")]
#[command(author, version, about = "Tool-augmented multi-provider chat gateway", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config.yml (default: ~/.toolchat/config.yml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway
    Serve {
        /// Host to bind to
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Print provider availability
    Providers,

    /// Print the tool schemas offered to providers
    Tools,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.log_json);

    match cli.command {
        Commands::Serve { host, port } => {
            let mut config = load_config(cli.config.as_ref())?;
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            tracing::info!(
                "starting toolchat gateway on {}:{}",
                config.gateway.host,
                config.gateway.port
            );
            let state = AppState::from_config(config).context("failed to initialise gateway")?;
            GatewayServer::new(state).run().await?;
        }
        Commands::Providers => {
            let config = load_config(cli.config.as_ref())?;
            let registry = ProviderRegistry::from_env(&config.providers);
            let report = HealthReporter::new(registry.into()).report();
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Tools => {
            let tools = ToolRegistry::builtin();
            println!("{}", serde_json::to_string_pretty(tools.list_tools())?);
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    ConfigLoader::load(path.map(PathBuf::as_path)).context("failed to load configuration")
}

fn init_tracing(verbose: u8, json: bool) {
    let default_filter = match verbose {
        0 => "info",
        1 => "info,toolchat_agents=debug,toolchat_gateway=debug,tower_http=debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let fmt = tracing_subscriber::fmt::layer().with_writer(RedactingWriter::stderr());
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt.json()).init();
    } else {
        registry.with(fmt).init();
    }
}
