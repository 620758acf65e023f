use std::path::PathBuf;

use clap::{Parser, Subcommand};

use form_relay::config::{load_config, validation::validate_config, ConfigError, RelayConfig};
use form_relay::lifecycle::{self, Role};
use form_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "form-relay")]
#[command(about = "Accept form posts over HTTP and record them in a JSON document", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `observability.log_level`.
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the HTTP front door and the store writer together (default)
    Run,
    /// Run only the HTTP front door
    FrontDoor,
    /// Run only the store writer
    StoreWriter,
}

impl From<Commands> for Role {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Run => Role::All,
            Commands::FrontDoor => Role::FrontDoor,
            Commands::StoreWriter => Role::StoreWriter,
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<RelayConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => RelayConfig::default(),
    };
    if let Some(level) = &cli.log_level {
        config.observability.log_level = level.clone();
        validate_config(&config).map_err(ConfigError::Validation)?;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let role = cli.command.map(Role::from).unwrap_or_default();

    let config = resolve_config(&cli)?;
    init_logging(&config.observability.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        role = ?role,
        http = %config.http.bind_address,
        transport = %config.transport.address,
        storage = %config.storage.path,
        "form-relay starting"
    );

    lifecycle::run(config, role).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
