mod config;
mod lorawan;
mod register;
mod setup;
mod ttn;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ttn-provision")]
#[command(about = "Set up a TTN application and register letterbox sensor devices")]
#[command(version)]
struct Cli {
    /// Your TTN API key
    #[arg(long, env = "TTNTOKEN", hide_env_values = true)]
    ttntoken: String,

    /// Name of your app
    #[arg(long, default_value = "WB-LetterBoxSensor")]
    appname: String,

    /// TTN user or organization owning the app
    #[arg(long, env = "TTNORG")]
    org: Option<String>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Optional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the TTN cluster URL
    #[arg(long, env = "TTN_API_URL")]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Set up the receiver application in TTN
    Setup,
    /// Register a device to the application
    RegisterDevice {
        /// Device name (defaults to the generated DevEUI)
        #[arg(long)]
        devicename: Option<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = match &cli.config {
        Some(path) => config::Config::load(path)?,
        None => config::Config::default(),
    };
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }

    // Initialize tracing/logging
    let level = if cli.verbose {
        "debug"
    } else {
        config.logging.level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new(format!("warn,{}={}", env!("CARGO_CRATE_NAME"), level))
            }),
        )
        .init();

    info!("ttn-provision v{}", env!("CARGO_PKG_VERSION"));

    let client = ttn::TtnClient::new(
        &config.api.base_url,
        &cli.ttntoken,
        Duration::from_secs(config.api.timeout_secs),
    )?;

    match cli.command {
        Command::Setup => {
            let org = cli
                .org
                .context("no organization given: pass --org or set TTNORG")?;
            let outcome = setup::setup_application(&client, &cli.appname, &org, &config).await?;
            info!(
                "Application {} ready ({})",
                outcome.app_id,
                if outcome.created { "created" } else { "already existed" }
            );
        }
        Command::RegisterDevice { devicename } => {
            let registration =
                register::Registration::new(&cli.appname, devicename, &mut rand::thread_rng());
            register::register_device(&client, &registration, &config).await?;
            print!("{}", registration.firmware_snippet());
        }
    }

    Ok(())
}
