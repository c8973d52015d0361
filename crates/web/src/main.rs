//! Cukerun Web
//!
//! Serves the HTTP control API for dispatching cucumber-js runs.

use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cukerun_web::WebConfig;

#[derive(Parser)]
#[command(name = "cukerun-web")]
#[command(about = "HTTP control API for dispatching cucumber-js runs")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "CUKERUN_CONFIG", default_value = "cukerun.toml")]
    config: PathBuf,

    /// Listen address
    #[arg(short, long, env = "CUKERUN_LISTEN")]
    listen: Option<SocketAddr>,

    /// Listen port on the configured host
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// Directory containing *.feature files
    #[arg(long)]
    features_dir: Option<PathBuf>,

    /// Working directory for spawned runs
    #[arg(long)]
    workdir: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    info!("Cukerun web v{}", cukerun_common::VERSION);

    let mut config = WebConfig::load(&cli.config)?;
    if let Some(listen) = cli.listen {
        config.listen = listen;
    }
    if let Some(port) = cli.port {
        config.listen.set_port(port);
    }
    if let Some(dir) = cli.features_dir {
        config.features_dir = dir;
    }
    if let Some(dir) = cli.workdir {
        config.dispatcher.working_dir = Some(dir);
    }

    info!(
        "Runs use `{}` over {}",
        config.dispatcher.command.join(" "),
        config.dispatcher.feature_glob
    );

    cukerun_web::serve(config).await
}
