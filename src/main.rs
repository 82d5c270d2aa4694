use anyhow::Result;
use clap::Parser;
use reportsrv::{app_state, config::Config, logging, routes};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the listen port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.service.port = port;
    }

    logging::init(&config.log_level);

    info!(
        service = %config.service.name,
        db_host = %config.database.host,
        db_name = %config.database.name,
        "starting reportsrv"
    );

    let addr: SocketAddr = format!("{}:{}", config.service.host, config.service.port).parse()?;

    let state = app_state::create_app_state(config).await?;
    let app = routes::create_routes(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
