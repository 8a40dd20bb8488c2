use std::error::Error;
use std::sync::Arc;

use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing::info;

use gembridge_core::{Core, ModelCatalog};
use gembridge_provider_impl::CopilotProvider;

mod cli;
mod config;

use crate::cli::Cli;
use crate::config::GlobalConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.log_json);
    if let Err(err) = run(cli).await {
        eprintln!("gembridge failed: {err}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn Error + Send + Sync>> {
    let config = GlobalConfig::load(&cli)?;
    info!(
        host = %config.host,
        port = config.port,
        base_url = %config.base_url,
        proxy = %config.proxy.as_deref().unwrap_or(""),
        models = %config.models.join(","),
        timeout_secs = config.timeout_secs,
        "config loaded"
    );

    let provider = Arc::new(CopilotProvider::new(config.copilot()));
    let models = ModelCatalog::new(config.models.iter().cloned());
    let core = Core::new(provider, models, config.proxy.clone());
    let app = core.router().layer(TraceLayer::new_for_http());

    let bind = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    info!(addr = %bind, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("gembridge=info,tower_http=info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
