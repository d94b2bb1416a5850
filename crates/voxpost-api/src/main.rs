mod api_doc;
mod auth;
mod error;
mod handlers;
mod setup;
mod state;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use voxpost_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    init_tracing(&config);

    let (state, router) = setup::initialize_app(config).await?;

    setup::server::start_server(state, router).await?;

    Ok(())
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,voxpost_api=debug,sqlx=warn"));

    let registry = tracing_subscriber::registry().with(filter);

    // JSON logs in production for the aggregator, human-readable locally.
    if config.is_production() {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
