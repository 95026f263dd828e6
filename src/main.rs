use std::sync::Arc;

use anyhow::{Error, Result, anyhow};
use push_dispatch::{
    api::{AppState, run_api_server},
    clients::{DataStore, expo::ExpoClient, health::HealthChecker, supabase::SupabaseClient},
    config::Config,
    dispatch::Dispatcher,
};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Error> {
    init_tracing();

    let config = Config::load()?;

    let store: Arc<dyn DataStore> = Arc::new(SupabaseClient::new(&config)?);
    let gateway = Arc::new(ExpoClient::new(&config)?);

    let state = Arc::new(AppState {
        dispatcher: Dispatcher::new(store.clone(), gateway, config.dispatch_concurrency),
        health_checker: HealthChecker::new(store),
    });

    run_api_server(state, config.server_port)
        .await
        .map_err(|e| anyhow!("Server error: {}", e))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
