use std::sync::Arc;

use amurex_api::config::{Config, redact};
use amurex_api::db::{PgStore, connect};
use mimalloc::MiMalloc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cfg = Config::load()?;

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cfg.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    info!(
        listen_addr = %cfg.listen_addr,
        proxy = %cfg.proxy.as_ref().map(|u| u.as_str()).unwrap_or("<none>"),
        loglevel = %cfg.loglevel,
        openai_model = %cfg.openai.model,
        openai_key = %redact(&cfg.openai.api_key),
        resend_key = %redact(&cfg.resend.api_key),
        supabase_url = %cfg.supabase.url,
        daily_limit = cfg.openai.daily_limit,
    );
    if cfg.google.legacy.client_id.is_empty() {
        warn!("no legacy Google client configured; users flagged 'old' cannot connect");
    }

    let pool = connect(&cfg.database_url).await?;
    let store = PgStore::new(pool);
    if cfg.init_schema {
        store.init_schema().await?;
    }

    let client = amurex_api::api::build_http_client(&cfg)?;
    let addr = cfg.listen_addr.clone();
    let state = amurex_api::AmurexState::new(Arc::new(store), client, cfg);
    let app = amurex_api::amurex_router(state);

    let listener = TcpListener::bind(&addr).await?;
    info!("HTTP server listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
