use posh_support_conversation::{Dispatcher, InMemorySessionStore, RuleSet};
use posh_support_integration::{FileOrderSink, ShopeeChannel};
use posh_support_server::{
    config::ServerConfig,
    webhook::{self, AppState},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!("Loaded configuration");

    let rules = RuleSet::load(&config.rules_path);
    let sink = FileOrderSink::new(config.orders.clone());
    let dispatcher = Dispatcher::new(
        Arc::new(rules),
        Arc::new(InMemorySessionStore::new()),
        Arc::new(sink),
    );

    let channel = ShopeeChannel::new(config.shopee);
    if channel.config().access_token.is_none() {
        tracing::warn!(
            shop_id = channel.config().shop_id,
            "SHOPEE__ACCESS_TOKEN not set; replies will not be delivered"
        );
    }

    let app = webhook::router(AppState::new(dispatcher, Arc::new(channel)));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("server error");
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
