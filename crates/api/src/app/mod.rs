//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `config.rs`: process configuration from environment variables
//! - `services.rs`: infrastructure wiring (stores, relay, gateway, subscriber)
//! - `routes/`: HTTP routes + handlers (one file per area)
//! - `dto.rs`: request DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};

pub mod config;
pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

pub use config::AppConfig;
pub use services::AppServices;

use stocksync_relay::InMemoryRelay;

/// Build the full HTTP router (public entrypoint used by `main.rs`).
pub async fn build_app(config: AppConfig) -> (Router, Arc<AppServices>) {
    build_app_with_relay(config, InMemoryRelay::new()).await
}

/// Like [`build_app`], but with a caller-provided in-memory relay so
/// several in-process warehouses can share one (dev/test). Ignored when
/// persistent stores are selected; those talk to the real broker.
pub async fn build_app_with_relay(config: AppConfig, relay: InMemoryRelay) -> (Router, Arc<AppServices>) {
    let services = Arc::new(services::build_services(config, relay).await);

    let router = Router::new()
        .route("/health", get(routes::system::health))
        .merge(routes::router())
        .layer(Extension(services.clone()));

    (router, services)
}
