use stocksync_api::app::{self, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    stocksync_observability::init();

    let config = AppConfig::from_env()?;
    let bind_addr = config.bind_addr.clone();

    let (router, services) = app::build_app(config).await;

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(
        warehouse = %services.warehouse_id(),
        peer = %services.peer_warehouse_id(),
        addr = %listener.local_addr()?,
        "listening"
    );

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("shutdown signal received");
        })
        .await?;

    // Release the subscriber's background task before exiting.
    services.shutdown();
    Ok(())
}
