use anyhow::Context;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    shopper_observability::init();

    let services = shopper_api::app::services::build_services().await;
    let app = shopper_api::app::build_app(services);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:8080")
        .await
        .context("failed to bind 0.0.0.0:8080")?;

    tracing::info!("listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
