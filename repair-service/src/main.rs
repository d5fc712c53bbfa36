use repair_core::observability::init_tracing;
use repair_service::config::RepairConfig;
use repair_service::services::init_metrics;
use repair_service::startup::Application;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = RepairConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    init_tracing(
        "repair-service",
        &config.common.log_level,
        config.common.otlp_endpoint.as_deref(),
    );
    init_metrics()?;

    let application = Application::build(config).await.map_err(|e| {
        tracing::error!("Failed to build application: {}", e);
        e
    })?;
    application.run_until_stopped().await?;

    Ok(())
}
