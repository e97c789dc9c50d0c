use std::net::SocketAddr;
use std::sync::Arc;

use tpay_payment_provider::api::{self, AppState};
use tpay_payment_provider::config::Config;
use tpay_payment_provider::payments::providers::TpayProvider;
use tpay_payment_provider::workflow::{HttpWorkflow, LoggingWorkflow, PaymentWorkflow};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting Tpay webhook server");
    tracing::info!("Environment: {}", config.server.environment);
    tracing::info!("Tpay sandbox: {}", config.tpay.sandbox);

    let sandbox = config.tpay.sandbox;
    let provider = TpayProvider::from_options(config.tpay.clone(), config.tpay_timeout)?;

    let workflow: Arc<dyn PaymentWorkflow> = match &config.workflow.url {
        Some(url) => {
            tracing::info!("Forwarding webhook results to {}", url);
            Arc::new(HttpWorkflow::new(url.clone(), config.workflow.timeout)?)
        }
        None => {
            tracing::warn!("HOST_WORKFLOW_URL not set, webhook results will only be logged (development)");
            Arc::new(LoggingWorkflow)
        }
    };

    let app = api::router(AppState {
        provider: Arc::new(provider),
        workflow,
        environment: config.server.environment.clone(),
        sandbox,
    });

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
