//! HTTP surface: health check and the Tpay notification endpoint

pub mod health;
pub mod webhook;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::payments::traits::PaymentProvider;
use crate::workflow::PaymentWorkflow;

pub const TPAY_WEBHOOK_PATH: &str = "/hooks/payment/tpay";

#[derive(Clone)]
pub struct AppState {
    pub provider: Arc<dyn PaymentProvider>,
    pub workflow: Arc<dyn PaymentWorkflow>,
    pub environment: String,
    pub sandbox: bool,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_check))
        .route(TPAY_WEBHOOK_PATH, post(webhook::tpay_webhook))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .with_state(state)
}
