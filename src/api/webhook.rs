use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use http::{header::CONTENT_TYPE, HeaderMap, StatusCode};
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{error, warn};

use super::AppState;
use crate::payments::types::WebhookPayload;

/// Acknowledgement body Tpay expects from a notification endpoint
pub const ACK_BODY: &str = "TRUE";

/// Receives Tpay transaction notifications
///
/// The body is taken as raw bytes so checksum verification sees exactly
/// what Tpay sent.
pub async fn tpay_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let payload = WebhookPayload {
        data: parse_body(&headers, &body),
        raw_data: body.to_vec(),
        headers: header_map(&headers),
    };

    let result = match state.provider.get_webhook_action_and_data(payload).await {
        Ok(result) if result.is_actionable() => result,
        Ok(result) => {
            warn!("Tpay webhook produced no actionable result: {:?}", result.action);
            return StatusCode::BAD_REQUEST.into_response();
        }
        Err(e) => {
            warn!("Tpay webhook rejected: {}", e);
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    if let Err(e) = state.workflow.process_payment(&result).await {
        error!("Error processing Tpay webhook: {}", e);
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }

    (StatusCode::OK, ACK_BODY).into_response()
}

fn parse_body(headers: &HeaderMap, body: &[u8]) -> Value {
    let is_json = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.contains("json"))
        .unwrap_or(false);

    if is_json {
        return serde_json::from_slice(body).unwrap_or(Value::Null);
    }

    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(body) {
        Ok(pairs) => Value::Object(
            pairs
                .into_iter()
                .map(|(k, v)| (k, Value::String(v)))
                .collect::<Map<String, Value>>(),
        ),
        Err(_) => Value::Null,
    }
}

fn header_map(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect()
}
