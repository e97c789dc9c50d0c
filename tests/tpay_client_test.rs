//! Integration tests for the Tpay OpenAPI client
//!
//! Tpay is stood in for by a wiremock server; the provider is pointed at it
//! through the `api_base_url` option.

use rust_decimal::Decimal;
use serde_json::json;
use std::time::Duration;
use tpay_payment_provider::payments::types::{
    InitiatePaymentInput, PaymentDataInput, PaymentSessionStatus, RefundPaymentInput,
};
use tpay_payment_provider::{PaymentProvider, ProviderError, TpayOptions, TpayProvider};
use wiremock::matchers::{body_json, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_token(server: &MockServer, expires_in: i64, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path("/oauth/auth"))
        .and(body_string_contains("client_id=01HQ-client"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "issued_at": 1_760_700_000,
            "scope": "read write",
            "token_type": "Bearer",
            "expires_in": expires_in,
            "client_id": "01HQ-client",
            "access_token": "test-token",
        })))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn setup_server() -> MockServer {
    let server = MockServer::start().await;
    mount_token(&server, 7200, 1).await;
    server
}

fn setup_provider(server: &MockServer) -> TpayProvider {
    let options = TpayOptions::parse(&json!({
        "client_id": "01HQ-client",
        "client_secret": "secret",
        "return_url": "https://shop.example.com/checkout/done",
        "callback_url": "https://shop.example.com/hooks/payment/tpay",
        "api_base_url": server.uri(),
    }))
    .expect("valid options");

    TpayProvider::from_options(options, Duration::from_secs(5)).expect("provider")
}

fn transaction_body(status: &str) -> serde_json::Value {
    json!({
        "result": "success",
        "requestId": "b1d5f7c3",
        "transactionId": "01HQ-TX",
        "title": "TR-ABC-123",
        "posId": "ps_1",
        "status": status,
        "amount": 49.99,
        "currency": "PLN",
        "transactionPaymentUrl": "https://secure.sandbox.tpay.com/?title=TR-ABC-123",
    })
}

fn stored_data() -> serde_json::Value {
    json!({
        "session_id": "s1",
        "amount": "49.99",
        "currency": "PLN",
        "tx_id": "TR-ABC-123",
        "url": "https://secure.sandbox.tpay.com/?title=TR-ABC-123",
    })
}

#[tokio::test]
async fn test_initiate_then_status_reuses_token() {
    let server = setup_server().await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_body("pending")))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_body("correct")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = setup_provider(&server);

    let output = provider
        .initiate_payment(InitiatePaymentInput {
            amount: Decimal::new(4999, 2),
            currency_code: "PLN".to_string(),
            data: Some(json!({
                "session_id": "s1",
                "customer_name": "Jan Kowalski",
                "email": "jan@example.com",
            })),
        })
        .await
        .unwrap();

    assert_eq!(output.id, "TR-ABC-123");
    assert_eq!(output.status, PaymentSessionStatus::Pending);

    let status = provider
        .get_payment_status(PaymentDataInput::new(output.data))
        .await
        .unwrap();
    assert_eq!(status.status, PaymentSessionStatus::Authorized);
}

#[tokio::test]
async fn test_unknown_transaction_is_not_found() {
    let server = setup_server().await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "result": "failed",
            "errors": [{ "errorCode": "transaction_not_found", "errorMessage": "Not found" }],
        })))
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    let err = provider
        .get_payment_status(PaymentDataInput::new(stored_data()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::NotFound { .. }));
}

#[tokio::test]
async fn test_refund_sends_amount() {
    let server = setup_server().await;

    Mock::given(method("POST"))
        .and(path("/transactions/TR-ABC-123/refunds"))
        .and(body_json(json!({ "amount": 10.5 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "requestId": "a1",
            "transactionId": "01HQ-TX",
            "title": "TR-ABC-123",
            "status": "refund",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    let output = provider
        .refund_payment(RefundPaymentInput {
            amount: Decimal::new(105, 1),
            data: Some(stored_data()),
        })
        .await
        .unwrap();

    assert_eq!(output.data, Some(stored_data()));
}

#[tokio::test]
async fn test_cancel_pending_transaction() {
    let server = setup_server().await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_body("pending")))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/transactions/TR-ABC-123/cancel"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "result": "success",
            "requestId": "c1",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    provider
        .cancel_payment(PaymentDataInput::new(stored_data()))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_server_error_is_retryable_gateway_error() {
    let server = setup_server().await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    let err = provider
        .capture_payment(PaymentDataInput::new(stored_data()))
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Gateway { .. }));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_expired_token_is_refreshed() {
    let server = MockServer::start().await;
    // expires inside the refresh margin, so every call needs a new token
    mount_token(&server, 0, 2).await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_body("pending")))
        .expect(2)
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    for _ in 0..2 {
        let status = provider
            .get_payment_status(PaymentDataInput::new(stored_data()))
            .await
            .unwrap();
        assert_eq!(status.status, PaymentSessionStatus::Pending);
    }
}

#[tokio::test]
async fn test_rejected_token_is_dropped() {
    let server = MockServer::start().await;
    mount_token(&server, 7200, 2).await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "result": "failed",
            "errors": [{ "errorCode": "invalid_token", "errorMessage": "Token expired" }],
        })))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/transactions/TR-ABC-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(transaction_body("correct")))
        .expect(1)
        .mount(&server)
        .await;

    let provider = setup_provider(&server);

    let err = provider
        .get_payment_status(PaymentDataInput::new(stored_data()))
        .await
        .unwrap_err();
    assert!(matches!(err, ProviderError::Gateway { .. }));
    assert!(!err.is_retryable());

    let status = provider
        .get_payment_status(PaymentDataInput::new(stored_data()))
        .await
        .unwrap();
    assert_eq!(status.status, PaymentSessionStatus::Authorized);
}

#[tokio::test]
async fn test_not_found_on_create_is_gateway_error() {
    let server = setup_server().await;

    Mock::given(method("POST"))
        .and(path("/transactions"))
        .respond_with(ResponseTemplate::new(404).set_body_string("no such endpoint"))
        .mount(&server)
        .await;

    let provider = setup_provider(&server);
    let err = provider
        .initiate_payment(InitiatePaymentInput {
            amount: Decimal::new(4999, 2),
            currency_code: "PLN".to_string(),
            data: Some(json!({
                "session_id": "s1",
                "customer_name": "Jan Kowalski",
                "email": "jan@example.com",
            })),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, ProviderError::Gateway { .. }));
    assert!(!err.to_string().contains("s1 not found"));
}
