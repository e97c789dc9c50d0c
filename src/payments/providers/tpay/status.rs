//! Tpay status vocabulary mapped onto host statuses
//!
//! Both mappings are total: unknown values fall through to pending so a
//! session is never rejected because Tpay added a status.

use crate::payments::options::PaidAction;
use crate::payments::types::{PaymentSessionStatus, WebhookAction};

/// Transaction statuses that mean the payer has paid
const PAID_STATUSES: &[&str] = &["correct", "paid"];

pub fn is_paid(transaction_status: &str) -> bool {
    PAID_STATUSES.contains(&transaction_status)
}

/// Map a transaction status from the OpenAPI to a session status
pub fn session_status(transaction_status: &str) -> PaymentSessionStatus {
    match transaction_status {
        s if is_paid(s) => PaymentSessionStatus::Authorized,
        "canceled" => PaymentSessionStatus::Canceled,
        _ => PaymentSessionStatus::Pending,
    }
}

/// Map a notification `tr_status` to the host webhook action
pub fn webhook_action(tr_status: &str, paid_action: PaidAction) -> WebhookAction {
    match tr_status {
        "TRUE" => match paid_action {
            PaidAction::Authorized => WebhookAction::Authorized,
            PaidAction::Captured => WebhookAction::Captured,
        },
        "FALSE" => WebhookAction::Canceled,
        _ => WebhookAction::Pending,
    }
}
