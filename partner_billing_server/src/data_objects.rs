use std::fmt::Display;

use chrono::{DateTime, Utc};
use partner_billing_engine::db_types::{NewPartner, PartnerId, PaymentUpdate};
use pbg_common::Money;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// The gateway webhook envelope. The gateway attaches plenty of other metadata; everything beyond the event type
/// and the payment id is ignored here, since payment state is re-fetched authoritatively anyway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: PaymentWebhookData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentWebhookData {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartnerRequest {
    pub id: String,
    pub name: String,
}

impl From<NewPartnerRequest> for NewPartner {
    fn from(req: NewPartnerRequest) -> Self {
        NewPartner::new(PartnerId::from(req.id), req.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeeRequest {
    /// The commission amount, in cents
    pub amount: Money,
    /// The order completion time. Defaults to the time of the request.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachPaymentRequest {
    pub payment_id: String,
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Opaque gateway metadata, stored verbatim alongside the invoice
    #[serde(default)]
    pub payment_data: Option<serde_json::Value>,
}

impl From<AttachPaymentRequest> for PaymentUpdate {
    fn from(req: AttachPaymentRequest) -> Self {
        PaymentUpdate { payment_id: req.payment_id, payment_method: req.payment_method, payment_data: req.payment_data }
    }
}
