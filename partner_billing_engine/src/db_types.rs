use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
use pbg_common::Money;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------     PartnerId       ---------------------------------------------------------
/// A lightweight wrapper around the stable partner identifier assigned by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct PartnerId(pub String);

impl Display for PartnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<S: Into<String>> From<S> for PartnerId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl PartnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------      Partner        ---------------------------------------------------------
/// A store affiliated with the platform. The partner owns its fee ledger and invoice history; the billing engine
/// only ever reads partner attributes (`created_at` acts as the accrual-window origin before the first invoice).
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------     NewPartner      ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPartner {
    /// The partner id as assigned by the platform
    pub id: PartnerId,
    pub name: String,
    /// The time the partner was registered on the platform
    pub created_at: DateTime<Utc>,
}

impl NewPartner {
    pub fn new(id: PartnerId, name: String) -> Self {
        Self { id, name, created_at: Utc::now() }
    }
}

//--------------------------------------        Fee          ---------------------------------------------------------
/// One platform commission charged to a partner. Fees are written by the order-fulfillment flow at order completion
/// and are settled exactly once, by exactly one invoice.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Fee {
    pub id: i64,
    pub partner_id: PartnerId,
    pub amount: Money,
    pub settled: bool,
    /// The invoice that consumed this fee. Set in the same transaction that flips `settled`.
    pub invoice_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

//--------------------------------------       NewFee        ---------------------------------------------------------
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFee {
    pub partner_id: PartnerId,
    pub amount: Money,
    /// The order completion time. Window membership is decided on this, not on insertion time.
    pub created_at: DateTime<Utc>,
}

impl NewFee {
    pub fn new(partner_id: PartnerId, amount: Money) -> Self {
        Self { partner_id, amount, created_at: Utc::now() }
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

//--------------------------------------   InvoiceStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// The invoice has been issued and no approved payment has been received for it.
    Pending,
    /// An approved gateway payment has been reconciled against the invoice.
    Paid,
    /// The invoice aged out without payment. Set by a time-based external process, never by this engine.
    Overdue,
}

impl Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InvoiceStatus::Pending => write!(f, "Pending"),
            InvoiceStatus::Paid => write!(f, "Paid"),
            InvoiceStatus::Overdue => write!(f, "Overdue"),
        }
    }
}

impl From<String> for InvoiceStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid invoice status: {value}. But this conversion cannot fail. Defaulting to Pending");
            InvoiceStatus::Pending
        })
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid invoice status: {0}")]
pub struct ConversionError(String);

impl FromStr for InvoiceStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Paid" => Ok(Self::Paid),
            "Overdue" => Ok(Self::Overdue),
            s => Err(ConversionError(format!("Invalid invoice status: {s}"))),
        }
    }
}

//--------------------------------------      Invoice        ---------------------------------------------------------
/// A partner's billing statement for one closed accrual window.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Invoice {
    pub id: i64,
    pub partner_id: PartnerId,
    /// Window boundaries. `start_date < end_date`, and `start_date` equals the previous invoice's `end_date`.
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Sum of the amounts of exactly the fees settled by this invoice's creation transaction.
    pub total_amount: Money,
    /// Count of the fees settled by this invoice.
    pub total_orders: i64,
    pub status: InvoiceStatus,
    /// The gateway-assigned payment id. Set when the partner initiates payment; the webhook correlates on it.
    pub payment_id: Option<String>,
    pub payment_method: Option<String>,
    /// Opaque gateway metadata, stored verbatim as JSON text.
    pub payment_data: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Invoice {
    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }
}

//--------------------------------------   PaymentUpdate     ---------------------------------------------------------
/// Gateway payment details attached to a pending invoice when the partner initiates payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentUpdate {
    pub payment_id: String,
    pub payment_method: Option<String>,
    pub payment_data: Option<serde_json::Value>,
}

impl PaymentUpdate {
    pub fn new<S: Into<String>>(payment_id: S) -> Self {
        Self { payment_id: payment_id.into(), payment_method: None, payment_data: None }
    }

    pub fn with_method<S: Into<String>>(mut self, method: S) -> Self {
        self.payment_method = Some(method.into());
        self
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.payment_data = Some(data);
        self
    }
}
