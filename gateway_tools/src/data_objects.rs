use std::fmt::Display;

use chrono::{DateTime, Utc};
use pbg_common::Money;
use serde::{Deserialize, Serialize};

/// The authoritative payment record as reported by the gateway. Only the fields the reconciler cares about are
/// modelled; anything else in the payload is ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayment {
    pub id: String,
    pub status: PaymentState,
    #[serde(default)]
    pub amount: Option<Money>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl GatewayPayment {
    /// "approved" is the only gateway state that settles an invoice.
    pub fn is_approved(&self) -> bool {
        self.status == PaymentState::Approved
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Approved,
    Pending,
    Declined,
    Refunded,
    /// Any state this client does not recognise. Treated as not-approved, never as an error.
    #[serde(other)]
    Unknown,
}

impl Display for PaymentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentState::Approved => write!(f, "approved"),
            PaymentState::Pending => write!(f, "pending"),
            PaymentState::Declined => write!(f, "declined"),
            PaymentState::Refunded => write!(f, "refunded"),
            PaymentState::Unknown => write!(f, "unknown"),
        }
    }
}
