use serde::{Deserialize, Serialize};

use crate::db_types::Invoice;

/// Emitted after an invoice and its fee settlements have been committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceCreatedEvent {
    pub invoice: Invoice,
}

impl InvoiceCreatedEvent {
    pub fn new(invoice: Invoice) -> Self {
        Self { invoice }
    }
}

/// Emitted after an approved gateway payment has been reconciled and the invoice marked paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoicePaidEvent {
    pub invoice: Invoice,
}

impl InvoicePaidEvent {
    pub fn new(invoice: Invoice) -> Self {
        Self { invoice }
    }
}
