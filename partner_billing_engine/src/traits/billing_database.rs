use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{Fee, Invoice, NewFee, NewPartner, Partner, PartnerId, PaymentUpdate},
    traits::data_objects::BillingWindow,
};

/// This trait defines the storage behaviour required by the billing engine.
///
/// This behaviour includes:
/// * Maintaining the partner registry and per-partner fee ledgers.
/// * Resolving billing windows (most-recent-invoice lookups).
/// * Creating invoices and settling the consumed fees in a single atomic batch.
/// * Correlating gateway payment ids with invoices across all partners.
#[allow(async_fn_in_trait)]
pub trait BillingDatabase: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Registers a partner. This call is idempotent: re-registering an existing partner id leaves the stored
    /// record untouched and returns it.
    async fn insert_partner(&self, partner: NewPartner) -> Result<Partner, BillingError>;

    /// Fetches all registered partners, oldest first. This is the scan set for a billing cycle.
    async fn fetch_partners(&self) -> Result<Vec<Partner>, BillingError>;

    async fn fetch_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>, BillingError>;

    /// Records one platform commission against the partner's ledger. The fee starts unsettled.
    async fn insert_fee(&self, fee: NewFee) -> Result<Fee, BillingError>;

    /// Fetches the partner's unsettled fees whose `created_at` lies in the inclusive window range, ordered by
    /// `created_at`. An empty result means the caller must skip invoice creation for this cycle.
    async fn fetch_unsettled_fees(
        &self,
        partner_id: &PartnerId,
        window: &BillingWindow,
    ) -> Result<Vec<Fee>, BillingError>;

    /// Fetches the partner's most recent invoice (by `created_at`, descending, limit 1). `None` means the partner
    /// has never been invoiced and the window resolver falls back to the partner's registration time.
    async fn fetch_last_invoice(&self, partner_id: &PartnerId) -> Result<Option<Invoice>, BillingError>;

    async fn fetch_invoice(&self, partner_id: &PartnerId, invoice_id: i64) -> Result<Option<Invoice>, BillingError>;

    /// Fetches the partner's invoice history, oldest first.
    async fn fetch_invoices_for_partner(&self, partner_id: &PartnerId) -> Result<Vec<Invoice>, BillingError>;

    /// Looks up the invoice carrying the given gateway payment id, across all partners. Webhook payloads carry no
    /// partner context, so this query is deliberately unscoped; `payment_id` is indexed.
    async fn fetch_invoice_by_payment_id(&self, payment_id: &str) -> Result<Option<Invoice>, BillingError>;

    /// Takes the resolved window and the fee set read from the ledger, and in a single atomic transaction:
    /// * creates the invoice (`total_amount` = sum of fee amounts, `total_orders` = fee count, status `Pending`);
    /// * marks every consumed fee as settled, linking it to the new invoice.
    ///
    /// The batch is all-or-nothing. If any fee in the set was already settled (for instance by a concurrent run),
    /// the whole transaction is rolled back and [`BillingError::FeeAlreadySettled`] is returned, so no fee can ever
    /// be consumed by two invoices.
    async fn create_invoice_with_settlement(
        &self,
        partner_id: &PartnerId,
        window: &BillingWindow,
        fees: &[Fee],
    ) -> Result<Invoice, BillingError>;

    /// Attaches gateway payment details to a pending invoice. Re-attaching the same payment id is a no-op;
    /// attaching a different payment id, or attaching to a non-pending invoice, is an error.
    async fn attach_payment(
        &self,
        partner_id: &PartnerId,
        invoice_id: i64,
        payment: &PaymentUpdate,
    ) -> Result<Invoice, BillingError>;

    /// Transitions the invoice to `Paid`. The settlement time is asserted at most once: a repeat call leaves the
    /// original `paid_at` untouched, which is what makes duplicate webhook delivery safe.
    async fn mark_invoice_paid(&self, invoice_id: i64, paid_at: DateTime<Utc>) -> Result<Invoice, BillingError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), BillingError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum BillingError {
    #[error("We have an internal database engine error (configuration/uptime etc.): {0}")]
    DatabaseError(String),
    #[error("The requested partner {0} does not exist")]
    PartnerNotFound(PartnerId),
    #[error("The requested invoice (internal id {0}) does not exist")]
    InvoiceNotFound(i64),
    #[error("No invoice matches payment id {0}")]
    NoMatchingInvoice(String),
    #[error("Refusing to create an invoice for an empty fee set")]
    EmptyFeeSet,
    #[error("A fee in the batch was already settled by another invoice")]
    FeeAlreadySettled,
    #[error("Fee amounts must be non-negative")]
    NegativeFeeAmount,
    #[error("Invoice {0} already carries payment id {1}")]
    PaymentAlreadyAttached(i64, String),
    #[error("Invoice {0} is not pending ({1})")]
    InvoiceNotPending(i64, String),
}

impl From<sqlx::Error> for BillingError {
    fn from(e: sqlx::Error) -> Self {
        BillingError::DatabaseError(e.to_string())
    }
}
