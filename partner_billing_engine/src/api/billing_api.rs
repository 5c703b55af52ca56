use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Fee, Invoice, NewFee, NewPartner, Partner, PartnerId},
    events::{EventProducers, InvoiceCreatedEvent},
    helpers::resolve_billing_window,
    traits::{BillingDatabase, BillingError, BillingFailure, BillingRunSummary},
};

/// `BillingApi` is the primary API for the accrual side of the engine: recording fees against partner ledgers and
/// closing 30-day billing windows into invoices.
pub struct BillingApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for BillingApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "BillingApi")
    }
}

impl<B> BillingApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> BillingApi<B>
where B: BillingDatabase
{
    /// Registers a partner with the billing engine. Idempotent.
    pub async fn register_partner(&self, partner: NewPartner) -> Result<Partner, BillingError> {
        self.db.insert_partner(partner).await
    }

    pub async fn fetch_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>, BillingError> {
        self.db.fetch_partner(partner_id).await
    }

    /// Records one platform commission against a partner's ledger. This is the entry point for the
    /// order-fulfillment collaborator; the fee waits, unsettled, for the next closed window that covers it.
    pub async fn record_fee(&self, fee: NewFee) -> Result<Fee, BillingError> {
        if fee.amount.is_negative() {
            return Err(BillingError::NegativeFeeAmount);
        }
        self.db.insert_fee(fee).await
    }

    /// Fetches a partner's invoice history, oldest first. Returns an error for an unknown partner so callers can
    /// distinguish "no invoices yet" from "no such partner".
    pub async fn invoices_for_partner(&self, partner_id: &PartnerId) -> Result<Vec<Invoice>, BillingError> {
        self.db
            .fetch_partner(partner_id)
            .await?
            .ok_or_else(|| BillingError::PartnerNotFound(partner_id.clone()))?;
        self.db.fetch_invoices_for_partner(partner_id).await
    }

    /// Runs one billing cycle over every registered partner.
    ///
    /// Partners are scanned sequentially. Each eligible partner gets its own atomic invoice-plus-settlement
    /// transaction, so a failure on one partner is recorded in the summary and the scan moves on; invoices already
    /// committed this run stay committed. Zero invoices is a perfectly normal outcome.
    ///
    /// A failure to read the partner registry itself aborts the run, since there is nothing to iterate.
    pub async fn run_billing_cycle(&self, now: DateTime<Utc>) -> Result<BillingRunSummary, BillingError> {
        let partners = self.db.fetch_partners().await?;
        debug!("🧾️ Billing cycle started over {} partners", partners.len());
        let mut summary = BillingRunSummary::default();
        for partner in partners {
            match self.invoice_partner(&partner, now).await {
                Ok(Some(invoice)) => {
                    info!(
                        "🧾️ Invoice #{} created for partner {}: {} over {} orders",
                        invoice.id, partner.id, invoice.total_amount, invoice.total_orders
                    );
                    summary.invoiced.push(invoice);
                },
                Ok(None) => {
                    summary.skipped += 1;
                },
                Err(e) => {
                    error!("🧾️ Billing failed for partner {}: {e}", partner.id);
                    summary.failures.push(BillingFailure::new(partner.id.clone(), e.to_string()));
                },
            }
        }
        info!(
            "🧾️ Billing cycle complete. {} invoiced, {} skipped, {} failures",
            summary.invoiced_count(),
            summary.skipped,
            summary.failures.len()
        );
        Ok(summary)
    }

    /// The single-partner billing flow: resolve the accrual window, read the fee ledger, and close the window into
    /// an invoice. Returns `None` when the partner is not due, or when the elapsed window holds no eligible fees
    /// (in which case the boundary deliberately does not advance and the next cycle re-evaluates it).
    pub async fn invoice_partner(&self, partner: &Partner, now: DateTime<Utc>) -> Result<Option<Invoice>, BillingError> {
        let last_invoice = self.db.fetch_last_invoice(&partner.id).await?;
        let last_end = last_invoice.map(|i| i.end_date);
        let Some(window) = resolve_billing_window(partner.created_at, last_end, now) else {
            trace!("🧾️ Partner {} is not due for invoicing", partner.id);
            return Ok(None);
        };
        let fees = self.db.fetch_unsettled_fees(&partner.id, &window).await?;
        if fees.is_empty() {
            debug!("🧾️ Window {window} for partner {} has no eligible fees. Skipping without advancing.", partner.id);
            return Ok(None);
        }
        let invoice = self.db.create_invoice_with_settlement(&partner.id, &window, &fees).await?;
        self.call_invoice_created_hook(&invoice).await;
        Ok(Some(invoice))
    }

    async fn call_invoice_created_hook(&self, invoice: &Invoice) {
        for emitter in &self.producers.invoice_created_producer {
            trace!("🧾️ Notifying invoice created hook subscribers");
            let event = InvoiceCreatedEvent::new(invoice.clone());
            emitter.publish_event(event).await;
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }

    pub fn db_mut(&mut self) -> &mut B {
        &mut self.db
    }
}
