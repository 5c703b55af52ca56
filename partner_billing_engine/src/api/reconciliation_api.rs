use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;

use crate::{
    db_types::{Invoice, PartnerId, PaymentUpdate},
    events::{EventProducers, InvoicePaidEvent},
    traits::{BillingDatabase, BillingError},
};

/// `ReconciliationApi` handles the payment side of an invoice's life: attaching gateway payment details when the
/// partner initiates payment, and settling the invoice when the gateway confirms approval.
pub struct ReconciliationApi<B> {
    db: B,
    producers: EventProducers,
}

impl<B> Debug for ReconciliationApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi")
    }
}

impl<B> ReconciliationApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        Self { db, producers }
    }
}

impl<B> ReconciliationApi<B>
where B: BillingDatabase
{
    /// Attaches gateway payment details to a pending invoice, making it reachable by the webhook's payment-id
    /// correlation. Re-attaching the same payment id is a no-op.
    pub async fn attach_payment(
        &self,
        partner_id: &PartnerId,
        invoice_id: i64,
        payment: PaymentUpdate,
    ) -> Result<Invoice, BillingError> {
        let invoice = self.db.attach_payment(partner_id, invoice_id, &payment).await?;
        debug!("💳️ Payment {} attached to invoice #{invoice_id} for partner {partner_id}", payment.payment_id);
        Ok(invoice)
    }

    /// Settles the invoice matching an approved gateway payment.
    ///
    /// The lookup spans all partners, since webhooks carry no partner context. An unknown payment id is a genuine
    /// unresolved-correlation error. An already-paid invoice returns as-is: duplicate webhook delivery re-asserts
    /// the terminal state without touching `paid_at` and without firing hooks a second time.
    pub async fn settle_approved_payment(
        &self,
        payment_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Invoice, BillingError> {
        let invoice = self
            .db
            .fetch_invoice_by_payment_id(payment_id)
            .await?
            .ok_or_else(|| BillingError::NoMatchingInvoice(payment_id.to_string()))?;
        if invoice.is_paid() {
            debug!("💳️ Invoice #{} is already paid. Duplicate delivery for payment {payment_id}.", invoice.id);
            return Ok(invoice);
        }
        let paid = self.db.mark_invoice_paid(invoice.id, now).await?;
        info!("💳️ Invoice #{} settled by payment {payment_id}", paid.id);
        self.call_invoice_paid_hook(&paid).await;
        Ok(paid)
    }

    async fn call_invoice_paid_hook(&self, invoice: &Invoice) {
        for emitter in &self.producers.invoice_paid_producer {
            trace!("💳️ Notifying invoice paid hook subscribers");
            let event = InvoicePaidEvent::new(invoice.clone());
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
