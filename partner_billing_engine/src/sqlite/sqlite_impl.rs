//! `SqliteDatabase` is a concrete implementation of a billing engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements the [`BillingDatabase`] trait. Per-flow query
//! logic lives in the [`super::db`] modules; this file owns the transaction boundaries.
use std::fmt::Debug;

use chrono::{DateTime, Utc};
use log::*;
use pbg_common::Money;
use sqlx::SqlitePool;

use super::{db::{fees, invoices, partners}, new_pool};
use crate::{
    db_types::{Fee, Invoice, InvoiceStatus, NewFee, NewPartner, Partner, PartnerId, PaymentUpdate},
    traits::{BillingDatabase, BillingError, BillingWindow},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, BillingError> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl BillingDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn insert_partner(&self, partner: NewPartner) -> Result<Partner, BillingError> {
        let mut conn = self.pool.acquire().await?;
        let result = partners::idempotent_insert(partner, &mut conn).await?;
        debug!("🗃️ Partner {} ({}) is registered", result.id, result.name);
        Ok(result)
    }

    async fn fetch_partners(&self) -> Result<Vec<Partner>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        partners::fetch_partners(&mut conn).await
    }

    async fn fetch_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        partners::fetch_partner(partner_id, &mut conn).await
    }

    async fn insert_fee(&self, fee: NewFee) -> Result<Fee, BillingError> {
        let mut conn = self.pool.acquire().await?;
        let partner_id = fee.partner_id.clone();
        partners::fetch_partner(&partner_id, &mut conn)
            .await?
            .ok_or_else(|| BillingError::PartnerNotFound(partner_id.clone()))?;
        let fee = fees::insert_fee(fee, &mut conn).await?;
        debug!("🗃️ Fee #{} ({}) recorded against partner {partner_id}", fee.id, fee.amount);
        Ok(fee)
    }

    async fn fetch_unsettled_fees(
        &self,
        partner_id: &PartnerId,
        window: &BillingWindow,
    ) -> Result<Vec<Fee>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        fees::fetch_unsettled_in_window(partner_id, window, &mut conn).await
    }

    async fn fetch_last_invoice(&self, partner_id: &PartnerId) -> Result<Option<Invoice>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        invoices::last_invoice_for_partner(partner_id, &mut conn).await
    }

    async fn fetch_invoice(&self, partner_id: &PartnerId, invoice_id: i64) -> Result<Option<Invoice>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        invoices::fetch_invoice_for_partner(partner_id, invoice_id, &mut conn).await
    }

    async fn fetch_invoices_for_partner(&self, partner_id: &PartnerId) -> Result<Vec<Invoice>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        invoices::fetch_invoices_for_partner(partner_id, &mut conn).await
    }

    async fn fetch_invoice_by_payment_id(&self, payment_id: &str) -> Result<Option<Invoice>, BillingError> {
        let mut conn = self.pool.acquire().await?;
        invoices::fetch_invoice_by_payment_id(payment_id, &mut conn).await
    }

    async fn create_invoice_with_settlement(
        &self,
        partner_id: &PartnerId,
        window: &BillingWindow,
        fees_to_settle: &[Fee],
    ) -> Result<Invoice, BillingError> {
        if fees_to_settle.is_empty() {
            return Err(BillingError::EmptyFeeSet);
        }
        let total_amount: Money = fees_to_settle.iter().map(|f| f.amount).sum();
        let total_orders = fees_to_settle.len() as i64;
        let mut tx = self.pool.begin().await?;
        let id = invoices::insert_invoice(partner_id, window, total_amount, total_orders, Utc::now(), &mut tx).await?;
        let fee_ids = fees_to_settle.iter().map(|f| f.id).collect::<Vec<i64>>();
        let settled = fees::settle_fees(id, &fee_ids, &mut tx).await?;
        if settled != fee_ids.len() as u64 {
            // Dropping the transaction rolls the invoice insert back, so neither side of the batch survives
            warn!(
                "🗃️ Settlement batch for partner {partner_id} matched {settled} of {} fees. Rolling back.",
                fee_ids.len()
            );
            return Err(BillingError::FeeAlreadySettled);
        }
        let invoice =
            invoices::fetch_invoice(id, &mut tx).await?.ok_or(BillingError::InvoiceNotFound(id))?;
        tx.commit().await?;
        debug!("🗃️ Invoice #{id} committed for partner {partner_id}: {total_amount} over {total_orders} orders");
        Ok(invoice)
    }

    async fn attach_payment(
        &self,
        partner_id: &PartnerId,
        invoice_id: i64,
        payment: &PaymentUpdate,
    ) -> Result<Invoice, BillingError> {
        let mut tx = self.pool.begin().await?;
        let invoice = invoices::fetch_invoice_for_partner(partner_id, invoice_id, &mut tx)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        match invoice.payment_id.as_deref() {
            Some(existing) if existing == payment.payment_id => {
                trace!("🗃️ Payment {existing} is already attached to invoice #{invoice_id}. Nothing to do.");
                return Ok(invoice);
            },
            Some(existing) => {
                return Err(BillingError::PaymentAlreadyAttached(invoice_id, existing.to_string()));
            },
            None => {},
        }
        if invoice.status != InvoiceStatus::Pending {
            return Err(BillingError::InvoiceNotPending(invoice_id, invoice.status.to_string()));
        }
        invoices::attach_payment(invoice_id, payment, &mut tx).await?;
        let invoice = invoices::fetch_invoice(invoice_id, &mut tx)
            .await?
            .ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        tx.commit().await?;
        Ok(invoice)
    }

    async fn mark_invoice_paid(&self, invoice_id: i64, paid_at: DateTime<Utc>) -> Result<Invoice, BillingError> {
        // A single-row update is the only concurrency primitive needed here; racing duplicates re-assert the same
        // terminal fields.
        let mut conn = self.pool.acquire().await?;
        invoices::mark_paid(invoice_id, paid_at, &mut conn).await?;
        let invoice =
            invoices::fetch_invoice(invoice_id, &mut conn).await?.ok_or(BillingError::InvoiceNotFound(invoice_id))?;
        debug!("🗃️ Invoice #{invoice_id} marked as paid");
        Ok(invoice)
    }
}
