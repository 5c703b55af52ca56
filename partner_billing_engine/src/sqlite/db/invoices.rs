use chrono::{DateTime, Utc};
use log::{debug, trace};
use pbg_common::Money;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Invoice, PartnerId, PaymentUpdate},
    traits::{BillingError, BillingWindow},
};

const INVOICE_COLUMNS: &str = "id, partner_id, start_date, end_date, created_at, total_amount, total_orders, \
                               status, payment_id, payment_method, payment_data, paid_at";

/// Inserts a new pending invoice using the given connection. Not atomic on its own; invoice generation embeds this
/// in the same transaction as the fee settlement update.
pub async fn insert_invoice(
    partner_id: &PartnerId,
    window: &BillingWindow,
    total_amount: Money,
    total_orders: i64,
    created_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<i64, BillingError> {
    let result = sqlx::query(
        "INSERT INTO invoices (partner_id, start_date, end_date, created_at, total_amount, total_orders, status) \
         VALUES ($1, $2, $3, $4, $5, $6, 'Pending')",
    )
    .bind(partner_id)
    .bind(window.start)
    .bind(window.end)
    .bind(created_at)
    .bind(total_amount)
    .bind(total_orders)
    .execute(&mut *conn)
    .await?;
    let id = result.last_insert_rowid();
    debug!("🗃️ Invoice #{id} ({total_amount} over {total_orders} orders) staged for partner {partner_id}");
    Ok(id)
}

pub async fn fetch_invoice(id: i64, conn: &mut SqliteConnection) -> Result<Option<Invoice>, BillingError> {
    let q = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1");
    let invoice = sqlx::query_as::<_, Invoice>(&q).bind(id).fetch_one(conn).await;
    match invoice {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(i) => Ok(Some(i)),
    }
}

pub async fn fetch_invoice_for_partner(
    partner_id: &PartnerId,
    id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, BillingError> {
    let q = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = $1 AND partner_id = $2");
    let invoice = sqlx::query_as::<_, Invoice>(&q).bind(id).bind(partner_id).fetch_one(conn).await;
    match invoice {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(i) => Ok(Some(i)),
    }
}

/// Returns the partner's most recent invoice. This is what drives the billing window resolver: the next window
/// starts where this invoice's `end_date` left off.
pub async fn last_invoice_for_partner(
    partner_id: &PartnerId,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, BillingError> {
    let q = format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices WHERE partner_id = $1 ORDER BY created_at DESC, id DESC LIMIT 1"
    );
    let invoice = sqlx::query_as::<_, Invoice>(&q).bind(partner_id).fetch_one(conn).await;
    match invoice {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(i) => Ok(Some(i)),
    }
}

pub async fn fetch_invoices_for_partner(
    partner_id: &PartnerId,
    conn: &mut SqliteConnection,
) -> Result<Vec<Invoice>, BillingError> {
    let q = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE partner_id = $1 ORDER BY created_at ASC, id ASC");
    let invoices = sqlx::query_as::<_, Invoice>(&q).bind(partner_id).fetch_all(conn).await?;
    Ok(invoices)
}

/// The unscoped payment-id lookup used by webhook reconciliation. Webhook payloads carry no partner context, so the
/// query spans every partner's invoices; `payment_id` carries a partial unique index.
pub async fn fetch_invoice_by_payment_id(
    payment_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Invoice>, BillingError> {
    let q = format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE payment_id = $1");
    let invoice = sqlx::query_as::<_, Invoice>(&q).bind(payment_id).fetch_one(conn).await;
    match invoice {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(i) => Ok(Some(i)),
    }
}

pub async fn attach_payment(
    id: i64,
    payment: &PaymentUpdate,
    conn: &mut SqliteConnection,
) -> Result<(), BillingError> {
    let data = payment.payment_data.as_ref().map(|v| v.to_string());
    let result = sqlx::query("UPDATE invoices SET payment_id = $1, payment_method = $2, payment_data = $3 WHERE id = $4")
        .bind(&payment.payment_id)
        .bind(&payment.payment_method)
        .bind(data)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::InvoiceNotFound(id));
    }
    trace!("🗃️ Payment {} attached to invoice #{id}", payment.payment_id);
    Ok(())
}

/// The single-row terminal transition to `Paid`. `paid_at` is asserted at most once via `COALESCE`, so a repeat of
/// the same settlement leaves the original timestamp in place.
pub async fn mark_paid(id: i64, paid_at: DateTime<Utc>, conn: &mut SqliteConnection) -> Result<(), BillingError> {
    let result = sqlx::query("UPDATE invoices SET status = 'Paid', paid_at = COALESCE(paid_at, $1) WHERE id = $2")
        .bind(paid_at)
        .bind(id)
        .execute(conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(BillingError::InvoiceNotFound(id));
    }
    Ok(())
}
