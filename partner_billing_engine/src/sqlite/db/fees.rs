use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Fee, NewFee, PartnerId},
    traits::{BillingError, BillingWindow},
};

const FEE_COLUMNS: &str = "id, partner_id, amount, settled, invoice_id, created_at";

/// Inserts a new fee into the ledger using the given connection. This is not atomic on its own. You can embed this
/// call inside a transaction if you need atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_fee(fee: NewFee, conn: &mut SqliteConnection) -> Result<Fee, BillingError> {
    if fee.amount.is_negative() {
        return Err(BillingError::NegativeFeeAmount);
    }
    let result = sqlx::query("INSERT INTO fees (partner_id, amount, settled, created_at) VALUES ($1, $2, 0, $3)")
        .bind(&fee.partner_id)
        .bind(fee.amount)
        .bind(fee.created_at)
        .execute(&mut *conn)
        .await?;
    let id = result.last_insert_rowid();
    fetch_fee(id, conn).await?.ok_or(BillingError::DatabaseError("Fee vanished straight after insert".to_string()))
}

pub async fn fetch_fee(id: i64, conn: &mut SqliteConnection) -> Result<Option<Fee>, BillingError> {
    let q = format!("SELECT {FEE_COLUMNS} FROM fees WHERE id = $1");
    let fee = sqlx::query_as::<_, Fee>(&q).bind(id).fetch_one(conn).await;
    match fee {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(f) => Ok(Some(f)),
    }
}

/// The fee ledger read backing invoice generation: unsettled fees for the partner whose `created_at` lies in the
/// inclusive window range, ordered by `created_at`.
pub async fn fetch_unsettled_in_window(
    partner_id: &PartnerId,
    window: &BillingWindow,
    conn: &mut SqliteConnection,
) -> Result<Vec<Fee>, BillingError> {
    let q = format!(
        "SELECT {FEE_COLUMNS} FROM fees \
         WHERE partner_id = $1 AND settled = 0 AND created_at >= $2 AND created_at <= $3 \
         ORDER BY created_at ASC, id ASC"
    );
    let fees = sqlx::query_as::<_, Fee>(&q)
        .bind(partner_id)
        .bind(window.start)
        .bind(window.end)
        .fetch_all(conn)
        .await?;
    trace!("🗃️ {} unsettled fees for partner {partner_id} in window {window}", fees.len());
    Ok(fees)
}

/// Flips the given fees to settled and links them to the consuming invoice. The `settled = 0` guard means a fee that
/// was settled in the meantime is left alone; callers compare the returned row count against the batch size and roll
/// the surrounding transaction back on a mismatch.
pub async fn settle_fees(
    invoice_id: i64,
    fee_ids: &[i64],
    conn: &mut SqliteConnection,
) -> Result<u64, BillingError> {
    if fee_ids.is_empty() {
        return Ok(0);
    }
    let mut builder = QueryBuilder::new("UPDATE fees SET settled = 1, invoice_id = ");
    builder.push_bind(invoice_id);
    builder.push(" WHERE settled = 0 AND id IN (");
    let mut ids = builder.separated(", ");
    for id in fee_ids {
        ids.push_bind(*id);
    }
    builder.push(")");
    trace!("🗃️ Executing query: {}", builder.sql());
    let result = builder.build().execute(conn).await?;
    Ok(result.rows_affected())
}
