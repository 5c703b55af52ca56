use sqlx::SqliteConnection;

use crate::{
    db_types::{NewPartner, Partner, PartnerId},
    traits::BillingError,
};

const PARTNER_COLUMNS: &str = "id, name, created_at";

/// Inserts a new partner record using the given connection. The insert is idempotent: an existing partner id is
/// left untouched and the stored record is returned.
pub async fn idempotent_insert(partner: NewPartner, conn: &mut SqliteConnection) -> Result<Partner, BillingError> {
    sqlx::query("INSERT INTO partners (id, name, created_at) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING")
        .bind(&partner.id)
        .bind(&partner.name)
        .bind(partner.created_at)
        .execute(&mut *conn)
        .await?;
    fetch_partner(&partner.id, conn)
        .await?
        .ok_or_else(|| BillingError::PartnerNotFound(partner.id.clone()))
}

pub async fn fetch_partner(id: &PartnerId, conn: &mut SqliteConnection) -> Result<Option<Partner>, BillingError> {
    let q = format!("SELECT {PARTNER_COLUMNS} FROM partners WHERE id = $1");
    let partner = sqlx::query_as::<_, Partner>(&q).bind(id).fetch_one(conn).await;
    match partner {
        Err(sqlx::Error::RowNotFound) => Ok(None),
        Err(e) => Err(e.into()),
        Ok(p) => Ok(Some(p)),
    }
}

/// Fetches every registered partner, oldest registration first. This is the scan order for a billing cycle.
pub async fn fetch_partners(conn: &mut SqliteConnection) -> Result<Vec<Partner>, BillingError> {
    let q = format!("SELECT {PARTNER_COLUMNS} FROM partners ORDER BY created_at ASC, id ASC");
    let partners = sqlx::query_as::<_, Partner>(&q).fetch_all(conn).await?;
    Ok(partners)
}
