use chrono::{DateTime, Duration, Utc};
use gateway_tools::{GatewayApiError, GatewayClient, GatewayPayment, PaymentState};
use mockall::mock;
use partner_billing_engine::{
    db_types::{Fee, Invoice, InvoiceStatus, NewFee, NewPartner, Partner, PartnerId, PaymentUpdate},
    traits::{BillingDatabase, BillingError, BillingWindow},
};
use pbg_common::Money;

mock! {
    pub BillingDb {}
    impl Clone for BillingDb {
        fn clone(&self) -> Self;
    }
    impl BillingDatabase for BillingDb {
        fn url(&self) -> &str;
        async fn insert_partner(&self, partner: NewPartner) -> Result<Partner, BillingError>;
        async fn fetch_partners(&self) -> Result<Vec<Partner>, BillingError>;
        async fn fetch_partner(&self, partner_id: &PartnerId) -> Result<Option<Partner>, BillingError>;
        async fn insert_fee(&self, fee: NewFee) -> Result<Fee, BillingError>;
        async fn fetch_unsettled_fees(&self, partner_id: &PartnerId, window: &BillingWindow) -> Result<Vec<Fee>, BillingError>;
        async fn fetch_last_invoice(&self, partner_id: &PartnerId) -> Result<Option<Invoice>, BillingError>;
        async fn fetch_invoice(&self, partner_id: &PartnerId, invoice_id: i64) -> Result<Option<Invoice>, BillingError>;
        async fn fetch_invoices_for_partner(&self, partner_id: &PartnerId) -> Result<Vec<Invoice>, BillingError>;
        async fn fetch_invoice_by_payment_id(&self, payment_id: &str) -> Result<Option<Invoice>, BillingError>;
        async fn create_invoice_with_settlement(&self, partner_id: &PartnerId, window: &BillingWindow, fees: &[Fee]) -> Result<Invoice, BillingError>;
        async fn attach_payment(&self, partner_id: &PartnerId, invoice_id: i64, payment: &PaymentUpdate) -> Result<Invoice, BillingError>;
        async fn mark_invoice_paid(&self, invoice_id: i64, paid_at: DateTime<Utc>) -> Result<Invoice, BillingError>;
    }
}

mock! {
    pub Gateway {}
    impl GatewayClient for Gateway {
        async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayApiError>;
    }
}

pub fn sample_partner(id: &str, age_days: i64) -> Partner {
    Partner {
        id: PartnerId::from(id),
        name: format!("{id} store"),
        created_at: Utc::now() - Duration::days(age_days),
    }
}

pub fn pending_invoice(id: i64, payment_id: Option<&str>) -> Invoice {
    let now = Utc::now();
    Invoice {
        id,
        partner_id: PartnerId::from("P1"),
        start_date: now - Duration::days(31),
        end_date: now - Duration::days(1),
        created_at: now - Duration::days(1),
        total_amount: Money::from_dollars(60),
        total_orders: 3,
        status: InvoiceStatus::Pending,
        payment_id: payment_id.map(String::from),
        payment_method: None,
        payment_data: None,
        paid_at: None,
    }
}

pub fn paid_invoice(id: i64, payment_id: &str) -> Invoice {
    let mut invoice = pending_invoice(id, Some(payment_id));
    invoice.status = InvoiceStatus::Paid;
    invoice.paid_at = Some(Utc::now() - Duration::hours(1));
    invoice
}

pub fn gateway_payment(id: &str, status: PaymentState) -> GatewayPayment {
    GatewayPayment {
        id: id.to_string(),
        status,
        amount: Some(Money::from_dollars(60)),
        payment_method: Some("card".to_string()),
        created_at: None,
    }
}
