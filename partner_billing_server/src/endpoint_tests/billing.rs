use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use log::*;
use partner_billing_engine::{
    db_types::{Fee, PartnerId},
    events::EventProducers,
    traits::BillingError,
    BillingApi,
    BillingRunSummary,
    ReconciliationApi,
};
use pbg_common::Money;

use super::mocks::{pending_invoice, sample_partner, MockBillingDb};
use crate::routes::{AttachPaymentRoute, PartnerInvoicesRoute, RecordFeeRoute, RunBillingRoute};

async fn call_billing(db: MockBillingDb, req: TestRequest) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let api = BillingApi::new(db, EventProducers::default());
    let app = App::new()
        .app_data(web::Data::new(api))
        .service(RecordFeeRoute::<MockBillingDb>::new())
        .service(PartnerInvoicesRoute::<MockBillingDb>::new())
        .service(RunBillingRoute::<MockBillingDb>::new());
    let app = test::init_service(app).await;
    let (_req, res) = test::call_service(&app, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    info!("Response body: {body}");
    (status, body)
}

async fn call_reconciliation(db: MockBillingDb, req: TestRequest) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let api = ReconciliationApi::new(db, EventProducers::default());
    let app = App::new().app_data(web::Data::new(api)).service(AttachPaymentRoute::<MockBillingDb>::new());
    let app = test::init_service(app).await;
    let (_req, res) = test::call_service(&app, req.to_request()).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    info!("Response body: {body}");
    (status, body)
}

#[actix_web::test]
async fn a_run_with_no_due_partners_is_a_normal_outcome() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_partners().return_once(|| Ok(vec![sample_partner("P1", 10)]));
    db.expect_fetch_last_invoice().return_once(|_| Ok(None));
    db.expect_create_invoice_with_settlement().never();

    let (status, body) = call_billing(db, TestRequest::post().uri("/billing/run")).await;
    assert_eq!(status, StatusCode::OK);
    let summary: BillingRunSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.invoiced_count(), 0);
    assert_eq!(summary.skipped, 1);
    assert!(!summary.has_failures());
}

#[actix_web::test]
async fn partner_failures_are_reported_not_fatal() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_partners()
        .return_once(|| Ok(vec![sample_partner("P1", 10), sample_partner("P2", 10)]));
    db.expect_fetch_last_invoice()
        .withf(|id| id == &PartnerId::from("P1"))
        .return_once(|_| Err(BillingError::DatabaseError("disk on fire".to_string())));
    db.expect_fetch_last_invoice()
        .withf(|id| id == &PartnerId::from("P2"))
        .return_once(|_| Ok(None));

    let (status, body) = call_billing(db, TestRequest::post().uri("/billing/run")).await;
    assert_eq!(status, StatusCode::OK);
    let summary: BillingRunSummary = serde_json::from_str(&body).unwrap();
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.failures.len(), 1);
    assert_eq!(summary.failures[0].partner_id, PartnerId::from("P1"));
}

#[actix_web::test]
async fn listing_invoices_for_an_unknown_partner_is_not_found() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_partner().return_once(|_| Ok(None));
    db.expect_fetch_invoices_for_partner().never();

    let (status, body) = call_billing(db, TestRequest::get().uri("/partners/NOPE/invoices")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("does not exist"), "was: {body}");
}

#[actix_web::test]
async fn invoice_history_is_listed() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_partner().return_once(|id| Ok(Some(sample_partner(id.as_str(), 40))));
    db.expect_fetch_invoices_for_partner()
        .return_once(|_| Ok(vec![pending_invoice(1, None), pending_invoice(2, Some("PAY2"))]));

    let (status, body) = call_billing(db, TestRequest::get().uri("/partners/P1/invoices")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"PAY2\""), "was: {body}");
}

#[actix_web::test]
async fn negative_fee_amounts_are_rejected() {
    let mut db = MockBillingDb::new();
    db.expect_insert_fee().never();
    let req = TestRequest::post().uri("/partners/P1/fees").set_json(serde_json::json!({"amount": -500}));
    let (status, body) = call_billing(db, req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("non-negative"), "was: {body}");
}

#[actix_web::test]
async fn recorded_fees_are_echoed_back() {
    let mut db = MockBillingDb::new();
    db.expect_insert_fee().return_once(|fee| {
        Ok(Fee {
            id: 42,
            partner_id: fee.partner_id,
            amount: fee.amount,
            settled: false,
            invoice_id: None,
            created_at: fee.created_at,
        })
    });
    let req = TestRequest::post().uri("/partners/P1/fees").set_json(serde_json::json!({"amount": 1500}));
    let (status, body) = call_billing(db, req).await;
    assert_eq!(status, StatusCode::OK);
    let fee: Fee = serde_json::from_str(&body).unwrap();
    assert_eq!(fee.id, 42);
    assert_eq!(fee.amount, Money::from_cents(1500));
    assert!(!fee.settled);
}

#[actix_web::test]
async fn attaching_a_second_payment_id_is_a_conflict() {
    let mut db = MockBillingDb::new();
    db.expect_attach_payment()
        .return_once(|_, id, payment| Err(BillingError::PaymentAlreadyAttached(id, payment.payment_id.clone())));
    let req = TestRequest::post()
        .uri("/partners/P1/invoices/7/payment")
        .set_json(serde_json::json!({"payment_id": "PAY999"}));
    let (status, body) = call_reconciliation(db, req).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body.contains("already carries payment id"), "was: {body}");
}

#[actix_web::test]
async fn attached_payments_are_echoed_back() {
    let mut db = MockBillingDb::new();
    db.expect_attach_payment().return_once(|_, id, payment| {
        let mut invoice = pending_invoice(id, Some(&payment.payment_id));
        invoice.payment_method = payment.payment_method.clone();
        Ok(invoice)
    });
    let req = TestRequest::post()
        .uri("/partners/P1/invoices/7/payment")
        .set_json(serde_json::json!({"payment_id": "PAY123", "payment_method": "card"}));
    let (status, body) = call_reconciliation(db, req).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("\"PAY123\""), "was: {body}");
}
