use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use gateway_tools::{GatewayApiError, PaymentState};
use log::*;
use partner_billing_engine::{events::EventProducers, ReconciliationApi};
use serde_json::json;

use super::mocks::{gateway_payment, paid_invoice, pending_invoice, MockBillingDb, MockGateway};
use crate::webhook_routes::PaymentWebhookRoute;

async fn post_webhook(db: MockBillingDb, gateway: MockGateway, body: serde_json::Value) -> (StatusCode, String) {
    let _ = env_logger::try_init();
    let api = ReconciliationApi::new(db, EventProducers::default());
    let app = App::new()
        .app_data(web::Data::new(api))
        .app_data(web::Data::new(gateway))
        .service(PaymentWebhookRoute::<MockBillingDb, MockGateway>::new());
    let app = test::init_service(app).await;
    let req = TestRequest::post().uri("/webhook/payment").set_json(&body).to_request();
    let (_req, res) = test::call_service(&app, req).await.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    info!("Response body: {body}");
    (status, body)
}

#[actix_web::test]
async fn non_payment_events_are_acknowledged_without_processing() {
    let db = MockBillingDb::new();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().never();
    let body = json!({"type": "payment_method.updated", "data": {"id": "PAY123"}});
    let (status, body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("ignored"), "was: {body}");
}

#[actix_web::test]
async fn approved_payments_settle_the_matching_invoice() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_invoice_by_payment_id()
        .withf(|id| id == "PAY123")
        .return_once(|_| Ok(Some(pending_invoice(7, Some("PAY123")))));
    db.expect_mark_invoice_paid()
        .withf(|id, _paid_at| *id == 7)
        .return_once(|_, _| Ok(paid_invoice(7, "PAY123")));
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .withf(|id| id == "PAY123")
        .return_once(|_| Ok(gateway_payment("PAY123", PaymentState::Approved)));

    let body = json!({"type": "payment", "data": {"id": "PAY123"}});
    let (status, body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("reconciled"), "was: {body}");
}

#[actix_web::test]
async fn duplicate_deliveries_are_acknowledged_without_rewriting() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_invoice_by_payment_id()
        .withf(|id| id == "PAY123")
        .return_once(|_| Ok(Some(paid_invoice(7, "PAY123"))));
    // The terminal state is never re-asserted through the store
    db.expect_mark_invoice_paid().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .return_once(|_| Ok(gateway_payment("PAY123", PaymentState::Approved)));

    let body = json!({"type": "payment", "data": {"id": "PAY123"}});
    let (status, _body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn unmatched_payment_ids_return_not_found() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_invoice_by_payment_id().return_once(|_| Ok(None));
    db.expect_mark_invoice_paid().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .return_once(|_| Ok(gateway_payment("PAY404", PaymentState::Approved)));

    let body = json!({"type": "payment", "data": {"id": "PAY404"}});
    let (status, body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("No invoice for payment PAY404"), "was: {body}");
}

#[actix_web::test]
async fn non_approved_statuses_are_a_no_op() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_invoice_by_payment_id().never();
    db.expect_mark_invoice_paid().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_fetch_payment()
        .return_once(|_| Ok(gateway_payment("PAY123", PaymentState::Declined)));

    let body = json!({"type": "payment", "data": {"id": "PAY123"}});
    let (status, body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("No action taken"), "was: {body}");
}

#[actix_web::test]
async fn gateway_failures_ask_for_redelivery() {
    let mut db = MockBillingDb::new();
    db.expect_fetch_invoice_by_payment_id().never();
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_payment().return_once(|_| {
        Err(GatewayApiError::QueryError { status: 503, message: "upstream maintenance".to_string() })
    });

    let body = json!({"type": "payment", "data": {"id": "PAY123"}});
    let (status, body) = post_webhook(db, gateway, body).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.contains("could not be consulted"), "was: {body}");
}
