//----------------------------------------------   Payment webhook  ----------------------------------------------------

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use gateway_tools::GatewayClient;
use log::{debug, info, trace, warn};
use partner_billing_engine::{BillingDatabase, BillingError, ReconciliationApi};

use crate::{data_objects::{JsonResponse, PaymentWebhookEvent}, errors::ServerError, route};

/// The only webhook event type this endpoint processes. Everything else is acknowledged and dropped so the gateway
/// does not keep redelivering events we will never act on.
const PAYMENT_EVENT_TYPE: &str = "payment";

route!(payment_webhook => Post "/webhook/payment" impl BillingDatabase, GatewayClient);
/// The payment reconciliation webhook.
///
/// Webhooks are at-least-once and may arrive duplicated or out of order, so the payload is treated as a hint only:
/// the authoritative payment state is fetched from the gateway before anything is written. Response codes are the
/// contract with the gateway's retry machinery:
/// * `200`: event understood (processed, not approved yet, or not a payment event at all). Stop retrying.
/// * `404`: no invoice carries this payment id. A genuine correlation failure that needs investigation; retrying
///   will not fix it.
/// * `500`: we could not answer authoritatively (gateway lookup or storage failure). Redeliver later.
pub async fn payment_webhook<B, G>(
    req: HttpRequest,
    body: web::Json<PaymentWebhookEvent>,
    api: web::Data<ReconciliationApi<B>>,
    gateway: web::Data<G>,
) -> Result<HttpResponse, ServerError>
where
    B: BillingDatabase,
    G: GatewayClient,
{
    trace!("💳️ Received webhook request: {}", req.uri());
    let event = body.into_inner();
    if event.event_type != PAYMENT_EVENT_TYPE {
        debug!("💳️ Ignoring webhook of type {}", event.event_type);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Event type ignored.")));
    }
    let payment = gateway.fetch_payment(&event.data.id).await.map_err(|e| {
        warn!("💳️ Could not fetch authoritative status for payment {}. {e}", event.data.id);
        ServerError::GatewayUnavailable(e.to_string())
    })?;
    if !payment.is_approved() {
        info!("💳️ Payment {} is {}. Nothing to settle.", payment.id, payment.status);
        return Ok(HttpResponse::Ok().json(JsonResponse::success("Payment not approved. No action taken.")));
    }
    match api.settle_approved_payment(&payment.id, Utc::now()).await {
        Ok(invoice) => {
            info!("💳️ Invoice #{} for partner {} is paid.", invoice.id, invoice.partner_id);
            Ok(HttpResponse::Ok().json(JsonResponse::success("Payment reconciled.")))
        },
        Err(BillingError::NoMatchingInvoice(payment_id)) => {
            warn!("💳️ Payment {payment_id} matches no invoice. This needs investigation.");
            Err(ServerError::NoRecordFound(format!("No invoice for payment {payment_id}")))
        },
        Err(e) => {
            warn!("💳️ Unexpected error while reconciling payment {}. {e}", payment.id);
            Err(ServerError::BackendError(e.to_string()))
        },
    }
}
