//! Request handler definitions
//!
//! Define each route and it handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause
//! the current worker to stop processing new requests. Any long, non-cpu-bound operation (I/O, database operations,
//! gateway calls, etc.) must therefore be expressed as futures or asynchronous functions, which worker threads
//! execute concurrently without blocking.
use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use log::*;
use partner_billing_engine::{
    db_types::{NewFee, PartnerId},
    BillingApi,
    BillingDatabase,
    ReconciliationApi,
};

use crate::{
    data_objects::{AttachPaymentRequest, NewFeeRequest, NewPartnerRequest},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Partners  ----------------------------------------------------
route!(register_partner => Post "/partners" impl BillingDatabase);
/// Registers a partner with the billing engine. Partner ids are assigned by the platform; registering an existing
/// id is a no-op that returns the stored record.
pub async fn register_partner<B: BillingDatabase>(
    body: web::Json<NewPartnerRequest>,
    api: web::Data<BillingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let req = body.into_inner();
    debug!("💻️ POST partner registration for {}", req.id);
    let partner = api.register_partner(req.into()).await?;
    Ok(HttpResponse::Ok().json(partner))
}

route!(record_fee => Post "/partners/{partner_id}/fees" impl BillingDatabase);
/// Records one platform commission against the partner's ledger. This is the integration seam for the
/// order-fulfillment flow; the fee stays unsettled until a billing cycle consumes it.
pub async fn record_fee<B: BillingDatabase>(
    path: web::Path<String>,
    body: web::Json<NewFeeRequest>,
    api: web::Data<BillingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let partner_id = PartnerId::from(path.into_inner());
    let req = body.into_inner();
    debug!("💻️ POST fee of {} for partner {partner_id}", req.amount);
    let mut fee = NewFee::new(partner_id, req.amount);
    if let Some(created_at) = req.created_at {
        fee = fee.with_created_at(created_at);
    }
    let fee = api.record_fee(fee).await?;
    Ok(HttpResponse::Ok().json(fee))
}

//----------------------------------------------   Invoices  ----------------------------------------------------
route!(partner_invoices => Get "/partners/{partner_id}/invoices" impl BillingDatabase);
pub async fn partner_invoices<B: BillingDatabase>(
    path: web::Path<String>,
    api: web::Data<BillingApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let partner_id = PartnerId::from(path.into_inner());
    trace!("💻️ GET invoices for partner {partner_id}");
    let invoices = api.invoices_for_partner(&partner_id).await?;
    Ok(HttpResponse::Ok().json(invoices))
}

route!(attach_payment => Post "/partners/{partner_id}/invoices/{invoice_id}/payment" impl BillingDatabase);
/// Attaches gateway payment details to a pending invoice. This is what makes the invoice reachable by the payment
/// webhook's correlation query, so it must happen when the partner initiates payment, before the gateway can
/// possibly notify us.
pub async fn attach_payment<B: BillingDatabase>(
    path: web::Path<(String, i64)>,
    body: web::Json<AttachPaymentRequest>,
    api: web::Data<ReconciliationApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (partner_id, invoice_id) = path.into_inner();
    let partner_id = PartnerId::from(partner_id);
    let req = body.into_inner();
    debug!("💻️ POST payment {} onto invoice #{invoice_id} for partner {partner_id}", req.payment_id);
    let invoice = api.attach_payment(&partner_id, invoice_id, req.into()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

//----------------------------------------------   Billing  ----------------------------------------------------
route!(run_billing => Post "/billing/run" impl BillingDatabase);
/// Triggers one billing cycle immediately and returns the structured run summary. The daily worker does the same
/// thing on schedule; this route is the operational escape hatch (and the hook for external schedulers).
pub async fn run_billing<B: BillingDatabase>(api: web::Data<BillingApi<B>>) -> Result<HttpResponse, ServerError> {
    info!("💻️ Manual billing run requested");
    let summary = api.run_billing_cycle(Utc::now()).await?;
    Ok(HttpResponse::Ok().json(summary))
}
