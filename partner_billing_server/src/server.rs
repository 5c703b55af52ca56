use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use gateway_tools::GatewayApi;
use log::*;
use partner_billing_engine::{events::EventProducers, run_migrations, BillingApi, ReconciliationApi, SqliteDatabase};

use crate::{
    billing_worker::start_billing_worker,
    config::ServerConfig,
    errors::ServerError,
    routes::{health, AttachPaymentRoute, PartnerInvoicesRoute, RecordFeeRoute, RegisterPartnerRoute, RunBillingRoute},
    webhook_routes::PaymentWebhookRoute,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    run_migrations(db.pool()).await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway =
        GatewayApi::new(config.gateway.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    // No hooks are wired up in the stock server; embedders that want invoice notifications construct EventHandlers
    // and pass the matching producers in.
    let producers = EventProducers::default();
    if config.billing_worker_enabled {
        let _worker = start_billing_worker(db.clone(), producers.clone(), config.billing_hour_utc);
    } else {
        warn!("🚀️ Billing worker is disabled. No invoices will be generated unless POST /billing/run is called.");
    }
    let srv = create_server_instance(config, db, gateway, producers)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: GatewayApi,
    producers: EventProducers,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        let billing_api = BillingApi::new(db.clone(), producers.clone());
        let reconciliation_api = ReconciliationApi::new(db.clone(), producers.clone());
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pbg::access_log"))
            .app_data(web::Data::new(billing_api))
            .app_data(web::Data::new(reconciliation_api))
            .app_data(web::Data::new(gateway.clone()))
            .service(health)
            .service(RegisterPartnerRoute::<SqliteDatabase>::new())
            .service(RecordFeeRoute::<SqliteDatabase>::new())
            .service(PartnerInvoicesRoute::<SqliteDatabase>::new())
            .service(AttachPaymentRoute::<SqliteDatabase>::new())
            .service(RunBillingRoute::<SqliteDatabase>::new())
            .service(PaymentWebhookRoute::<SqliteDatabase, GatewayApi>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
