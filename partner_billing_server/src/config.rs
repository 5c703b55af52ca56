use std::env;

use gateway_tools::GatewayConfig;
use log::*;
use pbg_common::parse_boolean_flag;

const DEFAULT_PBG_HOST: &str = "127.0.0.1";
const DEFAULT_PBG_PORT: u16 = 8480;
/// The daily billing run fires at this UTC hour unless configured otherwise.
const DEFAULT_BILLING_HOUR_UTC: u32 = 2;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// The hour of day (UTC) at which the daily billing worker closes accrual windows.
    pub billing_hour_utc: u32,
    /// When false, no in-process billing worker is started and billing cycles only run via `POST /billing/run`
    /// (for deployments that prefer an external scheduler).
    pub billing_worker_enabled: bool,
    /// Payment gateway connection settings
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PBG_HOST.to_string(),
            port: DEFAULT_PBG_PORT,
            database_url: String::default(),
            billing_hour_utc: DEFAULT_BILLING_HOUR_UTC,
            billing_worker_enabled: true,
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PBG_HOST").ok().unwrap_or_else(|| DEFAULT_PBG_HOST.into());
        let port = env::var("PBG_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PBG_PORT. {e} Using the default, {DEFAULT_PBG_PORT}, instead."
                    );
                    DEFAULT_PBG_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PBG_PORT);
        let database_url = env::var("PBG_DATABASE_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PBG_DATABASE_URL is not set. Please set it to the URL for the billing database.");
            String::default()
        });
        let billing_hour_utc = configure_billing_hour();
        let billing_worker_enabled = !parse_boolean_flag(env::var("PBG_DISABLE_BILLING_WORKER").ok(), false);
        if !billing_worker_enabled {
            info!("🪛️ The in-process billing worker is disabled. Billing cycles only run via POST /billing/run.");
        }
        let gateway = GatewayConfig::new_from_env_or_default();
        Self { host, port, database_url, billing_hour_utc, billing_worker_enabled, gateway }
    }
}

fn configure_billing_hour() -> u32 {
    env::var("PBG_BILLING_HOUR_UTC")
        .map_err(|_| {
            info!(
                "🪛️ PBG_BILLING_HOUR_UTC is not set. Using the default of {DEFAULT_BILLING_HOUR_UTC:02}:00 UTC."
            )
        })
        .and_then(|s| {
            s.parse::<u32>().map_err(|e| warn!("🪛️ Invalid configuration value for PBG_BILLING_HOUR_UTC. {e}"))
        })
        .ok()
        .filter(|h| {
            let valid = *h < 24;
            if !valid {
                warn!("🪛️ PBG_BILLING_HOUR_UTC must be between 0 and 23. Using the default instead.");
            }
            valid
        })
        .unwrap_or(DEFAULT_BILLING_HOUR_UTC)
}
