use std::{env, time::Duration};

use log::*;
use pbg_common::Secret;

const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Connection settings for the payment gateway. The timeout bounds every lookup so a slow gateway cannot stall a
/// scheduled billing run or pile up webhook workers.
#[derive(Clone, Debug, Default)]
pub struct GatewayConfig {
    /// Base URL of the gateway API, e.g. "https://api.pay.example.com/v1"
    pub base_url: String,
    pub access_token: Secret<String>,
    pub timeout: Duration,
}

impl GatewayConfig {
    pub fn new(base_url: &str, access_token: Secret<String>) -> Self {
        Self { base_url: base_url.to_string(), access_token, timeout: DEFAULT_GATEWAY_TIMEOUT }
    }

    pub fn new_from_env_or_default() -> Self {
        let base_url = env::var("PBG_GATEWAY_URL").ok().unwrap_or_else(|| {
            error!("🪛️ PBG_GATEWAY_URL is not set. Please set it to the base URL of the payment gateway API.");
            String::default()
        });
        let access_token = env::var("PBG_GATEWAY_ACCESS_TOKEN").ok().unwrap_or_else(|| {
            error!("🪛️ PBG_GATEWAY_ACCESS_TOKEN is not set. Please set it to the gateway bearer token.");
            String::default()
        });
        let timeout = env::var("PBG_GATEWAY_TIMEOUT")
            .map_err(|_| {
                info!(
                    "🪛️ PBG_GATEWAY_TIMEOUT is not set. Using the default value of {} s.",
                    DEFAULT_GATEWAY_TIMEOUT.as_secs()
                )
            })
            .and_then(|s| {
                s.parse::<u64>()
                    .map(Duration::from_secs)
                    .map_err(|e| warn!("🪛️ Invalid configuration value for PBG_GATEWAY_TIMEOUT. {e}"))
            })
            .ok()
            .unwrap_or(DEFAULT_GATEWAY_TIMEOUT);
        Self { base_url, access_token: Secret::new(access_token), timeout }
    }
}
