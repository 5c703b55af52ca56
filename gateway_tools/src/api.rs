use std::sync::Arc;

use log::*;
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Client,
    Method,
};
use serde::de::DeserializeOwned;

use crate::{config::GatewayConfig, data_objects::GatewayPayment, GatewayApiError};

/// The fetch seam the webhook reconciler depends on. Implemented by [`GatewayApi`] against the real gateway, and by
/// mocks in the server's endpoint tests.
#[allow(async_fn_in_trait)]
pub trait GatewayClient {
    /// Fetches the authoritative status of the payment with the given gateway-assigned id.
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayApiError>;
}

#[derive(Clone)]
pub struct GatewayApi {
    config: GatewayConfig,
    client: Arc<Client>,
}

impl GatewayApi {
    pub fn new(config: GatewayConfig) -> Result<Self, GatewayApiError> {
        let mut headers = HeaderMap::with_capacity(2);
        let bearer = format!("Bearer {}", config.access_token.reveal());
        let val = HeaderValue::from_str(&bearer).map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        headers.insert("Authorization", val);
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| GatewayApiError::Initialization(e.to_string()))?;
        Ok(Self { config, client: Arc::new(client) })
    }

    pub async fn rest_query<T: DeserializeOwned>(&self, method: Method, path: &str) -> Result<T, GatewayApiError> {
        let url = self.url(path);
        trace!("Sending REST query: {url}");
        let req = self.client.request(method, url);
        let response = req.send().await.map_err(|e| GatewayApiError::RequestError(e.to_string()))?;
        if response.status().is_success() {
            trace!("REST query successful. {}", response.status());
            response.json::<T>().await.map_err(|e| GatewayApiError::JsonError(e.to_string()))
        } else {
            let status = response.status().as_u16();
            let message = response.text().await.map_err(|e| GatewayApiError::RequestError(e.to_string()))?;
            Err(GatewayApiError::QueryError { status, message })
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.config.base_url)
    }
}

impl GatewayClient for GatewayApi {
    async fn fetch_payment(&self, payment_id: &str) -> Result<GatewayPayment, GatewayApiError> {
        let path = format!("/payments/{payment_id}");
        debug!("Fetching payment {payment_id}");
        let payment = self.rest_query::<GatewayPayment>(Method::GET, &path).await?;
        debug!("Fetched payment {payment_id}: {}", payment.status);
        Ok(payment)
    }
}
