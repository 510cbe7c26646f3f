use std::time::Duration;

use odpt_proxy_model::{BusVehicle, OdptBus};
use reqwest::Client;
use url::Url;

use crate::vehicle::{map_vehicles, VehicleQuery, CONSUMER_KEY_PARAM};

pub const DEFAULT_API_BASE_URL: &str = "https://api-public.odpt.org/api/v4";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("build http client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("invalid ODPT API url: {0}")]
    Url(#[from] url::ParseError),
    #[error("request to ODPT API failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("ODPT API returned status {0}")]
    Status(u16),
    #[error("read ODPT API response: {0}")]
    Body(#[source] reqwest::Error),
    #[error("parse ODPT API response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Client for the ODPT `odpt:Bus` endpoint. Cloning shares the underlying
/// connection pool.
#[derive(Debug, Clone)]
pub struct OdptClient {
    http: Client,
    base_url: String,
    consumer_key: Option<String>,
}

impl OdptClient {
    pub fn new(
        base_url: impl Into<String>,
        consumer_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, UpstreamError> {
        let http = Client::builder()
            .user_agent(format!("odpt-proxy/{}", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(UpstreamError::Client)?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            consumer_key: consumer_key.filter(|key| !key.is_empty()),
        })
    }

    pub fn has_consumer_key(&self) -> bool {
        self.consumer_key.is_some()
    }

    pub fn request_url(&self, query: &VehicleQuery) -> Result<Url, UpstreamError> {
        Ok(query.to_url(&self.base_url, self.consumer_key.as_deref())?)
    }

    /// Fetches raw `odpt:Bus` records. Any status other than 2xx is an error
    /// and the body is not read.
    pub async fn fetch_buses(&self, query: &VehicleQuery) -> Result<Vec<OdptBus>, UpstreamError> {
        let url = self.request_url(query)?;
        tracing::debug!(url = %redact_consumer_key(&url), "requesting ODPT API");

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(UpstreamError::Request)?;
        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status(status.as_u16()));
        }
        let body = response.bytes().await.map_err(UpstreamError::Body)?;
        Ok(serde_json::from_slice(&body)?)
    }

    pub async fn bus_vehicles(&self, query: &VehicleQuery) -> Result<Vec<BusVehicle>, UpstreamError> {
        self.fetch_buses(query).await.map(map_vehicles)
    }
}

/// Copy of `url` safe for logs.
pub fn redact_consumer_key(url: &Url) -> Url {
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(key, value)| {
            if key == CONSUMER_KEY_PARAM {
                (key.into_owned(), "***".to_string())
            } else {
                (key.into_owned(), value.into_owned())
            }
        })
        .collect();
    let mut redacted = url.clone();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vehicle::VehicleFilter;

    #[test]
    fn request_url_uses_configured_base_and_key() {
        let client = OdptClient::new(
            "http://localhost:9999/api/v4",
            Some("key".to_string()),
            DEFAULT_TIMEOUT,
        )
        .unwrap();
        assert!(client.has_consumer_key());
        let query =
            VehicleQuery::new("odpt.Operator:Toei").with_filter(VehicleFilter::ToBusstopPole, "X");
        let url = client.request_url(&query).unwrap();
        assert_eq!(url.host_str(), Some("localhost"));
        assert!(url
            .query_pairs()
            .any(|(key, value)| key == "odpt:toBusstopPole" && value == "X"));
        assert!(url
            .query_pairs()
            .any(|(key, value)| key == "acl:consumerKey" && value == "key"));
    }

    #[test]
    fn empty_consumer_key_is_ignored() {
        let client = OdptClient::new(DEFAULT_API_BASE_URL, Some(String::new()), DEFAULT_TIMEOUT)
            .unwrap();
        assert!(!client.has_consumer_key());
    }

    #[test]
    fn invalid_base_url_is_reported() {
        let client = OdptClient::new("not a url", None, DEFAULT_TIMEOUT).unwrap();
        let query = VehicleQuery::new("odpt.Operator:Toei");
        assert!(matches!(
            client.request_url(&query),
            Err(UpstreamError::Url(_))
        ));
    }

    #[test]
    fn redacts_consumer_key() {
        let url = VehicleQuery::new("odpt.Operator:Toei")
            .to_url(DEFAULT_API_BASE_URL, Some("secret"))
            .unwrap();
        let redacted = redact_consumer_key(&url);
        assert!(!redacted.as_str().contains("secret"));
        assert!(redacted
            .query_pairs()
            .any(|(key, value)| key == "acl:consumerKey" && value == "***"));
        assert!(redacted
            .query_pairs()
            .any(|(key, value)| key == "odpt:operator" && value == "odpt.Operator:Toei"));
    }
}
