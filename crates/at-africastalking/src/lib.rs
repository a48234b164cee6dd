//! # Africa's Talking backend
//!
//! Outbound delivery to `POST {base_url}/version1/messaging` and the inbound
//! incoming-message callback, both behind the provider-agnostic traits from
//! [`at_core`].
//!
//! Wire format: `application/x-www-form-urlencoded` body with `username`,
//! `to` (comma-joined), `message` and `bulkSMSMode=1`; the key goes in the
//! `apikey` header and `Accept` is `application/json`.

pub mod config;
pub mod inbound;
pub mod response;
pub mod wire;

use std::time::Duration;

use async_trait::async_trait;
use at_core::{
    FieldMap, InboundMessage, InboundWebhook, OutboundMessage, OutboundTransport, Outcome,
    TransportError,
};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE, USER_AGENT};
use reqwest::redirect::Policy;
use tracing::debug;

pub use config::{AfricasTalkingConfig, ConfigError};
pub use response::{classify, GatewayResponse};
pub use wire::OutboundWireRequest;

const PROVIDER: &str = "africastalking";

/// Name the transport publishes inbound messages under.
pub const TRANSPORT_NAME: &str = "at_transport";

pub const API_KEY_HEADER: &str = "apikey";
pub const USER_AGENT_VALUE: &str = concat!("africastalking-transport/", env!("CARGO_PKG_VERSION"));

/// Africa's Talking messaging client.
///
/// Everything derived from configuration (URL, headers, HTTP client) is fixed
/// at construction; the client is cheap to clone and safe to share.
#[derive(Clone, Debug)]
pub struct AfricasTalkingClient {
    username: String,
    outbound_url: String,
    headers: HeaderMap,
    http: reqwest::Client,
}

impl AfricasTalkingClient {
    pub fn new<S: Into<String>>(username: S, api_key: S) -> Result<Self, ConfigError> {
        Self::from_config(&AfricasTalkingConfig::new(username, api_key))
    }

    pub fn from_config(config: &AfricasTalkingConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let http = reqwest::Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            username: config.username.clone(),
            outbound_url: config.outbound_url(),
            headers: request_headers(&config.api_key)?,
            http,
        })
    }

    pub fn outbound_url(&self) -> &str {
        &self.outbound_url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Build the wire request for `message`, or the names of the required
    /// fields it lacks.
    pub fn translate<'a>(
        &'a self,
        message: &'a OutboundMessage,
    ) -> Result<OutboundWireRequest<'a>, Vec<String>> {
        let missing = message.missing_fields();
        if !missing.is_empty() {
            return Err(missing);
        }
        Ok(OutboundWireRequest {
            url: &self.outbound_url,
            headers: &self.headers,
            username: &self.username,
            to: wire::join_recipients(&message.to_addr),
            message: message.content.as_deref().unwrap_or_default(),
            bulk_sms_mode: wire::BULK_SMS_MODE,
        })
    }

    /// Issue the POST for an already translated request.
    pub async fn post(&self, wire: &OutboundWireRequest<'_>) -> Result<GatewayResponse, TransportError> {
        let body = wire.form_body()?;
        debug!(url = wire.url, to = %wire.to, "posting outbound message");
        let res = self
            .http
            .post(wire.url)
            .headers(wire.headers.clone())
            .body(body)
            .send()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?;
        GatewayResponse::read(res).await
    }
}

fn request_headers(api_key: &str) -> Result<HeaderMap, ConfigError> {
    let mut api_key = HeaderValue::from_str(api_key).map_err(|e| ConfigError::InvalidField {
        field: "api_key",
        reason: e.to_string(),
    })?;
    api_key.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(
        CONTENT_TYPE,
        HeaderValue::from_static("application/x-www-form-urlencoded"),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));
    headers.insert(HeaderName::from_static(API_KEY_HEADER), api_key);
    Ok(headers)
}

#[async_trait]
impl OutboundTransport for AfricasTalkingClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    async fn send(&self, message: &OutboundMessage) -> Result<Outcome, TransportError> {
        let wire = match self.translate(message) {
            Ok(wire) => wire,
            Err(missing) => return Ok(Outcome::Rejected { missing }),
        };
        let response = self.post(&wire).await?;
        debug!(status = response.status, "gateway responded");
        Ok(classify(&response))
    }
}

impl InboundWebhook for AfricasTalkingClient {
    fn provider(&self) -> &'static str {
        PROVIDER
    }

    fn expected_fields(&self) -> &[&'static str] {
        inbound::EXPECTED_FIELDS
    }

    fn ignored_fields(&self) -> &[&'static str] {
        inbound::OPTIONAL_FIELDS
    }

    fn build_inbound(&self, values: FieldMap) -> Result<InboundMessage, TransportError> {
        inbound::build_inbound(values, TRANSPORT_NAME, PROVIDER)
    }
}
