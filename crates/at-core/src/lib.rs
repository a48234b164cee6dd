//! # AT Core
//!
//! Core traits and types for the Africa's Talking SMS transport.
//!
//! This crate provides the provider-agnostic building blocks:
//! - [`OutboundTransport`] trait for delivering outbound messages to a gateway
//! - [`InboundWebhook`] trait describing how a gateway's webhook fields become an [`InboundMessage`]
//! - [`TransportHost`] trait, the seam to the messaging framework (publish, ack/nack, health)
//! - [`decode`] and [`validate`], the content decoder and field validator used on inbound webhooks
//! - [`deliver`], which turns a classified gateway [`Outcome`] into ack/nack events
//!
//! ## Example
//!
//! ```rust,ignore
//! use at_core::{deliver, OutboundMessage};
//!
//! let message = OutboundMessage::new("msg-1", vec!["+254700000000".into()], "hi");
//! let outcome = deliver(&client, &host, &message).await?;
//! ```

pub mod decode;
pub mod message;
pub mod outcome;
pub mod validate;

use async_trait::async_trait;
use serde_json::json;
use uuid::Uuid;

pub use decode::{
    decode, decode_body, field_text, is_structured, parse_query, BodyEncoding, DecodeError,
    FieldMap,
};
pub use message::{InboundMessage, OutboundMessage};
pub use outcome::{deliver, ComponentStatus, FailureDetails, HealthState, Outcome};
pub use validate::{validate, ErrorKind, Validation, ValidationErrors, ValidationMode};

/// Errors that can occur while talking to the gateway or the host framework
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Transport-level HTTP failure (connection refused, timeout, broken body)
    #[error("http error: {0}")]
    Http(String),
    /// Invalid request parameters
    #[error("invalid request: {0}")]
    Invalid(String),
    /// The host framework refused or failed to take an event
    #[error("publish failed: {0}")]
    Publish(String),
}

/// Errors raised while handling an inbound webhook call
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),
    #[error("invalid message: {0}")]
    Invalid(String),
    #[error("publish failed: {0}")]
    Publish(#[from] TransportError),
}

/// HTTP status code for web responses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpStatus {
    Ok = 200,
    BadRequest = 400,
    InternalServerError = 500,
}

impl HttpStatus {
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Generic webhook response that can be converted to any framework's response type
#[derive(Debug, Clone)]
pub struct WebhookResponse {
    pub status: HttpStatus,
    pub body: String,
    pub content_type: String,
}

impl WebhookResponse {
    pub fn json(status: HttpStatus, body: &serde_json::Value) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "application/json".to_string(),
        }
    }

    /// 200 reply for a webhook whose message reached the host.
    pub fn published(message_id: &str) -> Self {
        Self::json(HttpStatus::Ok, &json!({ "message_id": message_id }))
    }

    pub fn invalid(errors: &ValidationErrors) -> Self {
        Self::json(HttpStatus::BadRequest, &errors.to_json())
    }

    pub fn undecodable(error: &DecodeError) -> Self {
        Self::json(
            HttpStatus::BadRequest,
            &json!({ "invalid_body": error.to_string() }),
        )
    }

    pub fn error(status: HttpStatus, message: &str) -> Self {
        Self::json(status, &json!({ "error": message }))
    }
}

/// Outbound side of a gateway: turns one [`OutboundMessage`] into one classified [`Outcome`].
///
/// Implementations return `Err` only for transport-level failures; every HTTP
/// response the gateway produces, well-formed or not, is an `Ok(Outcome)`.
#[async_trait]
pub trait OutboundTransport: Send + Sync {
    /// Stable provider key, e.g. "africastalking".
    fn provider(&self) -> &'static str;

    async fn send(&self, message: &OutboundMessage) -> Result<Outcome, TransportError>;
}

/// Provider-specific description of an inbound webhook.
pub trait InboundWebhook: Send + Sync {
    /// Stable provider key, e.g. "africastalking".
    fn provider(&self) -> &'static str;

    /// Fields every webhook call must carry.
    fn expected_fields(&self) -> &[&'static str];

    /// Optional fields that are accepted without being required.
    fn ignored_fields(&self) -> &[&'static str] {
        &[]
    }

    /// Build a normalized message from already validated field values.
    fn build_inbound(&self, values: FieldMap) -> Result<InboundMessage, TransportError>;
}

/// The messaging framework this transport is plugged into.
#[async_trait]
pub trait TransportHost: Send + Sync {
    /// Hand an inbound message to the framework; returns the id it was published under.
    async fn publish_inbound(&self, message: InboundMessage) -> Result<String, TransportError>;

    async fn acknowledge(
        &self,
        user_message_id: &str,
        sent_message_id: &str,
        info: serde_json::Value,
    ) -> Result<(), TransportError>;

    async fn negative_acknowledge(
        &self,
        user_message_id: &str,
        reason: &str,
        details: Option<FailureDetails>,
    ) -> Result<(), TransportError>;

    /// Operational status sink (no-op by default).
    async fn report_health(&self, _status: ComponentStatus) -> Result<(), TransportError> {
        Ok(())
    }
}

/// Utility to create a message id when neither the host nor the gateway supplies one.
pub fn fallback_id() -> String {
    Uuid::new_v4().to_string()
}

/// Lightweight header representation to avoid tying the core to any HTTP framework.
pub type Headers = Vec<(String, String)>;

/// Case-insensitive header lookup; the first matching header wins.
pub fn header_value<'a>(headers: &'a Headers, name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}
