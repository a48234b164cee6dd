use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// A message the host framework wants delivered through the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OutboundMessage {
    pub message_id: String,
    #[serde(default)]
    pub to_addr: Vec<String>,
    #[serde(default)]
    pub from_addr: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub transport_metadata: serde_json::Value,
}

impl OutboundMessage {
    pub fn new<S: Into<String>>(message_id: S, to_addr: Vec<String>, content: S) -> Self {
        Self {
            message_id: message_id.into(),
            to_addr,
            from_addr: None,
            content: Some(content.into()),
            transport_metadata: serde_json::Value::Null,
        }
    }

    /// Names of the required fields this message lacks, in `to_addr`, `content` order.
    ///
    /// Blank addresses do not count as a destination and an empty string does
    /// not count as content.
    pub fn missing_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if !self.to_addr.iter().any(|addr| !addr.trim().is_empty()) {
            missing.push("to_addr".to_string());
        }
        if self.content.as_deref().map_or(true, str::is_empty) {
            missing.push("content".to_string());
        }
        missing
    }
}

/// Normalized inbound message handed to the host framework.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InboundMessage {
    pub message_id: String,
    pub to_addr: String,
    pub from_addr: String,
    pub content: String,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub transport_name: String,
    pub transport_type: String,
    /// Name of the gateway that produced the message, e.g. "africastalking".
    pub provider: String,
    /// Gateway-specific metadata bag.
    pub transport_metadata: serde_json::Value,
    /// Validated webhook fields as received.
    pub raw: serde_json::Value,
}
