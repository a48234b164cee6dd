use at_core::TransportError;
use reqwest::header::HeaderMap;
use serde::Serialize;

/// Ask the gateway to treat the request as bulk-capable delivery.
pub const BULK_SMS_MODE: u8 = 1;

#[derive(Debug, Serialize)]
struct SendForm<'a> {
    username: &'a str,
    to: &'a str,
    message: &'a str,
    #[serde(rename = "bulkSMSMode")]
    bulk_sms_mode: u8,
}

/// One outbound HTTP call, borrowed from the client and the message it was built from.
#[derive(Debug, Clone)]
pub struct OutboundWireRequest<'a> {
    pub url: &'a str,
    pub headers: &'a HeaderMap,
    pub username: &'a str,
    /// Destination addresses joined with `,`.
    pub to: String,
    pub message: &'a str,
    pub bulk_sms_mode: u8,
}

impl OutboundWireRequest<'_> {
    /// `application/x-www-form-urlencoded` request body.
    pub fn form_body(&self) -> Result<String, TransportError> {
        serde_urlencoded::to_string(SendForm {
            username: self.username,
            to: &self.to,
            message: self.message,
            bulk_sms_mode: self.bulk_sms_mode,
        })
        .map_err(|e| TransportError::Invalid(format!("form encode: {e}")))
    }
}

/// Join destination addresses, skipping blanks.
pub fn join_recipients(to_addr: &[String]) -> String {
    to_addr
        .iter()
        .map(|addr| addr.trim())
        .filter(|addr| !addr.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}
