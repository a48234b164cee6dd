//! Classification of gateway HTTP responses into ack/nack outcomes.

use at_core::{header_value, FailureDetails, Headers, Outcome, TransportError};
use reqwest::StatusCode;
use serde_json::Value;

/// What the gateway sent back for one outbound request.
#[derive(Debug, Clone)]
pub struct GatewayResponse {
    pub status: u16,
    pub headers: Headers,
    pub body: Vec<u8>,
}

impl GatewayResponse {
    /// Drain a reqwest response. Failing to read the body is a transport error.
    pub async fn read(response: reqwest::Response) -> Result<Self, TransportError> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::Http(e.to_string()))?
            .to_vec();
        Ok(Self {
            status,
            headers,
            body,
        })
    }

    pub fn declares_json(&self) -> bool {
        header_value(&self.headers, "content-type")
            .and_then(|ct| ct.split(';').next())
            .is_some_and(|media| media.trim().eq_ignore_ascii_case("application/json"))
    }

    fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Map a gateway response to an [`Outcome`].
///
/// Only `200` counts as success. A `200` that declares JSON but does not parse
/// is a failure. Failure details prefer the JSON `description` field and fall
/// back to the body text, then to the status reason phrase.
pub fn classify(response: &GatewayResponse) -> Outcome {
    if response.status == StatusCode::OK.as_u16() {
        if !response.declares_json() {
            return Outcome::Success {
                message: Value::String(response.text()),
                sent_message_id: None,
            };
        }
        return match serde_json::from_slice::<Value>(&response.body) {
            Ok(body) => Outcome::Success {
                sent_message_id: gateway_message_id(&body),
                message: body,
            },
            Err(e) => Outcome::Failure {
                message: Value::String(response.text()),
                details: FailureDetails {
                    error: format!("unparseable gateway response: {e}"),
                    res_code: response.status,
                },
            },
        };
    }

    let parsed = serde_json::from_slice::<Value>(&response.body).ok();
    let error = parsed
        .as_ref()
        .and_then(|body| body.get("description"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_error(response));
    Outcome::Failure {
        message: parsed.unwrap_or_else(|| Value::String(response.text())),
        details: FailureDetails {
            error,
            res_code: response.status,
        },
    }
}

fn fallback_error(response: &GatewayResponse) -> String {
    let text = response.text();
    let text = text.trim();
    if !text.is_empty() {
        return text.to_string();
    }
    StatusCode::from_u16(response.status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", response.status))
}

/// First usable recipient `messageId` from an `SMSMessageData` payload.
fn gateway_message_id(body: &Value) -> Option<String> {
    body.pointer("/SMSMessageData/Recipients")?
        .as_array()?
        .iter()
        .filter_map(|r| r.get("messageId").and_then(Value::as_str))
        .find(|id| !id.is_empty() && *id != "None")
        .map(str::to_string)
}
