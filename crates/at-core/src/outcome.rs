use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{OutboundMessage, OutboundTransport, TransportError, TransportHost};

/// Structured details attached to a negative acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureDetails {
    pub error: String,
    pub res_code: u16,
}

/// Result of one outbound delivery attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The gateway accepted the message.
    Success {
        message: Value,
        /// Gateway-side id, when the response carries one.
        sent_message_id: Option<String>,
    },
    /// The gateway answered with anything but success.
    Failure {
        message: Value,
        details: FailureDetails,
    },
    /// The message was refused before any request was made.
    Rejected { missing: Vec<String> },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The reason carried by the nack for this outcome, if it produces one.
    pub fn nack_reason(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { details, .. } => Some(details.error.clone()),
            Self::Rejected { missing } => Some(format!("Missing fields: {}", missing.join(", "))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    Ok,
    Down,
}

/// Status report for one transport component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentStatus {
    pub component: String,
    pub status: HealthState,
    #[serde(rename = "type")]
    pub kind: String,
    pub message: Value,
}

impl ComponentStatus {
    pub fn good_outbound(component: impl Into<String>, message: Value) -> Self {
        Self {
            component: component.into(),
            status: HealthState::Ok,
            kind: "good_outbound_request".to_string(),
            message,
        }
    }

    pub fn bad_outbound(component: impl Into<String>, message: Value) -> Self {
        Self {
            component: component.into(),
            status: HealthState::Down,
            kind: "bad_outbound_request".to_string(),
            message,
        }
    }
}

/// Deliver one outbound message and report the outcome to the host.
///
/// Exactly one of ack or nack is emitted per call, after the gateway response
/// has been classified, followed by a component status report for gateway
/// responses. Transport-level errors are returned without emitting either, so
/// a dropped or failed call never reports twice.
pub async fn deliver(
    transport: &dyn OutboundTransport,
    host: &dyn TransportHost,
    message: &OutboundMessage,
) -> Result<Outcome, TransportError> {
    info!(
        message_id = %message.message_id,
        provider = transport.provider(),
        "consuming outbound message"
    );
    let outcome = transport.send(message).await.map_err(|e| {
        error!(message_id = %message.message_id, error = %e, "outbound request failed");
        e
    })?;
    let component = format!("{}_outbound", transport.provider());

    match &outcome {
        Outcome::Success {
            message: info,
            sent_message_id,
        } => {
            let sent_id = sent_message_id.as_deref().unwrap_or(&message.message_id);
            host.acknowledge(&message.message_id, sent_id, info.clone())
                .await?;
            info!(message_id = %message.message_id, sent_message_id = sent_id, "outbound message acknowledged");
            report_status(host, ComponentStatus::good_outbound(&component, info.clone())).await;
        }
        Outcome::Failure {
            message: info,
            details,
        } => {
            warn!(
                message_id = %message.message_id,
                res_code = details.res_code,
                error = %details.error,
                "gateway rejected outbound message"
            );
            host.negative_acknowledge(&message.message_id, &details.error, Some(details.clone()))
                .await?;
            report_status(host, ComponentStatus::bad_outbound(&component, info.clone())).await;
        }
        Outcome::Rejected { missing } => {
            warn!(
                message_id = %message.message_id,
                missing = ?missing,
                "outbound message rejected before sending"
            );
            let reason = outcome.nack_reason().unwrap_or_default();
            host.negative_acknowledge(&message.message_id, &reason, None)
                .await?;
        }
    }

    Ok(outcome)
}

/// Status reports follow the ack or nack and never fail the delivery.
async fn report_status(host: &dyn TransportHost, status: ComponentStatus) {
    let component = status.component.clone();
    if let Err(e) = host.report_health(status).await {
        warn!(%component, error = %e, "component status not reported");
    }
}
