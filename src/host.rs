use async_trait::async_trait;
use at_core::{ComponentStatus, FailureDetails, InboundMessage, TransportError, TransportHost};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::debug;

/// Everything the transport reports to its host.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Inbound(InboundMessage),
    Ack {
        user_message_id: String,
        sent_message_id: String,
        info: Value,
    },
    Nack {
        user_message_id: String,
        reason: String,
        details: Option<FailureDetails>,
    },
    Status(ComponentStatus),
}

/// [`TransportHost`] that forwards every call as a [`TransportEvent`] on an
/// unbounded channel. Sends fail once the receiver is dropped.
#[derive(Debug, Clone)]
pub struct ChannelHost {
    tx: mpsc::UnboundedSender<TransportEvent>,
}

impl ChannelHost {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<TransportEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn emit(&self, event: TransportEvent) -> Result<(), TransportError> {
        self.tx
            .send(event)
            .map_err(|_| TransportError::Publish("event channel closed".to_string()))
    }
}

#[async_trait]
impl TransportHost for ChannelHost {
    async fn publish_inbound(&self, message: InboundMessage) -> Result<String, TransportError> {
        let message_id = message.message_id.clone();
        self.emit(TransportEvent::Inbound(message))?;
        Ok(message_id)
    }

    async fn acknowledge(
        &self,
        user_message_id: &str,
        sent_message_id: &str,
        info: Value,
    ) -> Result<(), TransportError> {
        self.emit(TransportEvent::Ack {
            user_message_id: user_message_id.to_string(),
            sent_message_id: sent_message_id.to_string(),
            info,
        })
    }

    async fn negative_acknowledge(
        &self,
        user_message_id: &str,
        reason: &str,
        details: Option<FailureDetails>,
    ) -> Result<(), TransportError> {
        self.emit(TransportEvent::Nack {
            user_message_id: user_message_id.to_string(),
            reason: reason.to_string(),
            details,
        })
    }

    async fn report_health(&self, status: ComponentStatus) -> Result<(), TransportError> {
        debug!(component = %status.component, kind = %status.kind, "component status");
        self.emit(TransportEvent::Status(status))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn forwards_acks_in_order() {
        let (host, mut rx) = ChannelHost::channel();
        host.acknowledge("m1", "ATXid_1", json!({})).await.unwrap();
        host.negative_acknowledge("m2", "bad request", None)
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(TransportEvent::Ack { user_message_id, .. }) if user_message_id == "m1"
        ));
        assert!(matches!(
            rx.recv().await,
            Some(TransportEvent::Nack { reason, .. }) if reason == "bad request"
        ));
    }

    #[tokio::test]
    async fn closed_receiver_is_a_publish_error() {
        let (host, rx) = ChannelHost::channel();
        drop(rx);
        let err = host.acknowledge("m1", "m1", json!({})).await.unwrap_err();
        assert!(matches!(err, TransportError::Publish(_)));
    }
}
