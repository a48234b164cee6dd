//! Run the webhook server and log every event the transport hands to its host.
//! Configure with `config/*.toml` or `AT_TRANSPORT__AFRICASTALKING__API_KEY` and friends.

use std::sync::Arc;

use at_transport::prelude::*;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging)?;

    let (host, mut events) = ChannelHost::channel();
    let transport = AfricasTalkingTransport::new(&config, Arc::new(host))?;

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Inbound(message) => info!(
                    message_id = %message.message_id,
                    from = ?message.from_addr,
                    "inbound message"
                ),
                TransportEvent::Ack { user_message_id, sent_message_id, .. } => {
                    info!(%user_message_id, %sent_message_id, "ack")
                }
                TransportEvent::Nack { user_message_id, reason, .. } => {
                    info!(%user_message_id, %reason, "nack")
                }
                TransportEvent::Status(status) => info!(component = %status.component, kind = %status.kind, "status"),
            }
        }
    });

    transport.serve().await?;
    Ok(())
}
