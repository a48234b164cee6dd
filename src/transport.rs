use std::sync::Arc;

use at_africastalking::AfricasTalkingClient;
use at_core::{deliver, OutboundMessage, Outcome, TransportError, TransportHost};
use at_web_axum::AppState;
use at_web_generic::WebhookProcessor;
use axum::Router;
use tokio::net::TcpListener;
use tracing::info;

use crate::config::{AppConfig, AppConfigError, ServerConfig};

/// The assembled transport: one gateway client shared by outbound deliveries
/// and the inbound webhook processor, wired to a single host.
#[derive(Clone)]
pub struct AfricasTalkingTransport {
    client: Arc<AfricasTalkingClient>,
    host: Arc<dyn TransportHost>,
    processor: WebhookProcessor,
    server: ServerConfig,
}

impl AfricasTalkingTransport {
    /// Validate `config` and resolve endpoints, headers and the HTTP client once.
    pub fn new(config: &AppConfig, host: Arc<dyn TransportHost>) -> Result<Self, AppConfigError> {
        config.validate()?;
        let client = Arc::new(AfricasTalkingClient::from_config(&config.africastalking)?);
        let processor = WebhookProcessor::new(client.clone(), host.clone())
            .with_validation_mode(config.africastalking.validation_mode);
        info!(
            outbound_url = client.outbound_url(),
            web_path = %config.server.web_path,
            "africastalking transport configured"
        );
        Ok(Self {
            client,
            host,
            processor,
            server: config.server.clone(),
        })
    }

    pub fn client(&self) -> &AfricasTalkingClient {
        &self.client
    }

    pub fn processor(&self) -> &WebhookProcessor {
        &self.processor
    }

    /// Deliver one outbound message; the host receives the ack or nack.
    pub async fn handle_outbound(&self, message: &OutboundMessage) -> Result<Outcome, TransportError> {
        deliver(self.client.as_ref(), self.host.as_ref(), message).await
    }

    /// Webhook and health routes.
    pub fn router(&self) -> Router {
        at_web_axum::router(
            AppState {
                processor: self.processor.clone(),
            },
            &self.server.web_path,
            &self.server.health_path,
        )
    }

    /// Bind the configured address and serve the webhook routes until the
    /// server stops.
    pub async fn serve(&self) -> std::io::Result<()> {
        let listener = TcpListener::bind((self.server.host.as_str(), self.server.port)).await?;
        info!(addr = %listener.local_addr()?, "listening for webhooks");
        axum::serve(listener, self.router()).await
    }
}
