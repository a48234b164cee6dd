//! # Africa's Talking Transport
//!
//! An SMS transport for the Africa's Talking gateway: outbound delivery with
//! ack/nack classification, and an inbound webhook that validates gateway
//! callbacks and publishes them as messages.
//!
//! ## Features
//!
//! - **Outbound delivery**: one form-encoded POST per message, classified into
//!   an acknowledgement or a negative acknowledgement with failure details
//! - **Inbound webhook**: JSON, form and query callbacks merged, validated and
//!   published through the host
//! - **Sandbox or production**: endpoint picked from the account username
//! - **Layered configuration**: defaults, config files and environment variables
//! - **Observability**: structured logging through `tracing`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use at_transport::prelude::*;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     let config = AppConfig::load()?;
//!     init_tracing(&config.logging)?;
//!
//!     let (host, mut events) = ChannelHost::channel();
//!     let transport = AfricasTalkingTransport::new(&config, Arc::new(host))?;
//!
//!     let message = OutboundMessage::new("m1", vec!["+254711XXXYYY".to_string()], "hello");
//!     transport.handle_outbound(&message).await?;
//!     println!("{:?}", events.recv().await);
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! Settings come from `config/default`, `config/{RUN_MODE}`, `config/local`
//! and `AT_TRANSPORT__*` environment variables:
//!
//! ```rust,ignore
//! use at_transport::config::AppConfig;
//!
//! let config = AppConfig::load()?;
//! println!("sending through {}", config.africastalking.outbound_url());
//! ```

pub mod config;
pub mod host;
pub mod telemetry;
pub mod transport;

pub use config::*;
pub use host::{ChannelHost, TransportEvent};
pub use telemetry::init_tracing;
pub use transport::AfricasTalkingTransport;

/// Common imports for transport usage
pub mod prelude {
    pub use crate::config::{AppConfig, AppConfigError, LogFormat, LoggingConfig, ServerConfig};
    pub use crate::host::{ChannelHost, TransportEvent};
    pub use crate::telemetry::init_tracing;
    pub use crate::transport::AfricasTalkingTransport;
    pub use at_africastalking::{AfricasTalkingClient, AfricasTalkingConfig};
    pub use at_core::*;
    pub use at_web_generic::WebhookProcessor;
}
