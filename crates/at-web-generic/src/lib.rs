use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use at_core::{
    decode_body, header_value, parse_query, validate, BodyEncoding, DecodeError, FieldMap,
    Headers, HttpStatus, InboundWebhook, TransportHost, ValidationMode, WebhookError,
    WebhookResponse,
};
use serde_json::json;
use tracing::{debug, error, info, warn};

/// Framework-agnostic webhook processor that handles the inbound SMS logic.
///
/// A call moves through decode, validate, publish and respond. Decode and
/// validation failures end in a 400 reply; a host that cannot take the
/// message ends in a 500 reply.
#[derive(Clone)]
pub struct WebhookProcessor {
    hook: Arc<dyn InboundWebhook>,
    host: Arc<dyn TransportHost>,
    mode: ValidationMode,
    pending: Arc<AtomicUsize>,
}

impl WebhookProcessor {
    pub fn new(hook: Arc<dyn InboundWebhook>, host: Arc<dyn TransportHost>) -> Self {
        Self {
            hook,
            host,
            mode: ValidationMode::default(),
            pending: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn validation_mode(&self) -> ValidationMode {
        self.mode
    }

    /// Webhook calls currently in flight.
    pub fn pending_requests(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// `{"pending_requests": n}` health reply.
    pub fn health(&self) -> WebhookResponse {
        WebhookResponse::json(
            HttpStatus::Ok,
            &json!({ "pending_requests": self.pending_requests() }),
        )
    }

    /// Process an incoming webhook request and return a framework-agnostic response.
    ///
    /// `query` is the raw query string without `?`. Body fields override query
    /// parameters of the same name.
    pub async fn process_webhook(
        &self,
        query: Option<&str>,
        headers: &Headers,
        body: &[u8],
    ) -> WebhookResponse {
        let _pending = PendingGuard::enter(&self.pending);
        match self.process_webhook_internal(query, headers, body).await {
            Ok(message_id) => WebhookResponse::published(&message_id),
            Err(e) => self.error_to_response(e),
        }
    }

    async fn process_webhook_internal(
        &self,
        query: Option<&str>,
        headers: &Headers,
        body: &[u8],
    ) -> Result<String, WebhookError> {
        let fields = decode_fields(query, headers, body)?;
        debug!(fields = fields.len(), provider = self.hook.provider(), "webhook decoded");

        let values = validate(
            fields,
            self.hook.expected_fields(),
            self.hook.ignored_fields(),
            self.mode,
        )
        .into_result()
        .map_err(WebhookError::Validation)?;

        let message = self
            .hook
            .build_inbound(values)
            .map_err(|e| WebhookError::Invalid(e.to_string()))?;
        let from_addr = message.from_addr.clone();
        let message_id = self.host.publish_inbound(message).await?;
        info!(%message_id, from = %from_addr, "inbound message published");
        Ok(message_id)
    }

    fn error_to_response(&self, error: WebhookError) -> WebhookResponse {
        if matches!(error, WebhookError::Publish(_)) {
            error!(error = %error, provider = self.hook.provider(), "inbound message not published");
        } else {
            warn!(error = %error, provider = self.hook.provider(), "webhook rejected");
        }
        match error {
            WebhookError::Decode(e) => WebhookResponse::undecodable(&e),
            WebhookError::Validation(errors) => WebhookResponse::invalid(&errors),
            WebhookError::Invalid(msg) => WebhookResponse::error(HttpStatus::BadRequest, &msg),
            WebhookError::Publish(e) => WebhookResponse::error(
                HttpStatus::InternalServerError,
                &format!("publish failed: {}", e),
            ),
        }
    }
}

/// Merge query parameters with the decoded body.
///
/// A bodiless request without a structured content type (a plain GET callback)
/// contributes no body fields.
fn decode_fields(
    query: Option<&str>,
    headers: &Headers,
    body: &[u8],
) -> Result<FieldMap, DecodeError> {
    let mut fields = parse_query(query)?;
    let encoding = BodyEncoding::from_content_type(header_value(headers, "content-type"));
    if body.is_empty() && encoding == BodyEncoding::Text {
        return Ok(fields);
    }
    fields.extend(decode_body(encoding, body)?);
    Ok(fields)
}

struct PendingGuard<'a>(&'a AtomicUsize);

impl<'a> PendingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Helper trait for framework adapters to convert headers
pub trait HeaderConverter {
    type HeaderType;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers;
}

/// Helper trait for framework adapters to convert responses
pub trait ResponseConverter {
    type ResponseType;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType;
}
