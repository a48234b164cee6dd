use axum::{
    extract::{RawQuery, State},
    http::{header::CONTENT_TYPE, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use bytes::Bytes;
use at_core::{Headers, WebhookResponse};
use at_web_generic::{HeaderConverter, ResponseConverter, WebhookProcessor};

#[derive(Clone)]
pub struct AppState {
    pub processor: WebhookProcessor,
}

/// Axum-specific header converter
pub struct AxumHeaderConverter;

impl HeaderConverter for AxumHeaderConverter {
    type HeaderType = HeaderMap;

    fn to_generic_headers(headers: &Self::HeaderType) -> Headers {
        headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    v.to_str().unwrap_or_default().to_string(),
                )
            })
            .collect()
    }
}

/// Axum-specific response converter
pub struct AxumResponseConverter;

impl ResponseConverter for AxumResponseConverter {
    type ResponseType = Response;

    fn from_webhook_response(response: WebhookResponse) -> Self::ResponseType {
        let status = StatusCode::from_u16(response.status.as_u16())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (
            status,
            [(CONTENT_TYPE, response.content_type)],
            response.body,
        )
            .into_response()
    }
}

/// Inbound SMS callback: GET or POST on the configured web path.
pub async fn inbound_webhook(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let generic_headers = AxumHeaderConverter::to_generic_headers(&headers);
    let response = state
        .processor
        .process_webhook(query.as_deref(), &generic_headers, &body)
        .await;
    AxumResponseConverter::from_webhook_response(response)
}

pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    AxumResponseConverter::from_webhook_response(state.processor.health())
}

/// Router with the webhook and health routes mounted.
pub fn router(state: AppState, web_path: &str, health_path: &str) -> Router {
    Router::new()
        .route(&route_path(web_path), get(inbound_webhook).post(inbound_webhook))
        .route(&route_path(health_path), get(health))
        .with_state(state)
}

fn route_path(path: &str) -> String {
    format!("/{}", path.trim_matches('/'))
}
