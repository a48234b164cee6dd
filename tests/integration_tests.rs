use at_transport::prelude::*;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use httpmock::Method::POST;
use httpmock::MockServer;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;

fn sandbox_config(base_url: &str) -> AppConfig {
    let mut config = AppConfig::default();
    config.africastalking = AfricasTalkingConfig {
        outbound_sandbox_url: base_url.to_string(),
        request_timeout_seconds: 5,
        ..AfricasTalkingConfig::new("sandbox", "test-key")
    };
    config
}

fn transport(config: &AppConfig) -> (AfricasTalkingTransport, UnboundedReceiver<TransportEvent>) {
    let (host, events) = ChannelHost::channel();
    let transport = AfricasTalkingTransport::new(config, Arc::new(host)).unwrap();
    (transport, events)
}

fn message(id: &str) -> OutboundMessage {
    OutboundMessage::new(id.to_string(), vec!["+254711000000".to_string()], "hello".to_string())
}

/// Events received so far, with status reports filtered out.
fn drain(events: &mut UnboundedReceiver<TransportEvent>) -> Vec<TransportEvent> {
    let mut out = Vec::new();
    while let Ok(event) = events.try_recv() {
        if !matches!(event, TransportEvent::Status(_)) {
            out.push(event);
        }
    }
    out
}

#[test]
fn test_endpoint_selection_follows_username() {
    let mut config = AppConfig::default();
    config.africastalking = AfricasTalkingConfig::new("sandbox", "k");
    let (sandbox, _events) = transport(&config);
    assert_eq!(
        sandbox.client().outbound_url(),
        "https://api.sandbox.africastalking.com/version1/messaging"
    );

    config.africastalking = AfricasTalkingConfig::new("acme", "k");
    let (production, _events) = transport(&config);
    assert_eq!(
        production.client().outbound_url(),
        "https://api.africastalking.com/version1/messaging"
    );
}

#[test]
fn test_transport_requires_credentials() {
    let (host, _events) = ChannelHost::channel();
    let result = AfricasTalkingTransport::new(&AppConfig::default(), Arc::new(host));
    assert!(matches!(result, Err(AppConfigError::Provider(_))));
}

#[tokio::test]
async fn test_successful_send_is_acknowledged() {
    let server = MockServer::start();
    let gateway = server.mock(|when, then| {
        when.method(POST)
            .path("/version1/messaging")
            .header("apikey", "test-key")
            .form_urlencoded_tuple("username", "sandbox")
            .form_urlencoded_tuple("to", "+254711000000")
            .form_urlencoded_tuple("message", "hello");
        then.status(200)
            .header("content-type", "application/json")
            .json_body(json!({
            "SMSMessageData": {
                "Message": "Sent to 1/1 Total Cost: KES 0.8000",
                "Recipients": [{
                    "statusCode": 101,
                    "number": "+254711000000",
                    "status": "Success",
                    "messageId": "ATXid_1"
                }]
            }
        }));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    let outcome = transport.handle_outbound(&message("m1")).await.unwrap();
    assert!(outcome.is_success());
    gateway.assert_calls(1);

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    match &events[0] {
        TransportEvent::Ack {
            user_message_id,
            sent_message_id,
            info,
        } => {
            assert_eq!(user_message_id, "m1");
            assert_eq!(sent_message_id, "ATXid_1");
            assert!(info.get("SMSMessageData").is_some());
        }
        other => panic!("expected ack, got {other:?}"),
    }
}

#[tokio::test]
async fn test_success_acks_then_reports_outbound_health() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(200).json_body(json!({}));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    transport.handle_outbound(&message("m1")).await.unwrap();

    assert!(matches!(
        events.try_recv(),
        Ok(TransportEvent::Ack { sent_message_id, .. }) if sent_message_id == "m1"
    ));
    match events.try_recv() {
        Ok(TransportEvent::Status(status)) => {
            assert_eq!(status.component, "africastalking_outbound");
            assert_eq!(status.status, HealthState::Ok);
            assert_eq!(status.kind, "good_outbound_request");
        }
        other => panic!("expected status report, got {other:?}"),
    }
}

#[tokio::test]
async fn test_gateway_error_is_negatively_acknowledged() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(404)
            .header("content-type", "application/json")
            .json_body(json!({ "description": "bad request" }));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    let outcome = transport.handle_outbound(&message("m2")).await.unwrap();
    assert!(!outcome.is_success());

    let events = drain(&mut events);
    assert_eq!(
        events,
        vec![TransportEvent::Nack {
            user_message_id: "m2".to_string(),
            reason: "bad request".to_string(),
            details: Some(FailureDetails {
                error: "bad request".to_string(),
                res_code: 404,
            }),
        }]
    );
}

#[tokio::test]
async fn test_plain_text_error_body_becomes_reason() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(401).body("The supplied authentication is invalid");
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    transport.handle_outbound(&message("m3")).await.unwrap();

    assert!(matches!(
        drain(&mut events).as_slice(),
        [TransportEvent::Nack { reason, details: Some(FailureDetails { res_code: 401, .. }), .. }]
            if reason == "The supplied authentication is invalid"
    ));
}

#[tokio::test]
async fn test_missing_content_never_reaches_gateway() {
    let server = MockServer::start();
    let gateway = server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(200).json_body(json!({}));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    let mut msg = message("m4");
    msg.content = None;
    let outcome = transport.handle_outbound(&msg).await.unwrap();

    gateway.assert_calls(0);
    assert_eq!(
        outcome,
        Outcome::Rejected {
            missing: vec!["content".to_string()]
        }
    );
    assert_eq!(
        drain(&mut events),
        vec![TransportEvent::Nack {
            user_message_id: "m4".to_string(),
            reason: "Missing fields: content".to_string(),
            details: None,
        }]
    );
}

#[tokio::test]
async fn test_connection_refused_emits_nothing() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let (transport, mut events) = transport(&sandbox_config(&format!("http://127.0.0.1:{port}")));
    let result = transport.handle_outbound(&message("m5")).await;

    assert!(matches!(result, Err(TransportError::Http(_))));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_cancelled_delivery_emits_nothing() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(200)
            .json_body(json!({}))
            .delay(Duration::from_secs(2));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    let result =
        tokio::time::timeout(Duration::from_millis(100), transport.handle_outbound(&message("m6")))
            .await;

    assert!(result.is_err());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_concurrent_deliveries_each_acknowledged_once() {
    use futures::future;

    let server = MockServer::start();
    let gateway = server.mock(|when, then| {
        when.method(POST).path("/version1/messaging");
        then.status(200).json_body(json!({}));
    });

    let (transport, mut events) = transport(&sandbox_config(&server.base_url()));
    let messages: Vec<OutboundMessage> = (0..10).map(|i| message(&format!("c{i}"))).collect();
    let results = future::join_all(messages.iter().map(|m| transport.handle_outbound(m))).await;

    assert!(results.iter().all(|r| matches!(r, Ok(o) if o.is_success())));
    gateway.assert_calls(10);

    let mut acked: Vec<String> = drain(&mut events)
        .into_iter()
        .filter_map(|event| match event {
            TransportEvent::Ack { user_message_id, .. } => Some(user_message_id),
            _ => None,
        })
        .collect();
    acked.sort();
    let mut expected: Vec<String> = (0..10).map(|i| format!("c{i}")).collect();
    expected.sort();
    assert_eq!(acked, expected);
}

async fn call(transport: &AfricasTalkingTransport, request: Request<Body>) -> (StatusCode, Value) {
    let response = transport.router().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

#[tokio::test]
async fn test_inbound_json_callback_is_published() {
    let (transport, mut events) = transport(&sandbox_config("http://127.0.0.1:1"));
    let request = Request::builder()
        .method("POST")
        .uri("/africastalking")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({
                "date": "2026-10-19T08:30:00Z",
                "to": "12345",
                "from": "+254711000000",
                "text": "hi",
                "id": "abc"
            })
            .to_string(),
        ))
        .unwrap();

    let (status, body) = call(&transport, request).await;
    assert_eq!(status, StatusCode::OK);

    let events = drain(&mut events);
    assert_eq!(events.len(), 1);
    let TransportEvent::Inbound(inbound) = &events[0] else {
        panic!("expected inbound message, got {:?}", events[0]);
    };
    assert_eq!(body, json!({ "message_id": inbound.message_id }));
    assert_eq!(inbound.content, "hi");
    assert_eq!(inbound.from_addr, "+254711000000");
    assert_eq!(inbound.to_addr, "12345");
    assert_eq!(inbound.transport_name, "at_transport");
    assert_eq!(inbound.transport_metadata["id"], "abc");
}

#[tokio::test]
async fn test_inbound_form_callback_is_published() {
    let (transport, mut events) = transport(&sandbox_config("http://127.0.0.1:1"));
    let request = Request::builder()
        .method("POST")
        .uri("/africastalking")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(
            "date=2026-10-19+08%3A30%3A00&to=12345&from=%2B254711000000&text=hello+there&linkId=L1",
        ))
        .unwrap();

    let (status, _) = call(&transport, request).await;
    assert_eq!(status, StatusCode::OK);
    assert!(matches!(
        drain(&mut events).as_slice(),
        [TransportEvent::Inbound(m)] if m.content == "hello there"
    ));
}

#[tokio::test]
async fn test_inbound_unexpected_field_rejected_in_strict_mode() {
    let (transport, mut events) = transport(&sandbox_config("http://127.0.0.1:1"));
    let request = Request::builder()
        .method("GET")
        .uri("/africastalking?date=2026-10-19&to=1&from=2&text=hi&colour=red")
        .body(Body::empty())
        .unwrap();

    let (status, body) = call(&transport, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "unexpected_parameter": ["colour"] }));
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn test_inbound_unexpected_field_dropped_in_permissive_mode() {
    let mut config = sandbox_config("http://127.0.0.1:1");
    config.africastalking.validation_mode = ValidationMode::Permissive;
    let (transport, mut events) = transport(&config);
    let request = Request::builder()
        .method("GET")
        .uri("/africastalking?date=2026-10-19&to=1&from=2&text=hi&colour=red")
        .body(Body::empty())
        .unwrap();

    let (status, _) = call(&transport, request).await;
    assert_eq!(status, StatusCode::OK);
    match drain(&mut events).as_slice() {
        [TransportEvent::Inbound(m)] => assert!(m.raw.get("colour").is_none()),
        other => panic!("expected one inbound message, got {other:?}"),
    }
}

#[tokio::test]
async fn test_health_endpoint_reports_pending_requests() {
    let (transport, _events) = transport(&sandbox_config("http://127.0.0.1:1"));
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = call(&transport, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "pending_requests": 0 }));
    assert_eq!(transport.processor().pending_requests(), 0);
}

#[test]
fn test_config_from_toml_builds_transport() {
    let config = AppConfig::from_toml_str(
        r#"
        [server]
        web_path = "/sms/inbound"

        [africastalking]
        username = "acme"
        api_key = "live-key"
        outbound_production_url = "https://gateway.example.test/"
        "#,
    )
    .unwrap();

    let (transport, _events) = transport(&config);
    assert_eq!(
        transport.client().outbound_url(),
        "https://gateway.example.test/version1/messaging"
    );
    assert_eq!(transport.processor().validation_mode(), ValidationMode::Strict);
}
