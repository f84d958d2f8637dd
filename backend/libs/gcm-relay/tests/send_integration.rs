//! Integration tests for the relay send loop against a mocked FCM endpoint
//!
//! The relay client is blocking, so every call into it runs on
//! `spawn_blocking` while wiremock serves requests on the async runtime.
//!
//! Run tests:
//! ```bash
//! cargo test --package gcm-relay --test send_integration
//! ```

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gcm_relay::{
    AccessToken, AuthError, FcmClient, Message, Notification, ProtocolError, RelayError,
    TokenProvider, ValidationError,
};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SEND_PATH: &str = "/v1/projects/demo/messages:send";

/// Token provider that hands out a fixed token and counts calls
#[derive(Clone, Default)]
struct StaticTokenProvider {
    calls: Arc<AtomicUsize>,
    deny: bool,
}

impl StaticTokenProvider {
    fn denying() -> Self {
        Self {
            deny: true,
            ..Default::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TokenProvider for StaticTokenProvider {
    fn access_token(&self, _credentials: &[u8]) -> Result<AccessToken, AuthError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.deny {
            return Err(AuthError::TokenRequestFailed {
                status: 403,
                body: "scope denied".to_string(),
            });
        }
        Ok(AccessToken {
            access_token: "test-token".to_string(),
            expires_at: 0,
        })
    }
}

async fn run_blocking<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .expect("blocking task panicked")
}

/// Send `message` through a fresh client pointed at `server`
async fn send_via(
    server: &MockServer,
    provider: StaticTokenProvider,
    message: Message,
) -> Result<Vec<gcm_relay::DeliveryResult>, RelayError> {
    let endpoint = format!("{}{}", server.uri(), SEND_PATH);
    run_blocking(move || {
        let client = FcmClient::new(&endpoint, "server-key")?.with_token_provider(provider);
        client.send(&message, b"{}")
    })
    .await
}

async fn sent_tokens(server: &MockServer) -> Vec<String> {
    server
        .received_requests()
        .await
        .expect("request recording enabled")
        .iter()
        .map(|request| {
            let body: Value = serde_json::from_slice(&request.body).unwrap();
            body["message"]["token"].as_str().unwrap().to_string()
        })
        .collect()
}

fn accepted(name: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "name": name }))
}

#[tokio::test(flavor = "multi_thread")]
async fn test_single_target_round_trip() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(header("authorization", "Bearer test-token"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({
            "message": {
                "token": "tok1",
                "notification": {"title": "Hi", "body": "there"},
                "android": {"notification": {}, "priority": "high"}
            }
        })))
        .respond_with(accepted("projects/x/messages/1"))
        .expect(1)
        .mount(&server)
        .await;

    let message = Message::new(["tok1"])
        .with_notification(Notification::new("Hi", "there"))
        .with_priority("high");

    let results = send_via(&server, StaticTokenProvider::default(), message)
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].name(), Some("projects/x/messages/1"));
    assert_eq!(results[0].0, json!({"name": "projects/x/messages/1"}));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_one_request_per_target_in_order() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(accepted("projects/demo/messages/ok"))
        .expect(3)
        .mount(&server)
        .await;

    let provider = StaticTokenProvider::default();
    let results = send_via(&server, provider.clone(), Message::new(["A", "B", "C"]))
        .await
        .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(sent_tokens(&server).await, ["A", "B", "C"]);
    assert_eq!(provider.calls(), 1, "one token per send call");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_failure_stops_the_batch() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_partial_json(json!({"message": {"token": "B"}})))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend unavailable"))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(accepted("projects/demo/messages/ok"))
        .mount(&server)
        .await;

    let err = send_via(
        &server,
        StaticTokenProvider::default(),
        Message::new(["A", "B", "C"]),
    )
    .await
    .unwrap_err();

    match err {
        RelayError::Protocol(ProtocolError::UnexpectedStatus { status, body }) => {
            assert_eq!(status, 500);
            assert_eq!(body, "backend unavailable");
        }
        other => panic!("expected protocol error, got {other:?}"),
    }
    assert_eq!(sent_tokens(&server).await, ["A", "B"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_non_200_success_status_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(202).set_body_json(json!({"name": "queued"})))
        .expect(1)
        .mount(&server)
        .await;

    let err = send_via(&server, StaticTokenProvider::default(), Message::new(["A"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Protocol(ProtocolError::UnexpectedStatus { status: 202, .. })
    ));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_undecodable_response_is_protocol_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .expect(1)
        .mount(&server)
        .await;

    let err = send_via(&server, StaticTokenProvider::default(), Message::new(["A", "B"]))
        .await
        .unwrap_err();

    assert!(matches!(err, RelayError::Protocol(ProtocolError::Decode(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_auth_failure_sends_nothing() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(accepted("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let provider = StaticTokenProvider::denying();
    let err = send_via(&server, provider.clone(), Message::new(["A", "B"]))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RelayError::Auth(AuthError::TokenRequestFailed { status: 403, .. })
    ));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_invalid_messages_never_reach_the_network() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(accepted("unused"))
        .expect(0)
        .mount(&server)
        .await;

    let too_many: Vec<String> = (0..1001).map(|i| format!("token-{i}")).collect();
    let cases = vec![
        (Message::default(), ValidationError::MissingTargets),
        (Message::new(Vec::<String>::new()), ValidationError::EmptyTargets),
        (
            Message::new(too_many),
            ValidationError::TooManyTargets { max: 1000 },
        ),
        (
            Message::new(["A"]).with_time_to_live(2_419_201),
            ValidationError::TimeToLiveOutOfRange {
                value: 2_419_201,
                max: 2_419_200,
            },
        ),
    ];

    let provider = StaticTokenProvider::default();
    for (message, expected) in cases {
        let err = send_via(&server, provider.clone(), message).await.unwrap_err();
        match err {
            RelayError::Validation(actual) => assert_eq!(actual, expected),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    let err = send_via(
        &server,
        provider.clone(),
        Message::new(["A"]).with_priority("urgent"),
    )
    .await
    .unwrap_err();
    assert!(matches!(
        err,
        RelayError::Validation(ValidationError::InvalidPriority { .. })
    ));

    assert_eq!(provider.calls(), 0, "validation runs before token exchange");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_token_acquired_on_every_send() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(accepted("projects/demo/messages/ok"))
        .expect(2)
        .mount(&server)
        .await;

    let endpoint = format!("{}{}", server.uri(), SEND_PATH);
    let provider = StaticTokenProvider::default();
    let provider_for_client = provider.clone();

    run_blocking(move || {
        let client =
            FcmClient::new(&endpoint, "server-key")?.with_token_provider(provider_for_client);
        client.send(&Message::new(["A"]), b"{}")?;
        client.send(&Message::new(["B"]), b"{}")
    })
    .await
    .unwrap();

    assert_eq!(provider.calls(), 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_multicast_continues_past_failures() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .and(body_partial_json(json!({"message": {"token": "B"}})))
        .respond_with(ResponseTemplate::new(404).set_body_string("UNREGISTERED"))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(accepted("projects/demo/messages/ok"))
        .mount(&server)
        .await;

    let endpoint = format!("{}{}", server.uri(), SEND_PATH);
    let outcome = run_blocking(move || {
        let client = FcmClient::new(&endpoint, "server-key")?
            .with_token_provider(StaticTokenProvider::default());
        client.send_multicast(&Message::new(["A", "B", "C"]), b"{}")
    })
    .await
    .unwrap();

    assert_eq!(outcome.success_count, 2);
    assert_eq!(outcome.failure_count, 1);

    let targets: Vec<&str> = outcome.results.iter().map(|o| o.target.as_str()).collect();
    assert_eq!(targets, ["A", "B", "C"]);
    assert!(outcome.results[0].result.is_ok());
    assert!(matches!(
        outcome.results[1].result,
        Err(RelayError::Protocol(ProtocolError::UnexpectedStatus { status: 404, .. }))
    ));
    assert!(outcome.results[2].result.is_ok());
    assert_eq!(sent_tokens(&server).await, ["A", "B", "C"]);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_connection_failure_is_transport_error() {
    // Nothing listens on port 1
    let err = run_blocking(|| {
        let client = FcmClient::new("http://127.0.0.1:1/v1/projects/demo/messages:send", "key")?
            .with_token_provider(StaticTokenProvider::default());
        client.send(&Message::new(["A"]), b"{}")
    })
    .await
    .unwrap_err();

    assert!(matches!(err, RelayError::Transport(_)));
}
