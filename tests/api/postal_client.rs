use crate::helpers::{spawn_server, API_KEY};
use claim::assert_ok;
use mailgate::error::{ApiErrorBody, DeliveryError};
use mailgate::postal::SendMessageRequest;
use std::time::Duration;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn request() -> SendMessageRequest {
    SendMessageRequest {
        to: vec!["test@example.com".into()],
        from: "sender@example.com".into(),
        subject: "Test Subject".into(),
        html_body: Some("<p>Test Body</p>".into()),
        plain_body: Some("Test Body".into()),
        tag: Some("campaign-123-subscriber-456".into()),
        ..Default::default()
    }
}

#[tokio::test]
async fn send_posts_json_with_the_api_key() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/send/message"))
        .and(header("X-Server-API-Key", API_KEY))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "time": 0.123,
            "data": {"message_id": "test-message-id"}
        })))
        .expect(1)
        .mount(&app.server)
        .await;

    // act
    let response = app.postal_client(None).send(&request()).await;

    // assert
    assert_ok!(&response);
    assert_eq!(response.unwrap().message_id(), "test-message-id");

    let body = app.last_json_body().await;
    assert_eq!(body["to"], serde_json::json!(["test@example.com"]));
    assert_eq!(body["tag"], "campaign-123-subscriber-456");
    assert_eq!(body["plain_body"], "Test Body");
    assert!(body.get("headers").is_none());
    assert!(body.get("attachments").is_none());
}

#[tokio::test]
async fn structured_error_envelope_is_surfaced() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "status": "error",
            "time": 0.123,
            "data": {"message": "Invalid request"}
        })))
        .mount(&app.server)
        .await;

    // act
    let error = app.postal_client(None).send(&request()).await.unwrap_err();

    // assert
    match error {
        DeliveryError::Api {
            status,
            body: ApiErrorBody::Envelope(envelope),
        } => {
            assert_eq!(status, 400);
            assert_eq!(envelope.data["message"], "Invalid request");
        }
        other => panic!("Expected an API error envelope, got {:?}", other),
    }
}

#[tokio::test]
async fn non_json_error_body_is_kept_verbatim() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .mount(&app.server)
        .await;

    // act
    let error = app.postal_client(None).send(&request()).await.unwrap_err();

    // assert
    assert_eq!(error.status(), Some(503));
    match error {
        DeliveryError::Api {
            body: ApiErrorBody::Raw(text),
            ..
        } => assert_eq!(text, "upstream unavailable"),
        other => panic!("Expected a raw API error, got {:?}", other),
    }
}

#[tokio::test]
async fn any_non_2xx_status_is_an_error() {
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400))
        .mount(&app.server)
        .await;

    let result = app.postal_client(None).send(&request()).await;

    assert!(result.is_err());
}

#[tokio::test]
async fn logical_failure_behind_a_200_is_rejected() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "parameter-error",
            "time": 0.01,
            "data": {"message": "No recipients"}
        })))
        .mount(&app.server)
        .await;

    // act
    let error = app.postal_client(None).send(&request()).await.unwrap_err();

    // assert
    match error {
        DeliveryError::SendRejected(status) => assert_eq!(status, "parameter-error"),
        other => panic!("Expected a rejected send, got {:?}", other),
    }
}

#[tokio::test]
async fn undecodable_success_body_is_malformed() {
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&app.server)
        .await;

    let error = app.postal_client(None).send(&request()).await.unwrap_err();

    assert!(matches!(error, DeliveryError::MalformedResponse(_)));
}

#[tokio::test]
async fn slow_responses_time_out_as_transport_errors() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(serde_json::json!({"status": "success"}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&app.server)
        .await;
    let client = app.postal_client(Some(Duration::from_millis(200)));

    // act
    let error = client.send(&request()).await.unwrap_err();

    // assert
    assert!(matches!(error, DeliveryError::Transport(_)));
    assert!(error.is_timeout());
}

#[tokio::test]
async fn client_keeps_working_after_close() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {"message_id": "id"}
        })))
        .expect(2)
        .mount(&app.server)
        .await;
    let client = app.postal_client(None);

    // act
    assert_ok!(client.send(&request()).await);
    client.close().unwrap();
    client.close().unwrap();

    // assert
    assert_ok!(client.send(&request()).await);
}

#[tokio::test]
async fn concurrent_sends_share_one_client() {
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": {"message_id": "id"}
        })))
        .expect(4)
        .mount(&app.server)
        .await;
    let client = app.postal_client(None);
    let request = request();

    let results = send_four_times(&client, &request).await;

    assert!(results.iter().all(Result::is_ok));
}

async fn send_four_times(
    client: &mailgate::postal::PostalClient,
    request: &SendMessageRequest,
) -> Vec<Result<mailgate::postal::SendMessageResponse, DeliveryError>> {
    let (a, b, c, d) = tokio::join!(
        client.send(request),
        client.send(request),
        client.send(request),
        client.send(request)
    );
    vec![a, b, c, d]
}
