use crate::helpers::{html_message, spawn_server, TestServer, API_KEY};
use mailgate::domain::Message;
use mailgate::error::{ApiErrorBody, DeliveryError};
use mailgate::messenger::{Messenger, SendGridConfig, SendGridMessenger};
use secrecy::Secret;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

fn sendgrid_messenger(app: &TestServer) -> SendGridMessenger {
    SendGridMessenger::new(SendGridConfig {
        name: None,
        enabled: true,
        api_key: Secret::new(API_KEY.into()),
        api_base: Some(app.uri()),
    })
    .expect("Failed to build the SendGrid messenger.")
}

#[tokio::test]
async fn push_sends_to_the_first_recipient() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .and(path("/v3/mail/send"))
        .and(header("Authorization", format!("Bearer {}", API_KEY).as_str()))
        .respond_with(ResponseTemplate::new(202).insert_header("X-Message-Id", "sg-id"))
        .expect(1)
        .mount(&app.server)
        .await;
    let messenger = sendgrid_messenger(&app);
    let mut message = html_message();
    message.to.push("second@example.com".into());

    // act
    messenger.push(&message).await.unwrap();

    // assert
    let body = app.last_json_body().await;
    let recipients = body["personalizations"][0]["to"].as_array().unwrap();
    assert_eq!(recipients.len(), 1);
    assert_eq!(recipients[0]["email"], message.to[0]);
    assert_eq!(body["subject"], message.subject);
    assert_eq!(body["content"][0]["type"], "text/plain");
    assert_eq!(body["content"][1]["type"], "text/html");
    assert_eq!(messenger.name(), "sendgrid");
}

#[tokio::test]
async fn rejected_request_carries_the_raw_body() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_string(r#"{"errors":[{"message":"bad key"}]}"#),
        )
        .mount(&app.server)
        .await;

    // act
    let error = sendgrid_messenger(&app)
        .push(&html_message())
        .await
        .unwrap_err();

    // assert
    match error {
        DeliveryError::Api {
            status: 401,
            body: ApiErrorBody::Raw(text),
        } => assert!(text.contains("bad key")),
        other => panic!("Expected a raw 401, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_recipients_are_rejected_locally() {
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(202))
        .expect(0)
        .mount(&app.server)
        .await;
    let message = Message {
        to: vec![],
        ..html_message()
    };

    let result = sendgrid_messenger(&app).push(&message).await;

    assert!(matches!(result, Err(DeliveryError::Validation(_))));
}
