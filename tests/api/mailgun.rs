use crate::helpers::{html_message, spawn_server, TestServer, API_KEY};
use mailgate::domain::{ContentType, Message};
use mailgate::error::DeliveryError;
use mailgate::messenger::{MailgunConfig, MailgunMessenger, MailgunRegion, Messenger};
use secrecy::Secret;
use wiremock::matchers::{header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

fn mailgun_messenger(app: &TestServer) -> MailgunMessenger {
    MailgunMessenger::new(MailgunConfig {
        name: Some("mailgun-test".into()),
        enabled: true,
        api_key: Secret::new(API_KEY.into()),
        domain: "mg.example.com".into(),
        region: MailgunRegion::Eu,
        api_base: Some(app.uri()),
    })
    .expect("Failed to build the Mailgun messenger.")
}

fn form_fields(body: &[u8]) -> Vec<(String, String)> {
    let body = std::str::from_utf8(body).expect("Form body was not UTF-8.");
    reqwest::Url::parse(&format!("http://localhost/?{}", body))
        .expect("Form body did not parse.")
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

#[tokio::test]
async fn push_posts_a_form_to_the_domain_endpoint() {
    // arrange
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .and(path("/v3/mg.example.com/messages"))
        .and(header_exists("Authorization"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": "<mailgun-id@mg.example.com>",
            "message": "Queued. Thank you."
        })))
        .expect(1)
        .mount(&app.server)
        .await;
    let message = Message {
        body: b"plain only".to_vec(),
        content_type: ContentType::Plain,
        ..html_message()
    };

    // act
    mailgun_messenger(&app).push(&message).await.unwrap();

    // assert
    let requests = app.received_requests().await;
    let fields = form_fields(&requests[0].body);
    let field = |name: &str| {
        fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
    };
    assert_eq!(field("to"), Some(message.to[0].clone()));
    assert_eq!(field("text").as_deref(), Some("plain only"));
    assert_eq!(field("html"), None);
}

#[tokio::test]
async fn provider_error_is_surfaced() {
    let app = spawn_server().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("'to' parameter is missing"))
        .mount(&app.server)
        .await;

    let error = mailgun_messenger(&app)
        .push(&html_message())
        .await
        .unwrap_err();

    assert_eq!(error.status(), Some(400));
    assert!(error.to_string().contains("'to' parameter is missing"));
}

#[tokio::test]
async fn empty_recipients_are_rejected_locally() {
    let app = spawn_server().await;
    let message = Message {
        to: vec![],
        ..html_message()
    };

    let result = mailgun_messenger(&app).push(&message).await;

    assert!(matches!(result, Err(DeliveryError::Validation(_))));
    assert!(app.received_requests().await.is_empty());
}
