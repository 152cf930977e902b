//! Telegram Bot API delivery.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use vigil_core::config::TelegramConfig;

use crate::{Notifier, NotifyError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Deserialize)]
struct ApiReply {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Sends messages to one chat through `sendMessage`.
pub struct TelegramNotifier {
    client: Client,
    endpoint: String,
    chat_id: String,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| NotifyError::Build(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: format!(
                "{}/bot{}/sendMessage",
                api_base.trim_end_matches('/'),
                bot_token
            ),
            chat_id: chat_id.to_string(),
        })
    }

    /// Build from config. `Ok(None)` when token or chat id is missing.
    pub fn from_config(config: &TelegramConfig) -> Result<Option<Self>, NotifyError> {
        match config.credentials() {
            Some((token, chat_id)) => Self::new(&config.api_base, token, chat_id).map(Some),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    fn name(&self) -> &'static str {
        "telegram"
    }

    async fn send(&self, text: &str) -> Result<(), NotifyError> {
        let payload = SendMessage {
            chat_id: &self.chat_id,
            text,
            parse_mode: "Markdown",
            disable_web_page_preview: true,
        };

        // The endpoint embeds the bot token; keep it out of error messages.
        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.without_url().to_string()))?;

        let status = response.status();
        let reply: Option<ApiReply> = response.json().await.ok();
        match reply {
            Some(ApiReply { ok: true, .. }) if status.is_success() => {
                debug!(chat_id = %self.chat_id, "telegram message delivered");
                Ok(())
            }
            Some(reply) => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: reply
                    .description
                    .unwrap_or_else(|| "no description".to_string()),
            }),
            None => Err(NotifyError::Rejected {
                status: status.as_u16(),
                description: "unreadable response body".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn posts_markdown_message_to_chat() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot123:abc/sendMessage"))
            .and(body_partial_json(serde_json::json!({
                "chat_id": "-1001",
                "text": "*down*",
                "parse_mode": "Markdown",
                "disable_web_page_preview": true
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ok": true,
                "result": { "message_id": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&server.uri(), "123:abc", "-1001").unwrap();
        notifier.send("*down*").await.unwrap();
    }

    #[tokio::test]
    async fn api_rejection_carries_description() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: chat not found"
            })))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&server.uri(), "t", "nope").unwrap();
        let err = notifier.send("hi").await.unwrap_err();
        match err {
            NotifyError::Rejected {
                status,
                description,
            } => {
                assert_eq!(status, 400);
                assert!(description.contains("chat not found"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn garbage_body_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("<html>"))
            .mount(&server)
            .await;

        let notifier = TelegramNotifier::new(&server.uri(), "t", "1").unwrap();
        assert!(matches!(
            notifier.send("hi").await,
            Err(NotifyError::Rejected { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn transport_error_hides_token() {
        let notifier = TelegramNotifier::new("http://127.0.0.1:1", "secret-token", "1").unwrap();
        let err = notifier.send("hi").await.unwrap_err();
        assert!(matches!(err, NotifyError::Request(_)));
        assert!(!err.to_string().contains("secret-token"));
    }

    #[test]
    fn from_config_requires_credentials() {
        let mut config = TelegramConfig::default();
        assert!(TelegramNotifier::from_config(&config).unwrap().is_none());

        config.bot_token = Some("t".to_string());
        config.chat_id = Some("1".to_string());
        let notifier = TelegramNotifier::from_config(&config).unwrap().unwrap();
        assert_eq!(notifier.endpoint, "https://api.telegram.org/bott/sendMessage");
    }
}
