use crate::domain::ports::Notifier;
use crate::utils::error::{EtlError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";
pub const DEFAULT_TELEGRAM_TIMEOUT: Duration = Duration::from_secs(30);

const MARKDOWN_V2_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!', '\\',
];

/// Escapes text for use outside code blocks in a MarkdownV2 message.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if MARKDOWN_V2_SPECIAL.contains(&c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Escapes text placed inside a ``` block, where only ` and \ are special.
pub fn escape_code_block(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '`' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Deserialize)]
struct BotResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BotUser {
    #[serde(default)]
    username: Option<String>,
}

pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    bot_token: String,
    chat_id: i64,
}

impl TelegramNotifier {
    pub fn new(api_base: &str, bot_token: &str, chat_id: &str) -> Result<Self> {
        let chat_id = chat_id
            .trim()
            .parse::<i64>()
            .map_err(|e| EtlError::InvalidConfigValueError {
                field: "telegram_config.chat_id".to_string(),
                value: chat_id.to_string(),
                reason: format!("Chat id must be an integer: {}", e),
            })?;

        Ok(Self {
            client: build_client(DEFAULT_TELEGRAM_TIMEOUT)?,
            api_base: api_base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id,
        })
    }

    /// Replaces the per-request timeout applied to every Bot API call.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.client = build_client(timeout)?;
        Ok(self)
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    async fn parse<T: serde::de::DeserializeOwned>(
        method: &str,
        response: reqwest::Response,
    ) -> Result<Option<T>> {
        let status = response.status();
        let body = response.text().await.map_err(notification_error)?;
        let parsed: BotResponse<T> =
            serde_json::from_str(&body).map_err(|_| EtlError::NotificationError {
                message: format!("{} returned HTTP {} with unexpected body", method, status),
            })?;

        if !parsed.ok {
            return Err(EtlError::NotificationError {
                message: format!(
                    "{} failed: {}",
                    method,
                    parsed.description.unwrap_or_else(|| status.to_string())
                ),
            });
        }

        Ok(parsed.result)
    }

    /// Checks the bot token with `getMe` and returns the bot's username.
    pub async fn authorize(&self) -> Result<String> {
        let response = self
            .client
            .get(self.method_url("getMe"))
            .send()
            .await
            .map_err(notification_error)?;

        let user: Option<BotUser> = Self::parse("getMe", response).await?;
        Ok(user.and_then(|u| u.username).unwrap_or_default())
    }
}

fn build_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(notification_error)
}

fn notification_error(e: reqwest::Error) -> EtlError {
    // reqwest 錯誤訊息會包含完整 URL（含 bot token），先移除
    EtlError::NotificationError {
        message: e.without_url().to_string(),
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> Result<()> {
        let response = self
            .client
            .post(self.method_url("sendMessage"))
            .json(&json!({
                "chat_id": self.chat_id,
                "text": text,
                "parse_mode": "MarkdownV2",
            }))
            .send()
            .await
            .map_err(notification_error)?;

        Self::parse::<serde_json::Value>("sendMessage", response).await?;
        tracing::info!("📨 Telegram summary message sent");
        Ok(())
    }

    async fn send_document(&self, file_name: &str, data: Vec<u8>, caption: &str) -> Result<()> {
        let document = Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str("text/csv")
            .map_err(notification_error)?;
        let form = Form::new()
            .text("chat_id", self.chat_id.to_string())
            .text("caption", caption.to_string())
            .part("document", document);

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(notification_error)?;

        Self::parse::<serde_json::Value>("sendDocument", response).await?;
        tracing::info!("📎 Telegram CSV attachment sent");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    #[test]
    fn test_escape_markdown_v2() {
        assert_eq!(escape_markdown_v2("a_b*c"), "a\\_b\\*c");
        assert_eq!(escape_markdown_v2("(2026-10-18)"), "\\(2026\\-10\\-18\\)");
        assert_eq!(escape_markdown_v2("example.com!"), "example\\.com\\!");
        assert_eq!(escape_markdown_v2("plain text"), "plain text");
    }

    #[test]
    fn test_escape_code_block_only_touches_backtick_and_backslash() {
        assert_eq!(escape_code_block("- active: 1 (a.b)"), "- active: 1 (a.b)");
        assert_eq!(escape_code_block("a`b\\c"), "a\\`b\\\\c");
    }

    #[test]
    fn test_invalid_chat_id_is_rejected() {
        let err = TelegramNotifier::new(DEFAULT_TELEGRAM_API, "123:abc", "@channel")
            .err()
            .unwrap();
        assert!(matches!(err, EtlError::InvalidConfigValueError { ref field, .. } if field == "telegram_config.chat_id"));
    }

    #[tokio::test]
    async fn test_authorize_returns_username() {
        let server = MockServer::start();
        let get_me = server.mock(|when, then| {
            when.method(GET).path("/bot123:abc/getMe");
            then.status(200).json_body(serde_json::json!({
                "ok": true,
                "result": {"id": 42, "is_bot": true, "first_name": "Reports", "username": "dns_report_bot"}
            }));
        });

        let notifier = TelegramNotifier::new(&server.base_url(), "123:abc", "-100200300").unwrap();
        let username = notifier.authorize().await.unwrap();

        get_me.assert();
        assert_eq!(username, "dns_report_bot");
    }

    #[tokio::test]
    async fn test_send_message_uses_markdown_v2() {
        let server = MockServer::start();
        let send = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendMessage")
                .json_body(serde_json::json!({
                    "chat_id": -100200300i64,
                    "text": "*hello*",
                    "parse_mode": "MarkdownV2"
                }));
            then.status(200)
                .json_body(serde_json::json!({"ok": true, "result": {"message_id": 7}}));
        });

        let notifier = TelegramNotifier::new(&server.base_url(), "123:abc", "-100200300").unwrap();
        notifier.send_message("*hello*").await.unwrap();

        send.assert();
    }

    #[tokio::test]
    async fn test_send_document_uploads_multipart() {
        let server = MockServer::start();
        let upload = server.mock(|when, then| {
            when.method(POST)
                .path("/bot123:abc/sendDocument")
                .body_contains("name=\"document\"; filename=\"report.csv\"")
                .body_contains("tenant_id,parent_key");
            then.status(200)
                .json_body(serde_json::json!({"ok": true, "result": {"message_id": 8}}));
        });

        let notifier = TelegramNotifier::new(&server.base_url(), "123:abc", "42").unwrap();
        notifier
            .send_document("report.csv", b"tenant_id,parent_key\n".to_vec(), "DNS report")
            .await
            .unwrap();

        upload.assert();
    }

    #[tokio::test]
    async fn test_api_rejection_becomes_notification_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(400).json_body(serde_json::json!({
                "ok": false,
                "error_code": 400,
                "description": "Bad Request: can't parse entities"
            }));
        });

        let notifier = TelegramNotifier::new(&server.base_url(), "123:abc", "42").unwrap();
        let err = notifier.send_message("*broken").await.unwrap_err();

        assert!(matches!(err, EtlError::NotificationError { ref message } if message.contains("can't parse entities")));
    }

    #[tokio::test]
    async fn test_stalled_request_times_out() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path("/bot123:abc/sendMessage");
            then.status(200)
                .delay(Duration::from_secs(5))
                .json_body(serde_json::json!({"ok": true, "result": {"message_id": 9}}));
        });

        let notifier = TelegramNotifier::new(&server.base_url(), "123:abc", "42")
            .unwrap()
            .with_timeout(Duration::from_millis(200))
            .unwrap();
        let started = std::time::Instant::now();
        let err = notifier.send_message("hello").await.unwrap_err();

        assert!(started.elapsed() < Duration::from_secs(4));
        assert!(matches!(err, EtlError::NotificationError { ref message } if !message.contains("123:abc")));
    }
}
