//! Telegram Bot API client with HTML formatting.
//!
//! Delivers listings via `sendMessage` with an inline keyboard, answers
//! button presses, edits keyboards after an action, and long-polls
//! `getUpdates` for the command surface.

use serde::de::DeserializeOwned;
use serde_json::json;

use crate::keyboard::listing_keyboard;
use crate::templating::ListingRenderer;
use crate::traits::{MessageId, Notifier, NotifyError, OutgoingListing};
use crate::types::{ApiEnvelope, BotCommand, InlineKeyboardMarkup, SentMessage, Update};

const API_BASE: &str = "https://api.telegram.org";

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    let mut result = String::with_capacity(text.len() + 16);
    for ch in text.chars() {
        match ch {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(ch),
        }
    }
    result
}

/// Decode a Bot API response envelope.
///
/// HTTP 429 (or `error_code` 429) maps to [`NotifyError::RateLimited`] using
/// `parameters.retry_after`; any other `ok: false` maps to [`NotifyError::Api`].
pub(crate) fn decode_envelope<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, NotifyError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| NotifyError::Decode(format!("HTTP {status}: {e}")))?;

    if envelope.ok {
        return envelope
            .result
            .ok_or_else(|| NotifyError::Decode("response has ok=true but no result".to_string()));
    }

    let code = envelope.error_code.unwrap_or(status);
    if code == 429 {
        let retry_after = envelope
            .parameters
            .and_then(|p| p.retry_after)
            .unwrap_or(30);
        return Err(NotifyError::RateLimited {
            retry_after_secs: retry_after,
        });
    }

    Err(NotifyError::Api {
        code,
        description: envelope
            .description
            .unwrap_or_else(|| "Unknown Telegram API error".to_string()),
    })
}

/// Talks to the Telegram Bot API on behalf of one bot token.
#[derive(Debug)]
pub struct TelegramClient {
    bot_token: String,
    api_base: String,
    client: reqwest::Client,
    renderer: ListingRenderer,
}

impl TelegramClient {
    /// Creates a client for `bot_token`. Returns [`NotifyError::Config`] if
    /// the token is empty.
    pub fn from_config(bot_token: String) -> Result<Self, NotifyError> {
        Self::with_api_base(bot_token, API_BASE)
    }

    /// Same as [`from_config`](Self::from_config) against a custom API host
    /// (self-hosted Bot API server).
    pub fn with_api_base(bot_token: String, api_base: &str) -> Result<Self, NotifyError> {
        if bot_token.trim().is_empty() {
            return Err(NotifyError::Config(
                "Telegram bot token must not be empty".to_string(),
            ));
        }

        Ok(Self {
            bot_token,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
            renderer: ListingRenderer::new()?,
        })
    }

    pub fn renderer(&self) -> &ListingRenderer {
        &self.renderer
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.api_base, self.bot_token, method)
    }

    /// Call a Bot API method with a JSON body and decode its result.
    async fn call<T: DeserializeOwned>(&self, method: &str, body: serde_json::Value) -> Result<T, NotifyError> {
        let response = self
            .client
            .post(self.method_url(method))
            .json(&body)
            .send()
            .await?;

        let status = response.status().as_u16();
        let text = response.text().await?;
        decode_envelope(status, &text)
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        html: &str,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<MessageId, NotifyError> {
        let mut body = json!({
            "chat_id": chat_id,
            "text": html,
            "parse_mode": "HTML",
            "disable_web_page_preview": true,
        });
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| NotifyError::Decode(e.to_string()))?;
        }

        tracing::debug!(chat_id, "Sending Telegram message");
        let sent: SentMessage = self.call("sendMessage", body).await?;
        Ok(sent.message_id)
    }

    pub async fn answer_callback_query(&self, callback_id: &str, text: &str) -> Result<(), NotifyError> {
        let _: bool = self
            .call(
                "answerCallbackQuery",
                json!({ "callback_query_id": callback_id, "text": text }),
            )
            .await?;
        Ok(())
    }

    pub async fn edit_message_reply_markup(
        &self,
        chat_id: i64,
        message_id: MessageId,
        markup: Option<&InlineKeyboardMarkup>,
    ) -> Result<(), NotifyError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id });
        // Omitting reply_markup removes the keyboard.
        if let Some(markup) = markup {
            body["reply_markup"] = serde_json::to_value(markup)
                .map_err(|e| NotifyError::Decode(e.to_string()))?;
        }
        // Returns the edited Message; only success matters here.
        let _: serde_json::Value = self.call("editMessageReplyMarkup", body).await?;
        Ok(())
    }

    /// Long-poll for updates after `offset`. `timeout_secs` is the
    /// server-side wait; the HTTP request stays open that long.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>, NotifyError> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message", "callback_query"],
            }),
        )
        .await
    }

    /// Register the command list shown in Telegram's command menu.
    pub async fn set_my_commands(&self, commands: &[BotCommand]) -> Result<(), NotifyError> {
        let _: bool = self.call("setMyCommands", json!({ "commands": commands })).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramClient {
    async fn send(&self, chat_id: i64, item: &OutgoingListing) -> Result<MessageId, NotifyError> {
        let text = self.renderer.render_listing(item)?;
        let markup = listing_keyboard(&item.listing.id, &item.listing.url);
        let message_id = self.send_message(chat_id, &text, Some(&markup)).await?;
        tracing::info!(chat_id, listing_id = %item.listing.id, message_id, "Listing delivered");
        Ok(message_id)
    }

    async fn reply(&self, chat_id: i64, html: &str) -> Result<MessageId, NotifyError> {
        self.send_message(chat_id, html, None).await
    }

    async fn acknowledge(&self, callback_id: &str, text: &str) -> Result<(), NotifyError> {
        self.answer_callback_query(callback_id, text).await
    }

    async fn edit_actions(
        &self,
        chat_id: i64,
        message_id: MessageId,
        markup: Option<InlineKeyboardMarkup>,
    ) -> Result<(), NotifyError> {
        self.edit_message_reply_markup(chat_id, message_id, markup.as_ref())
            .await
    }

    fn channel_name(&self) -> &str {
        "telegram"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html_special_chars() {
        let escaped = escape_html(r#"<b>Tom & "Jerry"</b>"#);
        assert_eq!(escaped, "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;");
    }

    #[test]
    fn test_escape_html_no_special_chars() {
        let input = "Frontend React — 200 000 RUR";
        assert_eq!(escape_html(input), input);
    }

    #[test]
    fn test_escape_html_empty() {
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = TelegramClient::from_config("  ".to_string()).unwrap_err();
        assert!(err.to_string().contains("must not be empty"));
    }

    #[test]
    fn test_channel_name_and_url() {
        let client = TelegramClient::with_api_base("123:ABC".to_string(), "http://localhost:8081/").unwrap();
        assert_eq!(client.channel_name(), "telegram");
        assert_eq!(client.method_url("getMe"), "http://localhost:8081/bot123:ABC/getMe");
    }

    #[test]
    fn test_decode_ok_result() {
        let sent: SentMessage =
            decode_envelope(200, r#"{"ok":true,"result":{"message_id":77,"chat":{"id":1}}}"#).unwrap();
        assert_eq!(sent.message_id, 77);
    }

    #[test]
    fn test_decode_rate_limited() {
        let err = decode_envelope::<bool>(
            429,
            r#"{"ok":false,"error_code":429,"description":"Too Many Requests","parameters":{"retry_after":12}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, NotifyError::RateLimited { retry_after_secs: 12 }));
    }

    #[test]
    fn test_decode_api_error() {
        let err = decode_envelope::<bool>(
            400,
            r#"{"ok":false,"error_code":400,"description":"Bad Request: chat not found"}"#,
        )
        .unwrap_err();
        match err {
            NotifyError::Api { code, description } => {
                assert_eq!(code, 400);
                assert!(description.contains("chat not found"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }

    #[test]
    fn test_decode_non_json_body() {
        let err = decode_envelope::<bool>(502, "<html>Bad Gateway</html>").unwrap_err();
        assert!(matches!(err, NotifyError::Decode(msg) if msg.contains("502")));
    }

    #[test]
    fn test_decode_updates() {
        let body = r#"{"ok":true,"result":[
            {"update_id":10,"message":{"message_id":1,"chat":{"id":5,"type":"private"},"text":"/jobs"}},
            {"update_id":11,"callback_query":{"id":"cb1","from":{"id":5},"data":"fav:42",
                "message":{"message_id":3,"chat":{"id":5}}}}
        ]}"#;
        let updates: Vec<Update> = decode_envelope(200, body).unwrap();
        assert_eq!(updates.len(), 2);
        assert_eq!(updates[0].message.as_ref().and_then(|m| m.text.as_deref()), Some("/jobs"));
        let cb = updates[1].callback_query.as_ref().unwrap();
        assert_eq!(cb.data.as_deref(), Some("fav:42"));
        assert_eq!(cb.message.as_ref().map(|m| m.message_id), Some(3));
    }
}
