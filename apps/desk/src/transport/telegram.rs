//! Telegram Bot API bridge: webhook updates in, `sendMessage` out.
//!
//! Replies are sent with Markdown parse mode. Every widget becomes an inline
//! keyboard with one button per row; free-text prompts still carry their
//! cancel button.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::transport::{ChatEvent, ChatTransport, EventKind, Reply, UserId};

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

impl Update {
    /// The chat event this update carries, plus the callback id to acknowledge
    /// for button presses. Stickers, photos and the like carry no event.
    pub fn into_event(self) -> Option<(ChatEvent, Option<String>)> {
        if let Some(query) = self.callback_query {
            let event = ChatEvent {
                user_id: query.from.id,
                kind: EventKind::Choice,
                payload: query.data.unwrap_or_default(),
            };
            return Some((event, Some(query.id)));
        }
        let message = self.message?;
        let text = message.text?;
        Some((ChatEvent::text(message.chat.id, text), None))
    }
}

#[derive(Debug, Serialize)]
struct InlineButton<'a> {
    text: &'a str,
    callback_data: &'a str,
}

fn send_message_body(chat_id: UserId, reply: &Reply) -> serde_json::Value {
    let buttons = reply.widget.buttons();
    let mut body = json!({
        "chat_id": chat_id,
        "text": reply.text,
        "parse_mode": "Markdown",
    });
    if !buttons.is_empty() {
        let rows: Vec<Vec<InlineButton>> = buttons
            .iter()
            .map(|b| {
                vec![InlineButton {
                    text: &b.label,
                    callback_data: &b.data,
                }]
            })
            .collect();
        body["reply_markup"] = json!({ "inline_keyboard": rows });
    }
    body
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            base_url: format!("{}/bot{token}", api_url.trim_end_matches('/')),
        }
    }

    async fn call(&self, method: &str, body: &serde_json::Value) -> Result<(), AppError> {
        let response = self
            .client
            .post(format!("{}/{method}", self.base_url))
            .json(body)
            .send()
            .await
            .map_err(|e| AppError::Transport(format!("{method}: {e}")))?;

        let status = response.status();
        let parsed: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::Transport(format!("{method} returned {status}: {e}")))?;
        if !parsed.ok {
            let description = parsed.description.unwrap_or_default();
            warn!("Telegram {method} rejected ({status}): {description}");
            return Err(AppError::Transport(format!("{method}: {description}")));
        }
        debug!("Telegram {method} succeeded");
        Ok(())
    }
}

#[async_trait]
impl ChatTransport for TelegramClient {
    async fn send(&self, user_id: UserId, reply: &Reply) -> Result<(), AppError> {
        self.call("sendMessage", &send_message_body(user_id, reply))
            .await
    }

    async fn acknowledge(&self, receipt: &str) -> Result<(), AppError> {
        self.call("answerCallbackQuery", &json!({ "callback_query_id": receipt }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Action, Widget};

    fn update(value: serde_json::Value) -> Update {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_text_message_becomes_text_event() {
        let u = update(json!({
            "update_id": 1,
            "message": {"message_id": 3, "chat": {"id": 42, "type": "private"}, "text": "/start"}
        }));
        let (event, receipt) = u.into_event().unwrap();
        assert_eq!(event, ChatEvent::text(42, "/start"));
        assert_eq!(receipt, None);
    }

    #[test]
    fn test_callback_becomes_choice_event_with_receipt() {
        let u = update(json!({
            "update_id": 2,
            "callback_query": {
                "id": "cb-9",
                "from": {"id": 42, "is_bot": false, "first_name": "Op"},
                "data": "entry_select:1"
            }
        }));
        let (event, receipt) = u.into_event().unwrap();
        assert_eq!(event, ChatEvent::choice(42, &Action::SelectEntry(1)));
        assert_eq!(receipt.as_deref(), Some("cb-9"));
    }

    #[test]
    fn test_photo_without_text_is_ignored() {
        let u = update(json!({
            "update_id": 3,
            "message": {"chat": {"id": 42}, "photo": []}
        }));
        assert!(u.into_event().is_none());
    }

    #[test]
    fn test_keyboard_has_one_button_per_row() {
        let reply = Reply::new("Select *Currently Working*:", Widget::TwoChoice);
        let body = send_message_body(42, &reply);
        assert_eq!(body["parse_mode"], "Markdown");
        let rows = body["reply_markup"]["inline_keyboard"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0]["callback_data"], "bool:true");
        assert_eq!(rows[2][0]["callback_data"], "cancel");
    }

    #[test]
    fn test_plain_reply_has_no_keyboard() {
        let body = send_message_body(42, &Reply::plain("details"));
        assert!(body.get("reply_markup").is_none());
    }

    #[test]
    fn test_base_url_trims_trailing_slash() {
        let client = TelegramClient::new("https://api.telegram.org/", "123:abc");
        assert_eq!(client.base_url, "https://api.telegram.org/bot123:abc");
    }
}
