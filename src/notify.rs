//! Publishing clients.
//!
//! Credentials come from the environment and are checked when a post is
//! actually sent, so runs that end up skipping never need them.

use std::env;
use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::{json, Value};
use tracing::{error, info};

use crate::config::PublisherKind;
use crate::error::PublishError;
use crate::types::PostId;

const X_API_BASE: &str = "https://api.twitter.com/2";
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

pub trait Publisher {
    fn name(&self) -> &'static str;

    fn publish(&self, text: &str) -> Result<PostId, PublishError>;

    fn publish_reply(&self, text: &str, parent: &PostId) -> Result<PostId, PublishError>;

    fn delete(&self, id: &PostId) -> Result<(), PublishError>;

    /// Post `texts` in order, each one replying to the previous.
    fn publish_thread(&self, texts: &[String]) -> Result<Vec<PostId>, PublishError> {
        let mut ids: Vec<PostId> = Vec::with_capacity(texts.len());
        for (i, text) in texts.iter().enumerate() {
            info!("Posting {}/{} to {}", i + 1, texts.len(), self.name());
            let id = match ids.last() {
                Some(parent) => self.publish_reply(text, parent)?,
                None => self.publish(text)?,
            };
            ids.push(id);
        }
        info!("Thread of {} posts published", ids.len());
        Ok(ids)
    }
}

/// Publisher for the configured service, credentials read from env.
pub fn publisher_from_env(kind: PublisherKind, timeout: Duration) -> anyhow::Result<Box<dyn Publisher>> {
    let client = Client::builder().timeout(timeout).build()?;
    Ok(match kind {
        PublisherKind::X => Box::new(XPublisher::from_env(client)),
        PublisherKind::Telegram => Box::new(TelegramPublisher::from_env(client)),
    })
}

fn env_value(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn classify_status(service: &'static str, response: Response) -> PublishError {
    let status = response.status().as_u16();
    let message = response.text().unwrap_or_default();
    error!("{} returned HTTP {}: {}", service, status, message);
    match status {
        401 | 403 => PublishError::Unauthorized { service, status, message },
        _ => PublishError::Api { service, status, message },
    }
}

fn transport(service: &'static str, e: reqwest::Error) -> PublishError {
    error!("{} request failed: {}", service, e);
    PublishError::Transport { service, message: e.to_string() }
}

fn read_json(service: &'static str, response: Response) -> Result<Value, PublishError> {
    if !response.status().is_success() {
        return Err(classify_status(service, response));
    }
    response.json::<Value>().map_err(|e| PublishError::UnexpectedResponse {
        service,
        message: e.to_string(),
    })
}

/// X (Twitter) API v2 with a user-context OAuth 2.0 access token.
///
/// X expires these tokens after about two hours; scheduled runs must be
/// handed a freshly refreshed `X_ACCESS_TOKEN`. A stale one surfaces as
/// `PublishError::Unauthorized`.
pub struct XPublisher {
    client: Client,
    api_base: String,
    access_token: Option<String>,
}

impl XPublisher {
    const SERVICE: &'static str = "X";

    pub fn new(client: Client, access_token: Option<String>) -> Self {
        Self {
            client,
            api_base: X_API_BASE.to_string(),
            access_token,
        }
    }

    pub fn from_env(client: Client) -> Self {
        Self::new(client, env_value("X_ACCESS_TOKEN"))
    }

    fn token(&self) -> Result<&str, PublishError> {
        self.access_token
            .as_deref()
            .ok_or_else(|| PublishError::MissingCredentials {
                service: Self::SERVICE,
                missing: "X_ACCESS_TOKEN".to_string(),
            })
    }

    fn create(&self, body: Value) -> Result<PostId, PublishError> {
        let token = self.token()?;
        let response = self
            .client
            .post(format!("{}/tweets", self.api_base))
            .bearer_auth(token)
            .json(&body)
            .send()
            .map_err(|e| transport(Self::SERVICE, e))?;

        let value = read_json(Self::SERVICE, response)?;
        let id = value
            .pointer("/data/id")
            .and_then(Value::as_str)
            .ok_or_else(|| PublishError::UnexpectedResponse {
                service: Self::SERVICE,
                message: format!("no data.id in {}", value),
            })?;

        info!("Post published on X, id {}", id);
        Ok(PostId(id.to_string()))
    }
}

impl Publisher for XPublisher {
    fn name(&self) -> &'static str {
        Self::SERVICE
    }

    fn publish(&self, text: &str) -> Result<PostId, PublishError> {
        info!("Posting to X ({} characters)", text.chars().count());
        self.create(json!({ "text": text }))
    }

    fn publish_reply(&self, text: &str, parent: &PostId) -> Result<PostId, PublishError> {
        self.create(json!({
            "text": text,
            "reply": { "in_reply_to_tweet_id": parent.0 },
        }))
    }

    fn delete(&self, id: &PostId) -> Result<(), PublishError> {
        let token = self.token()?;
        info!("Deleting X post {}", id);
        let response = self
            .client
            .delete(format!("{}/tweets/{}", self.api_base, id))
            .bearer_auth(token)
            .send()
            .map_err(|e| transport(Self::SERVICE, e))?;

        let value = read_json(Self::SERVICE, response)?;
        match value.pointer("/data/deleted").and_then(Value::as_bool) {
            Some(true) => {
                info!("Post {} deleted", id);
                Ok(())
            }
            _ => Err(PublishError::UnexpectedResponse {
                service: Self::SERVICE,
                message: format!("post {} not deleted: {}", id, value),
            }),
        }
    }
}

/// Telegram Bot API `sendMessage` to a single chat.
pub struct TelegramPublisher {
    client: Client,
    api_base: String,
    token: Option<String>,
    chat_id: Option<String>,
}

impl TelegramPublisher {
    const SERVICE: &'static str = "Telegram";

    pub fn new(client: Client, token: Option<String>, chat_id: Option<String>) -> Self {
        Self {
            client,
            api_base: TELEGRAM_API_BASE.to_string(),
            token,
            chat_id,
        }
    }

    pub fn from_env(client: Client) -> Self {
        Self::new(client, env_value("TELEGRAM_BOT_TOKEN"), env_value("TELEGRAM_CHAT_ID"))
    }

    fn credentials(&self) -> Result<(&str, &str), PublishError> {
        match (self.token.as_deref(), self.chat_id.as_deref()) {
            (Some(token), Some(chat)) => Ok((token, chat)),
            (token, chat) => {
                let missing = [
                    token.is_none().then_some("TELEGRAM_BOT_TOKEN"),
                    chat.is_none().then_some("TELEGRAM_CHAT_ID"),
                ];
                Err(PublishError::MissingCredentials {
                    service: Self::SERVICE,
                    missing: missing.iter().flatten().copied().collect::<Vec<_>>().join(", "),
                })
            }
        }
    }

    fn call(&self, method: &str, form: &[(&str, &str)]) -> Result<Value, PublishError> {
        let (token, chat_id) = self.credentials()?;
        let mut params = vec![("chat_id", chat_id)];
        params.extend_from_slice(form);

        let response = self
            .client
            .post(format!("{}/bot{}/{}", self.api_base, token, method))
            .form(&params)
            .send()
            .map_err(|e| transport(Self::SERVICE, e))?;

        let value = read_json(Self::SERVICE, response)?;
        if value.get("ok").and_then(Value::as_bool) != Some(true) {
            return Err(PublishError::UnexpectedResponse {
                service: Self::SERVICE,
                message: value.to_string(),
            });
        }
        Ok(value)
    }

    fn send(&self, form: &[(&str, &str)]) -> Result<PostId, PublishError> {
        let value = self.call("sendMessage", form)?;
        let id = value
            .pointer("/result/message_id")
            .and_then(Value::as_i64)
            .ok_or_else(|| PublishError::UnexpectedResponse {
                service: Self::SERVICE,
                message: format!("no result.message_id in {}", value),
            })?;

        info!("Message sent to Telegram, id {}", id);
        Ok(PostId(id.to_string()))
    }
}

impl Publisher for TelegramPublisher {
    fn name(&self) -> &'static str {
        Self::SERVICE
    }

    fn publish(&self, text: &str) -> Result<PostId, PublishError> {
        info!("Sending to Telegram ({} characters)", text.chars().count());
        self.send(&[("text", text)])
    }

    fn publish_reply(&self, text: &str, parent: &PostId) -> Result<PostId, PublishError> {
        self.send(&[("text", text), ("reply_to_message_id", parent.0.as_str())])
    }

    fn delete(&self, id: &PostId) -> Result<(), PublishError> {
        info!("Deleting Telegram message {}", id);
        self.call("deleteMessage", &[("message_id", id.0.as_str())])?;
        Ok(())
    }
}
