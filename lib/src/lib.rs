//! Telegram Bot API bindings for Rust
//! Provides long-polling for updates, sending HTML messages and deleting messages

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::Proxy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_URL: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum BotError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),
    #[error("Bot API error {code}: {description}")]
    Api { code: i64, description: String },
    #[error("Bot API returned ok without a result")]
    MissingResult,
    #[error("Invalid proxy URL: {0}")]
    InvalidProxy(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<Message>,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    #[serde(default)]
    error_code: Option<i64>,
    #[serde(default)]
    description: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdatesPayload {
    offset: i64,
    timeout: u64,
    allowed_updates: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SendMessagePayload<'a> {
    chat_id: i64,
    text: &'a str,
    parse_mode: &'static str,
    disable_web_page_preview: bool,
}

#[derive(Debug, Serialize)]
struct DeleteMessagePayload {
    chat_id: i64,
    message_id: i64,
}

pub struct BotClient {
    url: String,
    client: Client,
}

impl BotClient {
    /// Build a client for `token`, routing every request through `proxy` when given.
    ///
    /// `timeout` bounds ordinary calls; long polls extend it by their own wait.
    pub fn new(token: &str, proxy: Option<&str>, timeout: Duration) -> Result<Self, BotError> {
        Self::with_base_url(API_URL, token, proxy, timeout)
    }

    /// Same as [`BotClient::new`] against a non-default API host.
    pub fn with_base_url(
        base_url: &str,
        token: &str,
        proxy: Option<&str>,
        timeout: Duration,
    ) -> Result<Self, BotError> {
        let mut builder = Client::builder().timeout(timeout);
        if let Some(proxy) = proxy {
            let proxy = Proxy::all(proxy).map_err(|e| BotError::InvalidProxy(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        Ok(Self {
            url: format!("{}/bot{}", base_url.trim_end_matches('/'), token),
            client: builder.build()?,
        })
    }

    fn call<P: Serialize, T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &P,
        timeout: Option<Duration>,
    ) -> Result<T, BotError> {
        let mut request = self
            .client
            .post(format!("{}/{}", self.url, method))
            .json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        // The API reports failures in the body, often with a 4xx status
        let response: ApiResponse<T> = request.send()?.json()?;
        decode(response)
    }

    /// Long-poll for updates after `offset`, waiting up to `wait` on the server side
    pub fn get_updates(&self, offset: i64, wait: Duration) -> Result<Vec<Update>, BotError> {
        let payload = GetUpdatesPayload {
            offset,
            timeout: wait.as_secs(),
            allowed_updates: vec!["message"],
        };

        self.call(
            "getUpdates",
            &payload,
            Some(wait + Duration::from_secs(10)),
        )
    }

    /// Send an HTML-formatted message to a chat
    pub fn send_message(&self, chat_id: i64, html: &str) -> Result<Message, BotError> {
        let payload = SendMessagePayload {
            chat_id,
            text: html,
            parse_mode: "HTML",
            disable_web_page_preview: false,
        };

        self.call("sendMessage", &payload, None)
    }

    /// Delete a message previously sent by the bot
    pub fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), BotError> {
        let payload = DeleteMessagePayload {
            chat_id,
            message_id,
        };

        let _deleted: bool = self.call("deleteMessage", &payload, None)?;
        Ok(())
    }
}

fn decode<T>(response: ApiResponse<T>) -> Result<T, BotError> {
    if !response.ok {
        return Err(BotError::Api {
            code: response.error_code.unwrap_or_default(),
            description: response
                .description
                .unwrap_or_else(|| "unknown error".to_string()),
        });
    }

    response.result.ok_or(BotError::MissingResult)
}
