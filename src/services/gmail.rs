use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

use crate::config::EmailSettings;
use crate::models::EmailMessage;

/// Errors that can occur when talking to the mailbox
#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Unauthorized: Gmail access token missing or expired")]
    Unauthorized,

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Inbox the email monitor reads from
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Unread messages matching the configured search
    async fn unread(&self) -> Result<Vec<EmailMessage>, MailError>;

    async fn mark_read(&self, id: &str) -> Result<(), MailError>;
}

/// Gmail REST API client authenticated with an OAuth access token
pub struct GmailClient {
    base_url: String,
    access_token: String,
    user_id: String,
    query: String,
    client: Client,
}

impl GmailClient {
    pub fn new(settings: &EmailSettings) -> Result<Self, MailError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: settings.base_url.clone(),
            access_token: settings.access_token.clone(),
            user_id: settings.user_id.clone(),
            query: settings.query.clone(),
            client,
        })
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/users/{}/messages",
            self.base_url.trim_end_matches('/'),
            urlencoding::encode(&self.user_id)
        )
    }

    async fn get_json(&self, url: &str) -> Result<Value, MailError> {
        if self.access_token.is_empty() {
            return Err(MailError::Unauthorized);
        }

        let response = self.client.get(url).bearer_auth(&self.access_token).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MailError::Unauthorized),
            status if !status.is_success() => Err(MailError::ApiError(format!("{} returned {}", url, status))),
            _ => Ok(response.json().await?),
        }
    }

    async fn fetch_message(&self, id: &str) -> Result<EmailMessage, MailError> {
        let url = format!("{}/{}?format=full", self.messages_url(), urlencoding::encode(id));
        let json = self.get_json(&url).await?;

        let payload = json
            .get("payload")
            .ok_or_else(|| MailError::InvalidResponse(format!("Message {} has no payload", id)))?;

        Ok(EmailMessage {
            id: id.to_string(),
            subject: header(payload, "Subject").unwrap_or_default(),
            sender: header(payload, "From").unwrap_or_default(),
            body: extract_body(payload),
        })
    }
}

#[async_trait]
impl Mailbox for GmailClient {
    async fn unread(&self) -> Result<Vec<EmailMessage>, MailError> {
        let url = format!("{}?q={}", self.messages_url(), urlencoding::encode(&self.query));
        let json = self.get_json(&url).await?;

        let ids: Vec<String> = json
            .get("messages")
            .and_then(Value::as_array)
            .map(|messages| {
                messages
                    .iter()
                    .filter_map(|m| m.get("id").and_then(Value::as_str))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        tracing::debug!("Found {} candidate emails", ids.len());

        let mut messages = Vec::with_capacity(ids.len());
        for id in ids {
            messages.push(self.fetch_message(&id).await?);
        }
        Ok(messages)
    }

    async fn mark_read(&self, id: &str) -> Result<(), MailError> {
        if self.access_token.is_empty() {
            return Err(MailError::Unauthorized);
        }

        let url = format!("{}/{}/modify", self.messages_url(), urlencoding::encode(id));
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "removeLabelIds": ["UNREAD"] }))
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(MailError::Unauthorized),
            status if !status.is_success() => Err(MailError::ApiError(format!("Failed to mark {} read: {}", id, status))),
            _ => Ok(()),
        }
    }
}

fn header(payload: &Value, name: &str) -> Option<String> {
    payload
        .get("headers")?
        .as_array()?
        .iter()
        .find(|h| h.get("name").and_then(Value::as_str).is_some_and(|n| n.eq_ignore_ascii_case(name)))
        .and_then(|h| h.get("value").and_then(Value::as_str))
        .map(str::to_string)
}

/// First `text/plain` part, or the payload's own body when it has no parts
pub fn extract_body(payload: &Value) -> String {
    if let Some(parts) = payload.get("parts").and_then(Value::as_array) {
        return parts
            .iter()
            .find_map(|part| {
                if part.get("mimeType").and_then(Value::as_str) == Some("text/plain") {
                    part_data(part)
                } else if part.get("parts").is_some() {
                    Some(extract_body(part)).filter(|b| !b.is_empty())
                } else {
                    None
                }
            })
            .unwrap_or_default();
    }

    part_data(payload).unwrap_or_default()
}

fn part_data(part: &Value) -> Option<String> {
    let data = part.get("body")?.get("data")?.as_str()?;
    decode_body(data)
}

/// Decode URL-safe base64, padded or not
pub fn decode_body(data: &str) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(data.trim().trim_end_matches('=')).ok()?;
    Some(String::from_utf8_lossy(&bytes).into_owned())
}
