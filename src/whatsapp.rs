// src/whatsapp.rs

use crate::config::WhatsAppConfig;
use reqwest::blocking::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

pub const GRAPH_API_BASE: &str = "https://graph.facebook.com/v19.0";

#[derive(Debug, Error)]
pub enum WhatsAppError {
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    #[error("API error: {0}")]
    ApiError(String),
}

/// Digits-only phone number with country code. Ten-digit national numbers get the
/// Mexican prefix `52`; 12 or 13 digits are taken as already international.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let mut digits = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '0'..='9' => digits.push(c),
            '+' | ' ' | '-' | '(' | ')' | '.' => {}
            _ => return None,
        }
    }
    match digits.len() {
        10 => Some(format!("52{digits}")),
        12 | 13 => Some(digits),
        _ => None,
    }
}

/// Click-to-chat link with a prefilled message.
pub fn wa_me_link(number: &str, text: &str) -> String {
    let encoded: String = url::form_urlencoded::byte_serialize(text.as_bytes()).collect();
    // form encoding writes spaces as '+', a literal '+' is already %2B
    format!("https://wa.me/{number}?text={}", encoded.replace('+', "%20"))
}

pub struct WhatsAppClient {
    token: String,
    phone_number_id: String,
    api_base: String,
    client: Client,
}

#[derive(Serialize)]
struct TextBody<'a> {
    body: &'a str,
}

#[derive(Serialize)]
struct MessagePayload<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    text: TextBody<'a>,
}

impl WhatsAppClient {
    pub fn new(token: String, phone_number_id: String, api_base: impl Into<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            token,
            phone_number_id,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// `None` unless both the token and the sender phone id are configured.
    pub fn from_config(cfg: &WhatsAppConfig) -> Option<Self> {
        Some(Self::new(
            cfg.token.clone()?,
            cfg.phone_number_id.clone()?,
            GRAPH_API_BASE,
        ))
    }

    pub fn send_text(&self, to: &str, body: &str) -> Result<(), WhatsAppError> {
        let payload = MessagePayload {
            messaging_product: "whatsapp",
            to,
            kind: "text",
            text: TextBody { body },
        };

        let resp = self
            .client
            .post(format!("{}/{}/messages", self.api_base, self.phone_number_id))
            .bearer_auth(&self.token)
            .json(&payload)
            .send()?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_body = resp.text().unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WhatsAppError::ApiError(format!(
                "HTTP {status}: {error_body}"
            )));
        }

        Ok(())
    }
}
