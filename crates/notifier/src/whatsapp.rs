//! WhatsApp Business Cloud API chat provider.
//!
//! Sends pre-approved template messages. Requires an access token and the
//! sender's phone number ID from Meta Business Suite.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::NotifierError;
use crate::provider::{ChatProvider, ChatReceipt, TemplateMessage};

const GRAPH_API_BASE: &str = "https://graph.facebook.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WhatsAppConfig {
    /// Facebook Graph API access token
    pub access_token: String,
    /// WhatsApp Phone Number ID
    pub phone_number_id: String,
    /// Graph API version, e.g. `v21.0`
    pub api_version: String,
}

pub struct WhatsAppClient {
    config: WhatsAppConfig,
    base_url: String,
    client: reqwest::Client,
}

impl WhatsAppClient {
    pub fn new(config: WhatsAppConfig) -> Self {
        Self {
            config,
            base_url: GRAPH_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Point the client at a different Graph API host (used by tests and proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/{}/{}/messages",
            self.base_url.trim_end_matches('/'),
            self.config.api_version,
            self.config.phone_number_id
        )
    }

    fn request_body(message: &TemplateMessage) -> serde_json::Value {
        serde_json::json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": normalize_phone(&message.to),
            "type": "template",
            "template": {
                "name": message.template_name,
                "language": { "code": message.language_code },
                "components": message.components,
            }
        })
    }
}

/// Strip formatting so the API receives digits with country code only.
pub fn normalize_phone(phone: &str) -> String {
    phone.chars().filter(char::is_ascii_digit).collect()
}

#[async_trait]
impl ChatProvider for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp"
    }

    async fn send_template(&self, message: &TemplateMessage) -> Result<ChatReceipt, NotifierError> {
        let response = self
            .client
            .post(self.messages_url())
            .bearer_auth(&self.config.access_token)
            .json(&Self::request_body(message))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(NotifierError::Provider { status, body });
        }

        let result: serde_json::Value = response.json().await?;
        let message_id = result["messages"][0]["id"].as_str().map(str::to_string);

        tracing::debug!(
            template = %message.template_name,
            message_id = message_id.as_deref().unwrap_or("unknown"),
            "WhatsApp template accepted"
        );

        Ok(ChatReceipt {
            success: message_id.is_some(),
            message_id: message_id.unwrap_or_default(),
        })
    }
}
