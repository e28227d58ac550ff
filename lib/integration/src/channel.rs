//! Outbound messaging channel.
//!
//! The assistant needs two things from the marketplace chat: sending a
//! reply and flagging a conversation as unread so an operator picks it up.

use crate::error::ChannelError;
use crate::signature::{self, SignatureInput};
use async_trait::async_trait;
use chrono::Utc;
use posh_support_core::ConversationId;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument};

/// Path of the reply endpoint.
pub const REPLY_PATH: &str = "/api/v2/message/reply_message";

/// Path of the mark-unread endpoint.
pub const MARK_UNREAD_PATH: &str = "/api/v2/message/mark_message_unread";

/// Delivery side of a chat conversation.
#[async_trait]
pub trait MessageChannel: Send + Sync {
    /// Sends `text` to the conversation.
    async fn send_reply(
        &self,
        shop_id: u64,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), Report<ChannelError>>;

    /// Marks the conversation unread for the shop's operators.
    async fn mark_unread(
        &self,
        shop_id: u64,
        conversation_id: &ConversationId,
    ) -> Result<(), Report<ChannelError>>;
}

/// Marketplace open API credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct ShopeeConfig {
    /// Partner id issued to the app.
    pub partner_id: u64,
    /// Partner secret used to sign requests.
    pub api_secret: String,
    /// Shop the assistant answers for.
    pub shop_id: u64,
    /// Shop access token. Without one nothing is delivered.
    #[serde(default)]
    pub access_token: Option<String>,
    /// API host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    "https://open.shopee.com".to_string()
}

#[derive(Debug, Serialize)]
struct ReplyBody<'a> {
    conversation_id: &'a str,
    message_type: &'static str,
    content: ReplyContent<'a>,
}

#[derive(Debug, Serialize)]
struct ReplyContent<'a> {
    text: &'a str,
}

/// [`MessageChannel`] backed by the marketplace open API.
#[derive(Debug, Clone)]
pub struct ShopeeChannel {
    config: ShopeeConfig,
    client: reqwest::Client,
}

impl ShopeeChannel {
    #[must_use]
    pub fn new(config: ShopeeConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// The configured credentials.
    #[must_use]
    pub fn config(&self) -> &ShopeeConfig {
        &self.config
    }

    /// Builds a signed POST to `path`.
    fn signed_post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        shop_id: u64,
        body: &B,
        timestamp: i64,
    ) -> Result<reqwest::RequestBuilder, Report<ChannelError>> {
        let access_token = self
            .config
            .access_token
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or(ChannelError::MissingAccessToken)?;

        let signature = signature::sign(
            self.config.api_secret.as_bytes(),
            &SignatureInput {
                path,
                access_token,
                shop_id,
                partner_id: self.config.partner_id,
                timestamp,
            },
        )?;

        let url = format!("{}{path}", self.config.base_url.trim_end_matches('/'));
        Ok(self
            .client
            .post(url)
            .header("x-shopee-api-partner-id", self.config.partner_id.to_string())
            .header("x-shopee-api-timestamp", timestamp.to_string())
            .header("x-shopee-api-access-token", access_token)
            .header("x-shopee-api-shop-id", shop_id.to_string())
            .header("x-shopee-api-signature", signature)
            .json(body))
    }

    async fn post<B: Serialize + ?Sized + Sync>(
        &self,
        path: &str,
        shop_id: u64,
        body: &B,
    ) -> Result<(), Report<ChannelError>> {
        let request = self.signed_post(path, shop_id, body, Utc::now().timestamp())?;
        let response = request
            .send()
            .await
            .map_err(|e| ChannelError::RequestFailed {
                endpoint: path.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChannelError::Rejected {
                endpoint: path.to_string(),
                status: status.as_u16(),
                body,
            }
            .into());
        }
        debug!(endpoint = path, "channel request accepted");
        Ok(())
    }
}

#[async_trait]
impl MessageChannel for ShopeeChannel {
    #[instrument(skip_all, fields(shop_id = shop_id, conversation_id = %conversation_id))]
    async fn send_reply(
        &self,
        shop_id: u64,
        conversation_id: &ConversationId,
        text: &str,
    ) -> Result<(), Report<ChannelError>> {
        let body = ReplyBody {
            conversation_id: conversation_id.as_str(),
            message_type: "TEXT",
            content: ReplyContent { text },
        };
        self.post(REPLY_PATH, shop_id, &body).await
    }

    #[instrument(skip_all, fields(shop_id = shop_id, conversation_id = %conversation_id))]
    async fn mark_unread(
        &self,
        shop_id: u64,
        conversation_id: &ConversationId,
    ) -> Result<(), Report<ChannelError>> {
        let body = json!({ "conversation_id": conversation_id.as_str() });
        self.post(MARK_UNREAD_PATH, shop_id, &body).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(access_token: Option<&str>) -> ShopeeConfig {
        ShopeeConfig {
            partner_id: 1001,
            api_secret: "segredo".to_string(),
            shop_id: 2233,
            access_token: access_token.map(str::to_string),
            base_url: "https://partner.example.test/".to_string(),
        }
    }

    #[test]
    fn config_defaults() {
        let config: ShopeeConfig = serde_json::from_value(json!({
            "partner_id": 1,
            "api_secret": "s",
            "shop_id": 2,
        }))
        .unwrap();
        assert_eq!(config.base_url, "https://open.shopee.com");
        assert!(config.access_token.is_none());
    }

    #[test]
    fn signed_request_carries_headers() {
        let channel = ShopeeChannel::new(config(Some("token-abc")));
        let body = ReplyBody {
            conversation_id: "987",
            message_type: "TEXT",
            content: ReplyContent { text: "Olá" },
        };

        let request = channel
            .signed_post(REPLY_PATH, 2233, &body, 1_700_000_000)
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(
            request.url().as_str(),
            "https://partner.example.test/api/v2/message/reply_message"
        );
        let headers = request.headers();
        assert_eq!(headers["x-shopee-api-partner-id"], "1001");
        assert_eq!(headers["x-shopee-api-timestamp"], "1700000000");
        assert_eq!(headers["x-shopee-api-access-token"], "token-abc");
        assert_eq!(headers["x-shopee-api-shop-id"], "2233");
        assert_eq!(
            headers["x-shopee-api-signature"],
            "14936b84cd1e5b79e08e195236c8ffd38ae31f2c19dcd91d611aa9ca27c1766b"
        );
        assert_eq!(headers["content-type"], "application/json");

        let sent: serde_json::Value =
            serde_json::from_slice(request.body().and_then(|b| b.as_bytes()).unwrap()).unwrap();
        assert_eq!(
            sent,
            json!({
                "conversation_id": "987",
                "message_type": "TEXT",
                "content": { "text": "Olá" },
            })
        );
    }

    #[tokio::test]
    async fn missing_token_fails_before_sending() {
        let channel = ShopeeChannel::new(config(None));
        let err = channel
            .send_reply(2233, &ConversationId::new("987"), "Olá")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no access token configured"));

        let channel = ShopeeChannel::new(config(Some("")));
        let err = channel
            .mark_unread(2233, &ConversationId::new("987"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no access token configured"));
    }
}
