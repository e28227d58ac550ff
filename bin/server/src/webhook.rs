//! Marketplace chat webhook.
//!
//! Routes:
//! - `GET /` - health text
//! - `GET /shopee/webhook` - URL verification
//! - `POST /shopee/webhook` - inbound customer message
//! - `GET /oauth/callback` - shop authorization redirect
//!
//! Each inbound message runs through the dispatcher on a blocking thread.
//! A non-silent reply is sent back through the channel, and the
//! conversation is flagged unread whenever it is with an operator.
//! Delivery failures are logged and never change the response.

use crate::error::WebhookError;
use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    routing::get,
};
use posh_support_conversation::Dispatcher;
use posh_support_core::ConversationId;
use posh_support_integration::MessageChannel;
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared webhook state.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<Dispatcher>,
    channel: Arc<dyn MessageChannel>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher, channel: Arc<dyn MessageChannel>) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            channel,
        }
    }
}

/// Builds the webhook router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/shopee/webhook", get(verify).post(receive))
        .route("/oauth/callback", get(oauth_callback))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Webhook body as sent by the marketplace. Every field is optional here
/// so that missing data is reported as a 400 by [`WebhookPayload::into_message`].
#[derive(Debug, Default, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    shop_id: Option<u64>,
    #[serde(default)]
    data: Option<WebhookData>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookData {
    #[serde(default)]
    message: Option<WebhookMessage>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookMessage {
    #[serde(default)]
    conversation_id: Option<Value>,
    #[serde(default)]
    from_user_id: Option<Value>,
    #[serde(default)]
    content: Option<MessageContent>,
}

#[derive(Debug, Default, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<String>,
}

/// A customer message extracted from a webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub shop_id: u64,
    pub conversation_id: ConversationId,
    pub sender_id: String,
    pub text: String,
}

impl WebhookPayload {
    /// Extracts the customer message. A missing text counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`WebhookError::IncompletePayload`] naming the first missing
    /// field.
    pub fn into_message(self) -> Result<InboundMessage, WebhookError> {
        let shop_id = self
            .shop_id
            .filter(|&id| id != 0)
            .ok_or(WebhookError::IncompletePayload { field: "shop_id" })?;
        let message = self
            .data
            .and_then(|data| data.message)
            .ok_or(WebhookError::IncompletePayload { field: "message" })?;
        let conversation_id = message
            .conversation_id
            .as_ref()
            .and_then(id_text)
            .ok_or(WebhookError::IncompletePayload {
                field: "conversation_id",
            })?;
        let sender_id = message
            .from_user_id
            .as_ref()
            .and_then(id_text)
            .ok_or(WebhookError::IncompletePayload {
                field: "from_user_id",
            })?;
        let text = message
            .content
            .and_then(|content| content.text)
            .unwrap_or_default();

        Ok(InboundMessage {
            shop_id,
            conversation_id: ConversationId::new(conversation_id),
            sender_id,
            text,
        })
    }
}

/// Ids arrive as numbers or strings; zero and empty count as missing.
fn id_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.as_u64() != Some(0) => Some(n.to_string()),
        _ => None,
    }
}

async fn health() -> &'static str {
    "Bot Shopee Atendimento Posh está online!"
}

async fn verify() -> &'static str {
    info!("webhook URL verification");
    "Webhook URL verified"
}

/// Query parameters of the shop authorization redirect.
#[derive(Debug, Deserialize)]
pub struct OAuthCallbackQuery {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    shop_id: Option<String>,
}

/// Acknowledges the shop authorization redirect. Exchanging the code for an
/// access token is done out of band; the token is then configured through
/// `SHOPEE__ACCESS_TOKEN`.
async fn oauth_callback(Query(query): Query<OAuthCallbackQuery>) -> (StatusCode, String) {
    let code = query.code.filter(|code| !code.is_empty());
    let shop_id = query.shop_id.filter(|id| !id.is_empty());
    match (code, shop_id) {
        (Some(code), Some(shop_id)) => {
            info!(shop_id = %shop_id, "shop authorization received");
            (
                StatusCode::OK,
                format!("OAuth Callback processado. Shop ID: {shop_id}, Code: {code}."),
            )
        }
        _ => (
            StatusCode::BAD_REQUEST,
            "OAuth Callback: Parâmetros 'code' ou 'shop_id' ausentes.".to_string(),
        ),
    }
}

async fn receive(
    State(state): State<AppState>,
    Json(payload): Json<WebhookPayload>,
) -> Result<Json<Value>, WebhookError> {
    let message = payload.into_message()?;
    info!(
        shop_id = message.shop_id,
        conversation_id = %message.conversation_id,
        sender_id = %message.sender_id,
        "customer message received"
    );

    let dispatcher = Arc::clone(&state.dispatcher);
    let conversation_id = message.conversation_id.clone();
    let text = message.text;
    let reply = tokio::task::spawn_blocking(move || {
        dispatcher.handle_message(&conversation_id, &text)
    })
    .await
    .map_err(|e| WebhookError::Internal {
        details: e.to_string(),
    })?;

    if let Some(text) = &reply.text {
        if let Err(report) = state
            .channel
            .send_reply(message.shop_id, &message.conversation_id, text)
            .await
        {
            error!(error = %report, "failed to deliver reply");
        }
    }

    if reply.forwarded_to_human {
        if let Err(report) = state
            .channel
            .mark_unread(message.shop_id, &message.conversation_id)
            .await
        {
            error!(error = %report, "failed to mark conversation unread");
        }
    }

    Ok(Json(json!({ "message": "Mensagem processada com sucesso" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use posh_support_conversation::{
        Customization, InMemorySessionStore, OrderSink, OrderSinkError, RuleSet,
    };
    use posh_support_core::OrderId;
    use posh_support_integration::ChannelError;
    use rootcause::prelude::Report;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const RULES: &str = "
✔ SAUDACAO_INICIAL
RESPOSTA: [saudacao]
---
✔ MENU_PRINCIPAL
RESPOSTA: [menu]
---
✔ TRANSFERENCIA_OFERECER
RESPOSTA: [transferencia]
";

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Reply { shop_id: u64, conversation: String, text: String },
        MarkUnread { shop_id: u64, conversation: String },
    }

    #[derive(Default)]
    struct FakeChannel {
        calls: Mutex<Vec<Call>>,
        fail: bool,
    }

    impl FakeChannel {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn outcome(&self) -> Result<(), Report<ChannelError>> {
            if self.fail {
                return Err(ChannelError::MissingAccessToken.into());
            }
            Ok(())
        }
    }

    #[async_trait]
    impl MessageChannel for FakeChannel {
        async fn send_reply(
            &self,
            shop_id: u64,
            conversation_id: &ConversationId,
            text: &str,
        ) -> Result<(), Report<ChannelError>> {
            self.calls.lock().unwrap().push(Call::Reply {
                shop_id,
                conversation: conversation_id.to_string(),
                text: text.to_string(),
            });
            self.outcome()
        }

        async fn mark_unread(
            &self,
            shop_id: u64,
            conversation_id: &ConversationId,
        ) -> Result<(), Report<ChannelError>> {
            self.calls.lock().unwrap().push(Call::MarkUnread {
                shop_id,
                conversation: conversation_id.to_string(),
            });
            self.outcome()
        }
    }

    struct DiscardSink;

    impl OrderSink for DiscardSink {
        fn record(&self, _: &OrderId, _: &Customization) -> Result<(), Report<OrderSinkError>> {
            Ok(())
        }
    }

    fn app(channel: Arc<FakeChannel>) -> Router {
        let dispatcher = Dispatcher::new(
            Arc::new(RuleSet::parse(RULES)),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(DiscardSink),
        );
        router(AppState::new(dispatcher, channel))
    }

    fn message(conversation_id: Value, text: &str) -> Value {
        json!({
            "shop_id": 2233,
            "data": {
                "message": {
                    "conversation_id": conversation_id,
                    "from_user_id": 777,
                    "content": { "text": text },
                }
            }
        })
    }

    async fn post(app: &Router, body: Value) -> (StatusCode, Value) {
        let response = app
            .clone()
            .oneshot(
                Request::post("/shopee/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
        let response = app
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn health_and_verification() {
        let app = app(Arc::new(FakeChannel::default()));

        let (status, body) = get_text(&app, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("online"));

        let (status, body) = get_text(&app, "/shopee/webhook").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Webhook URL verified");
    }

    #[tokio::test]
    async fn oauth_callback_needs_code_and_shop() {
        let app = app(Arc::new(FakeChannel::default()));

        let (status, body) = get_text(&app, "/oauth/callback?code=abc123&shop_id=2233").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("Shop ID: 2233"));
        assert!(body.contains("Code: abc123"));

        let (status, body) = get_text(&app, "/oauth/callback?code=abc123").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.contains("ausentes"));

        let (status, _) = get_text(&app, "/oauth/callback?code=&shop_id=2233").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn first_message_gets_greeting() {
        let channel = Arc::new(FakeChannel::default());
        let app = app(Arc::clone(&channel));

        let (status, body) = post(&app, message(json!(987), "oi")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Mensagem processada com sucesso");
        assert_eq!(
            channel.calls(),
            vec![Call::Reply {
                shop_id: 2233,
                conversation: "987".to_string(),
                text: "[saudacao]\n[menu]".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn handoff_marks_unread_and_silences() {
        let channel = Arc::new(FakeChannel::default());
        let app = app(Arc::clone(&channel));

        post(&app, message(json!("abc"), "oi")).await;
        post(&app, message(json!("abc"), "falar com atendente")).await;
        post(&app, message(json!("abc"), "oi?")).await;

        let calls = channel.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(
            calls[1],
            Call::Reply {
                shop_id: 2233,
                conversation: "abc".to_string(),
                text: "[transferencia]".to_string(),
            }
        );
        let unread = Call::MarkUnread {
            shop_id: 2233,
            conversation: "abc".to_string(),
        };
        assert_eq!(calls[2], unread);
        assert_eq!(calls[3], unread);
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let channel = Arc::new(FakeChannel::default());
        let app = app(Arc::clone(&channel));

        let (status, body) = post(&app, json!({ "shop_id": 2233, "data": {} })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Dados da mensagem incompletos");

        let mut without_sender = message(json!(987), "oi");
        without_sender["data"]["message"]["from_user_id"] = Value::Null;
        let (status, _) = post(&app, without_sender).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        assert!(channel.calls().is_empty());
    }

    #[tokio::test]
    async fn delivery_failure_still_succeeds() {
        let channel = Arc::new(FakeChannel {
            fail: true,
            ..FakeChannel::default()
        });
        let app = app(Arc::clone(&channel));

        let (status, _) = post(&app, message(json!(987), "oi")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(channel.calls().len(), 1);
    }

    #[test]
    fn payload_extraction() {
        let payload: WebhookPayload =
            serde_json::from_value(message(json!(987), " Olá ")).unwrap();
        let inbound = payload.into_message().unwrap();
        assert_eq!(
            inbound,
            InboundMessage {
                shop_id: 2233,
                conversation_id: ConversationId::new("987"),
                sender_id: "777".to_string(),
                text: " Olá ".to_string(),
            }
        );

        let mut no_text = message(json!(987), "");
        no_text["data"]["message"]["content"] = json!({});
        let payload: WebhookPayload = serde_json::from_value(no_text).unwrap();
        assert_eq!(payload.into_message().unwrap().text, "");

        let payload: WebhookPayload =
            serde_json::from_value(message(json!(0), "oi")).unwrap();
        assert!(matches!(
            payload.into_message(),
            Err(WebhookError::IncompletePayload {
                field: "conversation_id"
            })
        ));
    }
}
