//! Request/response channel to the conversation backend.

pub mod http;
pub mod types;

#[cfg(test)]
pub(crate) mod canned_http;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::errors::AppError;

pub use http::HttpConversationGateway;
pub use types::{
    GatewayReply, GatewayRequest, LoadReply, MessagePayload, MessageReply, ReplyContent,
    ResetReply, WipeReply,
};

/// One POST per event, no retries. Non-2xx replies surface as
/// [`AppError::Gateway`], transport failures as [`AppError::Connection`].
#[async_trait]
pub trait ConversationGateway: Send + Sync {
    async fn send(&self, request: &GatewayRequest) -> Result<Value, AppError>;
}

/// Normalises a reply that may arrive bare or wrapped in a collection
/// (first element wins) into `T`.
pub fn unwrap_response<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    let item = match value {
        Value::Array(items) => items
            .into_iter()
            .next()
            .ok_or_else(|| AppError::Connection("Parse error: empty response".to_string()))?,
        other => other,
    };
    serde_json::from_value(item).map_err(|e| AppError::Connection(format!("Parse error: {e}")))
}

/// Sends `request` and decodes the typed reply. A reply whose `success`
/// flag is false becomes [`AppError::Gateway`].
pub async fn call<T>(gateway: &dyn ConversationGateway, request: GatewayRequest) -> Result<T, AppError>
where
    T: DeserializeOwned + GatewayReply,
{
    let event = request.event();
    let reply: T = unwrap_response(gateway.send(&request).await?)?;
    if !reply.succeeded() {
        warn!("Conversation backend reported failure for {event}");
        return Err(AppError::Gateway {
            status: 200,
            message: format!("{event} was not successful"),
        });
    }
    Ok(reply)
}
