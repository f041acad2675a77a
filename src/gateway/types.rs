use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::{ContentType, Message, Topic};

fn default_success() -> bool {
    true
}

/// Body posted to the conversation backend. Exactly one event per request.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum GatewayRequest {
    Load {
        entity_slug: String,
        session_id: Option<String>,
    },
    Message {
        entity_slug: String,
        session_id: String,
        thread_id: String,
        payload: MessagePayload,
    },
    Reset {
        entity_slug: String,
        session_id: String,
    },
    Wipe {
        entity_slug: String,
        session_id: String,
    },
}

impl GatewayRequest {
    pub fn event(&self) -> &'static str {
        match self {
            GatewayRequest::Load { .. } => "load",
            GatewayRequest::Message { .. } => "message",
            GatewayRequest::Reset { .. } => "reset",
            GatewayRequest::Wipe { .. } => "wipe",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_url: Option<String>,
}

/// Every reply carries a success flag; `false` is a backend-side failure.
pub trait GatewayReply {
    fn succeeded(&self) -> bool;
}

#[derive(Clone, Debug, Deserialize)]
pub struct LoadReply {
    #[serde(default = "default_success")]
    pub success: bool,
    pub session_id: String,
    pub thread_id: String,
    pub entity: Topic,
    #[serde(default)]
    pub messages: Vec<Message>,
}

/// Assistant content of a reply, either nested or at the top level.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ReplyContent {
    #[serde(default, alias = "type")]
    pub content_type: Option<ContentType>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct MessageReply {
    #[serde(default = "default_success")]
    pub success: bool,
    #[serde(default)]
    pub assistant_message: Option<ReplyContent>,
    #[serde(flatten)]
    pub inline: ReplyContent,
}

impl ReplyContent {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.media_url.is_none()
    }
}

impl MessageReply {
    /// The assistant part of the reply, preferring the nested message. A
    /// reply with neither text nor media is a backend failure.
    pub fn into_content(self) -> Result<ReplyContent, AppError> {
        let content = match self.assistant_message {
            Some(nested) if !nested.is_empty() => nested,
            _ => self.inline,
        };
        if content.is_empty() {
            return Err(AppError::Gateway {
                status: 200,
                message: "reply carried no assistant content".to_string(),
            });
        }
        Ok(content)
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ResetReply {
    #[serde(default = "default_success")]
    pub success: bool,
    pub thread_id: String,
    pub welcome_message: Message,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WipeReply {
    #[serde(default = "default_success")]
    pub success: bool,
}

macro_rules! impl_gateway_reply {
    ($($t:ty),*) => {
        $(impl GatewayReply for $t {
            fn succeeded(&self) -> bool {
                self.success
            }
        })*
    };
}

impl_gateway_reply!(LoadReply, MessageReply, ResetReply, WipeReply);
