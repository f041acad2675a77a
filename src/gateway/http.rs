use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{debug, error};

use super::{ConversationGateway, GatewayRequest};
use crate::errors::AppError;

/// [`ConversationGateway`] posting JSON to a single webhook URL.
#[derive(Clone)]
pub struct HttpConversationGateway {
    client: Client,
    endpoint: String,
}

impl HttpConversationGateway {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self { client, endpoint: endpoint.to_string() }
    }

    /// Shared HTTP client for every remote call in the process.
    pub fn build_client(timeout: Duration) -> Result<Client, AppError> {
        Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Connection(format!("Failed to create HTTP client: {e}")))
    }
}

#[async_trait]
impl ConversationGateway for HttpConversationGateway {
    async fn send(&self, request: &GatewayRequest) -> Result<Value, AppError> {
        let event = request.event();
        debug!("POST {} event={event}", self.endpoint);

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Conversation backend unreachable for {event}: {e}");
                AppError::Connection(format!("Network error: {e}"))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Conversation backend returned {status} for {event}: {body}");
            return Err(AppError::Gateway { status: status.as_u16(), message: body });
        }

        response.json::<Value>().await.map_err(|e| {
            error!("Unreadable reply for {event}: {e}");
            AppError::Connection(format!("Parse error: {e}"))
        })
    }
}
