use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, header};
use serde_json::Value as JsonValue;
use tracing::{debug, info};

use crate::{
    clients::PushGateway,
    config::Config,
    models::{
        expo::{ExpoMessage, GatewayReply},
        validation::redact_token,
    },
};

pub struct ExpoClient {
    http_client: Client,
    push_url: String,
    access_token: String,
}

impl ExpoClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(config.gateway_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        info!(
            push_url = %config.expo_push_url,
            timeout_seconds = config.gateway_timeout_seconds,
            "Expo push client initialized"
        );

        Ok(Self {
            http_client,
            push_url: config.expo_push_url.clone(),
            access_token: config.expo_access_token.clone(),
        })
    }
}

#[async_trait]
impl PushGateway for ExpoClient {
    async fn send(&self, message: &ExpoMessage) -> Result<GatewayReply, Error> {
        debug!(
            device_token = redact_token(&message.to),
            "Sending Expo push notification"
        );

        // Batch of one so the gateway always answers with a ticket list.
        let response = self
            .http_client
            .post(&self.push_url)
            .header(header::ACCEPT, "application/json")
            .bearer_auth(&self.access_token)
            .json(&[message])
            .send()
            .await?;

        let http_success = response.status().is_success();
        let raw: JsonValue = response
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse Expo response JSON: {}", e))?;

        Ok(GatewayReply::from_json(http_success, raw))
    }
}
