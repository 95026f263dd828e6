use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde_json::{Value as JsonValue, json};
use tracing::{debug, info};

use crate::{
    clients::DataStore,
    config::Config,
    models::{
        delivery::CreateDeliveryLog, device::Device, status::DeliveryStatus, template::Template,
    },
};

/// PostgREST client for the hosted backend, authenticated with the
/// service-role key.
pub struct SupabaseClient {
    http_client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let http_client = Client::builder()
            .timeout(config.store_timeout())
            .build()
            .map_err(|e| anyhow!("Failed to create HTTP client: {}", e))?;

        let base_url = config.supabase_url.trim_end_matches('/').to_string();

        info!(base_url = %base_url, "Supabase client initialized");

        Ok(Self {
            http_client,
            base_url,
            service_key: config.supabase_service_role_key.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
    }

    fn rest_url(&self, path: &str) -> String {
        format!("{}/rest/v1/{}", self.base_url, path)
    }

    async fn rpc(&self, function: &str, params: JsonValue) -> Result<Response, Error> {
        let response = self
            .authorized(self.http_client.post(self.rest_url(&format!("rpc/{}", function))))
            .json(&params)
            .send()
            .await?;

        ensure_success(function, response).await
    }
}

async fn ensure_success(operation: &str, response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response.text().await.unwrap_or_default();
    Err(anyhow!(
        "Supabase {} returned status {}: {}",
        operation,
        status,
        error_text
    ))
}

#[async_trait]
impl DataStore for SupabaseClient {
    async fn fetch_active_devices(&self, user_id: &str) -> Result<Vec<Device>, Error> {
        debug!(user_id, "Fetching user devices");

        let devices: Vec<Device> = self
            .rpc("get_user_devices", json!({ "target_user_id": user_id }))
            .await?
            .json::<Option<Vec<Device>>>()
            .await
            .map_err(|e| anyhow!("Failed to parse devices JSON: {}", e))?
            .unwrap_or_default();

        Ok(devices.into_iter().filter(|device| device.is_active).collect())
    }

    async fn fetch_template(&self, name: &str) -> Result<Option<Template>, Error> {
        debug!(template_name = name, "Fetching notification template");

        let request = self
            .http_client
            .get(self.rest_url("notification_templates"))
            .query(&[
                ("select", "*".to_string()),
                ("template_name", format!("eq.{}", name)),
                ("is_active", "eq.true".to_string()),
                ("limit", "1".to_string()),
            ]);

        let response = self.authorized(request).send().await?;
        let templates: Vec<Template> = ensure_success("notification_templates", response)
            .await?
            .json()
            .await
            .map_err(|e| anyhow!("Failed to parse template JSON: {}", e))?;

        Ok(templates.into_iter().next())
    }

    async fn create_log_entry(&self, entry: &CreateDeliveryLog) -> Result<String, Error> {
        let params = serde_json::to_value(entry)?;
        let log_id: JsonValue = self
            .rpc("log_push_notification", params)
            .await?
            .json()
            .await?;

        match log_id {
            JsonValue::String(id) if !id.is_empty() => Ok(id),
            JsonValue::Number(id) => Ok(id.to_string()),
            other => Err(anyhow!("log_push_notification returned no id: {}", other)),
        }
    }

    async fn update_log_entry(
        &self,
        log_id: &str,
        status: DeliveryStatus,
        error_message: Option<&str>,
    ) -> Result<(), Error> {
        let mut params = json!({
            "log_id_param": log_id,
            "status_param": status.to_string(),
        });
        if let Some(error_message) = error_message {
            params["error_message_param"] = json!(error_message);
        }

        self.rpc("update_notification_status", params).await?;

        debug!(log_id, status = %status, "Delivery log updated");
        Ok(())
    }

    async fn deactivate_device(&self, device_token: &str) -> Result<(), Error> {
        let request = self
            .http_client
            .patch(self.rest_url("user_devices"))
            .query(&[("device_token", format!("eq.{}", device_token))])
            .json(&json!({ "is_active": false }));

        let response = self.authorized(request).send().await?;
        ensure_success("user_devices", response).await?;

        Ok(())
    }

    async fn health_check(&self) -> Result<(), Error> {
        let response = self
            .authorized(self.http_client.get(self.rest_url("")))
            .send()
            .await?;
        ensure_success("health check", response).await?;

        Ok(())
    }
}
