use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};

use futures_util::{StreamExt, future::join_all, stream};
use serde_json::{Map, Value as JsonValue};
use tokio::sync::{Mutex as AsyncMutex, Semaphore};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::{
    clients::{DataStore, PushGateway, delivery_log::DeliveryLog},
    error::DispatchError,
    models::{
        delivery::CreateDeliveryLog,
        device::{Device, should_suppress},
        expo::ExpoMessage,
        request::{NotificationRequest, Targets},
        response::{DispatchResponse, DispatchResults, UserResult},
        status::DeliveryStatus,
        validation::{is_valid_expo_token, redact_token},
    },
    template::{merge_data, render, render_json},
};

/// Title, body and payload after template resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMessage {
    pub title: String,
    pub body: String,
    pub data: Map<String, JsonValue>,
    pub image_url: Option<String>,
}

impl ResolvedMessage {
    /// The `type` entry of the payload, used for preference filtering and
    /// log classification.
    pub fn category(&self) -> Option<&str> {
        self.data.get("type").and_then(JsonValue::as_str)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    InvalidToken,
    Suppressed,
    Deactivated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DeviceOutcome {
    Sent,
    Failed(String),
    Skipped(SkipReason),
}

struct UserDispatch {
    result: UserResult,
    outcomes: Vec<DeviceOutcome>,
}

impl UserDispatch {
    fn failed(user_id: &str, error: &str) -> Self {
        Self {
            result: UserResult::failed(user_id.to_string(), error),
            outcomes: Vec::new(),
        }
    }
}

#[derive(Default)]
struct TokenState {
    dead: bool,
}

/// Per-token state for one dispatch. Sends to the same token are serialized
/// through its lock, so once a send marks the token dead no later send to it
/// reaches the gateway.
#[derive(Default)]
struct TokenLedger(Mutex<HashMap<String, Arc<AsyncMutex<TokenState>>>>);

impl TokenLedger {
    fn state(&self, token: &str) -> Arc<AsyncMutex<TokenState>> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(token.to_string())
            .or_default()
            .clone()
    }
}

pub struct Dispatcher {
    store: Arc<dyn DataStore>,
    gateway: Arc<dyn PushGateway>,
    concurrency: usize,
    send_permits: Semaphore,
}

impl Dispatcher {
    pub fn new(store: Arc<dyn DataStore>, gateway: Arc<dyn PushGateway>, concurrency: usize) -> Self {
        let concurrency = concurrency.max(1);

        Self {
            store,
            gateway,
            concurrency,
            send_permits: Semaphore::new(concurrency),
        }
    }

    pub async fn dispatch(
        &self,
        request: NotificationRequest,
    ) -> Result<DispatchResponse, DispatchError> {
        let targets = request.targets()?;
        let message = self.resolve_message(&request).await?;

        if message.title.is_empty() || message.body.is_empty() {
            return Err(DispatchError::MissingContent);
        }

        let dispatch_id = Uuid::new_v4();
        let span = info_span!("dispatch", %dispatch_id);

        self.fan_out(targets, message).instrument(span).await
    }

    pub async fn resolve_message(
        &self,
        request: &NotificationRequest,
    ) -> Result<ResolvedMessage, DispatchError> {
        let mut message = ResolvedMessage {
            title: request.title.clone().unwrap_or_default(),
            body: request.body.clone().unwrap_or_default(),
            data: request.data.clone().unwrap_or_default(),
            image_url: request.image_url.clone(),
        };

        let Some(template_name) = request
            .template_name
            .as_deref()
            .filter(|name| !name.is_empty())
        else {
            return Ok(message);
        };

        let template = match self.store.fetch_template(template_name).await {
            Ok(Some(template)) if template.is_active => template,
            Ok(_) => {
                warn!(template_name, "Template not found or inactive");
                return Err(DispatchError::TemplateNotFound(template_name.to_string()));
            }
            Err(e) => {
                error!(error = %e, template_name, "Template lookup failed");
                return Err(DispatchError::TemplateNotFound(template_name.to_string()));
            }
        };

        let variables = &request.template_data;

        message.title = render(&template.title_template, variables);
        message.body = render(&template.body_template, variables);

        if let Some(data_template) = template.data_template.as_ref().filter(|t| !t.is_null()) {
            let rendered = render_json(data_template, variables).map_err(|source| {
                DispatchError::TemplateData {
                    name: template_name.to_string(),
                    source,
                }
            })?;

            match rendered {
                JsonValue::Object(rendered) => {
                    message.data = merge_data(std::mem::take(&mut message.data), rendered);
                }
                other => {
                    warn!(template_name, data = %other, "Template data is not an object, ignoring");
                }
            }
        }

        if message.image_url.as_deref().is_none_or(str::is_empty) {
            if let Some(image_template) = template.image_url.as_deref().filter(|t| !t.is_empty()) {
                message.image_url = Some(render(image_template, variables));
            }
        }

        debug!(template_name, "Template resolved");

        Ok(message)
    }

    async fn fan_out(
        &self,
        targets: Targets,
        message: ResolvedMessage,
    ) -> Result<DispatchResponse, DispatchError> {
        let user_ids = targets.user_ids();
        let tokens = TokenLedger::default();

        info!(
            total_users = user_ids.len(),
            bulk = targets.is_bulk(),
            category = message.category().unwrap_or("general"),
            "Dispatching push notification"
        );

        let message = &message;
        let tokens = &tokens;
        let dispatches: Vec<UserDispatch> = stream::iter(user_ids.iter().cloned())
            .map(|user_id| async move { self.dispatch_to_user(&user_id, message, tokens).await })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut success_count = 0;
        let mut failure_count = 0;
        let mut results = Vec::with_capacity(dispatches.len());

        for dispatch in dispatches {
            if !dispatch.result.success {
                failure_count += 1;
            }
            for outcome in &dispatch.outcomes {
                match outcome {
                    DeviceOutcome::Sent => success_count += 1,
                    DeviceOutcome::Failed(_) => failure_count += 1,
                    DeviceOutcome::Skipped(_) => {}
                }
            }
            results.push(dispatch.result);
        }

        info!(success_count, failure_count, "Dispatch complete");

        let results = if targets.is_bulk() {
            DispatchResults::Bulk(results)
        } else {
            let result = results
                .into_iter()
                .next()
                .ok_or_else(|| anyhow::anyhow!("Single-user dispatch produced no result"))?;
            DispatchResults::Single(result)
        };

        Ok(DispatchResponse {
            success: true,
            total_users: user_ids.len(),
            success_count,
            failure_count,
            results,
        })
    }

    async fn dispatch_to_user(
        &self,
        user_id: &str,
        message: &ResolvedMessage,
        tokens: &TokenLedger,
    ) -> UserDispatch {
        let devices = match self.store.fetch_active_devices(user_id).await {
            Ok(devices) => devices,
            Err(e) => {
                error!(error = %e, user_id, "Error fetching devices for user");
                return UserDispatch::failed(user_id, "Failed to fetch user devices");
            }
        };

        if devices.is_empty() {
            info!(user_id, "No active devices found for user");
            return UserDispatch::failed(user_id, "No active devices found");
        }

        let outcomes = join_all(
            devices
                .iter()
                .map(|device| self.dispatch_to_device(user_id, device, message, tokens)),
        )
        .await;

        UserDispatch {
            result: UserResult::dispatched(user_id.to_string(), devices.len()),
            outcomes,
        }
    }

    async fn dispatch_to_device(
        &self,
        user_id: &str,
        device: &Device,
        message: &ResolvedMessage,
        tokens: &TokenLedger,
    ) -> DeviceOutcome {
        let token = device.device_token.as_str();
        let category = message.category();

        if !is_valid_expo_token(token) {
            debug!(user_id, "Invalid Expo push token format, skipping device");
            return DeviceOutcome::Skipped(SkipReason::InvalidToken);
        }

        if should_suppress(category, device.preferences.as_ref()) {
            info!(user_id, category, "Notifications disabled by device preferences");
            return DeviceOutcome::Skipped(SkipReason::Suppressed);
        }

        // Held until the outcome is recorded, including deactivation.
        let token_lock = tokens.state(token);
        let mut token_state = token_lock.lock().await;

        if token_state.dead {
            debug!(user_id, device_token = redact_token(token), "Token deactivated earlier in this dispatch");
            return DeviceOutcome::Skipped(SkipReason::Deactivated);
        }

        let _permit = match self.send_permits.acquire().await {
            Ok(permit) => permit,
            Err(e) => return DeviceOutcome::Failed(e.to_string()),
        };

        let delivery_log = DeliveryLog::new(self.store.as_ref());
        let entry = CreateDeliveryLog::new(
            user_id.to_string(),
            token.to_string(),
            message.title.clone(),
            message.body.clone(),
        )
        .with_category(category)
        .with_data(message.data.clone())
        .with_image_url(message.image_url.clone());

        let log_id = delivery_log.open(&entry).await;

        let mut data = message.data.clone();
        data.insert(
            "log_id".to_string(),
            JsonValue::String(log_id.clone().unwrap_or_default()),
        );
        let expo_message = ExpoMessage::new(
            token.to_string(),
            message.title.clone(),
            message.body.clone(),
            data,
        );

        match self.gateway.send(&expo_message).await {
            Ok(reply) if reply.is_delivered() => {
                info!(user_id, device_token = redact_token(token), "Notification sent successfully");
                if let Some(log_id) = &log_id {
                    delivery_log.close(log_id, DeliveryStatus::Sent, None).await;
                }
                DeviceOutcome::Sent
            }
            Ok(reply) => {
                let not_registered = reply.is_device_not_registered();
                if not_registered {
                    token_state.dead = true;
                }

                let detail = reply.raw.to_string();
                error!(
                    user_id,
                    device_token = redact_token(token),
                    response = %detail,
                    "Expo rejected push notification"
                );
                if let Some(log_id) = &log_id {
                    delivery_log
                        .close(log_id, DeliveryStatus::Failed, Some(&detail))
                        .await;
                }
                if not_registered {
                    self.deactivate(user_id, token).await;
                }
                DeviceOutcome::Failed(detail)
            }
            Err(e) => {
                let detail = e.to_string();
                error!(
                    error = %detail,
                    user_id,
                    device_token = redact_token(token),
                    "Error sending to device"
                );
                if let Some(log_id) = &log_id {
                    delivery_log
                        .close(log_id, DeliveryStatus::Failed, Some(&detail))
                        .await;
                }
                DeviceOutcome::Failed(detail)
            }
        }
    }

    async fn deactivate(&self, user_id: &str, token: &str) {
        match self.store.deactivate_device(token).await {
            Ok(()) => info!(
                user_id,
                device_token = redact_token(token),
                "Device not registered, marked inactive"
            ),
            Err(e) => warn!(
                error = %e,
                user_id,
                device_token = redact_token(token),
                "Failed to deactivate device"
            ),
        }
    }
}
