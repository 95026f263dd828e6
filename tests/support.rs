use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};

use anyhow::{Error, Result, anyhow};
use async_trait::async_trait;
use push_dispatch::{
    clients::{DataStore, PushGateway},
    config::Config,
    dispatch::Dispatcher,
    models::{
        delivery::CreateDeliveryLog,
        device::Device,
        expo::{ExpoMessage, GatewayReply},
        status::DeliveryStatus,
        template::Template,
    },
};
use serde_json::{Value as JsonValue, json};

pub const ALICE_TOKEN: &str = "ExponentPushToken[alice-device-0001]";
pub const BOB_TOKEN: &str = "ExpoPushToken[bob-device-0001]";

#[derive(Debug, Clone)]
pub struct LogRecord {
    pub id: String,
    pub entry: CreateDeliveryLog,
    pub status: DeliveryStatus,
    pub error: Option<String>,
    pub close_calls: usize,
}

#[derive(Default)]
pub struct InMemoryStore {
    devices: Mutex<HashMap<String, Vec<Device>>>,
    failing_users: Mutex<HashSet<String>>,
    templates: Mutex<HashMap<String, Template>>,
    logs: Mutex<Vec<LogRecord>>,
    deactivated: Mutex<Vec<String>>,
    fail_log_creation: AtomicBool,
    slow_log_creation: Option<(usize, Duration)>,
    log_creations: AtomicUsize,
    device_lookups: AtomicUsize,
}

impl InMemoryStore {
    pub fn with_device(self, user_id: &str, device: Device) -> Self {
        self.devices
            .lock()
            .unwrap()
            .entry(user_id.to_string())
            .or_default()
            .push(device);
        self
    }

    pub fn with_failing_user(self, user_id: &str) -> Self {
        self.failing_users
            .lock()
            .unwrap()
            .insert(user_id.to_string());
        self
    }

    pub fn with_template(self, template: Template) -> Self {
        self.templates
            .lock()
            .unwrap()
            .insert(template.template_name.clone(), template);
        self
    }

    pub fn failing_log_creation(self) -> Self {
        self.fail_log_creation.store(true, Ordering::SeqCst);
        self
    }

    /// Delays the `nth` log creation (1-based) by `delay`.
    pub fn slow_log_creation(mut self, nth: usize, delay: Duration) -> Self {
        self.slow_log_creation = Some((nth, delay));
        self
    }

    pub fn logs(&self) -> Vec<LogRecord> {
        self.logs.lock().unwrap().clone()
    }

    pub fn deactivated(&self) -> Vec<String> {
        self.deactivated.lock().unwrap().clone()
    }

    pub fn device_lookups(&self) -> usize {
        self.device_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DataStore for InMemoryStore {
    async fn fetch_active_devices(&self, user_id: &str) -> Result<Vec<Device>, Error> {
        self.device_lookups.fetch_add(1, Ordering::SeqCst);

        if self.failing_users.lock().unwrap().contains(user_id) {
            return Err(anyhow!("connection reset"));
        }

        Ok(self
            .devices
            .lock()
            .unwrap()
            .get(user_id)
            .map(|devices| devices.iter().filter(|d| d.is_active).cloned().collect())
            .unwrap_or_default())
    }

    async fn fetch_template(&self, name: &str) -> Result<Option<Template>, Error> {
        Ok(self.templates.lock().unwrap().get(name).cloned())
    }

    async fn create_log_entry(&self, entry: &CreateDeliveryLog) -> Result<String, Error> {
        let call = self.log_creations.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some((nth, delay)) = self.slow_log_creation {
            if call == nth {
                tokio::time::sleep(delay).await;
            }
        }

        if self.fail_log_creation.load(Ordering::SeqCst) {
            return Err(anyhow!("log table unavailable"));
        }

        let mut logs = self.logs.lock().unwrap();
        let id = format!("log-{}", logs.len() + 1);
        logs.push(LogRecord {
            id: id.clone(),
            entry: entry.clone(),
            status: DeliveryStatus::Pending,
            error: None,
            close_calls: 0,
        });
        Ok(id)
    }

    async fn update_log_entry(
        &self,
        log_id: &str,
        status: DeliveryStatus,
        error_message: Option<&str>,
    ) -> Result<(), Error> {
        let mut logs = self.logs.lock().unwrap();
        let record = logs
            .iter_mut()
            .find(|record| record.id == log_id)
            .ok_or_else(|| anyhow!("unknown log id {}", log_id))?;

        record.status = status;
        record.error = error_message.map(str::to_string);
        record.close_calls += 1;
        Ok(())
    }

    async fn deactivate_device(&self, device_token: &str) -> Result<(), Error> {
        for devices in self.devices.lock().unwrap().values_mut() {
            for device in devices.iter_mut().filter(|d| d.device_token == device_token) {
                device.is_active = false;
            }
        }
        self.deactivated
            .lock()
            .unwrap()
            .push(device_token.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub enum Scripted {
    Reply { http_success: bool, body: JsonValue },
    TransportError(String),
}

pub fn ok_reply() -> Scripted {
    Scripted::Reply {
        http_success: true,
        body: json!({ "data": [{ "status": "ok", "id": "ticket-1" }] }),
    }
}

pub fn device_not_registered_reply() -> Scripted {
    Scripted::Reply {
        http_success: true,
        body: json!({
            "data": [{
                "status": "error",
                "message": "\"ExponentPushToken[dead]\" is not a registered push notification recipient",
                "details": { "error": "DeviceNotRegistered" }
            }]
        }),
    }
}

/// Answers `ok` for every token unless a reply was scripted for it.
#[derive(Default)]
pub struct ScriptedGateway {
    scripts: Mutex<HashMap<String, Scripted>>,
    sent: Mutex<Vec<ExpoMessage>>,
    latency: Option<Duration>,
}

impl ScriptedGateway {
    pub fn script(self, token: &str, reply: Scripted) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .insert(token.to_string(), reply);
        self
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn sent(&self) -> Vec<ExpoMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl PushGateway for ScriptedGateway {
    async fn send(&self, message: &ExpoMessage) -> Result<GatewayReply, Error> {
        self.sent.lock().unwrap().push(message.clone());

        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let script = self
            .scripts
            .lock()
            .unwrap()
            .get(&message.to)
            .cloned()
            .unwrap_or_else(ok_reply);

        match script {
            Scripted::Reply { http_success, body } => Ok(GatewayReply::from_json(http_success, body)),
            Scripted::TransportError(error) => Err(anyhow!(error)),
        }
    }
}

pub fn dispatcher(
    store: &Arc<InMemoryStore>,
    gateway: &Arc<ScriptedGateway>,
    concurrency: usize,
) -> Dispatcher {
    Dispatcher::new(store.clone(), gateway.clone(), concurrency)
}

pub fn template(name: &str, title: &str, body: &str) -> Template {
    Template {
        id: None,
        template_name: name.to_string(),
        title_template: title.to_string(),
        body_template: body.to_string(),
        data_template: None,
        image_url: None,
        is_active: true,
    }
}

pub fn test_config(supabase_url: &str, expo_push_url: &str) -> Config {
    Config {
        supabase_url: supabase_url.to_string(),
        supabase_service_role_key: "service-role-key".to_string(),
        expo_access_token: "expo-access-token".to_string(),
        expo_push_url: expo_push_url.to_string(),
        gateway_timeout_seconds: 5,
        store_timeout_seconds: 5,
        dispatch_concurrency: 4,
        server_port: 0,
    }
}
