use anyhow::{Error, Result};
use async_trait::async_trait;

use crate::models::{
    delivery::CreateDeliveryLog,
    device::Device,
    expo::{ExpoMessage, GatewayReply},
    status::DeliveryStatus,
    template::Template,
};

pub mod delivery_log;
pub mod expo;
pub mod health;
pub mod supabase;

/// Records the pipeline reads from and writes back to the hosted backend.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn fetch_active_devices(&self, user_id: &str) -> Result<Vec<Device>, Error>;

    /// Returns `None` when no active template carries `name`.
    async fn fetch_template(&self, name: &str) -> Result<Option<Template>, Error>;

    async fn create_log_entry(&self, entry: &CreateDeliveryLog) -> Result<String, Error>;

    async fn update_log_entry(
        &self,
        log_id: &str,
        status: DeliveryStatus,
        error_message: Option<&str>,
    ) -> Result<(), Error>;

    async fn deactivate_device(&self, device_token: &str) -> Result<(), Error>;

    async fn health_check(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &ExpoMessage) -> Result<GatewayReply, Error>;
}
