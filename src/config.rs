use std::time::Duration;

use anyhow::{Error, Result, anyhow};
use dotenvy::dotenv;
use serde::Deserialize;

pub const DEFAULT_EXPO_PUSH_URL: &str = "https://exp.host/--/api/v2/push/send";

#[derive(Clone, Deserialize, Debug)]
pub struct Config {
    pub supabase_url: String,
    pub supabase_service_role_key: String,

    pub expo_access_token: String,
    #[serde(default = "default_expo_push_url")]
    pub expo_push_url: String,

    #[serde(default = "default_timeout_seconds")]
    pub gateway_timeout_seconds: u64,
    #[serde(default = "default_timeout_seconds")]
    pub store_timeout_seconds: u64,

    #[serde(default = "default_dispatch_concurrency")]
    pub dispatch_concurrency: usize,

    #[serde(default = "default_server_port")]
    pub server_port: u16,
}

fn default_expo_push_url() -> String {
    DEFAULT_EXPO_PUSH_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

fn default_dispatch_concurrency() -> usize {
    8
}

fn default_server_port() -> u16 {
    8000
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        dotenv().ok();

        let config = envy::from_env::<Self>()
            .map_err(|e| anyhow!("Invalid or missing environmental variable: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.supabase_url.trim().is_empty() {
            return Err(anyhow!("SUPABASE_URL cannot be empty"));
        }
        if self.supabase_service_role_key.trim().is_empty() {
            return Err(anyhow!("SUPABASE_SERVICE_ROLE_KEY cannot be empty"));
        }
        if self.expo_access_token.trim().is_empty() {
            return Err(anyhow!("Expo access token not configured"));
        }
        if self.dispatch_concurrency == 0 {
            return Err(anyhow!("DISPATCH_CONCURRENCY must be at least 1"));
        }
        Ok(())
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_seconds)
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_seconds)
    }
}
