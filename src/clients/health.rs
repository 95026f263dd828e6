use std::{collections::HashMap, sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, warn};

use crate::{
    clients::DataStore,
    models::health::{HealthCheckResponse, HealthStatus, ServiceHealth},
};

const SLOW_RESPONSE_MS: u64 = 1000;

pub struct HealthChecker {
    store: Arc<dyn DataStore>,
}

impl HealthChecker {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn check_all(&self) -> HealthCheckResponse {
        let mut checks = HashMap::new();

        checks.insert("data_store".to_string(), self.check_data_store().await);

        let status = determine_overall_status(&checks);

        HealthCheckResponse {
            status,
            timestamp: Utc::now(),
            checks,
        }
    }

    async fn check_data_store(&self) -> ServiceHealth {
        let start = Instant::now();

        match self.store.health_check().await {
            Ok(()) => {
                let elapsed = start.elapsed().as_millis() as u64;
                debug!(response_time_ms = elapsed, "Data store health check passed");

                if elapsed > SLOW_RESPONSE_MS {
                    ServiceHealth::degraded(format!("Slow response: {}ms", elapsed))
                } else {
                    ServiceHealth::healthy(elapsed)
                }
            }
            Err(e) => {
                warn!(error = %e, "Data store health check failed");
                ServiceHealth::unhealthy(format!("Health check failed: {}", e))
            }
        }
    }
}

fn determine_overall_status(checks: &HashMap<String, ServiceHealth>) -> HealthStatus {
    if checks
        .values()
        .any(|health| health.status == HealthStatus::Unhealthy)
    {
        HealthStatus::Unhealthy
    } else if checks
        .values()
        .any(|health| health.status == HealthStatus::Degraded)
    {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    }
}
