use tracing::{debug, warn};

use crate::{
    clients::DataStore,
    models::{delivery::CreateDeliveryLog, status::DeliveryStatus},
};

/// Opens and closes delivery log entries. Store failures are logged and
/// swallowed so they never block a send.
pub struct DeliveryLog<'a> {
    store: &'a dyn DataStore,
}

impl<'a> DeliveryLog<'a> {
    pub fn new(store: &'a dyn DataStore) -> Self {
        Self { store }
    }

    pub async fn open(&self, entry: &CreateDeliveryLog) -> Option<String> {
        match self.store.create_log_entry(entry).await {
            Ok(log_id) => {
                debug!(log_id = %log_id, user_id = %entry.user_id, "Delivery log opened");
                Some(log_id)
            }
            Err(e) => {
                warn!(
                    error = %e,
                    user_id = %entry.user_id,
                    "Failed to open delivery log, sending without it"
                );
                None
            }
        }
    }

    pub async fn close(&self, log_id: &str, status: DeliveryStatus, error_detail: Option<&str>) {
        if let Err(e) = self
            .store
            .update_log_entry(log_id, status, error_detail)
            .await
        {
            warn!(error = %e, log_id, status = %status, "Failed to close delivery log");
        }
    }
}
