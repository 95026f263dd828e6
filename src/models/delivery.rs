use serde::Serialize;
use serde_json::{Map, Value as JsonValue};

pub const GENERAL_NOTIFICATION_TYPE: &str = "general";

/// Parameters of a pending delivery log entry, shaped after the
/// `log_push_notification` RPC.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateDeliveryLog {
    #[serde(rename = "target_user_id")]
    pub user_id: String,
    #[serde(rename = "target_device_token")]
    pub device_token: String,
    #[serde(rename = "notification_type_param")]
    pub notification_type: String,
    #[serde(rename = "title_param")]
    pub title: String,
    #[serde(rename = "body_param")]
    pub body: String,
    #[serde(rename = "data_param")]
    pub data: Map<String, JsonValue>,
    #[serde(rename = "image_url_param")]
    pub image_url: Option<String>,
}

impl CreateDeliveryLog {
    pub fn new(user_id: String, device_token: String, title: String, body: String) -> Self {
        Self {
            user_id,
            device_token,
            notification_type: GENERAL_NOTIFICATION_TYPE.to_string(),
            title,
            body,
            data: Map::new(),
            image_url: None,
        }
    }

    pub fn with_category(mut self, category: Option<&str>) -> Self {
        if let Some(category) = category {
            self.notification_type = category.to_string();
        }
        self
    }

    pub fn with_data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = data;
        self
    }

    pub fn with_image_url(mut self, image_url: Option<String>) -> Self {
        self.image_url = image_url;
        self
    }
}
