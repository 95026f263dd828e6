use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Operator-managed notification template, read from `notification_templates`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub template_name: String,
    pub title_template: String,
    pub body_template: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_template: Option<JsonValue>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default)]
    pub is_active: bool,
}
