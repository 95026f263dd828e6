use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::error::DispatchError;

/// Inbound dispatch request. A request carrying `user_ids` is a bulk request;
/// otherwise the single `user_id` is targeted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotificationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    /// Only an array makes a request bulk; any other value is ignored and
    /// the request falls back to `user_id`.
    #[serde(
        default,
        deserialize_with = "user_ids_array",
        skip_serializing_if = "Option::is_none"
    )]
    pub user_ids: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, JsonValue>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<String>,

    #[serde(default)]
    pub template_data: HashMap<String, String>,
}

fn user_ids_array<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        value @ JsonValue::Array(_) => serde_json::from_value(value)
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Targets {
    Single(String),
    Bulk(Vec<String>),
}

impl Targets {
    pub fn user_ids(&self) -> &[String] {
        match self {
            Targets::Single(user_id) => std::slice::from_ref(user_id),
            Targets::Bulk(user_ids) => user_ids,
        }
    }

    pub fn is_bulk(&self) -> bool {
        matches!(self, Targets::Bulk(_))
    }
}

impl NotificationRequest {
    pub fn from_slice(payload: &[u8]) -> Result<Self, DispatchError> {
        serde_json::from_slice(payload).map_err(|e| DispatchError::InvalidBody(e.to_string()))
    }

    pub fn single(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Default::default()
        }
    }

    pub fn bulk<I, S>(user_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            user_ids: Some(user_ids.into_iter().map(Into::into).collect()),
            ..Default::default()
        }
    }

    pub fn with_message(mut self, title: impl Into<String>, body: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self.body = Some(body.into());
        self
    }

    pub fn with_data(mut self, data: Map<String, JsonValue>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_template(
        mut self,
        template_name: impl Into<String>,
        template_data: HashMap<String, String>,
    ) -> Self {
        self.template_name = Some(template_name.into());
        self.template_data = template_data;
        self
    }

    /// Resolves the request shape into its target list. Duplicate user ids in a
    /// bulk request are kept and processed independently.
    pub fn targets(&self) -> Result<Targets, DispatchError> {
        if let Some(user_ids) = &self.user_ids {
            if user_ids.is_empty() {
                return Err(DispatchError::MissingTargets);
            }
            return Ok(Targets::Bulk(user_ids.clone()));
        }

        match self.user_id.as_deref() {
            Some(user_id) if !user_id.is_empty() => Ok(Targets::Single(user_id.to_string())),
            _ => Err(DispatchError::MissingTargets),
        }
    }
}
