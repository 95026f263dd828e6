use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserResult {
    pub user_id: String,
    pub success: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub devices_count: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl UserResult {
    pub fn dispatched(user_id: String, devices_count: usize) -> Self {
        Self {
            user_id,
            success: true,
            devices_count: Some(devices_count),
            error: None,
        }
    }

    pub fn failed(user_id: String, error: impl Into<String>) -> Self {
        Self {
            user_id,
            success: false,
            devices_count: None,
            error: Some(error.into()),
        }
    }
}

/// Mirrors the request shape: a lone object for single-user requests, a list
/// for bulk requests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DispatchResults {
    Single(UserResult),
    Bulk(Vec<UserResult>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub total_users: usize,
    pub success_count: usize,
    pub failure_count: usize,
    pub results: DispatchResults,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: String) -> Self {
        Self {
            success: false,
            error,
        }
    }
}
