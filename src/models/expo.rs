use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

pub const DEVICE_NOT_REGISTERED: &str = "DeviceNotRegistered";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpoMessage {
    pub to: String,
    pub title: String,
    pub body: String,
    pub data: Map<String, JsonValue>,
    pub sound: String,
    pub priority: String,
}

impl ExpoMessage {
    pub fn new(to: String, title: String, body: String, data: Map<String, JsonValue>) -> Self {
        Self {
            to,
            title,
            body,
            data,
            sound: "default".to_string(),
            priority: "high".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoTicket {
    pub status: TicketStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ExpoTicketDetails>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpoTicketDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpoResponse {
    #[serde(default)]
    pub data: Vec<ExpoTicket>,
}

/// What the gateway answered for one submitted message.
#[derive(Debug, Clone)]
pub struct GatewayReply {
    pub http_success: bool,
    pub tickets: Vec<ExpoTicket>,
    pub raw: JsonValue,
}

impl GatewayReply {
    pub fn from_json(http_success: bool, raw: JsonValue) -> Self {
        let tickets = serde_json::from_value::<ExpoResponse>(raw.clone())
            .map(|response| response.data)
            .unwrap_or_default();

        Self {
            http_success,
            tickets,
            raw,
        }
    }

    pub fn is_delivered(&self) -> bool {
        self.http_success
            && self
                .tickets
                .first()
                .is_some_and(|ticket| ticket.status == TicketStatus::Ok)
    }

    pub fn is_device_not_registered(&self) -> bool {
        self.tickets
            .first()
            .and_then(|ticket| ticket.details.as_ref())
            .and_then(|details| details.error.as_deref())
            == Some(DEVICE_NOT_REGISTERED)
    }
}
