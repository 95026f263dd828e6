use serde::{Deserialize, Serialize};

/// A registered push endpoint as returned by the `get_user_devices` RPC.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub device_token: String,

    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferences: Option<DevicePreferences>,
}

fn default_active() -> bool {
    true
}

impl Device {
    pub fn new(device_token: impl Into<String>) -> Self {
        Self {
            device_token: device_token.into(),
            is_active: true,
            platform: None,
            preferences: None,
        }
    }

    pub fn with_preferences(mut self, preferences: DevicePreferences) -> Self {
        self.preferences = Some(preferences);
        self
    }
}

/// Per-device notification switches. A missing flag is treated as enabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevicePreferences {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub push_enabled: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_notifications: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub booking_notifications: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_notifications: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_notifications: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    DeliveryUpdate,
    BookingUpdate,
    Message,
    PaymentUpdate,
}

impl NotificationCategory {
    pub fn parse(category: &str) -> Option<Self> {
        match category {
            "delivery_update" => Some(NotificationCategory::DeliveryUpdate),
            "booking_update" => Some(NotificationCategory::BookingUpdate),
            "message" => Some(NotificationCategory::Message),
            "payment_update" => Some(NotificationCategory::PaymentUpdate),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            NotificationCategory::DeliveryUpdate => "delivery_update",
            NotificationCategory::BookingUpdate => "booking_update",
            NotificationCategory::Message => "message",
            NotificationCategory::PaymentUpdate => "payment_update",
        }
    }
}

impl DevicePreferences {
    fn category_flag(&self, category: NotificationCategory) -> Option<bool> {
        match category {
            NotificationCategory::DeliveryUpdate => self.delivery_notifications,
            NotificationCategory::BookingUpdate => self.booking_notifications,
            NotificationCategory::Message => self.message_notifications,
            NotificationCategory::PaymentUpdate => self.payment_notifications,
        }
    }

    pub fn suppresses(&self, category: Option<&str>) -> bool {
        if self.push_enabled == Some(false) {
            return true;
        }

        category
            .and_then(NotificationCategory::parse)
            .is_some_and(|category| self.category_flag(category) == Some(false))
    }
}

/// Fails open: a device without stored preferences always receives the push.
pub fn should_suppress(category: Option<&str>, preferences: Option<&DevicePreferences>) -> bool {
    preferences.is_some_and(|preferences| preferences.suppresses(category))
}
