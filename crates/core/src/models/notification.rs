use super::Entity;
use chrono::NaiveDateTime;
use hms_ids::NotificationId;
use serde::{Deserialize, Serialize};

wire_enum! {
    NotificationType, "notification type" {
        Info => "info",
        Warning => "warning",
        Error => "error",
        Success => "success",
    }
}

/// A message shown in the notification tray. `read` only ever goes from false to true.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    #[serde(rename = "type")]
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
    #[serde(default)]
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action_url: Option<String>,
}

impl Entity for Notification {
    type Id = NotificationId;
    const KIND: &'static str = "notification";

    fn id(&self) -> &NotificationId {
        &self.id
    }
}

impl Notification {
    pub fn new(
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
        timestamp: NaiveDateTime,
    ) -> Self {
        Self {
            id: NotificationId::generate(),
            kind,
            title: title.into(),
            message: message.into(),
            timestamp,
            read: false,
            action_url: None,
        }
    }
}
