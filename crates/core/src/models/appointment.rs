use super::Entity;
use chrono::NaiveDateTime;
use hms_ids::{AppointmentId, PatientId, UserId};
use serde::{Deserialize, Serialize};

wire_enum! {
    AppointmentType, "appointment type" {
        Consultation => "consultation",
        FollowUp => "follow-up",
        Emergency => "emergency",
        Surgery => "surgery",
    }
}

wire_enum! {
    AppointmentStatus, "appointment status" {
        Scheduled => "scheduled",
        InProgress => "in-progress",
        Completed => "completed",
        Cancelled => "cancelled",
    }
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: AppointmentId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
    pub date_time: NaiveDateTime,
    /// Minutes.
    pub duration: u32,
    #[serde(rename = "type")]
    pub kind: AppointmentType,
    pub status: AppointmentStatus,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

impl Entity for Appointment {
    type Id = AppointmentId;
    const KIND: &'static str = "appointment";

    fn id(&self) -> &AppointmentId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<AppointmentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptoms: Option<String>,
}

impl AppointmentPatch {
    pub fn status(status: AppointmentStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merged_into(&self, appointment: &Appointment) -> Appointment {
        let mut next = appointment.clone();
        if let Some(date_time) = self.date_time {
            next.date_time = date_time;
        }
        if let Some(duration) = self.duration {
            next.duration = duration;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(notes) = &self.notes {
            next.notes = Some(notes.clone());
        }
        if let Some(symptoms) = &self.symptoms {
            next.symptoms = Some(symptoms.clone());
        }
        next
    }
}
