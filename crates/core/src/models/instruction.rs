use super::Entity;
use chrono::NaiveDateTime;
use hms_ids::{InstructionId, PatientId, UserId};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

wire_enum! {
    InstructionPriority, "instruction priority" {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
}

wire_enum! {
    InstructionStatus, "instruction status" {
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
    }
}

impl InstructionStatus {
    /// Open instructions still need a nurse's attention.
    pub fn is_open(self) -> bool {
        self != InstructionStatus::Completed
    }
}

/// A doctor's instruction for the nursing staff about one patient.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NurseInstruction {
    pub id: InstructionId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurse_id: Option<UserId>,
    pub instructions: NonEmptyText,
    pub priority: InstructionPriority,
    pub status: InstructionStatus,
    pub created_at: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for NurseInstruction {
    type Id = InstructionId;
    const KIND: &'static str = "nurse instruction";

    fn id(&self) -> &InstructionId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<InstructionStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nurse_id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<InstructionPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InstructionPatch {
    pub fn status(status: InstructionStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merges the patch. Moving to `completed` stamps `completed_at` with `now` unless it is
    /// already set.
    pub fn merged_into(&self, instruction: &NurseInstruction, now: NaiveDateTime) -> NurseInstruction {
        let mut next = instruction.clone();
        if let Some(status) = self.status {
            next.status = status;
            if status == InstructionStatus::Completed && next.completed_at.is_none() {
                next.completed_at = Some(now);
            }
        }
        if let Some(nurse) = &self.nurse_id {
            next.nurse_id = Some(nurse.clone());
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(notes) = &self.notes {
            next.notes = Some(notes.clone());
        }
        next
    }
}
