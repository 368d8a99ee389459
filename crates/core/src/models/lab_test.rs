use super::Entity;
use chrono::NaiveDateTime;
use hms_ids::{LabTestId, PatientId, UserId};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

wire_enum! {
    TestType, "test type" {
        Blood => "blood",
        Urine => "urine",
        Xray => "xray",
        Mri => "mri",
        Ct => "ct",
        Ultrasound => "ultrasound",
        Ecg => "ecg",
        Other => "other",
    }
}

wire_enum! {
    LabTestPriority, "lab test priority" {
        Routine => "routine",
        Urgent => "urgent",
        Stat => "stat",
    }
}

wire_enum! {
    /// Lab work only moves forward through these states.
    LabTestStatus, "lab test status" {
        Pending => "pending",
        InProgress => "in-progress",
        Completed => "completed",
        Reported => "reported",
    }
}

impl LabTestStatus {
    /// True if `next` is this status or a later one.
    pub fn can_advance_to(self, next: LabTestStatus) -> bool {
        next >= self
    }

    pub fn is_finished(self) -> bool {
        self >= LabTestStatus::Completed
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTest {
    pub id: LabTestId,
    pub patient_id: PatientId,
    pub requested_by: UserId,
    pub test_name: NonEmptyText,
    pub test_type: TestType,
    pub priority: LabTestPriority,
    pub status: LabTestStatus,
    pub request_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completion_date: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Entity for LabTest {
    type Id = LabTestId;
    const KIND: &'static str = "lab test";

    fn id(&self) -> &LabTestId {
        &self.id
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabTestPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<LabTestStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<LabTestPriority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachments: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl LabTestPatch {
    pub fn status(status: LabTestStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merged_into(&self, test: &LabTest) -> LabTest {
        let mut next = test.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(priority) = self.priority {
            next.priority = priority;
        }
        if let Some(results) = &self.results {
            next.results = Some(results.clone());
        }
        if let Some(attachments) = &self.attachments {
            next.attachments = attachments.clone();
        }
        if let Some(notes) = &self.notes {
            next.notes = Some(notes.clone());
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progression_is_forward_only() {
        use LabTestStatus::*;
        assert!(Pending.can_advance_to(InProgress));
        assert!(InProgress.can_advance_to(Reported));
        assert!(Completed.can_advance_to(Completed));
        assert!(!InProgress.can_advance_to(Pending));
        assert!(!Reported.can_advance_to(Completed));
        assert!(Completed.is_finished() && !InProgress.is_finished());
    }
}
