use super::Entity;
use hms_ids::DepartmentId;
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

/// A hospital department. The bed counters are reported figures and are not linked to rooms.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: DepartmentId,
    pub name: NonEmptyText,
    pub head: String,
    pub total_doctors: u32,
    pub total_nurses: u32,
    pub total_beds: u32,
    pub occupied_beds: u32,
    pub floor: String,
    pub contact: String,
}

impl Entity for Department {
    type Id = DepartmentId;
    const KIND: &'static str = "department";

    fn id(&self) -> &DepartmentId {
        &self.id
    }
}

impl Department {
    pub fn free_beds(&self) -> u32 {
        self.total_beds.saturating_sub(self.occupied_beds)
    }
}
