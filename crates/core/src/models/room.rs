//! Rooms and occupancy.
//!
//! `occupied` always equals `patients.len()` and never exceeds `capacity`. `status` is derived
//! from occupancy except for `maintenance`, which is set and cleared explicitly.

use super::Entity;
use crate::error::{CoreError, CoreResult};
use hms_ids::{PatientId, RoomId};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

wire_enum! {
    RoomType, "room type" {
        Icu => "icu",
        Private => "private",
        General => "general",
        Emergency => "emergency",
        Surgery => "surgery",
    }
}

wire_enum! {
    RoomStatus, "room status" {
        Available => "available",
        Occupied => "occupied",
        Maintenance => "maintenance",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub id: RoomId,
    pub room_number: NonEmptyText,
    #[serde(rename = "type")]
    pub kind: RoomType,
    pub floor: String,
    pub capacity: u32,
    pub occupied: u32,
    pub status: RoomStatus,
    pub department: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patients: Vec<PatientId>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub equipment: Vec<String>,
}

impl Entity for Room {
    type Id = RoomId;
    const KIND: &'static str = "room";

    fn id(&self) -> &RoomId {
        &self.id
    }
}

impl Room {
    /// Status implied by occupancy, ignoring maintenance.
    fn occupancy_status(&self) -> RoomStatus {
        if self.occupied > 0 {
            RoomStatus::Occupied
        } else {
            RoomStatus::Available
        }
    }

    pub fn free_beds(&self) -> u32 {
        self.capacity.saturating_sub(self.occupied)
    }

    /// Whether a new patient could be admitted right now.
    pub fn accepts_admission(&self) -> bool {
        self.status != RoomStatus::Maintenance && self.free_beds() > 0
    }

    /// Checks the occupancy invariants.
    pub fn check_invariants(&self) -> CoreResult<()> {
        let fail = |msg: String| Err(CoreError::InvariantViolation(msg));
        if self.occupied > self.capacity {
            return fail(format!(
                "room {} holds {} patients but has capacity {}",
                self.room_number, self.occupied, self.capacity
            ));
        }
        if self.occupied as usize != self.patients.len() {
            return fail(format!(
                "room {} counts {} occupants but lists {}",
                self.room_number,
                self.occupied,
                self.patients.len()
            ));
        }
        if self.status != RoomStatus::Maintenance && self.status != self.occupancy_status() {
            return fail(format!(
                "room {} is marked {} with {} occupants",
                self.room_number, self.status, self.occupied
            ));
        }
        Ok(())
    }

    /// Places `patient` in this room.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::RoomUnavailable`] if the room is under maintenance or full.
    pub fn admit(&mut self, patient: PatientId) -> CoreResult<()> {
        if self.patients.contains(&patient) {
            return Ok(());
        }
        if !self.accepts_admission() {
            let reason = if self.status == RoomStatus::Maintenance {
                "under maintenance".to_owned()
            } else {
                format!("all {} beds occupied", self.capacity)
            };
            return Err(CoreError::RoomUnavailable {
                room: self.room_number.to_string(),
                reason,
            });
        }
        self.patients.push(patient);
        self.sync_occupancy();
        Ok(())
    }

    /// Removes `patient` from this room. Releasing a patient who is not here is a no-op.
    pub fn release(&mut self, patient: &PatientId) {
        self.patients.retain(|p| p != patient);
        self.sync_occupancy();
    }

    fn sync_occupancy(&mut self) {
        self.occupied = self.patients.len() as u32;
        if self.status != RoomStatus::Maintenance {
            self.status = self.occupancy_status();
        }
    }
}

/// Changes an attendant or administrator may make to a room.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomPatch {
    /// `maintenance` takes the room out of service; `available` or `occupied` puts it back,
    /// and must agree with current occupancy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment: Option<Vec<String>>,
}

impl RoomPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the patched room after checking it against the occupancy invariants.
    pub fn applied_to(&self, room: &Room) -> CoreResult<Room> {
        let mut next = room.clone();
        if let Some(capacity) = self.capacity {
            next.capacity = capacity;
        }
        if let Some(equipment) = &self.equipment {
            next.equipment = equipment.clone();
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        next.check_invariants()?;
        Ok(next)
    }
}
