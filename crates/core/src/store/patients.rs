//! Patient and room actions.
//!
//! A patient occupies a bed exactly when its `room_number` is set; the room's `patients` list
//! is kept in step. Discharging a patient clears its room number and frees the bed.

use super::{ensure_absent, ensure_unique, position, HospitalStore, MutationOutcome, StoreEvent};
use crate::models::{
    Entity, NewPatient, Patient, PatientPatch, PatientStatus, Room, RoomPatch, RoomStatus,
};
use crate::permissions::ActionKind;
use crate::roles::Role;
use crate::{CoreError, CoreResult};
use hms_ids::{PatientId, RoomId};
use hms_types::NonEmptyText;

impl HospitalStore {
    /// Admit a new patient record.
    ///
    /// # Errors
    ///
    /// Fails with [`CoreError::Unauthorized`], [`CoreError::DuplicateIdentity`], a reference
    /// error for an unknown or wrongly-roled doctor or nurse, or
    /// [`CoreError::RoomUnavailable`] if the requested room cannot take the patient.
    pub fn add_patient(&mut self, mut patient: Patient) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddPatient)?;
        ensure_absent(&self.patients, patient.id())?;
        if patient.status == PatientStatus::Discharged {
            patient.room_number = None;
        }
        self.check_care_team(&patient)?;

        let room_change = self.plan_room_move(&patient.id, None, patient.room_number.as_ref())?;

        let id = patient.id.clone();
        self.patients.push(patient);
        self.commit_rooms(room_change);
        Ok(self.notify(StoreEvent::PatientAdded(id)))
    }

    /// Admit a validated form payload under a freshly generated id.
    pub fn admit_patient(&mut self, payload: NewPatient) -> CoreResult<PatientId> {
        let id = PatientId::generate();
        self.add_patient(payload.into_patient(id.clone()))?;
        Ok(id)
    }

    /// Apply a partial update to a patient.
    ///
    /// Moving to `discharged` frees the patient's bed. Changing `room_number` moves the
    /// patient between rooms.
    pub fn update_patient(&mut self, id: &PatientId, patch: &PatientPatch) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdatePatient)?;
        let idx = position(&self.patients, id)?;
        let current = &self.patients[idx];

        let mut next = patch.merged_into(current);
        if next.status == PatientStatus::Discharged {
            next.room_number = None;
        }
        if next == *current {
            return Ok(MutationOutcome::Unchanged);
        }
        self.check_care_team(&next)?;
        let room_change = self.plan_room_move(
            id,
            current.room_number.as_ref(),
            next.room_number.as_ref(),
        )?;

        self.patients[idx] = next;
        self.commit_rooms(room_change);
        Ok(self.notify(StoreEvent::PatientUpdated(id.clone())))
    }

    /// Shorthand for a status-only update.
    pub fn set_patient_status(&mut self, id: &PatientId, status: PatientStatus) -> CoreResult<MutationOutcome> {
        self.update_patient(id, &PatientPatch::status(status))
    }

    /// Replace the patient collection with a freshly fetched list.
    ///
    /// Room occupancy is rebuilt from the incoming room numbers. Patients naming a room this
    /// store does not know keep their room number but occupy nothing. Not permission gated:
    /// this is hydration from the backend, not a user edit.
    ///
    /// The list is rejected when the resulting store would fail the reference audit, e.g. when
    /// it drops a patient that appointments or a user account still point at. Every problem is
    /// logged and the first one is returned.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentity`] for repeated ids,
    /// [`CoreError::InvariantViolation`] if the list overfills a room, or the first reference
    /// error ([`CoreError::DanglingReference`], [`CoreError::RoleMismatch`]) the audit finds.
    /// The store is unchanged on error.
    pub fn load_patients(&mut self, patients: Vec<Patient>) -> CoreResult<MutationOutcome> {
        ensure_unique(&patients)?;

        let mut rooms = self.rooms.clone();
        for room in &mut rooms {
            room.patients.clear();
            room.occupied = 0;
            if room.status != RoomStatus::Maintenance {
                room.status = RoomStatus::Available;
            }
        }
        for patient in patients.iter().filter(|p| p.status != PatientStatus::Discharged) {
            let Some(number) = &patient.room_number else {
                continue;
            };
            let Some(room) = rooms.iter_mut().find(|r| &r.room_number == number) else {
                tracing::warn!(patient = %patient.id, room = %number, "patient references unknown room");
                continue;
            };
            room.patients.push(patient.id.clone());
            room.occupied = room.patients.len() as u32;
            if room.status != RoomStatus::Maintenance {
                room.status = RoomStatus::Occupied;
            }
        }
        for room in &rooms {
            room.check_invariants()?;
        }

        let count = patients.len();
        let previous_patients = std::mem::replace(&mut self.patients, patients);
        let previous_rooms = std::mem::replace(&mut self.rooms, rooms);
        let mut problems = crate::relations::audit_references(self);
        if !problems.is_empty() {
            for problem in &problems {
                tracing::warn!(error = %problem, "rejecting fetched patient list");
            }
            self.patients = previous_patients;
            self.rooms = previous_rooms;
            return Err(problems.swap_remove(0));
        }
        Ok(self.notify(StoreEvent::PatientsLoaded { count }))
    }

    /// Change a room's status, capacity or equipment.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvariantViolation`] if the patch would shrink capacity below
    /// occupancy or mark the room with a status that contradicts its occupants.
    pub fn update_room(&mut self, id: &RoomId, patch: &RoomPatch) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdateRoom)?;
        let idx = position(&self.rooms, id)?;
        let next = patch.applied_to(&self.rooms[idx])?;
        if next == self.rooms[idx] {
            return Ok(MutationOutcome::Unchanged);
        }
        self.rooms[idx] = next;
        Ok(self.notify(StoreEvent::RoomUpdated(id.clone())))
    }

    /// Rooms that can take another patient right now.
    pub fn available_rooms(&self) -> impl Iterator<Item = &Room> {
        self.rooms.iter().filter(|r| r.accepts_admission())
    }

    fn check_care_team(&self, patient: &Patient) -> CoreResult<()> {
        if let Some(doctor) = &patient.assigned_doctor {
            self.require_user_role(doctor, Role::Doctor)?;
        }
        if let Some(nurse) = &patient.assigned_nurse {
            self.require_user_role(nurse, Role::Nurse)?;
        }
        Ok(())
    }

    fn room_index(&self, number: &NonEmptyText) -> CoreResult<usize> {
        self.rooms
            .iter()
            .position(|r| &r.room_number == number)
            .ok_or_else(|| CoreError::not_found(Room::KIND, number))
    }

    /// Works out the rooms that change when `patient` moves from `from` to `to`, without
    /// touching the store.
    fn plan_room_move(
        &self,
        patient: &PatientId,
        from: Option<&NonEmptyText>,
        to: Option<&NonEmptyText>,
    ) -> CoreResult<Vec<(usize, Room)>> {
        if from == to {
            return Ok(Vec::new());
        }
        let mut changed = Vec::with_capacity(2);
        if let Some(number) = from {
            // The old room may have been removed from the backend's view; nothing to free then.
            if let Ok(idx) = self.room_index(number) {
                let mut room = self.rooms[idx].clone();
                room.release(patient);
                changed.push((idx, room));
            }
        }
        if let Some(number) = to {
            let idx = self.room_index(number)?;
            let mut room = self.rooms[idx].clone();
            room.admit(patient.clone())?;
            changed.push((idx, room));
        }
        Ok(changed)
    }

    fn commit_rooms(&mut self, changed: Vec<(usize, Room)>) {
        for (idx, room) in changed {
            tracing::debug!(room = %room.room_number, occupied = room.occupied, "room occupancy changed");
            self.rooms[idx] = room;
        }
    }
}
