//! Relationship resolution.
//!
//! Records refer to each other by typed id (and patients to rooms by room number). Views that
//! need display names go through the `resolve_*` functions here, which follow those references
//! and fail with [`CoreError::DanglingReference`] instead of rendering a placeholder.
//!
//! [`audit_references`] walks every reference in a store at once. The store runs it when it is
//! seeded, and `hms seed-check` prints its findings.

use crate::models::{
    Appointment, BillingRecord, Entity, LabTest, NurseInstruction, Patient, Prescription, Room,
    User,
};
use crate::roles::Role;
use crate::store::{dangling, HospitalStore};
use crate::{CoreError, CoreResult};
use hms_ids::{AppointmentId, InstructionId, LabTestId, PatientId, PrescriptionId, UserId};

/// A patient with its care team and room looked up.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPatient<'a> {
    pub patient: &'a Patient,
    pub doctor: Option<&'a User>,
    pub nurse: Option<&'a User>,
    pub room: Option<&'a Room>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedAppointment<'a> {
    pub appointment: &'a Appointment,
    pub patient: &'a Patient,
    pub doctor: &'a User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedPrescription<'a> {
    pub prescription: &'a Prescription,
    pub patient: &'a Patient,
    pub doctor: &'a User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedLabTest<'a> {
    pub lab_test: &'a LabTest,
    pub patient: &'a Patient,
    pub requested_by: &'a User,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedInstruction<'a> {
    pub instruction: &'a NurseInstruction,
    pub patient: &'a Patient,
    pub doctor: &'a User,
    pub nurse: Option<&'a User>,
}

impl ResolvedPatient<'_> {
    /// Room number to display, if the patient holds a bed.
    pub fn room_number(&self) -> Option<&str> {
        self.room.map(|r| r.room_number.as_str())
    }
}

fn user_ref<'a, E: Entity>(store: &'a HospitalStore, from: &E, id: &UserId) -> CoreResult<&'a User> {
    store
        .user(id)
        .ok_or_else(|| dangling(from, User::KIND, id))
}

fn patient_ref<'a, E: Entity>(
    store: &'a HospitalStore,
    from: &E,
    id: &PatientId,
) -> CoreResult<&'a Patient> {
    store
        .patient(id)
        .ok_or_else(|| dangling(from, Patient::KIND, id))
}

fn room_ref<'a>(store: &'a HospitalStore, patient: &Patient) -> CoreResult<Option<&'a Room>> {
    match &patient.room_number {
        Some(number) => store
            .room_by_number(number)
            .map(Some)
            .ok_or_else(|| dangling(patient, Room::KIND, number)),
        None => Ok(None),
    }
}

/// Looks up a patient's doctor, nurse and room.
///
/// # Errors
///
/// Returns [`CoreError::NotFound`] for an unknown patient and
/// [`CoreError::DanglingReference`] if any of its references do not resolve.
pub fn resolve_patient<'a>(
    store: &'a HospitalStore,
    id: &PatientId,
) -> CoreResult<ResolvedPatient<'a>> {
    let patient = store
        .patient(id)
        .ok_or_else(|| CoreError::not_found(Patient::KIND, id))?;
    let doctor = patient
        .assigned_doctor
        .as_ref()
        .map(|d| user_ref(store, patient, d))
        .transpose()?;
    let nurse = patient
        .assigned_nurse
        .as_ref()
        .map(|n| user_ref(store, patient, n))
        .transpose()?;
    Ok(ResolvedPatient {
        patient,
        doctor,
        nurse,
        room: room_ref(store, patient)?,
    })
}

pub fn resolve_appointment<'a>(
    store: &'a HospitalStore,
    id: &AppointmentId,
) -> CoreResult<ResolvedAppointment<'a>> {
    let appointment = store
        .appointment(id)
        .ok_or_else(|| CoreError::not_found(Appointment::KIND, id))?;
    Ok(ResolvedAppointment {
        appointment,
        patient: patient_ref(store, appointment, &appointment.patient_id)?,
        doctor: user_ref(store, appointment, &appointment.doctor_id)?,
    })
}

pub fn resolve_prescription<'a>(
    store: &'a HospitalStore,
    id: &PrescriptionId,
) -> CoreResult<ResolvedPrescription<'a>> {
    let prescription = store
        .prescription(id)
        .ok_or_else(|| CoreError::not_found(Prescription::KIND, id))?;
    Ok(ResolvedPrescription {
        prescription,
        patient: patient_ref(store, prescription, &prescription.patient_id)?,
        doctor: user_ref(store, prescription, &prescription.doctor_id)?,
    })
}

pub fn resolve_lab_test<'a>(
    store: &'a HospitalStore,
    id: &LabTestId,
) -> CoreResult<ResolvedLabTest<'a>> {
    let lab_test = store
        .lab_test(id)
        .ok_or_else(|| CoreError::not_found(LabTest::KIND, id))?;
    Ok(ResolvedLabTest {
        lab_test,
        patient: patient_ref(store, lab_test, &lab_test.patient_id)?,
        requested_by: user_ref(store, lab_test, &lab_test.requested_by)?,
    })
}

pub fn resolve_instruction<'a>(
    store: &'a HospitalStore,
    id: &InstructionId,
) -> CoreResult<ResolvedInstruction<'a>> {
    let instruction = store
        .nurse_instruction(id)
        .ok_or_else(|| CoreError::not_found(NurseInstruction::KIND, id))?;
    let nurse = instruction
        .nurse_id
        .as_ref()
        .map(|n| user_ref(store, instruction, n))
        .transpose()?;
    Ok(ResolvedInstruction {
        instruction,
        patient: patient_ref(store, instruction, &instruction.patient_id)?,
        doctor: user_ref(store, instruction, &instruction.doctor_id)?,
        nurse,
    })
}

/// Collects reference problems across the whole store.
struct Audit<'a> {
    store: &'a HospitalStore,
    problems: Vec<CoreError>,
}

impl Audit<'_> {
    fn report(&mut self, result: CoreResult<()>) {
        if let Err(err) = result {
            self.problems.push(err);
        }
    }

    fn patient<E: Entity>(&mut self, from: &E, id: &PatientId) {
        let found = patient_ref(self.store, from, id).map(|_| ());
        self.report(found);
    }

    fn user<E: Entity>(&mut self, from: &E, id: &UserId, expected: Role) {
        let checked = user_ref(self.store, from, id).and_then(|user| {
            if user.role == expected {
                Ok(())
            } else {
                Err(CoreError::RoleMismatch {
                    user: id.to_string(),
                    expected,
                    actual: user.role,
                })
            }
        });
        self.report(checked);
    }
}

/// Every broken reference in `store`, in collection order. An empty result means every id
/// resolves, every assigned user holds the expected role, and room occupancy lists agree with
/// the patients' room numbers.
pub fn audit_references(store: &HospitalStore) -> Vec<CoreError> {
    let mut audit = Audit {
        store,
        problems: Vec::new(),
    };

    for user in store.users() {
        if let Some(patient) = &user.patient_id {
            audit.patient(user, patient);
        }
    }

    for patient in store.patients() {
        if let Some(doctor) = &patient.assigned_doctor {
            audit.user(patient, doctor, Role::Doctor);
        }
        if let Some(nurse) = &patient.assigned_nurse {
            audit.user(patient, nurse, Role::Nurse);
        }
        let placed = room_ref(store, patient).and_then(|room| match room {
            Some(room) if !room.patients.contains(&patient.id) => {
                Err(CoreError::InvariantViolation(format!(
                    "patient '{}' is in room '{}' but not on its occupancy list",
                    patient.id, room.room_number
                )))
            }
            _ => Ok(()),
        });
        audit.report(placed);
    }

    for room in store.rooms() {
        for id in &room.patients {
            let listed = match store.patient(id) {
                None => Err(dangling(room, Patient::KIND, id)),
                Some(p) if p.room_number.as_ref() != Some(&room.room_number) => {
                    Err(CoreError::InvariantViolation(format!(
                        "room '{}' lists patient '{}' who is not assigned to it",
                        room.room_number, id
                    )))
                }
                Some(_) => Ok(()),
            };
            audit.report(listed);
        }
    }

    for appointment in store.appointments() {
        audit.patient(appointment, &appointment.patient_id);
        audit.user(appointment, &appointment.doctor_id, Role::Doctor);
    }
    for prescription in store.prescriptions() {
        audit.patient(prescription, &prescription.patient_id);
        audit.user(prescription, &prescription.doctor_id, Role::Doctor);
    }
    for test in store.lab_tests() {
        audit.patient(test, &test.patient_id);
        audit.user(test, &test.requested_by, Role::Doctor);
    }
    for instruction in store.nurse_instructions() {
        audit.patient(instruction, &instruction.patient_id);
        audit.user(instruction, &instruction.doctor_id, Role::Doctor);
        if let Some(nurse) = &instruction.nurse_id {
            audit.user(instruction, nurse, Role::Nurse);
        }
    }
    for record in store.billing_records() {
        audit.patient::<BillingRecord>(record, &record.patient_id);
    }

    if !audit.problems.is_empty() {
        tracing::warn!(count = audit.problems.len(), "reference audit found problems");
    }
    audit.problems
}
