//! Appointments, prescriptions, lab tests and nurse instructions.

use super::{dangling, ensure_absent, position, HospitalStore, MutationOutcome, StoreEvent};
use crate::models::{
    Appointment, AppointmentPatch, Entity, InstructionPatch, LabTest, LabTestPatch,
    NurseInstruction, Prescription, PrescriptionPatch, User,
};
use crate::permissions::ActionKind;
use crate::roles::Role;
use crate::{CoreError, CoreResult};
use hms_ids::{AppointmentId, InstructionId, LabTestId, MedicationId, PrescriptionId};

fn check_duration(appointment: &Appointment) -> CoreResult<()> {
    if appointment.duration == 0 {
        return Err(CoreError::InvalidInput("appointment duration must be positive".into()));
    }
    Ok(())
}

impl HospitalStore {
    /// Book an appointment.
    ///
    /// The patient must exist, the doctor must be a user with the doctor role and the
    /// duration must be positive.
    pub fn add_appointment(&mut self, appointment: Appointment) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddAppointment)?;
        ensure_absent(&self.appointments, appointment.id())?;
        self.require_patient(&appointment, &appointment.patient_id)?;
        self.require_clinician(&appointment, &appointment.doctor_id, Role::Doctor)?;
        check_duration(&appointment)?;

        let id = appointment.id.clone();
        self.appointments.push(appointment);
        Ok(self.notify(StoreEvent::AppointmentAdded(id)))
    }

    /// Reschedule, annotate or move an appointment through its lifecycle.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] for any change to a completed or cancelled
    /// appointment.
    pub fn update_appointment(
        &mut self,
        id: &AppointmentId,
        patch: &AppointmentPatch,
    ) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdateAppointment)?;
        let idx = position(&self.appointments, id)?;
        let current = &self.appointments[idx];
        let next = patch.merged_into(current);
        if next == *current {
            return Ok(MutationOutcome::Unchanged);
        }
        if current.status.is_terminal() {
            return Err(CoreError::InvalidTransition {
                kind: Appointment::KIND,
                from: current.status.as_str(),
                to: next.status.as_str(),
            });
        }
        check_duration(&next)?;

        self.appointments[idx] = next;
        Ok(self.notify(StoreEvent::AppointmentUpdated(id.clone())))
    }

    /// Issue a prescription. Its status is derived from the medication lines, whatever the
    /// caller supplied.
    pub fn add_prescription(&mut self, mut prescription: Prescription) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddPrescription)?;
        ensure_absent(&self.prescriptions, prescription.id())?;
        self.require_patient(&prescription, &prescription.patient_id)?;
        self.require_clinician(&prescription, &prescription.doctor_id, Role::Doctor)?;
        prescription.normalise()?;

        let id = prescription.id.clone();
        self.prescriptions.push(prescription);
        Ok(self.notify(StoreEvent::PrescriptionAdded(id)))
    }

    pub fn update_prescription(
        &mut self,
        id: &PrescriptionId,
        patch: &PrescriptionPatch,
    ) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdatePrescription)?;
        let idx = position(&self.prescriptions, id)?;
        let mut next = patch.merged_into(&self.prescriptions[idx]);
        next.normalise()?;
        if next == self.prescriptions[idx] {
            return Ok(MutationOutcome::Unchanged);
        }

        self.prescriptions[idx] = next;
        Ok(self.notify(StoreEvent::PrescriptionUpdated(id.clone())))
    }

    /// Mark one medication line as dispensed and recompute the prescription's status.
    /// Dispensing an already-dispensed line changes nothing.
    pub fn dispense_medication(
        &mut self,
        prescription: &PrescriptionId,
        medication: &MedicationId,
    ) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::DispenseMedication)?;
        let idx = position(&self.prescriptions, prescription)?;
        let mut next = self.prescriptions[idx].clone();
        let line = next
            .medications
            .iter_mut()
            .find(|m| &m.id == medication)
            .ok_or_else(|| CoreError::not_found("medication", medication))?;
        if line.dispensed {
            return Ok(MutationOutcome::Unchanged);
        }
        line.dispensed = true;
        next.normalise()?;

        tracing::info!(%prescription, %medication, status = %next.status, "medication dispensed");
        self.prescriptions[idx] = next;
        Ok(self.notify(StoreEvent::MedicationDispensed {
            prescription: prescription.clone(),
            medication: medication.clone(),
        }))
    }

    /// Order a lab test. A test added as already finished gets a completion time if it has
    /// none.
    pub fn add_lab_test(&mut self, mut test: LabTest) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddLabTest)?;
        ensure_absent(&self.lab_tests, test.id())?;
        self.require_patient(&test, &test.patient_id)?;
        self.require_clinician(&test, &test.requested_by, Role::Doctor)?;
        if test.status.is_finished() && test.completion_date.is_none() {
            test.completion_date = Some(self.now());
        }

        let id = test.id.clone();
        self.lab_tests.push(test);
        Ok(self.notify(StoreEvent::LabTestAdded(id)))
    }

    /// Progress a lab test or attach results.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidTransition`] if the patch would move the status backwards.
    pub fn update_lab_test(&mut self, id: &LabTestId, patch: &LabTestPatch) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdateLabTest)?;
        let idx = position(&self.lab_tests, id)?;
        let current = &self.lab_tests[idx];
        let mut next = patch.merged_into(current);
        if !current.status.can_advance_to(next.status) {
            return Err(CoreError::InvalidTransition {
                kind: LabTest::KIND,
                from: current.status.as_str(),
                to: next.status.as_str(),
            });
        }
        if next.status.is_finished() && next.completion_date.is_none() {
            next.completion_date = Some(self.now());
        }
        if next == *current {
            return Ok(MutationOutcome::Unchanged);
        }

        self.lab_tests[idx] = next;
        Ok(self.notify(StoreEvent::LabTestUpdated(id.clone())))
    }

    pub fn add_nurse_instruction(&mut self, mut instruction: NurseInstruction) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddNurseInstruction)?;
        ensure_absent(&self.nurse_instructions, instruction.id())?;
        self.require_patient(&instruction, &instruction.patient_id)?;
        self.require_clinician(&instruction, &instruction.doctor_id, Role::Doctor)?;
        if let Some(nurse) = &instruction.nurse_id {
            self.require_clinician(&instruction, nurse, Role::Nurse)?;
        }
        if !instruction.status.is_open() && instruction.completed_at.is_none() {
            instruction.completed_at = Some(self.now());
        }

        let id = instruction.id.clone();
        self.nurse_instructions.push(instruction);
        Ok(self.notify(StoreEvent::InstructionAdded(id)))
    }

    /// Progress an instruction. Status only moves forward; completing stamps `completed_at`.
    pub fn update_nurse_instruction(
        &mut self,
        id: &InstructionId,
        patch: &InstructionPatch,
    ) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::UpdateNurseInstruction)?;
        let idx = position(&self.nurse_instructions, id)?;
        let current = &self.nurse_instructions[idx];
        let next = patch.merged_into(current, self.now());
        if next.status < current.status {
            return Err(CoreError::InvalidTransition {
                kind: NurseInstruction::KIND,
                from: current.status.as_str(),
                to: next.status.as_str(),
            });
        }
        if next == *current {
            return Ok(MutationOutcome::Unchanged);
        }
        if let Some(nurse) = &next.nurse_id {
            self.require_clinician(&next, nurse, Role::Nurse)?;
        }

        self.nurse_instructions[idx] = next;
        Ok(self.notify(StoreEvent::InstructionUpdated(id.clone())))
    }

    /// Like `require_user_role`, but an unknown user is reported as a dangling reference from
    /// `from`.
    fn require_clinician<E: Entity>(
        &self,
        from: &E,
        user: &hms_ids::UserId,
        expected: Role,
    ) -> CoreResult<()> {
        if self.user(user).is_none() {
            return Err(dangling(from, User::KIND, user));
        }
        self.require_user_role(user, expected)
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{fixed_now, recorder, seeded};
    use super::*;
    use crate::models::{
        AppointmentStatus, AppointmentType, InstructionPriority, InstructionStatus,
        LabTestPriority, LabTestStatus, Medication, PrescriptionStatus, TestType,
    };
    use chrono::NaiveDate;
    use hms_ids::{PatientId, UserId};
    use hms_types::NonEmptyText;

    fn appointment(id: &str, patient: &str, doctor: &str) -> Appointment {
        Appointment {
            id: AppointmentId::parse(id).unwrap(),
            patient_id: PatientId::parse(patient).unwrap(),
            doctor_id: UserId::parse(doctor).unwrap(),
            date_time: NaiveDate::from_ymd_opt(2025, 1, 22)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap(),
            duration: 30,
            kind: AppointmentType::Consultation,
            status: AppointmentStatus::Scheduled,
            department: "Cardiology".into(),
            notes: None,
            symptoms: None,
        }
    }

    #[test]
    fn appointment_references_are_checked_on_add() {
        let mut store = seeded(Role::Doctor);
        let err = store
            .add_appointment(appointment("A100", "P999", "U001"))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::DanglingReference { from_kind: "appointment", to_kind: "patient", .. }
        ));

        let err = store
            .add_appointment(appointment("A100", "P001", "U003"))
            .unwrap_err();
        assert!(matches!(err, CoreError::RoleMismatch { expected: Role::Doctor, .. }));

        store.add_appointment(appointment("A100", "P004", "U004")).unwrap();
        assert_eq!(store.appointments().len(), 4);
    }

    #[test]
    fn zero_length_appointments_are_rejected() {
        let mut store = seeded(Role::Doctor);
        let mut empty = appointment("A100", "P001", "U001");
        empty.duration = 0;
        assert!(matches!(
            store.add_appointment(empty),
            Err(CoreError::InvalidInput(_))
        ));
        assert_eq!(store.appointments().len(), 3);

        let patch = AppointmentPatch {
            duration: Some(0),
            ..AppointmentPatch::default()
        };
        let id = AppointmentId::parse("A001").unwrap();
        assert!(matches!(
            store.update_appointment(&id, &patch),
            Err(CoreError::InvalidInput(_))
        ));
    }

    #[test]
    fn terminal_appointments_are_frozen() {
        let mut store = seeded(Role::Doctor);
        let id = AppointmentId::parse("A001").unwrap();
        store
            .update_appointment(&id, &AppointmentPatch::status(AppointmentStatus::Cancelled))
            .unwrap();

        let err = store
            .update_appointment(&id, &AppointmentPatch::status(AppointmentStatus::Scheduled))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidTransition { from: "cancelled", to: "scheduled", .. }
        ));
        assert_eq!(
            store
                .update_appointment(&id, &AppointmentPatch::status(AppointmentStatus::Cancelled))
                .unwrap(),
            MutationOutcome::Unchanged
        );
    }

    #[test]
    fn nurses_cannot_schedule() {
        let mut store = seeded(Role::Nurse);
        let err = store
            .add_appointment(appointment("A100", "P001", "U001"))
            .unwrap_err();
        assert!(err.is_authorization());
        assert_eq!(store.appointments().len(), 3);
    }

    #[test]
    fn caller_supplied_prescription_status_is_ignored() {
        let mut store = seeded(Role::Doctor);
        let rx = Prescription {
            id: PrescriptionId::parse("RX100").unwrap(),
            patient_id: PatientId::parse("P002").unwrap(),
            doctor_id: UserId::parse("U004").unwrap(),
            date: NaiveDate::from_ymd_opt(2025, 1, 21).unwrap(),
            medications: vec![Medication {
                id: MedicationId::parse("M100").unwrap(),
                name: NonEmptyText::new("Azithromycin").unwrap(),
                dosage: "250mg".into(),
                frequency: "Once daily".into(),
                duration: "5 days".into(),
                quantity: 5,
                dispensed: false,
            }],
            status: PrescriptionStatus::Dispensed,
            instructions: None,
            diagnosis: "Pneumonia".into(),
        };
        store.add_prescription(rx).unwrap();
        let stored = store.prescription(&PrescriptionId::parse("RX100").unwrap()).unwrap();
        assert_eq!(stored.status, PrescriptionStatus::Pending);
    }

    #[test]
    fn dispensing_walks_prescription_status() {
        let mut store = seeded(Role::Chemist);
        let events = recorder(&mut store);
        let rx = PrescriptionId::parse("RX001").unwrap();
        let m = |id: &str| MedicationId::parse(id).unwrap();

        store.dispense_medication(&rx, &m("M001")).unwrap();
        assert_eq!(
            store.prescription(&rx).unwrap().status,
            PrescriptionStatus::PartiallyDispensed
        );
        assert_eq!(
            store.dispense_medication(&rx, &m("M001")).unwrap(),
            MutationOutcome::Unchanged
        );

        store.dispense_medication(&rx, &m("M002")).unwrap();
        store.dispense_medication(&rx, &m("M003")).unwrap();
        assert_eq!(store.prescription(&rx).unwrap().status, PrescriptionStatus::Dispensed);
        assert_eq!(events.borrow().len(), 3);

        assert!(matches!(
            store.dispense_medication(&rx, &m("M999")),
            Err(CoreError::NotFound { kind: "medication", .. })
        ));
    }

    #[test]
    fn doctors_cannot_dispense() {
        let mut store = seeded(Role::Doctor);
        let err = store
            .dispense_medication(
                &PrescriptionId::parse("RX001").unwrap(),
                &MedicationId::parse("M001").unwrap(),
            )
            .unwrap_err();
        assert!(err.is_authorization());
    }

    #[test]
    fn lab_status_only_moves_forward() {
        let mut store = seeded(Role::Lab);
        let id = LabTestId::parse("LT002").unwrap();

        let err = store
            .update_lab_test(&id, &LabTestPatch::status(LabTestStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { from: "in-progress", to: "pending", .. }));

        let done = LabTestPatch {
            status: Some(LabTestStatus::Completed),
            results: Some("Troponin I: 2.3 ng/mL".into()),
            ..LabTestPatch::default()
        };
        store.update_lab_test(&id, &done).unwrap();
        let test = store.lab_test(&id).unwrap();
        assert_eq!(test.status, LabTestStatus::Completed);
        assert_eq!(test.completion_date, Some(fixed_now()));
    }

    #[test]
    fn lab_orders_come_from_doctors() {
        let mut store = seeded(Role::Doctor);
        let test = LabTest {
            id: LabTestId::parse("LT100").unwrap(),
            patient_id: PatientId::parse("P003").unwrap(),
            requested_by: UserId::parse("U006").unwrap(),
            test_name: NonEmptyText::new("Blood Culture").unwrap(),
            test_type: TestType::Blood,
            priority: LabTestPriority::Stat,
            status: LabTestStatus::Pending,
            request_date: fixed_now(),
            completion_date: None,
            results: None,
            attachments: vec![],
            notes: None,
        };
        assert!(matches!(
            store.add_lab_test(test.clone()),
            Err(CoreError::RoleMismatch { actual: Role::Lab, .. })
        ));

        let ordered = LabTest {
            requested_by: UserId::parse("U001").unwrap(),
            ..test
        };
        store.add_lab_test(ordered).unwrap();
        assert_eq!(store.lab_tests().len(), 4);
    }

    #[test]
    fn nurse_completes_instruction_once() {
        let mut store = seeded(Role::Nurse);
        let id = InstructionId::parse("NI001").unwrap();
        let patch = InstructionPatch {
            status: Some(InstructionStatus::Completed),
            nurse_id: Some(UserId::parse("U003").unwrap()),
            ..InstructionPatch::default()
        };
        store.update_nurse_instruction(&id, &patch).unwrap();
        let done = store.nurse_instruction(&id).unwrap();
        assert_eq!(done.completed_at, Some(fixed_now()));

        let err = store
            .update_nurse_instruction(&id, &InstructionPatch::status(InstructionStatus::Pending))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidTransition { .. }));

        let err = store
            .add_nurse_instruction(NurseInstruction {
                id: InstructionId::parse("NI100").unwrap(),
                patient_id: PatientId::parse("P001").unwrap(),
                doctor_id: UserId::parse("U001").unwrap(),
                nurse_id: None,
                instructions: NonEmptyText::new("Turn patient every 2 hours").unwrap(),
                priority: InstructionPriority::Medium,
                status: InstructionStatus::Pending,
                created_at: fixed_now(),
                completed_at: None,
                notes: None,
            })
            .unwrap_err();
        assert!(err.is_authorization(), "nurses complete instructions but do not create them");
    }
}
