//! Prescriptions and their medication lines.
//!
//! A prescription's status is never taken from the caller: it is recomputed from the
//! `dispensed` flags of its medications whenever the medications change.

use super::Entity;
use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use hms_ids::{MedicationId, PatientId, PrescriptionId, UserId};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

wire_enum! {
    PrescriptionStatus, "prescription status" {
        Pending => "pending",
        PartiallyDispensed => "partially-dispensed",
        Dispensed => "dispensed",
    }
}

impl PrescriptionStatus {
    /// At least one medication is still to be dispensed.
    pub fn is_outstanding(self) -> bool {
        self != PrescriptionStatus::Dispensed
    }

    /// Status implied by the dispensed flags of `medications`.
    pub fn from_medications(medications: &[Medication]) -> Self {
        let dispensed = medications.iter().filter(|m| m.dispensed).count();
        if dispensed == 0 {
            PrescriptionStatus::Pending
        } else if dispensed == medications.len() {
            PrescriptionStatus::Dispensed
        } else {
            PrescriptionStatus::PartiallyDispensed
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Medication {
    pub id: MedicationId,
    pub name: NonEmptyText,
    pub dosage: String,
    pub frequency: String,
    pub duration: String,
    pub quantity: u32,
    #[serde(default)]
    pub dispensed: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prescription {
    pub id: PrescriptionId,
    pub patient_id: PatientId,
    pub doctor_id: UserId,
    pub date: NaiveDate,
    pub medications: Vec<Medication>,
    pub status: PrescriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    pub diagnosis: String,
}

impl Entity for Prescription {
    type Id = PrescriptionId;
    const KIND: &'static str = "prescription";

    fn id(&self) -> &PrescriptionId {
        &self.id
    }
}

impl Prescription {
    /// Checks the medication list and overwrites `status` with the derived value.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvariantViolation`] if the prescription has no medications,
    /// repeats a medication id or prescribes a zero quantity.
    pub fn normalise(&mut self) -> CoreResult<()> {
        if self.medications.is_empty() {
            return Err(CoreError::InvariantViolation(format!(
                "prescription '{}' has no medications",
                self.id
            )));
        }
        let mut seen = HashSet::new();
        for medication in &self.medications {
            if !seen.insert(&medication.id) {
                return Err(CoreError::InvariantViolation(format!(
                    "prescription '{}' lists medication '{}' twice",
                    self.id, medication.id
                )));
            }
            if medication.quantity == 0 {
                return Err(CoreError::InvariantViolation(format!(
                    "medication '{}' has zero quantity",
                    medication.id
                )));
            }
        }
        self.status = PrescriptionStatus::from_medications(&self.medications);
        Ok(())
    }

    /// Whether the stored status agrees with the medication flags.
    pub fn status_is_consistent(&self) -> bool {
        self.status == PrescriptionStatus::from_medications(&self.medications)
    }
}

/// Partial update of a prescription. There is deliberately no `status` field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrescriptionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<Vec<Medication>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

impl PrescriptionPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn merged_into(&self, prescription: &Prescription) -> Prescription {
        let mut next = prescription.clone();
        if let Some(medications) = &self.medications {
            next.medications = medications.clone();
        }
        if let Some(instructions) = &self.instructions {
            next.instructions = Some(instructions.clone());
        }
        if let Some(diagnosis) = &self.diagnosis {
            next.diagnosis = diagnosis.clone();
        }
        next
    }
}
