//! Patient records, partial updates, list filters and status counts.

use super::{double_option, Entity};
use chrono::NaiveDate;
use hms_ids::{PatientId, RoomId, UserId};
use hms_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};

wire_enum! {
    PatientStatus, "patient status" {
        Admitted => "admitted",
        Discharged => "discharged",
        Critical => "critical",
        Stable => "stable",
        Outpatient => "outpatient",
    }
}

impl PatientStatus {
    /// Statuses that count as currently under care on a ward.
    pub fn is_inpatient(self) -> bool {
        matches!(
            self,
            PatientStatus::Admitted | PatientStatus::Critical | PatientStatus::Stable
        )
    }
}

wire_enum! {
    Gender, "gender" {
        Male => "male",
        Female => "female",
        Other => "other",
    }
}

wire_enum! {
    BloodGroup, "blood group" {
        APos => "A+",
        ANeg => "A-",
        BPos => "B+",
        BNeg => "B-",
        AbPos => "AB+",
        AbNeg => "AB-",
        OPos => "O+",
        ONeg => "O-",
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmergencyContact {
    pub name: NonEmptyText,
    pub relation: String,
    pub phone: NonEmptyText,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: PatientId,
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub admission_date: NaiveDate,
    pub status: PatientStatus,
    /// Display number of the room the patient occupies, e.g. `ICU-101`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_nurse: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub medical_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allergies: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_contact: Option<EmergencyContact>,
}

impl Entity for Patient {
    type Id = PatientId;
    const KIND: &'static str = "patient";

    fn id(&self) -> &PatientId {
        &self.id
    }
}

/// A validated patient payload without an identifier, as produced by the admission form and
/// sent to `POST /patients`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPatient {
    pub name: NonEmptyText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blood_group: Option<BloodGroup>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<EmailAddress>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub admission_date: NaiveDate,
    pub status: PatientStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_number: Option<NonEmptyText>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_doctor: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_nurse: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnosis: Option<String>,
}

impl NewPatient {
    pub fn into_patient(self, id: PatientId) -> Patient {
        Patient {
            id,
            name: self.name,
            age: self.age,
            gender: self.gender,
            blood_group: self.blood_group,
            contact: self.contact,
            email: self.email,
            address: self.address,
            admission_date: self.admission_date,
            status: self.status,
            room_number: self.room_number,
            assigned_doctor: self.assigned_doctor,
            assigned_nurse: self.assigned_nurse,
            diagnosis: self.diagnosis,
            medical_history: Vec::new(),
            allergies: Vec::new(),
            emergency_contact: None,
        }
    }
}

/// Partial update of a patient. Absent fields are left untouched; for optional fields an
/// explicit `null` clears the value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<NonEmptyText>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub age: Option<Option<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub blood_group: Option<Option<BloodGroup>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub contact: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PatientStatus>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub room_number: Option<Option<NonEmptyText>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_doctor: Option<Option<UserId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub assigned_nurse: Option<Option<UserId>>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub diagnosis: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medical_history: Option<Vec<String>>,
}

impl PatientPatch {
    pub fn status(status: PatientStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns a copy of `patient` with this patch merged in.
    pub fn merged_into(&self, patient: &Patient) -> Patient {
        let mut next = patient.clone();
        if let Some(name) = &self.name {
            next.name = name.clone();
        }
        if let Some(age) = self.age {
            next.age = age;
        }
        if let Some(gender) = self.gender {
            next.gender = gender;
        }
        if let Some(blood_group) = self.blood_group {
            next.blood_group = blood_group;
        }
        if let Some(contact) = &self.contact {
            next.contact = contact.clone();
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(room_number) = &self.room_number {
            next.room_number = room_number.clone();
        }
        if let Some(doctor) = &self.assigned_doctor {
            next.assigned_doctor = doctor.clone();
        }
        if let Some(nurse) = &self.assigned_nurse {
            next.assigned_nurse = nurse.clone();
        }
        if let Some(diagnosis) = &self.diagnosis {
            next.diagnosis = diagnosis.clone();
        }
        if let Some(allergies) = &self.allergies {
            next.allergies = allergies.clone();
        }
        if let Some(history) = &self.medical_history {
            next.medical_history = history.clone();
        }
        next
    }
}

/// Query parameters accepted by `GET /patients`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PatientFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<PatientStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor_id: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub room_id: Option<RoomId>,
}

/// Per-status patient counts, as served by `GET /patients/stats`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientStats {
    pub total: usize,
    pub admitted: usize,
    pub discharged: usize,
    pub critical: usize,
    pub stable: usize,
    pub outpatient: usize,
}

impl PatientStats {
    pub fn from_patients<'a>(patients: impl IntoIterator<Item = &'a Patient>) -> Self {
        let mut stats = Self::default();
        for patient in patients {
            stats.total += 1;
            match patient.status {
                PatientStatus::Admitted => stats.admitted += 1,
                PatientStatus::Discharged => stats.discharged += 1,
                PatientStatus::Critical => stats.critical += 1,
                PatientStatus::Stable => stats.stable += 1,
                PatientStatus::Outpatient => stats.outpatient += 1,
            }
        }
        stats
    }
}
