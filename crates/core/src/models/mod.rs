//! Domain records.
//!
//! These are plain data: the only behaviour they carry is local to one record (deriving a
//! status from line items, checking counters). Anything that needs a second collection, such
//! as room occupancy or reference checks, lives in the store.
//!
//! Wire spelling is camelCase field names and kebab-case enum values, matching the REST
//! backend and the seed document.

pub mod appointment;
pub mod billing;
pub mod department;
pub mod instruction;
pub mod lab_test;
pub mod notification;
pub mod patient;
pub mod prescription;
pub mod room;
pub mod user;

pub use appointment::{Appointment, AppointmentPatch, AppointmentStatus, AppointmentType};
pub use billing::{BillingCategory, BillingItem, BillingRecord, BillingStatus, Money};
pub use department::Department;
pub use instruction::{InstructionPatch, InstructionPriority, InstructionStatus, NurseInstruction};
pub use lab_test::{LabTest, LabTestPatch, LabTestPriority, LabTestStatus, TestType};
pub use notification::{Notification, NotificationType};
pub use patient::{
    BloodGroup, EmergencyContact, Gender, NewPatient, Patient, PatientFilters, PatientPatch,
    PatientStats, PatientStatus,
};
pub use prescription::{Medication, Prescription, PrescriptionPatch, PrescriptionStatus};
pub use room::{Room, RoomPatch, RoomStatus, RoomType};
pub use user::User;

use serde::{Deserialize, Deserializer};
use std::fmt::Display;

/// A record kept in one of the store's collections, keyed by a typed identifier.
pub trait Entity {
    type Id: Clone + PartialEq + Display;

    /// Human-readable kind used in error messages.
    const KIND: &'static str;

    fn id(&self) -> &Self::Id;
}

/// Deserialises a patch field that distinguishes "absent" (`None`) from "explicitly null"
/// (`Some(None)`), so a PATCH can clear an optional field.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
