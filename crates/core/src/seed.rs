//! Seed data.
//!
//! A fresh store is populated from a YAML document holding every collection. The default
//! document is compiled into the crate; a different one can be loaded from disk at startup.

use crate::constants::EMBEDDED_SEED_YAML;
use crate::models::{
    Appointment, BillingRecord, Department, LabTest, Notification, NurseInstruction, Patient,
    Prescription, Room, User,
};
use crate::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every collection the store holds, in seed-file form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct SeedData {
    pub users: Vec<User>,
    pub patients: Vec<Patient>,
    pub appointments: Vec<Appointment>,
    pub prescriptions: Vec<Prescription>,
    pub lab_tests: Vec<LabTest>,
    pub departments: Vec<Department>,
    pub rooms: Vec<Room>,
    pub nurse_instructions: Vec<NurseInstruction>,
    pub billing_records: Vec<BillingRecord>,
    pub notifications: Vec<Notification>,
}

impl SeedData {
    /// Parse a seed document.
    ///
    /// This uses `serde_path_to_error` to surface a best-effort "path" (e.g.
    /// `patients[2].status`) when the document does not match the schema.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SeedSchema`] naming the failing path.
    pub fn parse(yaml_text: &str) -> CoreResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        match serde_path_to_error::deserialize::<_, SeedData>(deserializer) {
            Ok(parsed) => Ok(parsed),
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>".to_owned()
                } else {
                    path
                };
                Err(CoreError::SeedSchema {
                    path,
                    message: source.to_string(),
                })
            }
        }
    }

    /// The data set compiled into the crate.
    pub fn embedded() -> CoreResult<Self> {
        Self::parse(EMBEDDED_SEED_YAML)
    }

    /// Load a seed document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SeedRead`] if the file cannot be read, or
    /// [`CoreError::SeedSchema`] if it does not parse.
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path).map_err(CoreError::SeedRead)?;
        let data = Self::parse(&text)?;
        tracing::debug!(path = %path.display(), patients = data.patients.len(), "loaded seed file");
        Ok(data)
    }

    /// The embedded data set, or `path` when given.
    pub fn load(path: Option<&Path>) -> CoreResult<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => Self::embedded(),
        }
    }
}
