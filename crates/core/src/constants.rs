//! Constants used throughout the core crate.

use crate::roles::Role;

/// Role the session starts in when no override is configured.
pub const DEFAULT_ROLE: Role = Role::Doctor;

/// Seed document compiled into the crate, used when no seed file override is configured.
pub const EMBEDDED_SEED_YAML: &str = include_str!("../seed/hospital.yaml");

/// Oldest age accepted for a patient record.
pub const MAX_PATIENT_AGE: u8 = 150;

/// Sidebar starts expanded.
pub const DEFAULT_SIDEBAR_OPEN: bool = true;
