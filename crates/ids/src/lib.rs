//! Typed entity identifiers.
//!
//! Every domain entity (patient, user, room, ...) is keyed by its own identifier type so that a
//! `PatientId` can never be passed where a `UserId` is expected. All identifier types share one
//! textual format:
//!
//! - Length: 1 to 64 bytes
//! - Characters: ASCII letters, digits, `-` and `_`
//! - Case is preserved (`P001` and `p001` are different identifiers)
//!
//! Identifiers coming from seed data or the REST backend are validated with `parse`. New
//! identifiers are allocated with `generate`, which produces `<PREFIX>-<32 hex>` from a v4 UUID,
//! for example `P-550e8400e29b41d4a716446655440000`.

mod entity;

pub use entity::{
    AppointmentId, BillingId, BillingItemId, DepartmentId, InstructionId, LabTestId,
    MedicationId, NotificationId, PatientId, PrescriptionId, RoomId, UserId,
};

/// Maximum identifier length in bytes.
pub const MAX_ID_LEN: usize = 64;

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum IdError {
    /// Invalid input provided
    #[error("Invalid {kind} identifier: {reason}")]
    InvalidInput { kind: &'static str, reason: String },
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;

/// Returns true if `input` is a well-formed identifier.
///
/// This is a purely syntactic check and can be used before calling `parse`.
pub fn is_valid_id(input: &str) -> bool {
    !input.is_empty()
        && input.len() <= MAX_ID_LEN
        && input
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_'))
}
