use crate::permissions::ActionKind;
use crate::roles::Role;
use crate::validation::FieldError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant { kind: &'static str, value: String },
    #[error(transparent)]
    Id(#[from] hms_ids::IdError),
    #[error(transparent)]
    Text(#[from] hms_types::TextError),

    #[error("role '{role}' is not permitted to {action}")]
    Unauthorized { role: Role, action: ActionKind },

    #[error("{kind} '{id}' already exists")]
    DuplicateIdentity { kind: &'static str, id: String },
    #[error("{kind} '{id}' not found")]
    NotFound { kind: &'static str, id: String },
    #[error("{from_kind} '{from_id}' references missing {to_kind} '{to_id}'")]
    DanglingReference {
        from_kind: &'static str,
        from_id: String,
        to_kind: &'static str,
        to_id: String,
    },
    #[error("user '{user}' cannot be assigned as {expected}: role is {actual}")]
    RoleMismatch {
        user: String,
        expected: Role,
        actual: Role,
    },
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    #[error("{kind} cannot move from {from} to {to}")]
    InvalidTransition {
        kind: &'static str,
        from: &'static str,
        to: &'static str,
    },
    #[error("room '{room}' is not available: {reason}")]
    RoomUnavailable { room: String, reason: String },

    #[error("validation failed: {}", join_field_errors(.0))]
    Validation(Vec<FieldError>),

    #[error("failed to read seed file: {0}")]
    SeedRead(std::io::Error),
    #[error("seed data schema mismatch at {path}: {message}")]
    SeedSchema { path: String, message: String },
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl CoreError {
    pub(crate) fn not_found(kind: &'static str, id: impl ToString) -> Self {
        CoreError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn duplicate(kind: &'static str, id: impl ToString) -> Self {
        CoreError::DuplicateIdentity {
            kind,
            id: id.to_string(),
        }
    }

    /// True for failures caused by the caller's role rather than the data.
    pub fn is_authorization(&self) -> bool {
        matches!(self, CoreError::Unauthorized { .. })
    }
}

pub type CoreResult<T> = std::result::Result<T, CoreError>;
