//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and passed into the store. Library code
//! never reads environment variables; binaries read them and hand the raw values to the
//! `*_from_env_value` helpers below.

use crate::constants::DEFAULT_ROLE;
use crate::roles::Role;
use crate::{CoreError, CoreResult};
use hms_ids::UserId;
use std::path::{Path, PathBuf};

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    default_role: Role,
    seed_file: Option<PathBuf>,
    current_user: Option<UserId>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            default_role: DEFAULT_ROLE,
            seed_file: None,
            current_user: None,
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Arguments
    ///
    /// * `default_role` - Role the dashboard starts in.
    /// * `seed_file` - YAML seed document to load instead of the embedded one.
    /// * `current_user` - User to sign in as at startup, if any.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] if `seed_file` is given but is not a file.
    pub fn new(
        default_role: Role,
        seed_file: Option<PathBuf>,
        current_user: Option<UserId>,
    ) -> CoreResult<Self> {
        if let Some(path) = &seed_file {
            if !path.is_file() {
                return Err(CoreError::InvalidInput(format!(
                    "seed file {} does not exist or is not a file",
                    path.display()
                )));
            }
        }
        Ok(Self {
            default_role,
            seed_file,
            current_user,
        })
    }

    pub fn default_role(&self) -> Role {
        self.default_role
    }

    pub fn seed_file(&self) -> Option<&Path> {
        self.seed_file.as_deref()
    }

    pub fn current_user(&self) -> Option<&UserId> {
        self.current_user.as_ref()
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the startup role from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_ROLE`].
pub fn role_from_env_value(value: Option<String>) -> CoreResult<Role> {
    let parsed = non_blank(value).map(|v| v.parse::<Role>()).transpose()?;
    Ok(parsed.unwrap_or(DEFAULT_ROLE))
}

/// Parse the seed file override from an optional string value.
///
/// Blank values mean "use the embedded seed".
pub fn seed_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    non_blank(value).map(PathBuf::from)
}

/// Parse the startup user from an optional string value.
pub fn current_user_from_env_value(value: Option<String>) -> CoreResult<Option<UserId>> {
    Ok(non_blank(value).map(|v| UserId::parse(&v)).transpose()?)
}
