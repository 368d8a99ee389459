//! # HMS API Client
//!
//! Async REST client for the hospital backend's patient and room endpoints, plus the sync
//! path that loads fetched patients into a [`hms_core::HospitalStore`].
//!
//! Every call is a plain future. Dropping it abandons the request; there is no retry.

pub mod client;
pub mod config;
pub mod error;
pub mod sync;

pub use client::ApiClient;
pub use config::{base_url_from_env_value, timeout_from_env_value, ApiConfig};
pub use error::{ApiError, ApiResult};
pub use sync::refresh_patients;
