//! # HMS Core
//!
//! Core state and rules for the hospital dashboard.
//!
//! This crate holds everything the dashboard needs that does not involve a network or a
//! screen:
//! - The domain model (patients, appointments, prescriptions, lab tests, rooms, billing)
//! - Role configuration and the single authorization gate
//! - The [`HospitalStore`] that owns all state and applies every change
//! - Role-scoped views, relationship resolution and derived dashboard stats
//! - Form validation and seed data loading
//!
//! **No transport concerns**: the REST client lives in `hms-api-client`, and process setup
//! (environment, logging) belongs in the binaries.

#[macro_use]
mod macros;

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod permissions;
pub mod relations;
pub mod roles;
pub mod seed;
pub mod stats;
pub mod store;
pub mod validation;
pub mod views;

pub use config::CoreConfig;
pub use error::{CoreError, CoreResult};
pub use permissions::{authorize, ActionKind, Permission, PermissionSet};
pub use roles::{role_config, Role, RoleConfig};
pub use seed::SeedData;
pub use stats::DashboardStats;
pub use store::{HospitalStore, MutationOutcome, StoreEvent, SubscriptionId};
pub use views::RoleView;
