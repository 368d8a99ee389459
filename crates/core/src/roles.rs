//! Role configuration.
//!
//! [`role_config`] is a pure, total function from [`Role`] to the theme, label, navigation
//! surface and permission set of that role. Unknown role names are rejected when parsing
//! (`"surgeon".parse::<Role>()` fails), so an out-of-range role can never reach `role_config`.
//!
//! Navigation badges are not numbers here. Each item names a [`BadgeSource`] and the store
//! resolves it against its live collections (see `HospitalStore::navigation`).

use crate::permissions::PermissionSet;
use serde::Serialize;

wire_enum! {
    /// The seven actor kinds of the dashboard.
    Role, "role" {
        Admin => "admin",
        Doctor => "doctor",
        Nurse => "nurse",
        /// Pharmacist.
        Chemist => "chemist",
        /// Lab technician.
        Lab => "lab",
        Attendant => "attendant",
        Patient => "patient",
    }
}

/// Accent colours of a role, as CSS hex strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct ColorTheme {
    pub primary: &'static str,
    pub light: &'static str,
}

/// Live count shown next to a navigation item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BadgeSource {
    /// Nurse instructions that are pending or in progress.
    OpenInstructions,
    /// Prescriptions with at least one medication still to dispense.
    PendingPrescriptions,
    /// Lab tests without a result yet.
    PendingLabTests,
    /// Rooms under maintenance, the attendant's task list.
    MaintenanceRooms,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub id: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<BadgeSource>,
}

const fn nav(id: &'static str, label: &'static str, path: &'static str) -> NavItem {
    NavItem {
        id,
        label,
        path,
        badge: None,
    }
}

const fn nav_badge(
    id: &'static str,
    label: &'static str,
    path: &'static str,
    badge: BadgeSource,
) -> NavItem {
    NavItem {
        id,
        label,
        path,
        badge: Some(badge),
    }
}

const ADMIN_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav("patients", "Patients", "/patients"),
    nav("staff", "Staff Management", "/staff"),
    nav("departments", "Departments", "/departments"),
    nav("rooms", "Room Management", "/rooms"),
    nav("appointments", "Appointments", "/appointments"),
    nav("billing", "Billing", "/billing"),
    nav("analytics", "Analytics", "/analytics"),
    nav("settings", "Settings", "/settings"),
];

const DOCTOR_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav("patients", "My Patients", "/patients"),
    nav("appointments", "Appointments", "/appointments"),
    nav("prescriptions", "Prescriptions", "/prescriptions"),
    nav("lab-requests", "Lab Requests", "/lab-requests"),
    nav("nurse-instructions", "Nurse Instructions", "/instructions"),
    nav("medical-records", "Medical Records", "/records"),
];

const NURSE_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav("patients", "Assigned Patients", "/patients"),
    nav_badge(
        "instructions",
        "Instructions",
        "/instructions",
        BadgeSource::OpenInstructions,
    ),
    nav("vitals", "Vital Signs", "/vitals"),
    nav("medications", "Medication Schedule", "/medications"),
    nav("rounds", "Rounds", "/rounds"),
];

const CHEMIST_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav_badge(
        "prescriptions",
        "Prescriptions",
        "/prescriptions",
        BadgeSource::PendingPrescriptions,
    ),
    nav("inventory", "Inventory", "/inventory"),
    nav("dispensing", "Dispensing Queue", "/dispensing"),
    nav("reports", "Reports", "/reports"),
];

const LAB_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav_badge("tests", "Test Queue", "/tests", BadgeSource::PendingLabTests),
    nav("results", "Results", "/results"),
    nav("equipment", "Equipment", "/equipment"),
    nav("reports", "Reports", "/reports"),
];

const ATTENDANT_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav("patients", "Patient Care", "/patients"),
    nav("rooms", "Room Service", "/rooms"),
    nav_badge("tasks", "Tasks", "/tasks", BadgeSource::MaintenanceRooms),
];

const PATIENT_NAV: &[NavItem] = &[
    nav("dashboard", "Dashboard", "/dashboard"),
    nav("appointments", "My Appointments", "/appointments"),
    nav("medical-records", "Medical Records", "/records"),
    nav("prescriptions", "Prescriptions", "/prescriptions"),
    nav("lab-results", "Lab Results", "/lab-results"),
    nav("billing", "Billing", "/billing"),
];

/// Everything the view layer needs to theme and gate itself for one role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoleConfig {
    pub role: Role,
    pub color: ColorTheme,
    pub label: &'static str,
    pub navigation: &'static [NavItem],
    pub permissions: PermissionSet,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::Admin => "Administrator",
            Role::Doctor => "Doctor",
            Role::Nurse => "Nurse",
            Role::Chemist => "Pharmacist",
            Role::Lab => "Lab Technician",
            Role::Attendant => "Attendant",
            Role::Patient => "Patient",
        }
    }

    pub fn color(self) -> ColorTheme {
        let (primary, light) = match self {
            Role::Admin => ("#8b5cf6", "#a78bfa"),
            Role::Doctor => ("#06b6d4", "#22d3ee"),
            Role::Nurse => ("#ec4899", "#f472b6"),
            Role::Chemist => ("#f59e0b", "#fbbf24"),
            Role::Lab => ("#14b8a6", "#2dd4bf"),
            Role::Attendant => ("#10b981", "#34d399"),
            Role::Patient => ("#6366f1", "#818cf8"),
        };
        ColorTheme { primary, light }
    }

    pub fn navigation(self) -> &'static [NavItem] {
        match self {
            Role::Admin => ADMIN_NAV,
            Role::Doctor => DOCTOR_NAV,
            Role::Nurse => NURSE_NAV,
            Role::Chemist => CHEMIST_NAV,
            Role::Lab => LAB_NAV,
            Role::Attendant => ATTENDANT_NAV,
            Role::Patient => PATIENT_NAV,
        }
    }
}

/// Returns the theme, label, navigation and permissions of `role`.
pub fn role_config(role: Role) -> RoleConfig {
    RoleConfig {
        role,
        color: role.color(),
        label: role.label(),
        navigation: role.navigation(),
        permissions: PermissionSet::for_role(role),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CoreError;
    use std::collections::HashSet;

    #[test]
    fn every_role_has_navigation_and_boolean_permissions() {
        for &role in Role::ALL {
            let cfg = role_config(role);
            assert!(!cfg.navigation.is_empty(), "{role} has no navigation");
            assert_eq!(cfg.navigation[0].id, "dashboard");

            let flags = cfg.permissions.flags();
            assert!(flags.values().any(|granted| *granted), "{role} has no grants");

            let json = serde_json::to_value(&cfg).expect("role config should serialise");
            let perms = json["permissions"].as_object().expect("permission map");
            assert!(perms.values().all(|v| v.is_boolean()));
        }
    }

    #[test]
    fn navigation_ids_are_unique_per_role() {
        for &role in Role::ALL {
            let ids: HashSet<_> = role.navigation().iter().map(|n| n.id).collect();
            assert_eq!(ids.len(), role.navigation().len(), "duplicate nav id for {role}");
        }
    }

    #[test]
    fn unknown_role_names_are_rejected() {
        let err = "surgeon".parse::<Role>().expect_err("surgeon is not a role");
        assert!(matches!(
            err,
            CoreError::UnknownVariant { kind: "role", ref value } if value == "surgeon"
        ));
        assert!("Doctor".parse::<Role>().is_err(), "role names are case sensitive");
        assert_eq!("chemist".parse::<Role>().unwrap(), Role::Chemist);
    }

    #[test]
    fn doctor_and_nurse_navigation_differ() {
        let doctor = role_config(Role::Doctor);
        let nurse = role_config(Role::Nurse);
        assert_ne!(doctor.navigation, nurse.navigation);
        assert_eq!(nurse.navigation[1].label, "Assigned Patients");
        assert_eq!(doctor.label, "Doctor");
        assert_eq!(role_config(Role::Chemist).label, "Pharmacist");
    }

    #[test]
    fn only_queue_roles_carry_badges() {
        let with_badges: Vec<Role> = Role::ALL
            .iter()
            .copied()
            .filter(|r| r.navigation().iter().any(|n| n.badge.is_some()))
            .collect();
        assert_eq!(
            with_badges,
            vec![Role::Nurse, Role::Chemist, Role::Lab, Role::Attendant]
        );
    }
}
