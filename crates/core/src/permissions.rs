//! Permission flags and the authorization gate.
//!
//! Every mutating store action is described by an [`ActionKind`]. [`authorize`] checks the
//! acting role's [`PermissionSet`] against the action's accepted permissions before the store
//! touches any collection.

use crate::error::{CoreError, CoreResult};
use crate::roles::Role;
use serde::ser::SerializeMap;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

wire_enum! {
    /// A single capability grant.
    Permission, "permission" {
        ViewAllPatients => "canViewAllPatients",
        ManagePatients => "canManagePatients",
        ManageStaff => "canManageStaff",
        ManageDepartments => "canManageDepartments",
        ManageRooms => "canManageRooms",
        ViewBilling => "canViewBilling",
        ManageBilling => "canManageBilling",
        ViewAnalytics => "canViewAnalytics",
        ManageSettings => "canManageSettings",
        ScheduleAppointments => "canScheduleAppointments",
        ViewPatients => "canViewPatients",
        AddPatients => "canAddPatients",
        Prescribe => "canPrescribe",
        OrderLabTests => "canOrderLabTests",
        CreateInstructions => "canCreateInstructions",
        ViewMedicalRecords => "canViewMedicalRecords",
        UpdateMedicalRecords => "canUpdateMedicalRecords",
        UpdateVitals => "canUpdateVitals",
        ViewInstructions => "canViewInstructions",
        CompleteInstructions => "canCompleteInstructions",
        AdministerMedications => "canAdministerMedications",
        ViewPrescriptions => "canViewPrescriptions",
        DispenseMedications => "canDispenseMedications",
        ManageInventory => "canManageInventory",
        ViewReports => "canViewReports",
        ViewLabTests => "canViewLabTests",
        UpdateLabTests => "canUpdateLabTests",
        UploadResults => "canUploadResults",
        ManageEquipment => "canManageEquipment",
        UpdateRoomStatus => "canUpdateRoomStatus",
        ViewTasks => "canViewTasks",
        CompleteTasks => "canCompleteTasks",
        ViewOwnRecords => "canViewOwnRecords",
        ViewOwnAppointments => "canViewOwnAppointments",
        ViewOwnPrescriptions => "canViewOwnPrescriptions",
        ViewOwnLabResults => "canViewOwnLabResults",
        ViewOwnBilling => "canViewOwnBilling",
    }
}

wire_enum! {
    /// Every mutating store action that passes through the gate.
    ActionKind, "action" {
        AddPatient => "add-patient",
        UpdatePatient => "update-patient",
        AddAppointment => "add-appointment",
        UpdateAppointment => "update-appointment",
        AddPrescription => "add-prescription",
        UpdatePrescription => "update-prescription",
        DispenseMedication => "dispense-medication",
        AddLabTest => "add-lab-test",
        UpdateLabTest => "update-lab-test",
        AddNurseInstruction => "add-nurse-instruction",
        UpdateNurseInstruction => "update-nurse-instruction",
        UpdateRoom => "update-room",
        AddBillingRecord => "add-billing-record",
        RecordPayment => "record-payment",
        PushNotification => "push-notification",
    }
}

impl ActionKind {
    /// Permissions that allow this action; holding any one of them is enough.
    pub fn accepted_permissions(self) -> &'static [Permission] {
        use Permission::*;
        match self {
            ActionKind::AddPatient => &[AddPatients, ManagePatients],
            ActionKind::UpdatePatient => &[UpdateMedicalRecords, ManagePatients],
            ActionKind::AddAppointment | ActionKind::UpdateAppointment => {
                &[ScheduleAppointments]
            }
            ActionKind::AddPrescription | ActionKind::UpdatePrescription => &[Prescribe],
            ActionKind::DispenseMedication => &[DispenseMedications],
            ActionKind::AddLabTest => &[OrderLabTests],
            ActionKind::UpdateLabTest => &[UpdateLabTests, UploadResults],
            ActionKind::AddNurseInstruction => &[CreateInstructions],
            ActionKind::UpdateNurseInstruction => &[CreateInstructions, CompleteInstructions],
            ActionKind::UpdateRoom => &[ManageRooms, UpdateRoomStatus],
            ActionKind::AddBillingRecord | ActionKind::RecordPayment => &[ManageBilling],
            // Any staff role that edits hospital records can raise an alert.
            ActionKind::PushNotification => &[
                ManageSettings,
                UpdateMedicalRecords,
                CompleteInstructions,
                DispenseMedications,
                UploadResults,
                UpdateRoomStatus,
            ],
        }
    }
}

/// The capability grants of one role.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PermissionSet {
    granted: BTreeSet<Permission>,
}

impl PermissionSet {
    pub fn for_role(role: Role) -> Self {
        use Permission::*;
        let granted: &[Permission] = match role {
            Role::Admin => &[
                ViewAllPatients,
                ManagePatients,
                ManageStaff,
                ManageDepartments,
                ManageRooms,
                ViewBilling,
                ManageBilling,
                ViewAnalytics,
                ManageSettings,
                ScheduleAppointments,
            ],
            Role::Doctor => &[
                ViewPatients,
                AddPatients,
                Prescribe,
                OrderLabTests,
                CreateInstructions,
                ViewMedicalRecords,
                UpdateMedicalRecords,
                ScheduleAppointments,
            ],
            Role::Nurse => &[
                ViewPatients,
                UpdateVitals,
                ViewInstructions,
                CompleteInstructions,
                AdministerMedications,
                ViewPrescriptions,
            ],
            Role::Chemist => &[
                ViewPrescriptions,
                DispenseMedications,
                ManageInventory,
                ViewReports,
            ],
            Role::Lab => &[ViewLabTests, UpdateLabTests, UploadResults, ManageEquipment],
            Role::Attendant => &[ViewPatients, UpdateRoomStatus, ViewTasks, CompleteTasks],
            Role::Patient => &[
                ViewOwnRecords,
                ViewOwnAppointments,
                ViewOwnPrescriptions,
                ViewOwnLabResults,
                ViewOwnBilling,
            ],
        };
        Self {
            granted: granted.iter().copied().collect(),
        }
    }

    pub fn allows(&self, permission: Permission) -> bool {
        self.granted.contains(&permission)
    }

    pub fn permits(&self, action: ActionKind) -> bool {
        action
            .accepted_permissions()
            .iter()
            .any(|p| self.allows(*p))
    }

    /// One boolean per known permission.
    pub fn flags(&self) -> BTreeMap<Permission, bool> {
        Permission::ALL
            .iter()
            .map(|p| (*p, self.allows(*p)))
            .collect()
    }
}

impl Serialize for PermissionSet {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let flags = self.flags();
        let mut map = serializer.serialize_map(Some(flags.len()))?;
        for (permission, granted) in flags {
            map.serialize_entry(permission.as_str(), &granted)?;
        }
        map.end()
    }
}

/// The single authorization gate for mutating actions.
///
/// # Errors
///
/// Returns [`CoreError::Unauthorized`] when `role` holds none of the action's accepted
/// permissions.
pub fn authorize(role: Role, action: ActionKind) -> CoreResult<()> {
    if PermissionSet::for_role(role).permits(action) {
        return Ok(());
    }
    tracing::warn!(%role, %action, "rejected unauthorized action");
    Err(CoreError::Unauthorized { role, action })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_action_is_permitted_to_some_role() {
        for &action in ActionKind::ALL {
            assert!(
                Role::ALL.iter().any(|r| authorize(*r, action).is_ok()),
                "{action} is unreachable"
            );
        }
    }

    #[test]
    fn patient_role_cannot_mutate_anything() {
        for &action in ActionKind::ALL {
            let err = authorize(Role::Patient, action).expect_err("patients are read-only");
            assert!(err.is_authorization());
        }
    }

    #[test]
    fn gate_follows_role_grants() {
        assert!(authorize(Role::Doctor, ActionKind::AddPrescription).is_ok());
        assert!(authorize(Role::Nurse, ActionKind::AddPrescription).is_err());
        assert!(authorize(Role::Chemist, ActionKind::DispenseMedication).is_ok());
        assert!(authorize(Role::Doctor, ActionKind::DispenseMedication).is_err());
        assert!(authorize(Role::Nurse, ActionKind::UpdateNurseInstruction).is_ok());
        assert!(authorize(Role::Nurse, ActionKind::AddNurseInstruction).is_err());
        assert!(authorize(Role::Attendant, ActionKind::UpdateRoom).is_ok());
        assert!(authorize(Role::Lab, ActionKind::UpdateLabTest).is_ok());
        assert!(authorize(Role::Lab, ActionKind::AddLabTest).is_err());
        assert!(authorize(Role::Admin, ActionKind::AddPatient).is_ok());
        assert!(authorize(Role::Admin, ActionKind::AddPrescription).is_err());
        for role in Role::ALL.iter().filter(|r| **r != Role::Patient) {
            assert!(authorize(*role, ActionKind::PushNotification).is_ok(), "{role}");
        }
    }

    #[test]
    fn unauthorized_error_names_role_and_action() {
        let err = authorize(Role::Attendant, ActionKind::RecordPayment).unwrap_err();
        assert_eq!(
            err.to_string(),
            "role 'attendant' is not permitted to record-payment"
        );
    }

    #[test]
    fn flags_cover_every_permission() {
        let flags = PermissionSet::for_role(Role::Lab).flags();
        assert_eq!(flags.len(), Permission::ALL.len());
        assert_eq!(flags[&Permission::UploadResults], true);
        assert_eq!(flags[&Permission::Prescribe], false);
    }
}
