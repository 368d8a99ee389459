//! Session, UI flags and notifications.
//!
//! Pushing a notification goes through the gate like any other record change. Role and user
//! switches, UI toggles, marking a notification read and clearing the tray only change the
//! viewer's own dashboard state and are not gated.

use super::{ensure_absent, position, HospitalStore, MutationOutcome, StoreEvent};
use crate::constants::DEFAULT_SIDEBAR_OPEN;
use crate::models::{Entity, Notification, User};
use crate::permissions::ActionKind;
use crate::roles::Role;
use crate::{CoreError, CoreResult};
use hms_ids::{NotificationId, UserId};
use serde::Serialize;

/// Dashboard chrome state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    pub sidebar_open: bool,
    pub dark_mode: bool,
    pub command_palette_open: bool,
    /// Id of the dropdown currently open, if any. Dropdown contents depend on the role, so
    /// this is cleared whenever the role changes.
    pub open_dropdown: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            sidebar_open: DEFAULT_SIDEBAR_OPEN,
            dark_mode: false,
            command_palette_open: false,
            open_dropdown: None,
        }
    }
}

impl HospitalStore {
    /// Switch the acting role. Role-scoped UI state (open dropdown, command palette) is reset
    /// even when the role does not change.
    ///
    /// The signed-in user always holds the active role. If the current user holds a different
    /// one, the first user with `role` is signed in instead, or nobody if there is none.
    pub fn set_current_role(&mut self, role: Role) -> MutationOutcome {
        let ui_reset = self.reset_role_scoped_ui();
        if role == self.current_role {
            return if ui_reset {
                self.notify(StoreEvent::UiChanged)
            } else {
                MutationOutcome::Unchanged
            };
        }
        tracing::info!(from = %self.current_role, to = %role, "switching role");
        self.current_role = role;

        let holds_role = self.current_user().map(|u| u.role == role);
        if holds_role == Some(false) {
            let replacement = self.users.iter().find(|u| u.role == role).map(|u| u.id.clone());
            tracing::info!(user = ?replacement, "signed-in user does not hold the new role");
            self.current_user = replacement.clone();
            self.notify(StoreEvent::UserChanged(replacement));
        }
        self.notify(StoreEvent::RoleChanged(role))
    }

    fn reset_role_scoped_ui(&mut self) -> bool {
        let changed = self.ui.open_dropdown.is_some() || self.ui.command_palette_open;
        self.ui.open_dropdown = None;
        self.ui.command_palette_open = false;
        changed
    }

    /// Sign in as `user`, adopting that user's role, or sign out with `None`.
    ///
    /// Signing in again as the current user still restores that user's role.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NotFound`] if `user` is not a known user.
    pub fn set_current_user(&mut self, user: Option<UserId>) -> CoreResult<MutationOutcome> {
        let role = match &user {
            Some(id) => Some(
                self.user(id)
                    .map(|u| u.role)
                    .ok_or_else(|| CoreError::not_found(User::KIND, id))?,
            ),
            None => None,
        };
        let mut outcome = MutationOutcome::Unchanged;
        if user != self.current_user {
            self.current_user = user.clone();
            outcome = self.notify(StoreEvent::UserChanged(user));
        }
        if let Some(role) = role.filter(|r| *r != self.current_role) {
            outcome = self.set_current_role(role);
        }
        Ok(outcome)
    }

    pub fn toggle_sidebar(&mut self) -> MutationOutcome {
        self.ui.sidebar_open = !self.ui.sidebar_open;
        self.notify(StoreEvent::UiChanged)
    }

    pub fn toggle_dark_mode(&mut self) -> MutationOutcome {
        self.ui.dark_mode = !self.ui.dark_mode;
        self.notify(StoreEvent::UiChanged)
    }

    pub fn toggle_command_palette(&mut self) -> MutationOutcome {
        self.ui.command_palette_open = !self.ui.command_palette_open;
        self.notify(StoreEvent::UiChanged)
    }

    pub fn set_open_dropdown(&mut self, dropdown: Option<String>) -> MutationOutcome {
        if self.ui.open_dropdown == dropdown {
            return MutationOutcome::Unchanged;
        }
        self.ui.open_dropdown = dropdown;
        self.notify(StoreEvent::UiChanged)
    }

    /// Add a notification to the tray.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Unauthorized`] for the patient role and
    /// [`CoreError::DuplicateIdentity`] for a repeated id.
    pub fn push_notification(&mut self, notification: Notification) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::PushNotification)?;
        ensure_absent(&self.notifications, notification.id())?;
        let id = notification.id.clone();
        self.notifications.push(notification);
        Ok(self.notify(StoreEvent::NotificationPushed(id)))
    }

    /// Mark one notification read. Marking an already-read notification is not an error.
    pub fn mark_notification_read(&mut self, id: &NotificationId) -> CoreResult<MutationOutcome> {
        let idx = position(&self.notifications, id)?;
        if self.notifications[idx].read {
            return Ok(MutationOutcome::Unchanged);
        }
        self.notifications[idx].read = true;
        Ok(self.notify(StoreEvent::NotificationRead(id.clone())))
    }

    /// Remove every notification.
    pub fn clear_all_notifications(&mut self) -> MutationOutcome {
        if self.notifications.is_empty() {
            return MutationOutcome::Unchanged;
        }
        self.notifications.clear();
        self.notify(StoreEvent::NotificationsCleared)
    }

    pub fn unread_notifications(&self) -> usize {
        self.notifications.iter().filter(|n| !n.read).count()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{fixed_now, recorder, seeded};
    use super::*;
    use crate::models::NotificationType;
    use crate::roles::role_config;

    #[test]
    fn switching_role_changes_navigation_and_resets_dropdown() {
        let mut store = seeded(Role::Doctor);
        store.set_open_dropdown(Some("patient-actions".into()));
        store.toggle_command_palette();
        assert_eq!(store.role_config().navigation, role_config(Role::Doctor).navigation);

        let outcome = store.set_current_role(Role::Nurse);
        assert!(outcome.is_applied());
        assert_eq!(store.current_role(), Role::Nurse);
        assert_eq!(store.role_config().navigation, role_config(Role::Nurse).navigation);
        assert_eq!(store.ui().open_dropdown, None);
        assert!(!store.ui().command_palette_open);
    }

    #[test]
    fn reselecting_same_role_still_clears_dropdown() {
        let mut store = seeded(Role::Doctor);
        assert_eq!(store.set_current_role(Role::Doctor), MutationOutcome::Unchanged);

        store.set_open_dropdown(Some("profile".into()));
        assert!(store.set_current_role(Role::Doctor).is_applied());
        assert_eq!(store.ui().open_dropdown, None);
    }

    #[test]
    fn toggles_are_independent() {
        let mut store = seeded(Role::Admin);
        let before = store.ui().clone();
        store.toggle_dark_mode();
        assert!(store.ui().dark_mode);
        assert_eq!(store.ui().sidebar_open, before.sidebar_open);
        assert_eq!(store.ui().command_palette_open, before.command_palette_open);

        store.toggle_sidebar();
        store.toggle_sidebar();
        assert_eq!(store.ui().sidebar_open, before.sidebar_open);
        assert!(store.ui().dark_mode);
    }

    #[test]
    fn signing_in_adopts_the_users_role() {
        let mut store = seeded(Role::Admin);
        let events = recorder(&mut store);

        store.set_current_user(Some(UserId::parse("U003").unwrap())).unwrap();
        assert_eq!(store.current_role(), Role::Nurse);
        assert_eq!(store.current_user().map(|u| u.name.as_str()), Some("Nurse Emma Wilson"));
        assert_eq!(
            events.borrow().as_slice(),
            &[
                StoreEvent::UserChanged(Some(UserId::parse("U003").unwrap())),
                StoreEvent::RoleChanged(Role::Nurse),
            ]
        );

        let err = store
            .set_current_user(Some(UserId::parse("U404").unwrap()))
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { kind: "user", .. }));
        assert_eq!(store.current_role(), Role::Nurse);
    }

    #[test]
    fn signing_in_again_restores_the_users_role() {
        let mut store = seeded(Role::Admin);
        let nurse = UserId::parse("U003").unwrap();
        store.set_current_user(Some(nurse.clone())).unwrap();
        store.set_current_role(Role::Admin);
        assert_eq!(store.current_user().map(|u| u.id.as_str()), Some("U002"));

        store.set_current_user(Some(nurse.clone())).unwrap();
        assert_eq!(store.current_role(), Role::Nurse);
        let events = recorder(&mut store);
        assert_eq!(
            store.set_current_user(Some(nurse)).unwrap(),
            MutationOutcome::Unchanged
        );
        assert!(events.borrow().is_empty());
    }

    #[test]
    fn switching_role_signs_in_a_user_holding_it() {
        let mut store = seeded(Role::Admin);
        store.set_current_user(Some(UserId::parse("U001").unwrap())).unwrap();
        let events = recorder(&mut store);

        store.set_current_role(Role::Nurse);
        let user = store.current_user().expect("a nurse is signed in");
        assert_eq!(user.id.as_str(), "U003");
        assert_eq!(user.role, Role::Nurse);
        assert_eq!(
            events.borrow().as_slice(),
            &[
                StoreEvent::UserChanged(Some(UserId::parse("U003").unwrap())),
                StoreEvent::RoleChanged(Role::Nurse),
            ]
        );
        assert!(!store.view().patients().is_empty());

        store.set_current_user(None).unwrap();
        store.set_current_role(Role::Chemist);
        assert!(store.current_user().is_none());
    }

    #[test]
    fn mark_read_is_idempotent() {
        let mut store = seeded(Role::Patient);
        let events = recorder(&mut store);
        let id = NotificationId::parse("N001").unwrap();

        assert!(store.mark_notification_read(&id).unwrap().is_applied());
        assert!(store.notification(&id).unwrap().read);
        assert_eq!(
            store.mark_notification_read(&id).unwrap(),
            MutationOutcome::Unchanged
        );
        assert!(store.notification(&id).unwrap().read);
        assert_eq!(events.borrow().len(), 1);

        let missing = NotificationId::parse("N999").unwrap();
        assert!(store.mark_notification_read(&missing).is_err());
    }

    #[test]
    fn push_and_clear_notifications() {
        let mut store = seeded(Role::Admin);
        assert_eq!(store.unread_notifications(), 2);

        let note = Notification::new(NotificationType::Info, "Bed freed", "PVT-301 is ready", fixed_now());
        store.push_notification(note.clone()).unwrap();
        assert_eq!(store.unread_notifications(), 3);
        assert!(matches!(
            store.push_notification(note),
            Err(CoreError::DuplicateIdentity { .. })
        ));

        assert!(store.clear_all_notifications().is_applied());
        assert!(store.notifications().is_empty());
        assert_eq!(store.clear_all_notifications(), MutationOutcome::Unchanged);
    }

    #[test]
    fn patients_cannot_push_but_can_manage_their_tray() {
        let mut store = seeded(Role::Patient);
        let note = Notification::new(NotificationType::Warning, "Ward closed", "GEN wing", fixed_now());
        let err = store.push_notification(note.clone()).unwrap_err();
        assert!(err.is_authorization());
        assert!(store.notification(&note.id).is_none());

        store
            .mark_notification_read(&NotificationId::parse("N001").unwrap())
            .unwrap();
        assert!(store.clear_all_notifications().is_applied());
    }
}
