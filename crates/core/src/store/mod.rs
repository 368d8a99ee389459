//! The hospital state store.
//!
//! [`HospitalStore`] is the single owner of every domain collection, the signed-in session and
//! the dashboard's UI flags. Views read through the accessors here and change state only
//! through the store's actions.
//!
//! Every gated action follows the same sequence:
//!
//! 1. [`authorize`] the current role for the action's [`ActionKind`]
//! 2. locate the target and build the next value off to the side
//! 3. validate references and invariants on that value
//! 4. commit it and notify subscribers
//!
//! A failure in steps 1 to 3 returns an error and leaves the store exactly as it was.
//! Subscribers are called synchronously before the action returns, so a read straight after
//! an action always observes its effect.
//!
//! Actions that target an existing record report [`MutationOutcome::Unchanged`] when the
//! request would not change anything; no event is emitted in that case. An unknown id is
//! always [`CoreError::NotFound`]; nothing is ever upserted.

mod billing;
mod clinical;
mod patients;
mod session;

pub use session::UiState;

use crate::config::CoreConfig;
use crate::models::{
    Appointment, BillingRecord, Department, Entity, LabTest, Notification, NurseInstruction,
    Patient, Prescription, Room, User,
};
use crate::permissions::{authorize, ActionKind};
use crate::roles::{role_config, BadgeSource, NavItem, Role, RoleConfig};
use crate::seed::SeedData;
use crate::{CoreError, CoreResult};
use chrono::NaiveDateTime;
use hms_ids::{
    AppointmentId, BillingId, InstructionId, LabTestId, MedicationId, NotificationId, PatientId,
    PrescriptionId, RoomId, UserId,
};
use hms_types::NonEmptyText;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// Handle returned by [`HospitalStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// What a successful action did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// State changed and subscribers were notified.
    Applied,
    /// The request matched current state; nothing changed and nobody was notified.
    Unchanged,
}

impl MutationOutcome {
    pub fn is_applied(self) -> bool {
        self == MutationOutcome::Applied
    }
}

/// Emitted once per state change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    PatientAdded(PatientId),
    PatientUpdated(PatientId),
    PatientsLoaded { count: usize },
    AppointmentAdded(AppointmentId),
    AppointmentUpdated(AppointmentId),
    PrescriptionAdded(PrescriptionId),
    PrescriptionUpdated(PrescriptionId),
    MedicationDispensed {
        prescription: PrescriptionId,
        medication: MedicationId,
    },
    LabTestAdded(LabTestId),
    LabTestUpdated(LabTestId),
    InstructionAdded(InstructionId),
    InstructionUpdated(InstructionId),
    RoomUpdated(RoomId),
    BillingRecordAdded(BillingId),
    PaymentRecorded(BillingId),
    NotificationPushed(NotificationId),
    NotificationRead(NotificationId),
    NotificationsCleared,
    RoleChanged(Role),
    UserChanged(Option<UserId>),
    UiChanged,
}

type Subscriber = Box<dyn FnMut(&StoreEvent)>;

/// A navigation item with its badge resolved against live data.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedNavItem {
    pub id: &'static str,
    pub label: &'static str,
    pub path: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub badge: Option<usize>,
}

fn system_now() -> NaiveDateTime {
    chrono::Utc::now().naive_utc()
}

/// Process-wide hospital state. Construct one at startup and pass it to whatever needs it.
pub struct HospitalStore {
    users: Vec<User>,
    patients: Vec<Patient>,
    appointments: Vec<Appointment>,
    prescriptions: Vec<Prescription>,
    lab_tests: Vec<LabTest>,
    departments: Vec<Department>,
    rooms: Vec<Room>,
    nurse_instructions: Vec<NurseInstruction>,
    billing_records: Vec<BillingRecord>,
    notifications: Vec<Notification>,

    current_role: Role,
    current_user: Option<UserId>,
    ui: UiState,

    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_subscription: u64,
    clock: fn() -> NaiveDateTime,
}

impl fmt::Debug for HospitalStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HospitalStore")
            .field("current_role", &self.current_role)
            .field("current_user", &self.current_user)
            .field("patients", &self.patients.len())
            .field("rooms", &self.rooms.len())
            .field("subscribers", &self.subscribers.len())
            .finish_non_exhaustive()
    }
}

impl HospitalStore {
    /// An empty store acting as `role`.
    pub fn new(role: Role) -> Self {
        Self {
            users: Vec::new(),
            patients: Vec::new(),
            appointments: Vec::new(),
            prescriptions: Vec::new(),
            lab_tests: Vec::new(),
            departments: Vec::new(),
            rooms: Vec::new(),
            nurse_instructions: Vec::new(),
            billing_records: Vec::new(),
            notifications: Vec::new(),
            current_role: role,
            current_user: None,
            ui: UiState::default(),
            subscribers: Vec::new(),
            next_subscription: 0,
            clock: system_now,
        }
    }

    /// A store populated from `seed`.
    ///
    /// Prescription statuses are recomputed from their medications. Everything else must
    /// already be consistent.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DuplicateIdentity`] for a repeated id in any collection,
    /// [`CoreError::InvariantViolation`] for inconsistent rooms or billing records, and the
    /// first reference error found by [`crate::relations::audit_references`].
    pub fn with_seed(mut seed: SeedData, role: Role) -> CoreResult<Self> {
        ensure_unique(&seed.users)?;
        ensure_unique(&seed.patients)?;
        ensure_unique(&seed.appointments)?;
        ensure_unique(&seed.prescriptions)?;
        ensure_unique(&seed.lab_tests)?;
        ensure_unique(&seed.departments)?;
        ensure_unique(&seed.rooms)?;
        ensure_unique(&seed.nurse_instructions)?;
        ensure_unique(&seed.billing_records)?;
        ensure_unique(&seed.notifications)?;

        let mut numbers = HashSet::new();
        for room in &seed.rooms {
            room.check_invariants()?;
            if !numbers.insert(&room.room_number) {
                return Err(CoreError::duplicate("room number", &room.room_number));
            }
        }
        for prescription in &mut seed.prescriptions {
            prescription.normalise()?;
        }
        for record in &seed.billing_records {
            record.check_invariants()?;
        }

        let store = Self::populated(seed, role);
        if let Some(err) = crate::relations::audit_references(&store).into_iter().next() {
            return Err(err);
        }
        tracing::debug!(
            patients = store.patients.len(),
            rooms = store.rooms.len(),
            users = store.users.len(),
            "store seeded"
        );
        Ok(store)
    }

    /// Moves the seed collections into a new store without checking them.
    pub(crate) fn populated(seed: SeedData, role: Role) -> Self {
        let SeedData {
            users,
            patients,
            appointments,
            prescriptions,
            lab_tests,
            departments,
            rooms,
            nurse_instructions,
            billing_records,
            notifications,
        } = seed;
        Self {
            users,
            patients,
            appointments,
            prescriptions,
            lab_tests,
            departments,
            rooms,
            nurse_instructions,
            billing_records,
            notifications,
            ..Self::new(role)
        }
    }

    /// A store built from startup configuration: seed source, role and signed-in user.
    ///
    /// Without a configured user, the first seeded user holding the default role is signed
    /// in, so role-scoped views have someone to scope to.
    pub fn from_config(config: &CoreConfig) -> CoreResult<Self> {
        let seed = SeedData::load(config.seed_file())?;
        let role = config.default_role();
        let mut store = Self::with_seed(seed, role)?;
        let user = match config.current_user() {
            Some(user) => Some(user.clone()),
            None => store
                .users
                .iter()
                .find(|u| u.role == role)
                .map(|u| u.id.clone()),
        };
        if user.is_some() {
            store.set_current_user(user)?;
        }
        Ok(store)
    }

    /// Replace the clock used to stamp completion times.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub(crate) fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }

    // Read accessors. These are plain projections; filtering is the caller's business.

    pub fn users(&self) -> &[User] {
        &self.users
    }

    pub fn patients(&self) -> &[Patient] {
        &self.patients
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn prescriptions(&self) -> &[Prescription] {
        &self.prescriptions
    }

    pub fn lab_tests(&self) -> &[LabTest] {
        &self.lab_tests
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn nurse_instructions(&self) -> &[NurseInstruction] {
        &self.nurse_instructions
    }

    pub fn billing_records(&self) -> &[BillingRecord] {
        &self.billing_records
    }

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    pub fn user(&self, id: &UserId) -> Option<&User> {
        find(&self.users, id)
    }

    pub fn patient(&self, id: &PatientId) -> Option<&Patient> {
        find(&self.patients, id)
    }

    pub fn appointment(&self, id: &AppointmentId) -> Option<&Appointment> {
        find(&self.appointments, id)
    }

    pub fn prescription(&self, id: &PrescriptionId) -> Option<&Prescription> {
        find(&self.prescriptions, id)
    }

    pub fn lab_test(&self, id: &LabTestId) -> Option<&LabTest> {
        find(&self.lab_tests, id)
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        find(&self.rooms, id)
    }

    pub fn room_by_number(&self, number: &NonEmptyText) -> Option<&Room> {
        self.rooms.iter().find(|r| &r.room_number == number)
    }

    pub fn nurse_instruction(&self, id: &InstructionId) -> Option<&NurseInstruction> {
        find(&self.nurse_instructions, id)
    }

    pub fn billing_record(&self, id: &BillingId) -> Option<&BillingRecord> {
        find(&self.billing_records, id)
    }

    pub fn notification(&self, id: &NotificationId) -> Option<&Notification> {
        find(&self.notifications, id)
    }

    pub fn current_role(&self) -> Role {
        self.current_role
    }

    pub fn current_user(&self) -> Option<&User> {
        self.current_user.as_ref().and_then(|id| self.user(id))
    }

    pub fn ui(&self) -> &UiState {
        &self.ui
    }

    /// Theme, navigation and permissions of the current role.
    pub fn role_config(&self) -> RoleConfig {
        role_config(self.current_role)
    }

    /// Live count for a navigation badge.
    pub fn badge_count(&self, source: BadgeSource) -> usize {
        use crate::models::{InstructionStatus, RoomStatus};
        match source {
            BadgeSource::OpenInstructions => self
                .nurse_instructions
                .iter()
                .filter(|n| n.status != InstructionStatus::Completed)
                .count(),
            BadgeSource::PendingPrescriptions => self
                .prescriptions
                .iter()
                .filter(|p| p.status.is_outstanding())
                .count(),
            BadgeSource::PendingLabTests => self
                .lab_tests
                .iter()
                .filter(|t| !t.status.is_finished())
                .count(),
            BadgeSource::MaintenanceRooms => self
                .rooms
                .iter()
                .filter(|r| r.status == RoomStatus::Maintenance)
                .count(),
        }
    }

    /// The current role's navigation with badge counts filled in.
    pub fn navigation(&self) -> Vec<ResolvedNavItem> {
        self.current_role
            .navigation()
            .iter()
            .map(|item: &NavItem| ResolvedNavItem {
                id: item.id,
                label: item.label,
                path: item.path,
                badge: item.badge.map(|source| self.badge_count(source)),
            })
            .collect()
    }

    /// Register `callback` to be called after every state change.
    pub fn subscribe(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    /// Remove a subscriber. Returns false if `id` was not subscribed.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    fn notify(&mut self, event: StoreEvent) -> MutationOutcome {
        tracing::debug!(?event, role = %self.current_role, "store changed");
        for (_, subscriber) in &mut self.subscribers {
            subscriber(&event);
        }
        MutationOutcome::Applied
    }

    fn gate(&self, action: ActionKind) -> CoreResult<()> {
        authorize(self.current_role, action)
    }

    /// Checks that `id` names a user holding `expected`.
    fn require_user_role(&self, id: &UserId, expected: Role) -> CoreResult<()> {
        let user = self
            .user(id)
            .ok_or_else(|| CoreError::not_found(User::KIND, id))?;
        if user.role != expected {
            return Err(CoreError::RoleMismatch {
                user: id.to_string(),
                expected,
                actual: user.role,
            });
        }
        Ok(())
    }

    fn require_patient<E: Entity>(&self, from: &E, patient: &PatientId) -> CoreResult<()> {
        if self.patient(patient).is_none() {
            return Err(dangling(from, Patient::KIND, patient));
        }
        Ok(())
    }
}

pub(crate) fn dangling<E: Entity>(from: &E, to_kind: &'static str, to_id: impl ToString) -> CoreError {
    CoreError::DanglingReference {
        from_kind: E::KIND,
        from_id: from.id().to_string(),
        to_kind,
        to_id: to_id.to_string(),
    }
}

fn find<'a, T: Entity>(items: &'a [T], id: &T::Id) -> Option<&'a T> {
    items.iter().find(|item| item.id() == id)
}

fn position<T: Entity>(items: &[T], id: &T::Id) -> CoreResult<usize> {
    items
        .iter()
        .position(|item| item.id() == id)
        .ok_or_else(|| CoreError::not_found(T::KIND, id))
}

fn ensure_absent<T: Entity>(items: &[T], id: &T::Id) -> CoreResult<()> {
    if find(items, id).is_some() {
        return Err(CoreError::duplicate(T::KIND, id));
    }
    Ok(())
}

fn ensure_unique<T: Entity>(items: &[T]) -> CoreResult<()> {
    for (i, item) in items.iter().enumerate() {
        if items[..i].iter().any(|earlier| earlier.id() == item.id()) {
            return Err(CoreError::duplicate(T::KIND, item.id()));
        }
    }
    Ok(())
}
