//! Role-scoped read views.
//!
//! Dashboards never filter raw collections themselves. They ask the store for a [`RoleView`],
//! which already narrows every collection to what the signed-in user's role may see:
//!
//! - doctors see their assigned patients and the records they authored
//! - nurses see their assigned patients and the instructions for them
//! - a patient sees only records about their own linked patient
//! - every other role sees everything
//!
//! Doctor, nurse and patient views with no signed-in user see nothing.

use crate::models::{
    Appointment, BillingRecord, LabTest, NurseInstruction, Patient, PatientFilters, Prescription,
};
use crate::roles::Role;
use crate::store::HospitalStore;
use hms_ids::{PatientId, UserId};

/// Whose records a view is narrowed to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scope {
    All,
    Doctor(UserId),
    Nurse(UserId),
    Patient(PatientId),
    Nothing,
}

#[derive(Debug)]
pub struct RoleView<'a> {
    store: &'a HospitalStore,
    scope: Scope,
}

impl HospitalStore {
    /// A view of the collections scoped to the current role and user.
    pub fn view(&self) -> RoleView<'_> {
        let user = self.current_user();
        let scope = match (self.current_role(), user) {
            (Role::Doctor, Some(u)) => Scope::Doctor(u.id.clone()),
            (Role::Nurse, Some(u)) => Scope::Nurse(u.id.clone()),
            (Role::Patient, Some(u)) => match &u.patient_id {
                Some(p) => Scope::Patient(p.clone()),
                None => Scope::Nothing,
            },
            (Role::Doctor | Role::Nurse | Role::Patient, None) => Scope::Nothing,
            _ => Scope::All,
        };
        RoleView { store: self, scope }
    }
}

impl<'a> RoleView<'a> {
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    fn sees_patient(&self, patient: &Patient) -> bool {
        match &self.scope {
            Scope::All => true,
            Scope::Doctor(me) => patient.assigned_doctor.as_ref() == Some(me),
            Scope::Nurse(me) => patient.assigned_nurse.as_ref() == Some(me),
            Scope::Patient(mine) => &patient.id == mine,
            Scope::Nothing => false,
        }
    }

    fn sees_patient_id(&self, id: &PatientId) -> bool {
        self.store
            .patient(id)
            .map(|p| self.sees_patient(p))
            .unwrap_or(false)
    }

    pub fn patients(&self) -> Vec<&'a Patient> {
        self.store
            .patients()
            .iter()
            .filter(|p| self.sees_patient(p))
            .collect()
    }

    /// Visible patients narrowed by `filters`, the local counterpart of `GET /patients`.
    /// `search` matches the name, id or diagnosis case-insensitively.
    pub fn filter_patients(&self, filters: &PatientFilters) -> Vec<&'a Patient> {
        let room = filters
            .room_id
            .as_ref()
            .map(|id| self.store.room(id).map(|r| &r.room_number));
        let needle = filters.search.as_deref().map(str::trim).filter(|s| !s.is_empty());
        self.patients()
            .into_iter()
            .filter(|p| filters.status.map_or(true, |s| p.status == s))
            .filter(|p| {
                filters
                    .doctor_id
                    .as_ref()
                    .map_or(true, |d| p.assigned_doctor.as_ref() == Some(d))
            })
            .filter(|p| match room {
                Some(number) => number.is_some() && p.room_number.as_ref() == number,
                None => true,
            })
            .filter(|p| {
                needle.map_or(true, |n| {
                    p.name.contains_ignore_case(n)
                        || p.id.as_str().eq_ignore_ascii_case(n)
                        || p.diagnosis
                            .as_deref()
                            .is_some_and(|d| d.to_lowercase().contains(&n.to_lowercase()))
                })
            })
            .collect()
    }

    pub fn appointments(&self) -> Vec<&'a Appointment> {
        self.store
            .appointments()
            .iter()
            .filter(|a| match &self.scope {
                Scope::Doctor(me) => &a.doctor_id == me,
                _ => self.sees_patient_id(&a.patient_id),
            })
            .collect()
    }

    pub fn prescriptions(&self) -> Vec<&'a Prescription> {
        self.store
            .prescriptions()
            .iter()
            .filter(|rx| match &self.scope {
                Scope::Doctor(me) => &rx.doctor_id == me,
                _ => self.sees_patient_id(&rx.patient_id),
            })
            .collect()
    }

    pub fn lab_tests(&self) -> Vec<&'a LabTest> {
        self.store
            .lab_tests()
            .iter()
            .filter(|t| match &self.scope {
                Scope::Doctor(me) => &t.requested_by == me,
                _ => self.sees_patient_id(&t.patient_id),
            })
            .collect()
    }

    pub fn nurse_instructions(&self) -> Vec<&'a NurseInstruction> {
        self.store
            .nurse_instructions()
            .iter()
            .filter(|n| match &self.scope {
                Scope::Doctor(me) => &n.doctor_id == me,
                Scope::Nurse(me) => {
                    n.nurse_id.as_ref() == Some(me) || self.sees_patient_id(&n.patient_id)
                }
                _ => self.sees_patient_id(&n.patient_id),
            })
            .collect()
    }

    pub fn billing_records(&self) -> Vec<&'a BillingRecord> {
        self.store
            .billing_records()
            .iter()
            .filter(|b| self.sees_patient_id(&b.patient_id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::tests::seeded;

    fn ids<T>(items: &[&T], id: impl Fn(&T) -> String) -> Vec<String> {
        items.iter().map(|item| id(item)).collect()
    }

    fn sign_in(store: &mut HospitalStore, user: &str) {
        store
            .set_current_user(Some(UserId::parse(user).unwrap()))
            .unwrap();
    }

    #[test]
    fn doctor_sees_assigned_patients_only() {
        let mut store = seeded(Role::Admin);
        sign_in(&mut store, "U001");
        let view = store.view();
        assert_eq!(ids(&view.patients(), |p| p.id.to_string()), vec!["P001", "P003"]);
        assert_eq!(view.appointments().len(), 3);
        assert_eq!(view.lab_tests().len(), 3);

        sign_in(&mut store, "U004");
        let view = store.view();
        assert_eq!(ids(&view.patients(), |p| p.id.to_string()), vec!["P002"]);
        assert!(view.appointments().is_empty());
    }

    #[test]
    fn nurse_sees_assigned_patients_and_own_instructions() {
        let mut store = seeded(Role::Admin);
        sign_in(&mut store, "U003");
        let view = store.view();
        assert_eq!(ids(&view.patients(), |p| p.id.to_string()), vec!["P001"]);
        assert_eq!(
            ids(&view.nurse_instructions(), |n| n.id.to_string()),
            vec!["NI001", "NI003"]
        );
    }

    #[test]
    fn patient_sees_only_own_records() {
        let mut store = seeded(Role::Admin);
        sign_in(&mut store, "U008");
        let view = store.view();
        assert_eq!(*view.scope(), Scope::Patient(PatientId::parse("P001").unwrap()));
        assert_eq!(ids(&view.patients(), |p| p.id.to_string()), vec!["P001"]);
        assert!(view.appointments().iter().all(|a| a.patient_id.as_str() == "P001"));
        assert_eq!(view.prescriptions().len(), 1);
        assert_eq!(view.lab_tests().len(), 2);
        assert_eq!(view.billing_records().len(), 1);
    }

    #[test]
    fn filters_narrow_the_visible_patients() {
        let store = seeded(Role::Admin);
        let view = store.view();
        let by = |filters: PatientFilters| {
            view.filter_patients(&filters)
                .iter()
                .map(|p| p.id.to_string())
                .collect::<Vec<_>>()
        };

        assert_eq!(
            by(PatientFilters {
                search: Some("  DOE ".into()),
                ..PatientFilters::default()
            }),
            vec!["P001"]
        );
        assert_eq!(
            by(PatientFilters {
                search: Some("pneumonia".into()),
                ..PatientFilters::default()
            }),
            vec!["P002"]
        );
        assert_eq!(
            by(PatientFilters {
                status: Some(crate::models::PatientStatus::Critical),
                doctor_id: Some(UserId::parse("U001").unwrap()),
                ..PatientFilters::default()
            }),
            vec!["P003"]
        );
        assert_eq!(
            by(PatientFilters {
                room_id: Some(hms_ids::RoomId::parse("R003").unwrap()),
                ..PatientFilters::default()
            }),
            vec!["P002"]
        );
        assert!(by(PatientFilters {
            room_id: Some(hms_ids::RoomId::parse("R999").unwrap()),
            ..PatientFilters::default()
        })
        .is_empty());
    }

    #[test]
    fn other_roles_see_everything_and_anonymous_clinicians_nothing() {
        let store = seeded(Role::Chemist);
        assert_eq!(store.view().patients().len(), 4);
        assert_eq!(store.view().prescriptions().len(), 2);

        let store = seeded(Role::Doctor);
        assert_eq!(*store.view().scope(), Scope::Nothing);
        assert!(store.view().patients().is_empty());
    }
}
