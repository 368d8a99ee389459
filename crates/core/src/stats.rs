//! Dashboard headline numbers, derived from the store's collections.

use crate::models::{Money, PatientStatus, RoomStatus};
use crate::store::HospitalStore;
use chrono::{Datelike, NaiveDate};
use serde::Serialize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_patients: usize,
    /// Patients currently on a ward (admitted, stable or critical).
    pub active_patients: usize,
    pub today_appointments: usize,
    /// Lab tests not yet completed.
    pub pending_tests: usize,
    /// Prescriptions with at least one medication still to dispense.
    pub pending_prescriptions: usize,
    pub critical_patients: usize,
    pub available_beds: u32,
    /// Occupied share of in-service beds, as a whole percentage.
    pub occupancy_rate: u8,
    /// Payments on bills raised `today`.
    pub revenue_today: Money,
    /// Payments on bills raised in the calendar month of `today`.
    pub revenue_month: Money,
}

impl DashboardStats {
    /// Computes the stats as of `today`. Rooms under maintenance are out of service and count
    /// toward neither available beds nor occupancy.
    pub fn compute(store: &HospitalStore, today: NaiveDate) -> Self {
        let patients = store.patients();

        let (occupied, capacity) = store
            .rooms()
            .iter()
            .filter(|r| r.status != RoomStatus::Maintenance)
            .fold((0u64, 0u64), |(occ, cap), r| {
                (occ + u64::from(r.occupied), cap + u64::from(r.capacity))
            });
        let occupancy_rate = if capacity == 0 {
            0
        } else {
            u8::try_from((occupied * 100 + capacity / 2) / capacity).unwrap_or(100)
        };

        let same_month = |d: NaiveDate| d.year() == today.year() && d.month() == today.month();

        Self {
            total_patients: patients.len(),
            active_patients: patients.iter().filter(|p| p.status.is_inpatient()).count(),
            today_appointments: store
                .appointments()
                .iter()
                .filter(|a| a.date_time.date() == today)
                .count(),
            pending_tests: store
                .lab_tests()
                .iter()
                .filter(|t| !t.status.is_finished())
                .count(),
            pending_prescriptions: store
                .prescriptions()
                .iter()
                .filter(|rx| rx.status.is_outstanding())
                .count(),
            critical_patients: patients
                .iter()
                .filter(|p| p.status == PatientStatus::Critical)
                .count(),
            available_beds: store
                .rooms()
                .iter()
                .filter(|r| r.status != RoomStatus::Maintenance)
                .map(|r| r.free_beds())
                .sum(),
            occupancy_rate,
            revenue_today: store
                .billing_records()
                .iter()
                .filter(|b| b.created_at == today)
                .map(|b| b.paid_amount)
                .sum(),
            revenue_month: store
                .billing_records()
                .iter()
                .filter(|b| same_month(b.created_at))
                .map(|b| b.paid_amount)
                .sum(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RoomPatch;
    use crate::roles::Role;
    use crate::store::tests::seeded;
    use hms_ids::RoomId;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, day).unwrap()
    }

    #[test]
    fn seeded_stats_as_of_rounds_day() {
        let store = seeded(Role::Admin);
        let stats = DashboardStats::compute(&store, jan(20));
        assert_eq!(
            stats,
            DashboardStats {
                total_patients: 4,
                active_patients: 3,
                today_appointments: 3,
                pending_tests: 2,
                pending_prescriptions: 1,
                critical_patients: 1,
                available_beds: 8,
                occupancy_rate: 27,
                revenue_today: Money::ZERO,
                revenue_month: Money::from_cents(500_000),
            }
        );
    }

    #[test]
    fn maintenance_rooms_leave_service() {
        let mut store = seeded(Role::Attendant);
        let patch = RoomPatch {
            status: Some(RoomStatus::Maintenance),
            ..RoomPatch::default()
        };
        store
            .update_room(&RoomId::parse("R005").unwrap(), &patch)
            .unwrap();

        let stats = DashboardStats::compute(&store, jan(20));
        assert_eq!(stats.available_beds, 4);
        assert_eq!(stats.occupancy_rate, 43);
    }

    #[test]
    fn revenue_follows_the_calendar() {
        let store = seeded(Role::Admin);
        let stats = DashboardStats::compute(&store, jan(10));
        assert_eq!(stats.revenue_today, Money::from_cents(500_000));
        assert_eq!(stats.today_appointments, 0);

        let february = DashboardStats::compute(&store, NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        assert_eq!(february.revenue_month, Money::ZERO);
    }

    #[test]
    fn empty_store_has_zero_occupancy() {
        let store = HospitalStore::new(Role::Admin);
        assert_eq!(DashboardStats::compute(&store, jan(1)), DashboardStats::default());
    }
}
