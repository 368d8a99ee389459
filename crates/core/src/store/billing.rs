//! Billing actions.

use super::{ensure_absent, position, HospitalStore, MutationOutcome, StoreEvent};
use crate::models::{BillingRecord, Entity, Money};
use crate::permissions::ActionKind;
use crate::CoreResult;
use hms_ids::BillingId;

impl HospitalStore {
    /// Add a billing record. Its totals must already be consistent; build it with
    /// [`BillingRecord::new`] to have them computed.
    pub fn add_billing_record(&mut self, record: BillingRecord) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::AddBillingRecord)?;
        ensure_absent(&self.billing_records, record.id())?;
        self.require_patient(&record, &record.patient_id)?;
        record.check_invariants()?;

        let id = record.id.clone();
        self.billing_records.push(record);
        Ok(self.notify(StoreEvent::BillingRecordAdded(id)))
    }

    /// Take a payment against a record's pending balance.
    pub fn record_payment(&mut self, id: &BillingId, amount: Money) -> CoreResult<MutationOutcome> {
        self.gate(ActionKind::RecordPayment)?;
        let idx = position(&self.billing_records, id)?;
        let mut next = self.billing_records[idx].clone();
        next.record_payment(amount)?;

        tracing::info!(billing = %id, %amount, status = %next.status, "payment recorded");
        self.billing_records[idx] = next;
        Ok(self.notify(StoreEvent::PaymentRecorded(id.clone())))
    }

    /// Sum of pending balances across all records.
    pub fn outstanding_balance(&self) -> Money {
        self.billing_records.iter().map(|r| r.pending_amount).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::seeded;
    use super::*;
    use crate::models::{BillingCategory, BillingItem, BillingStatus};
    use crate::roles::Role;
    use crate::CoreError;
    use chrono::NaiveDate;
    use hms_ids::{BillingItemId, PatientId};

    #[test]
    fn seeded_billing_is_internally_consistent() {
        let store = seeded(Role::Admin);
        for record in store.billing_records() {
            assert_eq!(
                record.paid_amount + record.pending_amount,
                record.total_amount
            );
            let items: Money = record.items.iter().map(|i| i.total_price).sum();
            assert_eq!(items, record.total_amount);
        }
        assert_eq!(store.outstanding_balance(), Money::from_cents(1_075_000));
    }

    #[test]
    fn payments_settle_the_balance() {
        let mut store = seeded(Role::Admin);
        let id = BillingId::parse("B001").unwrap();

        let err = store
            .record_payment(&id, Money::from_cents(2_000_000))
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(store.billing_record(&id).unwrap().paid_amount, Money::from_cents(500_000));

        store.record_payment(&id, Money::from_cents(1_075_000)).unwrap();
        let bill = store.billing_record(&id).unwrap();
        assert_eq!(bill.status, BillingStatus::Paid);
        assert_eq!(store.outstanding_balance(), Money::ZERO);
    }

    #[test]
    fn inconsistent_records_are_refused() {
        let mut store = seeded(Role::Admin);
        let day = NaiveDate::from_ymd_opt(2025, 1, 21).unwrap();
        let item = BillingItem::priced(
            BillingItemId::parse("BI100").unwrap(),
            "Consultation",
            BillingCategory::Consultation,
            1,
            Money::from_cents(15_000),
        )
        .unwrap();
        let mut record = BillingRecord::new(
            BillingId::parse("B100").unwrap(),
            PatientId::parse("P004").unwrap(),
            vec![item],
            Money::ZERO,
            day,
            day,
        )
        .unwrap();
        record.pending_amount = Money::from_cents(1);

        assert!(matches!(
            store.add_billing_record(record.clone()),
            Err(CoreError::InvariantViolation(_))
        ));
        record.pending_amount = record.total_amount;
        assert!(store.add_billing_record(record).unwrap().is_applied());
    }

    #[test]
    fn only_billing_staff_take_payments() {
        let mut store = seeded(Role::Nurse);
        let err = store
            .record_payment(&BillingId::parse("B001").unwrap(), Money::from_cents(100))
            .unwrap_err();
        assert!(err.is_authorization());
    }
}
