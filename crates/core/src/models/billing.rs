//! Billing records.
//!
//! All amounts are whole cents. A record is only ever built through [`BillingRecord::new`] or
//! checked with [`BillingRecord::check_invariants`], so the following always hold:
//!
//! - every item's `total_price == unit_price * quantity`
//! - the item totals sum to `total_amount`
//! - `paid_amount + pending_amount == total_amount`
//! - `status` agrees with the paid amount

use super::Entity;
use crate::error::{CoreError, CoreResult};
use chrono::NaiveDate;
use hms_ids::{BillingId, BillingItemId, PatientId};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign};

/// An amount of money in cents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: u64) -> Self {
        Money(cents)
    }

    pub const fn cents(self) -> u64 {
        self.0
    }

    pub fn checked_mul(self, quantity: u32) -> Option<Money> {
        self.0.checked_mul(u64::from(quantity)).map(Money)
    }

    pub fn checked_sub(self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0 + rhs.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, rhs: Money) {
        self.0 += rhs.0;
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

wire_enum! {
    BillingCategory, "billing category" {
        Consultation => "consultation",
        Medication => "medication",
        LabTest => "lab-test",
        Procedure => "procedure",
        Room => "room",
        Other => "other",
    }
}

wire_enum! {
    BillingStatus, "billing status" {
        Unpaid => "unpaid",
        PartiallyPaid => "partially-paid",
        Paid => "paid",
    }
}

impl BillingStatus {
    pub fn derive(total: Money, paid: Money) -> Self {
        if paid == Money::ZERO && total > Money::ZERO {
            BillingStatus::Unpaid
        } else if paid >= total {
            BillingStatus::Paid
        } else {
            BillingStatus::PartiallyPaid
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingItem {
    pub id: BillingItemId,
    pub description: String,
    pub category: BillingCategory,
    pub quantity: u32,
    pub unit_price: Money,
    pub total_price: Money,
}

impl BillingItem {
    /// Builds an item with `total_price` computed from the unit price.
    pub fn priced(
        id: BillingItemId,
        description: impl Into<String>,
        category: BillingCategory,
        quantity: u32,
        unit_price: Money,
    ) -> CoreResult<Self> {
        let total_price = unit_price.checked_mul(quantity).ok_or_else(|| {
            CoreError::InvariantViolation(format!("billing item '{id}' total overflows"))
        })?;
        Ok(Self {
            id,
            description: description.into(),
            category,
            quantity,
            unit_price,
            total_price,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillingRecord {
    pub id: BillingId,
    pub patient_id: PatientId,
    pub total_amount: Money,
    pub paid_amount: Money,
    pub pending_amount: Money,
    pub status: BillingStatus,
    pub items: Vec<BillingItem>,
    pub created_at: NaiveDate,
    pub due_date: NaiveDate,
}

impl Entity for BillingRecord {
    type Id = BillingId;
    const KIND: &'static str = "billing record";

    fn id(&self) -> &BillingId {
        &self.id
    }
}

impl BillingRecord {
    /// Builds a record whose totals and status are computed from `items` and `paid`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvariantViolation`] if an item's total disagrees with its unit
    /// price, or if `paid` exceeds the total.
    pub fn new(
        id: BillingId,
        patient_id: PatientId,
        items: Vec<BillingItem>,
        paid: Money,
        created_at: NaiveDate,
        due_date: NaiveDate,
    ) -> CoreResult<Self> {
        check_items(&id, &items)?;
        let total: Money = items.iter().map(|item| item.total_price).sum();
        let pending = total.checked_sub(paid).ok_or_else(|| {
            CoreError::InvariantViolation(format!(
                "billing record '{id}' paid {paid} exceeds total {total}"
            ))
        })?;
        Ok(Self {
            id,
            patient_id,
            total_amount: total,
            paid_amount: paid,
            pending_amount: pending,
            status: BillingStatus::derive(total, paid),
            items,
            created_at,
            due_date,
        })
    }

    /// Verifies a record built elsewhere (seed file, backend) without changing it.
    pub fn check_invariants(&self) -> CoreResult<()> {
        check_items(&self.id, &self.items)?;
        let item_total: Money = self.items.iter().map(|item| item.total_price).sum();
        if item_total != self.total_amount {
            return Err(CoreError::InvariantViolation(format!(
                "billing record '{}' items sum to {} but total is {}",
                self.id, item_total, self.total_amount
            )));
        }
        if self.paid_amount + self.pending_amount != self.total_amount {
            return Err(CoreError::InvariantViolation(format!(
                "billing record '{}' paid {} + pending {} != total {}",
                self.id, self.paid_amount, self.pending_amount, self.total_amount
            )));
        }
        let expected = BillingStatus::derive(self.total_amount, self.paid_amount);
        if self.status != expected {
            return Err(CoreError::InvariantViolation(format!(
                "billing record '{}' is marked {} but should be {}",
                self.id, self.status, expected
            )));
        }
        Ok(())
    }

    /// Applies a payment against the pending balance.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidInput`] for a zero payment or one larger than the pending
    /// amount. The record is unchanged on error.
    pub fn record_payment(&mut self, amount: Money) -> CoreResult<()> {
        if amount == Money::ZERO {
            return Err(CoreError::InvalidInput("payment must be positive".into()));
        }
        let pending = self.pending_amount.checked_sub(amount).ok_or_else(|| {
            CoreError::InvalidInput(format!(
                "payment {amount} exceeds pending balance {} on '{}'",
                self.pending_amount, self.id
            ))
        })?;
        self.paid_amount += amount;
        self.pending_amount = pending;
        self.status = BillingStatus::derive(self.total_amount, self.paid_amount);
        Ok(())
    }
}

fn check_items(id: &BillingId, items: &[BillingItem]) -> CoreResult<()> {
    for item in items {
        if item.unit_price.checked_mul(item.quantity) != Some(item.total_price) {
            return Err(CoreError::InvariantViolation(format!(
                "billing record '{id}' item '{}' totals {} but {} x {} was expected",
                item.id, item.total_price, item.quantity, item.unit_price
            )));
        }
    }
    Ok(())
}
