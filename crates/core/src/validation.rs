//! Form validation.
//!
//! Each form holds raw text exactly as typed into the dashboard. `validate` is a pure function
//! from that text to either a fully typed payload or every field error found, so the view can
//! mark all offending inputs at once. Nothing here touches the store or the network.

use crate::constants::MAX_PATIENT_AGE;
use crate::models::{
    Appointment, AppointmentStatus, AppointmentType, BloodGroup, Gender, LabTest,
    LabTestPriority, LabTestStatus, Money, NewPatient, PatientStatus, TestType,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use hms_ids::{AppointmentId, LabTestId, PatientId, UserId};
use hms_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One rejected form field.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Collects field errors while a form is checked field by field.
#[derive(Default)]
struct Checker {
    errors: Vec<FieldError>,
}

impl Checker {
    fn fail(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn required(&mut self, field: &'static str, raw: &str) -> Option<NonEmptyText> {
        match NonEmptyText::new(raw) {
            Ok(text) => Some(text),
            Err(_) => {
                self.fail(field, format!("{} is required", label(field)));
                None
            }
        }
    }

    fn choice<T: FromStr>(&mut self, field: &'static str, raw: &str) -> Option<T> {
        let raw = raw.trim();
        if raw.is_empty() {
            self.fail(field, format!("{} is required", label(field)));
            return None;
        }
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.fail(field, format!("'{raw}' is not a valid {}", label(field)));
                None
            }
        }
    }

    /// Like `choice`, but a blank input means "not given".
    fn optional_choice<T: FromStr>(&mut self, field: &'static str, raw: &str) -> Option<Option<T>> {
        if raw.trim().is_empty() {
            return Some(None);
        }
        self.choice(field, raw).map(Some)
    }

    fn id<T, E>(&mut self, field: &'static str, raw: &str, parse: impl Fn(&str) -> Result<T, E>) -> Option<T>
    where
        E: std::fmt::Display,
    {
        let raw = raw.trim();
        if raw.is_empty() {
            self.fail(field, format!("{} is required", label(field)));
            return None;
        }
        match parse(raw) {
            Ok(id) => Some(id),
            Err(e) => {
                self.fail(field, e.to_string());
                None
            }
        }
    }

    fn optional_id<T, E>(
        &mut self,
        field: &'static str,
        raw: &str,
        parse: impl Fn(&str) -> Result<T, E>,
    ) -> Option<Option<T>>
    where
        E: std::fmt::Display,
    {
        if raw.trim().is_empty() {
            return Some(None);
        }
        self.id(field, raw, parse).map(Some)
    }

    fn finish<T>(self, value: Option<T>) -> Result<T, Vec<FieldError>> {
        match value {
            Some(value) if self.errors.is_empty() => Ok(value),
            _ => Err(self.errors),
        }
    }
}

fn label(field: &'static str) -> String {
    let mut out = String::with_capacity(field.len());
    for (i, c) in field.chars().enumerate() {
        if c == '_' {
            out.push(' ');
        } else if i == 0 {
            out.push(c.to_ascii_uppercase());
        } else {
            out.push(c);
        }
    }
    out
}

fn optional_text(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

/// Parses a calendar date in `YYYY-MM-DD` form.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Parses an RFC 3339 timestamp or a local `YYYY-MM-DDTHH:MM[:SS]` date-time.
///
/// RFC 3339 inputs are converted to their naive UTC time.
pub fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M"))
        .ok()
}

/// Parses a non-negative decimal amount with at most two fractional digits into cents.
///
/// # Errors
///
/// Returns a message suitable for a [`FieldError`] if the input is negative, malformed or
/// too precise.
pub fn parse_amount(raw: &str) -> Result<Money, String> {
    let raw = raw.trim();
    if raw.starts_with('-') {
        return Err("Amount cannot be negative".into());
    }
    let (whole, frac) = raw.split_once('.').unwrap_or((raw, ""));
    if whole.is_empty() || !whole.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{raw}' is not a valid amount"));
    }
    if frac.len() > 2 || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{raw}' must have at most two decimal places"));
    }
    let whole: u64 = whole
        .parse()
        .map_err(|_| format!("'{raw}' is too large"))?;
    let frac: u64 = match frac.len() {
        0 => 0,
        1 => frac.parse::<u64>().map(|f| f * 10).unwrap_or(0),
        _ => frac.parse().unwrap_or(0),
    };
    whole
        .checked_mul(100)
        .and_then(|cents| cents.checked_add(frac))
        .map(Money::from_cents)
        .ok_or_else(|| format!("'{raw}' is too large"))
}

/// Raw patient admission form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientForm {
    pub name: String,
    pub age: String,
    pub gender: String,
    pub blood_group: String,
    pub contact: String,
    pub email: String,
    pub address: String,
    pub admission_date: String,
    pub status: String,
    pub room_number: String,
    pub assigned_doctor: String,
    pub assigned_nurse: String,
    pub diagnosis: String,
}

impl PatientForm {
    /// Validates the form into a [`NewPatient`].
    ///
    /// Name, gender, admission date and status are required. Age, when given, must be a whole
    /// number no greater than the maximum patient age.
    pub fn validate(&self) -> Result<NewPatient, Vec<FieldError>> {
        let mut check = Checker::default();

        let name = check.required("name", &self.name);
        let gender: Option<Gender> = check.choice("gender", &self.gender);
        let status: Option<PatientStatus> = check.choice("status", &self.status);
        let blood_group: Option<Option<BloodGroup>> =
            check.optional_choice("blood_group", &self.blood_group);

        let age = match self.age.trim() {
            "" => Some(None),
            raw => match raw.parse::<u16>() {
                Ok(age) if age <= u16::from(MAX_PATIENT_AGE) => Some(Some(age as u8)),
                Ok(_) => {
                    check.fail("age", format!("Age must be between 0 and {MAX_PATIENT_AGE}"));
                    None
                }
                Err(_) => {
                    check.fail("age", "Age must be a whole number");
                    None
                }
            },
        };

        let email = match self.email.trim() {
            "" => Some(None),
            raw => match EmailAddress::parse(raw) {
                Ok(email) => Some(Some(email)),
                Err(e) => {
                    check.fail("email", e.to_string());
                    None
                }
            },
        };

        let admission_date = if self.admission_date.trim().is_empty() {
            check.fail("admission_date", "Admission date is required");
            None
        } else {
            let parsed = parse_date(&self.admission_date);
            if parsed.is_none() {
                check.fail("admission_date", "Admission date must be YYYY-MM-DD");
            }
            parsed
        };

        let room_number = NonEmptyText::new(&self.room_number).ok();
        let assigned_doctor = check.optional_id("assigned_doctor", &self.assigned_doctor, UserId::parse);
        let assigned_nurse = check.optional_id("assigned_nurse", &self.assigned_nurse, UserId::parse);

        let payload = (|| {
            Some(NewPatient {
                name: name?,
                age: age?,
                gender: gender?,
                blood_group: blood_group?,
                contact: optional_text(&self.contact),
                email: email?,
                address: optional_text(&self.address),
                admission_date: admission_date?,
                status: status?,
                room_number,
                assigned_doctor: assigned_doctor?,
                assigned_nurse: assigned_nurse?,
                diagnosis: optional_text(&self.diagnosis),
            })
        })();
        check.finish(payload)
    }
}

/// Raw appointment booking form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppointmentForm {
    pub patient_id: String,
    pub doctor_id: String,
    pub date_time: String,
    pub duration: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub department: String,
    pub notes: String,
    pub symptoms: String,
}

impl AppointmentForm {
    /// Validates the form into a scheduled [`Appointment`] with the given id.
    pub fn validate(&self, id: AppointmentId) -> Result<Appointment, Vec<FieldError>> {
        let mut check = Checker::default();

        let patient_id = check.id("patient_id", &self.patient_id, PatientId::parse);
        let doctor_id = check.id("doctor_id", &self.doctor_id, UserId::parse);
        let kind: Option<AppointmentType> = check.choice("type", &self.kind);
        let department = check.required("department", &self.department);

        let date_time = if self.date_time.trim().is_empty() {
            check.fail("date_time", "Date time is required");
            None
        } else {
            let parsed = parse_date_time(&self.date_time);
            if parsed.is_none() {
                check.fail("date_time", "Date time must be RFC 3339 or YYYY-MM-DDTHH:MM:SS");
            }
            parsed
        };

        let duration = match self.duration.trim().parse::<u32>() {
            Ok(0) => {
                check.fail("duration", "Duration must be greater than zero");
                None
            }
            Ok(minutes) => Some(minutes),
            Err(_) => {
                check.fail("duration", "Duration must be a whole number of minutes");
                None
            }
        };

        let payload = (|| {
            Some(Appointment {
                id,
                patient_id: patient_id?,
                doctor_id: doctor_id?,
                date_time: date_time?,
                duration: duration?,
                kind: kind?,
                status: AppointmentStatus::Scheduled,
                department: department?.to_string(),
                notes: optional_text(&self.notes),
                symptoms: optional_text(&self.symptoms),
            })
        })();
        check.finish(payload)
    }
}

/// Raw lab order form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LabOrderForm {
    pub patient_id: String,
    pub test_name: String,
    pub test_type: String,
    pub priority: String,
    pub notes: String,
}

impl LabOrderForm {
    /// Validates the form into a pending [`LabTest`].
    ///
    /// # Arguments
    ///
    /// * `id` - Identifier for the new test.
    /// * `requested_by` - The ordering clinician.
    /// * `requested_at` - Timestamp recorded as the request date.
    pub fn validate(
        &self,
        id: LabTestId,
        requested_by: UserId,
        requested_at: NaiveDateTime,
    ) -> Result<LabTest, Vec<FieldError>> {
        let mut check = Checker::default();

        let patient_id = check.id("patient_id", &self.patient_id, PatientId::parse);
        let test_name = check.required("test_name", &self.test_name);
        let test_type: Option<TestType> = check.choice("test_type", &self.test_type);
        let priority = if self.priority.trim().is_empty() {
            Some(LabTestPriority::Routine)
        } else {
            check.choice("priority", &self.priority)
        };

        let payload = (|| {
            Some(LabTest {
                id,
                patient_id: patient_id?,
                requested_by,
                test_name: test_name?,
                test_type: test_type?,
                priority: priority?,
                status: LabTestStatus::Pending,
                request_date: requested_at,
                completion_date: None,
                results: None,
                attachments: Vec::new(),
                notes: optional_text(&self.notes),
            })
        })();
        check.finish(payload)
    }
}

/// Raw payment entry against a billing record.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaymentForm {
    pub amount: String,
}

impl PaymentForm {
    pub fn validate(&self) -> Result<Money, Vec<FieldError>> {
        let mut check = Checker::default();
        let amount = if self.amount.trim().is_empty() {
            check.fail("amount", "Amount is required");
            None
        } else {
            match parse_amount(&self.amount) {
                Ok(amount) => Some(amount),
                Err(message) => {
                    check.fail("amount", message);
                    None
                }
            }
        };
        check.finish(amount)
    }
}
