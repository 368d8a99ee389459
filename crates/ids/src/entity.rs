//! Identifier newtypes, one per entity kind.

use crate::{is_valid_id, IdError, IdResult, MAX_ID_LEN};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $kind:literal, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(String);

        impl $name {
            /// Prefix used by [`Self::generate`].
            pub const PREFIX: &'static str = $prefix;

            /// Validates an externally supplied identifier.
            ///
            /// # Errors
            ///
            /// Returns [`IdError::InvalidInput`] if `input` is empty, longer than
            /// [`MAX_ID_LEN`] or contains characters outside `[A-Za-z0-9_-]`.
            pub fn parse(input: &str) -> IdResult<Self> {
                if is_valid_id(input) {
                    return Ok(Self(input.to_owned()));
                }
                let reason = if input.is_empty() {
                    "identifier cannot be empty".to_owned()
                } else if input.len() > MAX_ID_LEN {
                    format!("identifier exceeds {MAX_ID_LEN} bytes")
                } else {
                    format!("'{input}' contains characters outside [A-Za-z0-9_-]")
                };
                Err(IdError::InvalidInput { kind: $kind, reason })
            }

            /// Allocates a fresh identifier of the form `<PREFIX>-<32 hex>`.
            pub fn generate() -> Self {
                Self(format!("{}-{}", $prefix, uuid::Uuid::new_v4().simple()))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        #[cfg(feature = "serde")]
        impl serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::parse(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

entity_id!(
    /// Identifier of a patient record.
    PatientId, "patient", "P"
);
entity_id!(
    /// Identifier of a staff or patient user account.
    UserId, "user", "U"
);
entity_id!(AppointmentId, "appointment", "A");
entity_id!(PrescriptionId, "prescription", "RX");
entity_id!(
    /// Identifier of a single medication line within a prescription.
    MedicationId, "medication", "M"
);
entity_id!(LabTestId, "lab test", "LT");
entity_id!(RoomId, "room", "R");
entity_id!(DepartmentId, "department", "D");
entity_id!(
    /// Identifier of a doctor-to-nurse instruction.
    InstructionId, "nurse instruction", "NI"
);
entity_id!(BillingId, "billing record", "B");
entity_id!(BillingItemId, "billing item", "BI");
entity_id!(NotificationId, "notification", "N");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_seed_style_ids() {
        let id = PatientId::parse("P001").expect("P001 should be valid");
        assert_eq!(id.as_str(), "P001");
        assert_eq!(id.to_string(), "P001");
        assert!(RoomId::parse("R_ICU-101").is_ok());
    }

    #[test]
    fn parse_rejects_empty_and_illegal_characters() {
        let err = PatientId::parse("").expect_err("empty id should fail");
        assert_eq!(
            err,
            IdError::InvalidInput {
                kind: "patient",
                reason: "identifier cannot be empty".into()
            }
        );

        assert!(UserId::parse("U 001").is_err());
        assert!(UserId::parse("U/001").is_err());
        assert!(UserId::parse(&"x".repeat(MAX_ID_LEN + 1)).is_err());
        assert!(UserId::parse(&"x".repeat(MAX_ID_LEN)).is_ok());
    }

    #[test]
    fn generate_uses_prefix_and_is_unique() {
        let a = PrescriptionId::generate();
        let b = PrescriptionId::generate();
        assert!(a.as_str().starts_with("RX-"));
        assert_eq!(a.as_str().len(), "RX-".len() + 32);
        assert_ne!(a, b);
        assert!(PrescriptionId::parse(a.as_str()).is_ok());
    }

    #[test]
    fn serde_round_trip_validates() {
        let id: LabTestId = serde_json::from_str("\"LT001\"").expect("should deserialise");
        assert_eq!(id.as_str(), "LT001");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"LT001\"");

        let err = serde_json::from_str::<LabTestId>("\"LT 001\"").expect_err("should reject");
        assert!(err.to_string().contains("lab test"));
    }
}
