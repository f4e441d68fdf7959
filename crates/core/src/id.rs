//! Strongly-typed identifiers used across the domain.
//!
//! Ids are opaque strings: generated ids are UUIDv7 (time-ordered), while
//! seeded demo records keep short human ids such as `s1` or `p3`.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a catalog service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceId(String);

/// Identifier of a performer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PerformerId(String);

/// Identifier of an assignment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Generate a fresh identifier.
            ///
            /// Uses UUIDv7 (time-ordered). Prefer passing IDs explicitly in tests
            /// for determinism.
            pub fn generate() -> Self {
                Self(Uuid::now_v7().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(DomainError::validation(format!("{} cannot be empty", $name)));
                }
                Ok(Self(trimmed.to_string()))
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }
    };
}

impl_string_newtype!(ServiceId, "ServiceId");
impl_string_newtype!(PerformerId, "PerformerId");
impl_string_newtype!(AssignmentId, "AssignmentId");

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn generated_ids_are_unique() {
        let ids: HashSet<ServiceId> = (0..1000).map(|_| ServiceId::generate()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn parse_trims_and_rejects_blank() {
        let id: PerformerId = "  p1 ".parse().unwrap();
        assert_eq!(id.as_str(), "p1");
        assert!(matches!("   ".parse::<PerformerId>(), Err(DomainError::Validation(_))));
    }
}
