//! Consent status vocabulary and the values produced by the resolver.

use crate::constants::NO_EXPIRY_TIMESTAMP;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Consent state of one domain for one patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum ConsentStatus {
    NotAsked,
    Accepted,
    Declined,
    Expired,
    Withdrawn,
}

impl ConsentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConsentStatus::NotAsked => "not-asked",
            ConsentStatus::Accepted => "accepted",
            ConsentStatus::Declined => "declined",
            ConsentStatus::Expired => "expired",
            ConsentStatus::Withdrawn => "withdrawn",
        }
    }
}

impl std::fmt::Display for ConsentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One provision as echoed back to the caller.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct Policy {
    pub name: String,
    pub permit: bool,
    #[serde(skip)]
    pub code: String,
}

/// Resolved consent status of a domain.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub struct DomainStatus {
    pub domain: String,
    pub description: String,
    pub status: ConsentStatus,
    pub last_updated: Option<DateTime<Utc>>,
    /// Rendered as `null` when the provision never expires.
    #[serde(serialize_with = "serialize_expires")]
    pub expires: Option<DateTime<Utc>>,
    pub ask_consent: bool,
    pub policies: Vec<Policy>,
}

/// The registry's "never expires" date, 3000-01-01T00:00:00Z.
pub fn no_expiry() -> DateTime<Utc> {
    DateTime::from_timestamp(NO_EXPIRY_TIMESTAMP, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// Whether `at` is the registry's "never expires" date.
pub fn is_no_expiry(at: &DateTime<Utc>) -> bool {
    at.timestamp() == NO_EXPIRY_TIMESTAMP
}

/// Whether `at` reads as 3000-01-01T00:00:00 in its own offset.
///
/// The registry writes the sentinel in its local zone, so `+01:00` and `Z` both qualify.
pub fn is_no_expiry_in_offset<Tz: TimeZone>(at: &DateTime<Tz>) -> bool {
    at.naive_local() == no_expiry().naive_utc()
}

fn serialize_expires<S>(expires: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match expires {
        Some(at) if !is_no_expiry(at) => serializer.serialize_some(at),
        _ => serializer.serialize_none(),
    }
}
