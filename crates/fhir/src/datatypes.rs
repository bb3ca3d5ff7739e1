//! FHIR general-purpose data types shared by the resource models.

use crate::{FhirError, FhirResult};
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// An identifier intended for computation, e.g. a domain name or a patient id.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// A reference to a code defined by a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    /// Whether this coding carries exactly `system|code`.
    pub fn is(&self, system: &str, code: &str) -> bool {
        self.system.as_deref() == Some(system) && self.code.as_deref() == Some(code)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,
}

/// A time range. Both bounds are kept as wire strings; see [`parse_date_time`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reference {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
}

/// A FHIR extension. gICS nests key/value pairs one level deep.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Extension {
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub extension: Vec<Extension>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_uri: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value_string: Option<String>,
}

impl Extension {
    /// Construct a nested extension container.
    pub fn with_children(url: impl Into<String>, children: Vec<Extension>) -> Self {
        Self {
            url: url.into(),
            extension: children,
            ..Self::default()
        }
    }

    /// Construct a leaf extension carrying a `valueString`.
    pub fn string(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value_string: Some(value.into()),
            ..Self::default()
        }
    }

    /// Construct a leaf extension carrying a `valueUri`.
    pub fn uri(url: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            value_uri: Some(value.into()),
            ..Self::default()
        }
    }

    /// First nested extension with the given `url`.
    pub fn child(&self, url: &str) -> Option<&Extension> {
        self.extension.iter().find(|e| e.url == url)
    }
}

/// Parse a FHIR `date` or `dateTime` value into a UTC timestamp.
///
/// Accepts full RFC 3339 date-times and bare `YYYY-MM-DD` dates (read as midnight UTC).
/// Sub-second precision is truncated so that comparisons happen at second granularity.
///
/// # Errors
///
/// Returns [`FhirError::InvalidDateTime`] for any other shape. Callers must not substitute a
/// default timestamp for an unparseable value.
pub fn parse_date_time(value: &str) -> FhirResult<DateTime<Utc>> {
    parse_date_time_in_offset(value).map(|dt| dt.with_timezone(&Utc))
}

/// Like [`parse_date_time`], but keeps the offset the value was written in.
///
/// Bare dates carry a zero offset.
pub fn parse_date_time_in_offset(value: &str) -> FhirResult<DateTime<FixedOffset>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        let utc = DateTime::from_timestamp(dt.timestamp(), 0)
            .ok_or_else(|| FhirError::InvalidDateTime(value.to_owned()))?;
        return Ok(utc.with_timezone(dt.offset()));
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc().fixed_offset())
        .ok_or_else(|| FhirError::InvalidDateTime(value.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn parses_rfc3339_with_offset() {
        let parsed = parse_date_time("2024-05-01T12:30:00+02:00").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 10, 30, 0).unwrap());
    }

    #[test]
    fn truncates_fractional_seconds() {
        let parsed = parse_date_time("2024-05-01T12:30:00.987Z").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn parses_bare_date_as_midnight() {
        let parsed = parse_date_time("3000-01-01").expect("parse");
        assert_eq!(parsed, Utc.with_ymd_and_hms(3000, 1, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn keeps_the_written_offset() {
        let parsed = parse_date_time_in_offset("3000-01-01T00:00:00.5+01:00").expect("parse");
        assert_eq!(parsed.offset().local_minus_utc(), 3600);
        assert_eq!(parsed.to_rfc3339(), "3000-01-01T00:00:00+01:00");
        assert_eq!(
            parse_date_time("3000-01-01T00:00:00+01:00").expect("parse"),
            Utc.with_ymd_and_hms(2999, 12, 31, 23, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage_instead_of_defaulting() {
        let err = parse_date_time("yesterday").expect_err("should not parse");
        assert!(matches!(err, FhirError::InvalidDateTime(v) if v == "yesterday"));
    }

    #[test]
    fn finds_nested_extension_by_url() {
        let ext = Extension::with_children(
            "outer",
            vec![Extension::string("key", "checkPolicy"), Extension::uri("system", "urn:x")],
        );
        assert_eq!(
            ext.child("system").and_then(|e| e.value_uri.as_deref()),
            Some("urn:x")
        );
        assert!(ext.child("missing").is_none());
    }
}
