//! FHIR wire/boundary support for the consent registry.
//!
//! This crate provides **wire models** for the subset of FHIR R4 JSON exchanged with the
//! gICS consent registry:
//! - `ResearchStudy` resources describing consent domains
//! - `Consent` resources carrying per-patient policy provisions
//! - `Questionnaire` / `QuestionnaireResponse` resources identifying consent templates
//! - `Parameters` resources used as operation request bodies
//!
//! This crate focuses on:
//! - serialisation/deserialisation with field paths in error messages
//! - `resourceType` validation
//! - FHIR date/dateTime parsing
//!
//! Registry models are deliberately lenient about unknown keys: the registry returns full
//! FHIR resources and only the fields modelled here are read.

pub mod bundle;
pub mod consent;
pub mod datatypes;
pub mod parameters;
pub mod questionnaire;
pub mod research_study;

pub use bundle::{Bundle, BundleEntry};
pub use consent::{Consent, ConsentProvision, ProvisionType};
pub use datatypes::{
    parse_date_time, parse_date_time_in_offset, CodeableConcept, Coding, Extension, Identifier, Meta, Period, Reference,
};
pub use parameters::{Parameters, ParametersParameter};
pub use questionnaire::{Questionnaire, QuestionnaireResponse};
pub use research_study::{ResearchStudy, ResearchStudyStatus};

use serde::de::DeserializeOwned;
use serde::Serialize;

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("translation error: {0}")]
    Translation(String),

    #[error("invalid date/time: {0}")]
    InvalidDateTime(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;

/// A top-level FHIR resource with a fixed `resourceType`.
pub trait Resource: Serialize + DeserializeOwned {
    /// The `resourceType` value this model represents.
    const RESOURCE_TYPE: &'static str;

    /// The `resourceType` carried by this instance, if any.
    fn declared_type(&self) -> Option<&str>;
}

/// Parse a FHIR resource from JSON bytes.
///
/// This uses `serde_path_to_error` to surface a best-effort "path" (e.g. `entry[0].resource.status`)
/// to the failing field when the JSON does not match the wire schema.
///
/// # Errors
///
/// Returns [`FhirError`] if:
/// - the JSON does not match the wire model,
/// - the document declares a `resourceType` other than `R::RESOURCE_TYPE`.
pub fn parse<R: Resource>(json: &[u8]) -> FhirResult<R> {
    let mut deserializer = serde_json::Deserializer::from_slice(json);

    let resource = match serde_path_to_error::deserialize::<_, R>(&mut deserializer) {
        Ok(parsed) => parsed,
        Err(err) => {
            let path = err.path().to_string();
            let source = err.into_inner();
            let path = if path.is_empty() || path == "." {
                "<root>"
            } else {
                path.as_str()
            };
            return Err(FhirError::Translation(format!(
                "{} schema mismatch at {path}: {source}",
                R::RESOURCE_TYPE
            )));
        }
    };

    match resource.declared_type() {
        Some(declared) if declared != R::RESOURCE_TYPE => Err(FhirError::InvalidInput(format!(
            "Expected resourceType '{}', got '{declared}'",
            R::RESOURCE_TYPE
        ))),
        _ => Ok(resource),
    }
}

/// Render a FHIR resource as JSON bytes.
///
/// # Errors
///
/// Returns [`FhirError`] if serialization fails.
pub fn render<R: Resource>(resource: &R) -> FhirResult<Vec<u8>> {
    serde_json::to_vec(resource).map_err(|e| {
        FhirError::Translation(format!("Failed to serialize {}: {e}", R::RESOURCE_TYPE))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rejects_mismatched_resource_type() {
        let err = parse::<ResearchStudy>(br#"{"resourceType":"Patient"}"#)
            .expect_err("should reject Patient");
        match err {
            FhirError::InvalidInput(msg) => assert!(msg.contains("Patient")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn parse_reports_path_of_failing_field() {
        let err = parse::<Bundle<ResearchStudy>>(
            br#"{"resourceType":"Bundle","entry":[{"resource":{"description":42}}]}"#,
        )
        .expect_err("should reject numeric description");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("entry[0].resource.description")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_non_json() {
        let err = parse::<Bundle<Questionnaire>>(b"<invalid-fhir>").expect_err("not json");
        assert!(matches!(err, FhirError::Translation(_)));
    }

    #[test]
    fn parse_accepts_missing_resource_type() {
        let study = parse::<ResearchStudy>(br#"{"status":"active"}"#).expect("parse");
        assert_eq!(study.status, Some(ResearchStudyStatus::Active));
    }
}
