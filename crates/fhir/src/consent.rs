//! FHIR `Consent` wire model.
//!
//! gICS returns one `Consent` per policy state. The policy itself sits either on the
//! top-level provision or on its first nested provision, depending on the registry version.

use crate::{CodeableConcept, Coding, Meta, Period, Reference, Resource};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Consent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_reference: Option<Reference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provision: Option<ConsentProvision>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsentProvision {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<ProvisionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<Period>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub code: Vec<CodeableConcept>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provision: Vec<ConsentProvision>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionType {
    Deny,
    Permit,
}

impl ConsentProvision {
    /// First coding of the first code, if present.
    pub fn first_coding(&self) -> Option<&Coding> {
        self.code.first().and_then(|c| c.coding.first())
    }

    pub fn is_permit(&self) -> bool {
        self.kind == Some(ProvisionType::Permit)
    }
}

impl Consent {
    /// The provision describing the policy: the first nested provision when present,
    /// otherwise the top-level provision.
    pub fn policy_provision(&self) -> Option<&ConsentProvision> {
        let top = self.provision.as_ref()?;
        Some(top.provision.first().unwrap_or(top))
    }

    pub fn source_reference(&self) -> Option<&str> {
        self.source_reference
            .as_ref()
            .and_then(|r| r.reference.as_deref())
    }
}

impl Resource for Consent {
    const RESOURCE_TYPE: &'static str = "Consent";

    fn declared_type(&self) -> Option<&str> {
        self.resource_type.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;

    #[test]
    fn nested_provision_takes_precedence() {
        let input = br#"{
  "resourceType": "Consent",
  "meta": {"lastUpdated": "2024-01-01T00:00:00Z"},
  "sourceReference": {"reference": "QuestionnaireResponse/42"},
  "provision": {
    "type": "deny",
    "provision": [{
      "type": "permit",
      "period": {"start": "2024-01-01", "end": "3000-01-01"},
      "code": [{"coding": [{"system": "https://ths-greifswald.de/fhir/CodeSystem/gics/Policy", "code": "MDAT_erheben", "display": "Erheben"}]}]
    }]
  }
}"#;

        let consent = parse::<Consent>(input).expect("parse consent");
        let provision = consent.policy_provision().expect("provision");
        assert!(provision.is_permit());
        assert_eq!(
            provision.first_coding().and_then(|c| c.code.as_deref()),
            Some("MDAT_erheben")
        );
        assert_eq!(consent.source_reference(), Some("QuestionnaireResponse/42"));
    }

    #[test]
    fn flat_provision_is_used_when_not_nested() {
        let input = br#"{"provision": {"type": "deny", "code": [{"coding": [{"code": "IDAT"}]}]}}"#;
        let consent = parse::<Consent>(input).expect("parse consent");
        let provision = consent.policy_provision().expect("provision");
        assert!(!provision.is_permit());
        assert_eq!(
            provision.first_coding().and_then(|c| c.code.as_deref()),
            Some("IDAT")
        );
    }

    #[test]
    fn missing_provision_yields_none() {
        let consent = parse::<Consent>(br#"{"resourceType":"Consent"}"#).expect("parse");
        assert!(consent.policy_provision().is_none());
    }
}
