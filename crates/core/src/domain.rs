//! Consent domains and their extraction from registry records.
//!
//! A domain is published by the registry as a `ResearchStudy`. Only active records with a
//! person identifier system and a check policy are usable; everything else is skipped
//! without failing the batch, since a registry may hold domains meant for other consumers.

use crate::constants::{
    CHECK_POLICY_PROPERTY, CONTEXT_IDENTIFIER_EXTENSION_URL, CONTEXT_IDENTIFIER_SYSTEM_KEY,
    DEPARTMENTS_PROPERTY, EXTERNAL_PROPERTY_EXTENSION_URL, EXTERNAL_PROPERTY_KEY,
    EXTERNAL_PROPERTY_VALUE,
};
use crate::DirectoryRecordError;
use fhir::ResearchStudy;
use std::collections::HashMap;

/// Normalized directory entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Domain {
    /// Unique key within the directory.
    pub name: String,
    pub description: String,
    /// Provision code deciding the domain's consent status.
    pub check_policy_code: String,
    /// Identifier namespace used when querying provisions for a patient.
    pub person_id_system: String,
    /// Department tags; empty means unrestricted.
    pub departments: Vec<String>,
    /// Withdrawal template identifier; `None` disables withdrawal detection.
    pub withdrawal_template_ref: Option<String>,
}

impl std::fmt::Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

impl Domain {
    /// Normalize a registry record.
    ///
    /// The withdrawal template is never set here; it is resolved separately by the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`DirectoryRecordError`] naming the first rule the record fails.
    pub fn from_research_study(study: &ResearchStudy) -> Result<Self, DirectoryRecordError> {
        if !study.is_active() {
            return Err(DirectoryRecordError::Inactive);
        }

        let name = study
            .primary_identifier()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or(DirectoryRecordError::MissingName)?
            .to_owned();

        let description = study
            .description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map_or_else(|| name.clone(), str::to_owned);

        let person_id_system =
            person_id_system(study).ok_or(DirectoryRecordError::MissingPersonIdSystem)?;

        let properties = external_properties(study);

        let check_policy_code = properties
            .get(CHECK_POLICY_PROPERTY)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .ok_or(DirectoryRecordError::MissingCheckPolicy)?
            .to_owned();

        let departments = properties
            .get(DEPARTMENTS_PROPERTY)
            .map(|v| split_departments(v))
            .unwrap_or_default();

        Ok(Self {
            name,
            description,
            check_policy_code,
            person_id_system,
            departments,
            withdrawal_template_ref: None,
        })
    }

    /// Whether a caller from `departments` may see this domain.
    pub fn is_visible_to(&self, departments: &[String]) -> bool {
        self.departments.is_empty() || self.departments.iter().any(|d| departments.contains(d))
    }
}

/// Domains visible to a caller from `departments`, in snapshot order.
pub fn filter_domains(domains: &[Domain], departments: &[String]) -> Vec<Domain> {
    domains
        .iter()
        .filter(|d| d.is_visible_to(departments))
        .cloned()
        .collect()
}

fn person_id_system(study: &ResearchStudy) -> Option<String> {
    study
        .extensions(CONTEXT_IDENTIFIER_EXTENSION_URL)
        .filter_map(|e| e.child(CONTEXT_IDENTIFIER_SYSTEM_KEY))
        .filter_map(|e| e.value_uri.as_deref())
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Key/value pairs from the gICS property extensions. Later duplicates win.
fn external_properties(study: &ResearchStudy) -> HashMap<&str, &str> {
    study
        .extensions(EXTERNAL_PROPERTY_EXTENSION_URL)
        .filter_map(|e| {
            let key = e.child(EXTERNAL_PROPERTY_KEY)?.value_string.as_deref()?;
            let value = e.child(EXTERNAL_PROPERTY_VALUE)?.value_string.as_deref()?;
            Some((key, value))
        })
        .collect()
}

fn split_departments(value: &str) -> Vec<String> {
    let mut departments: Vec<String> = Vec::new();
    for tag in value.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        if !departments.iter().any(|d| d == tag) {
            departments.push(tag.to_owned());
        }
    }
    departments
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{domain, domain_study};
    use fhir::{Extension, ResearchStudyStatus};

    const PID_SYSTEM: &str = "https://ths-greifswald.de/fhir/gics/identifiers/Patienten-ID";

    #[test]
    fn extracts_domain_from_active_study() {
        let study = domain_study("Bar", "MDAT_erheben", &["bar-dep"]);

        let domain = Domain::from_research_study(&study).expect("usable record");
        assert_eq!(
            domain,
            Domain {
                name: "Bar".into(),
                description: "Bar Domain".into(),
                check_policy_code: "MDAT_erheben".into(),
                person_id_system: PID_SYSTEM.into(),
                departments: vec!["bar-dep".into()],
                withdrawal_template_ref: None,
            }
        );
    }

    #[test]
    fn skips_inactive_study() {
        let mut study = domain_study("Foo", "MDAT_erheben", &[]);
        study.status = Some(ResearchStudyStatus::Completed);
        assert_eq!(
            Domain::from_research_study(&study),
            Err(DirectoryRecordError::Inactive)
        );

        study.status = None;
        assert_eq!(
            Domain::from_research_study(&study),
            Err(DirectoryRecordError::Inactive)
        );
    }

    #[test]
    fn skips_study_without_person_id_system() {
        let mut study = domain_study("Foo", "MDAT_erheben", &[]);
        study
            .extension
            .retain(|e| e.url != CONTEXT_IDENTIFIER_EXTENSION_URL);
        assert_eq!(
            Domain::from_research_study(&study),
            Err(DirectoryRecordError::MissingPersonIdSystem)
        );
    }

    #[test]
    fn skips_study_without_check_policy() {
        let mut study = domain_study("Foo", "MDAT_erheben", &["dep"]);
        study.extension.retain(|e| {
            e.child(EXTERNAL_PROPERTY_KEY)
                .and_then(|k| k.value_string.as_deref())
                != Some(CHECK_POLICY_PROPERTY)
        });
        assert_eq!(
            Domain::from_research_study(&study),
            Err(DirectoryRecordError::MissingCheckPolicy)
        );
    }

    #[test]
    fn blank_check_policy_counts_as_missing() {
        let study = domain_study("Foo", "   ", &[]);
        assert_eq!(
            Domain::from_research_study(&study),
            Err(DirectoryRecordError::MissingCheckPolicy)
        );
    }

    #[test]
    fn description_falls_back_to_name() {
        let mut study = domain_study("Foo", "MDAT_erheben", &[]);
        study.description = None;
        let domain = Domain::from_research_study(&study).expect("usable record");
        assert_eq!(domain.description, "Foo");
    }

    #[test]
    fn ignores_property_extensions_without_value() {
        let mut study = domain_study("Foo", "MDAT_erheben", &[]);
        study.extension.push(Extension::with_children(
            EXTERNAL_PROPERTY_EXTENSION_URL,
            vec![Extension::string(EXTERNAL_PROPERTY_KEY, DEPARTMENTS_PROPERTY)],
        ));
        let domain = Domain::from_research_study(&study).expect("usable record");
        assert!(domain.departments.is_empty());
    }

    #[test]
    fn splits_and_trims_departments() {
        assert_eq!(
            split_departments(" cardio, onco,,cardio "),
            vec!["cardio".to_string(), "onco".to_string()]
        );
        assert!(split_departments(" , ").is_empty());
    }

    #[test]
    fn filters_by_department() {
        let open = domain("Test", "IDAT_Test");
        let mut restricted = domain("Dep", "IDAT_Test");
        restricted.departments = vec!["dep".into()];
        let all = vec![open.clone(), restricted.clone()];

        assert_eq!(filter_domains(&all, &["dep".into()]), all);
        assert_eq!(filter_domains(&all, &[]), vec![open.clone()]);
        assert_eq!(filter_domains(&all, &["other".into()]), vec![open]);
    }
}
