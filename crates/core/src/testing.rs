//! Deterministic test double for [`PolicyDirectoryClient`] and record builders.
//!
//! Compiled for this crate's tests and, through the `test-util` feature, for dependants.

use crate::constants::{
    CHECK_POLICY_PROPERTY, CONTEXT_IDENTIFIER_EXTENSION_URL, CONTEXT_IDENTIFIER_SYSTEM_KEY,
    DEPARTMENTS_PROPERTY, EXTERNAL_PROPERTY_EXTENSION_URL, EXTERNAL_PROPERTY_KEY,
    EXTERNAL_PROPERTY_VALUE,
};
use crate::{DirectoryError, Domain, PolicyCoding, PolicyDirectoryClient, ProvisionRecord};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fhir::{Extension, Identifier, ResearchStudy, ResearchStudyStatus};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Semaphore;

pub const TEST_PERSON_ID_SYSTEM: &str =
    "https://ths-greifswald.de/fhir/gics/identifiers/Patienten-ID";

/// In-memory registry.
///
/// Provisions are keyed by domain name and returned for any patient.
#[derive(Default)]
pub struct FakeDirectoryClient {
    domains: Mutex<Vec<ResearchStudy>>,
    domains_error: Mutex<Option<String>>,
    provisions: Mutex<HashMap<String, Result<Vec<ProvisionRecord>, String>>>,
    source_templates: HashMap<String, String>,
    domain_templates: HashMap<String, String>,
    fail_template_lookups: bool,
    gate: Mutex<Option<Arc<Semaphore>>>,
    list_calls: AtomicUsize,
    template_lookups: AtomicUsize,
}

impl FakeDirectoryClient {
    pub fn with_domains(self, studies: Vec<ResearchStudy>) -> Self {
        self.set_domains(studies);
        self
    }

    pub fn with_provisions(self, domain: &str, provisions: Vec<ProvisionRecord>) -> Self {
        self.provisions
            .lock()
            .insert(domain.to_owned(), Ok(provisions));
        self
    }

    pub fn with_failing_provisions(self, domain: &str, message: &str) -> Self {
        self.provisions
            .lock()
            .insert(domain.to_owned(), Err(message.to_owned()));
        self
    }

    /// Answer `resolve_withdrawal_template(reference)` with `template`.
    pub fn with_source_template(mut self, reference: &str, template: &str) -> Self {
        self.source_templates
            .insert(reference.to_owned(), template.to_owned());
        self
    }

    /// Answer `withdrawal_template(domain)` with `template`.
    pub fn with_domain_template(mut self, domain: &str, template: &str) -> Self {
        self.domain_templates
            .insert(domain.to_owned(), template.to_owned());
        self
    }

    /// Make every template lookup fail.
    pub fn fail_template_lookups(mut self) -> Self {
        self.fail_template_lookups = true;
        self
    }

    pub fn set_domains(&self, studies: Vec<ResearchStudy>) {
        *self.domains.lock() = studies;
        *self.domains_error.lock() = None;
    }

    /// Make `list_domains` fail until the next [`FakeDirectoryClient::set_domains`].
    pub fn fail_domains(&self, message: &str) {
        *self.domains_error.lock() = Some(message.to_owned());
    }

    /// Block `list_domains` until a permit is added to the returned semaphore.
    pub fn hold_list_domains(&self) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        *self.gate.lock() = Some(gate.clone());
        gate
    }

    pub fn list_domains_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of `resolve_withdrawal_template` calls.
    pub fn template_lookups(&self) -> usize {
        self.template_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PolicyDirectoryClient for FakeDirectoryClient {
    async fn list_domains(&self) -> Result<Vec<ResearchStudy>, DirectoryError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        let gate = self.gate.lock().clone();
        if let Some(gate) = gate {
            gate.acquire().await?.forget();
        }
        if let Some(message) = self.domains_error.lock().clone() {
            return Err(message.into());
        }
        Ok(self.domains.lock().clone())
    }

    async fn get_provisions(
        &self,
        _patient_id: &str,
        domain: &Domain,
    ) -> Result<Vec<ProvisionRecord>, DirectoryError> {
        match self.provisions.lock().get(&domain.name) {
            Some(Ok(provisions)) => Ok(provisions.clone()),
            Some(Err(message)) => Err(message.clone().into()),
            None => Ok(Vec::new()),
        }
    }

    async fn resolve_withdrawal_template(
        &self,
        source_reference: &str,
    ) -> Result<String, DirectoryError> {
        self.template_lookups.fetch_add(1, Ordering::SeqCst);
        if self.fail_template_lookups {
            return Err("template lookup failed".into());
        }
        Ok(self
            .source_templates
            .get(source_reference)
            .cloned()
            .unwrap_or_default())
    }

    async fn withdrawal_template(&self, domain_name: &str) -> Result<String, DirectoryError> {
        if self.fail_template_lookups {
            return Err("template lookup failed".into());
        }
        Ok(self
            .domain_templates
            .get(domain_name)
            .cloned()
            .unwrap_or_default())
    }
}

/// An active gICS domain record named `name` with description "`name` Domain".
pub fn domain_study(name: &str, check_policy: &str, departments: &[&str]) -> ResearchStudy {
    let mut extension = vec![
        Extension::with_children(
            CONTEXT_IDENTIFIER_EXTENSION_URL,
            vec![Extension::uri(
                CONTEXT_IDENTIFIER_SYSTEM_KEY,
                TEST_PERSON_ID_SYSTEM,
            )],
        ),
        property(CHECK_POLICY_PROPERTY, check_policy),
    ];
    if !departments.is_empty() {
        extension.push(property(DEPARTMENTS_PROPERTY, &departments.join(",")));
    }

    ResearchStudy {
        resource_type: Some("ResearchStudy".into()),
        identifier: vec![Identifier {
            system: None,
            value: Some(name.into()),
        }],
        status: Some(ResearchStudyStatus::Active),
        description: Some(format!("{name} Domain")),
        extension,
        ..ResearchStudy::default()
    }
}

fn property(key: &str, value: &str) -> Extension {
    Extension::with_children(
        EXTERNAL_PROPERTY_EXTENSION_URL,
        vec![
            Extension::string(EXTERNAL_PROPERTY_KEY, key),
            Extension::string(EXTERNAL_PROPERTY_VALUE, value),
        ],
    )
}

/// An unrestricted domain without withdrawal detection.
pub fn domain(name: &str, check_policy: &str) -> Domain {
    Domain {
        name: name.into(),
        description: format!("{name} Domain"),
        check_policy_code: check_policy.into(),
        person_id_system: TEST_PERSON_ID_SYSTEM.into(),
        departments: Vec::new(),
        withdrawal_template_ref: None,
    }
}

pub fn provision(
    code: &str,
    permit: bool,
    period_end: DateTime<Utc>,
    last_updated: DateTime<Utc>,
) -> ProvisionRecord {
    ProvisionRecord {
        coding: Some(PolicyCoding {
            code: code.into(),
            display: None,
        }),
        permit,
        period_end: Some(period_end),
        last_updated: Some(last_updated),
        source_reference: None,
    }
}

pub use crate::status::no_expiry;
