//! Capability interface towards the consent registry.
//!
//! The cache and the resolver only ever talk to the registry through
//! [`PolicyDirectoryClient`]. The live implementation lives in the `registry-client` crate;
//! tests use [`crate::testing::FakeDirectoryClient`].

use crate::{DirectoryError, Domain};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fhir::ResearchStudy;

/// The coding identifying which policy a provision is about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolicyCoding {
    pub code: String,
    pub display: Option<String>,
}

/// One policy state for a patient within a domain, as returned by the registry.
///
/// Provisions are fetched per request and never cached.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProvisionRecord {
    /// `None` when the registry sent a provision without any coding.
    pub coding: Option<PolicyCoding>,
    pub permit: bool,
    pub period_end: Option<DateTime<Utc>>,
    pub last_updated: Option<DateTime<Utc>>,
    /// Reference to the signed document, used for withdrawal detection.
    pub source_reference: Option<String>,
}

#[async_trait]
pub trait PolicyDirectoryClient: Send + Sync {
    /// All domain records known to the registry, unfiltered.
    async fn list_domains(&self) -> Result<Vec<ResearchStudy>, DirectoryError>;

    /// Current policy states of a patient within `domain`.
    async fn get_provisions(
        &self,
        patient_id: &str,
        domain: &Domain,
    ) -> Result<Vec<ProvisionRecord>, DirectoryError>;

    /// Template identifier of the document behind `source_reference`.
    ///
    /// An empty string means "no template" and is not an error.
    async fn resolve_withdrawal_template(
        &self,
        source_reference: &str,
    ) -> Result<String, DirectoryError>;

    /// Identifier of the withdrawal template configured for a domain.
    ///
    /// An empty string means the domain has none.
    async fn withdrawal_template(&self, domain_name: &str) -> Result<String, DirectoryError>;
}
