//! # Registry Client
//!
//! Live [`consent_core::PolicyDirectoryClient`] backed by the gICS FHIR API.
//!
//! - [`GicsClient`] issues the HTTP requests and parses the FHIR responses
//! - [`mapping`] turns `Consent` resources into [`consent_core::ProvisionRecord`]s

pub mod client;
pub mod mapping;

pub use client::GicsClient;

/// Errors talking to the registry.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry responded with {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("registry request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected registry response: {0}")]
    Fhir(#[from] fhir::FhirError),
}

pub type RegistryResult<T> = std::result::Result<T, RegistryError>;
