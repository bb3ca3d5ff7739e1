//! # Consent Core
//!
//! Core logic of the consent status service:
//! - the domain directory, cached in memory and refreshed from the registry in the background
//! - classification of a patient's provisions into a consent status
//! - runtime configuration
//!
//! **No API concerns**: authentication and HTTP surfaces belong in `api-shared` and
//! `api-rest`. The registry is only reached through [`PolicyDirectoryClient`].

pub mod cache;
pub mod client;
pub mod config;
pub mod constants;
pub mod domain;
pub mod error;
pub mod resolver;
pub mod service;
pub mod status;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use cache::{DomainCache, RefreshHandle};
pub use client::{PolicyCoding, PolicyDirectoryClient, ProvisionRecord};
pub use config::{AppConfig, BasicAuth};
pub use domain::{filter_domains, Domain};
pub use error::{
    ConfigError, ConfigResult, ConsentError, ConsentResult, DirectoryError, DirectoryRecordError,
};
pub use resolver::ConsentResolver;
pub use service::ConsentService;
pub use status::{is_no_expiry, is_no_expiry_in_offset, no_expiry, ConsentStatus, DomainStatus, Policy};
