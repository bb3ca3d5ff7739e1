//! Constants used throughout the consent core crate.
//!
//! This module collects the registry extension URLs, property keys and defaults so the
//! extraction rules and the live client agree on them.

use std::time::Duration;

/// Extension carrying the person identifier system of a domain.
pub const CONTEXT_IDENTIFIER_EXTENSION_URL: &str =
    "http://fhir.de/ConsentManagement/StructureDefinition/ContextIdentifier";

/// Nested key inside [`CONTEXT_IDENTIFIER_EXTENSION_URL`] holding the system URI.
pub const CONTEXT_IDENTIFIER_SYSTEM_KEY: &str = "system";

/// gICS key/value extension used for free-form domain properties.
pub const EXTERNAL_PROPERTY_EXTENSION_URL: &str =
    "https://ths-greifswald.de/fhir/StructureDefinition/gics/ExternalPropertyElement";

pub const EXTERNAL_PROPERTY_KEY: &str = "key";
pub const EXTERNAL_PROPERTY_VALUE: &str = "value";

/// Property listing the departments a domain is restricted to (comma separated).
pub const DEPARTMENTS_PROPERTY: &str = "departments";

/// Property naming the policy code that decides a domain's consent status.
pub const CHECK_POLICY_PROPERTY: &str = "checkPolicy";

/// Code system of consent template types.
pub const TEMPLATE_TYPE_SYSTEM: &str = "http://fhir.de/ConsentManagement/CodeSystem/TemplateType";

/// Template type of withdrawal documents.
pub const WITHDRAWAL_TEMPLATE_TYPE: &str = "WITHDRAWAL";

/// Unix timestamp of 3000-01-01T00:00:00Z, the registry's "never expires" date.
pub const NO_EXPIRY_TIMESTAMP: i64 = 32_503_680_000;

/// Refresh interval used when none is configured.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Configuration file read from the working directory when present.
pub const DEFAULT_CONFIG_FILE: &str = "app.yml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_FILE_ENV: &str = "CONSENTED_CONFIG";

pub const DEFAULT_HTTP_PORT: u16 = 8080;

pub const DEFAULT_LOG_LEVEL: &str = "info";
