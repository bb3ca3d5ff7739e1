//! # API Shared
//!
//! Shared utilities and definitions for the consent service APIs.
//!
//! Contains:
//! - Shared services like `HealthService`
//! - Basic authentication against the configured credentials
//!
//! Used by `api-rest` for common functionality.

pub mod auth;
pub mod health;

pub use auth::{validate_basic_auth, AuthError, BASIC_CHALLENGE};
pub use health::{HealthRes, HealthService};
