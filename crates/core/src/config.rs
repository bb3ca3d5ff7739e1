//! Runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into services. Request
//! handling never reads process-wide environment variables.
//!
//! Sources, later ones winning: built-in defaults, the YAML file, environment variables. Each
//! variable is named after its key path with `.` and `-` replaced by `_`, upper-cased
//! (`gics.fhir.base` is `GICS_FHIR_BASE`).

use crate::constants::{
    CONFIG_FILE_ENV, DEFAULT_CONFIG_FILE, DEFAULT_HTTP_PORT, DEFAULT_LOG_LEVEL,
    DEFAULT_UPDATE_INTERVAL,
};
use crate::{ConfigError, ConfigResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AppConfig {
    pub app: App,
    pub gics: Gics,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct App {
    /// Default `tracing` filter directive, overridden by `RUST_LOG`.
    pub log_level: String,
    pub http: Http,
}

impl Default for App {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.into(),
            http: Http::default(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Http {
    pub port: u16,
    pub auth: BasicAuth,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            port: DEFAULT_HTTP_PORT,
            auth: BasicAuth::default(),
        }
    }
}

/// Username and password for HTTP basic authentication.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BasicAuth {
    pub user: String,
    pub password: String,
}

impl std::fmt::Debug for BasicAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicAuth")
            .field("user", &self.user)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Gics {
    /// Domain cache refresh period, in humantime syntax (`30m`, `1h`).
    #[serde(with = "humantime_serde")]
    pub update_interval: Duration,
    pub fhir: Fhir,
}

impl Default for Gics {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            fhir: Fhir::default(),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Fhir {
    /// Base URL of the registry's FHIR endpoint.
    pub base: String,
    pub auth: Option<BasicAuth>,
}

impl AppConfig {
    /// Load from the file named by `CONSENTED_CONFIG` (or `app.yml` when present) and the
    /// process environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file cannot be read or parsed, an override is invalid,
    /// or the result fails validation.
    pub fn load() -> ConfigResult<Self> {
        let path = std::env::var_os(CONFIG_FILE_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref(), |key| std::env::var(key).ok())
    }

    /// Load with an explicit file and environment source.
    ///
    /// With `path` set the file must exist. Without it, `app.yml` in the working directory is
    /// read if present and defaults are used otherwise.
    pub fn load_from<F>(path: Option<&Path>, env: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::from_file(default)?
                } else {
                    tracing::debug!("No {DEFAULT_CONFIG_FILE} found, using defaults");
                    Self::default()
                }
            }
        };

        config.apply_env(env)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).map_err(ConfigError::YamlDeserialization)
    }

    /// Overlay values from `env`, looked up by variable name.
    pub fn apply_env<F>(&mut self, env: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(level) = env("APP_LOG_LEVEL") {
            self.app.log_level = level;
        }
        if let Some(port) = env("APP_HTTP_PORT") {
            self.app.http.port = port.trim().parse().map_err(|_| {
                ConfigError::InvalidInput(format!("APP_HTTP_PORT is not a valid port: {port}"))
            })?;
        }
        if let Some(user) = env("APP_HTTP_AUTH_USER") {
            self.app.http.auth.user = user;
        }
        if let Some(password) = env("APP_HTTP_AUTH_PASSWORD") {
            self.app.http.auth.password = password;
        }
        if let Some(interval) = env("GICS_UPDATE_INTERVAL") {
            self.gics.update_interval =
                humantime::parse_duration(interval.trim()).map_err(|source| {
                    ConfigError::InvalidDuration {
                        value: interval.clone(),
                        source,
                    }
                })?;
        }
        if let Some(base) = env("GICS_FHIR_BASE") {
            self.gics.fhir.base = base;
        }

        let fhir_user = env("GICS_FHIR_AUTH_USER");
        let fhir_password = env("GICS_FHIR_AUTH_PASSWORD");
        if fhir_user.is_some() || fhir_password.is_some() {
            let auth = self.gics.fhir.auth.get_or_insert_with(BasicAuth::default);
            if let Some(user) = fhir_user {
                auth.user = user;
            }
            if let Some(password) = fhir_password {
                auth.password = password;
            }
        }

        Ok(())
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.gics.fhir.base.trim().is_empty() {
            return Err(ConfigError::InvalidInput(
                "gics.fhir.base cannot be empty".into(),
            ));
        }
        if self.gics.update_interval.is_zero() {
            return Err(ConfigError::InvalidInput(
                "gics.update-interval must be greater than zero".into(),
            ));
        }
        if self.app.http.auth.user.trim().is_empty() {
            return Err(ConfigError::InvalidInput(
                "app.http.auth.user cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

mod humantime_serde {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(s.trim()).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    const YAML: &str = r#"
app:
  log-level: debug
  http:
    port: 9090
    auth:
      user: test
      password: secret
gics:
  update-interval: 30m
  fhir:
    base: http://localhost:8080/ttp-fhir/fhir/gics
    auth:
      user: gics
      password: gics-secret
"#;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents.as_bytes()).expect("write config");
        file
    }

    #[test]
    fn parses_yaml_file() {
        let file = write_config(YAML);
        let config = AppConfig::load_from(Some(file.path()), env(&[])).expect("config");

        assert_eq!(config.app.log_level, "debug");
        assert_eq!(config.app.http.port, 9090);
        assert_eq!(
            config.app.http.auth,
            BasicAuth {
                user: "test".into(),
                password: "secret".into()
            }
        );
        assert_eq!(config.gics.update_interval, Duration::from_secs(30 * 60));
        assert_eq!(
            config.gics.fhir.base,
            "http://localhost:8080/ttp-fhir/fhir/gics"
        );
        assert_eq!(
            config.gics.fhir.auth.as_ref().map(|a| a.user.as_str()),
            Some("gics")
        );
    }

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config = AppConfig::from_yaml_str("gics:\n  fhir:\n    base: http://gics\n")
            .expect("config");

        assert_eq!(config.app.log_level, DEFAULT_LOG_LEVEL);
        assert_eq!(config.app.http.port, DEFAULT_HTTP_PORT);
        assert_eq!(config.gics.update_interval, DEFAULT_UPDATE_INTERVAL);
        assert!(config.gics.fhir.auth.is_none());
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_config(YAML);
        let config = AppConfig::load_from(
            Some(file.path()),
            env(&[
                ("GICS_FHIR_BASE", "test"),
                ("APP_LOG_LEVEL", "warn"),
                ("APP_HTTP_PORT", "8081"),
                ("GICS_UPDATE_INTERVAL", "5m"),
                ("GICS_FHIR_AUTH_PASSWORD", "rotated"),
            ]),
        )
        .expect("config");

        assert_eq!(config.gics.fhir.base, "test");
        assert_eq!(config.app.log_level, "warn");
        assert_eq!(config.app.http.port, 8081);
        assert_eq!(config.gics.update_interval, Duration::from_secs(300));
        let auth = config.gics.fhir.auth.expect("fhir auth");
        assert_eq!(auth.user, "gics");
        assert_eq!(auth.password, "rotated");
    }

    #[test]
    fn environment_alone_is_enough() {
        let mut config = AppConfig::default();
        config
            .apply_env(env(&[
                ("GICS_FHIR_BASE", "http://gics"),
                ("APP_HTTP_AUTH_USER", "test"),
                ("GICS_FHIR_AUTH_USER", "gics"),
            ]))
            .expect("overrides");

        assert!(config.validate().is_ok());
        assert_eq!(
            config.gics.fhir.auth,
            Some(BasicAuth {
                user: "gics".into(),
                password: String::new()
            })
        );
    }

    #[test]
    fn rejects_invalid_interval() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("GICS_UPDATE_INTERVAL", "every hour")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidDuration { .. }));

        let err = AppConfig::from_yaml_str("gics:\n  update-interval: soon\n").unwrap_err();
        assert!(matches!(err, ConfigError::YamlDeserialization(_)));
    }

    #[test]
    fn rejects_invalid_port() {
        let mut config = AppConfig::default();
        let err = config
            .apply_env(env(&[("APP_HTTP_PORT", "http")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidInput(_)));
    }

    #[test]
    fn rejects_empty_fhir_base() {
        let file = write_config("app:\n  http:\n    auth:\n      user: test\n");
        let err = AppConfig::load_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(err.to_string().contains("gics.fhir.base"));
    }

    #[test]
    fn rejects_missing_http_user() {
        let file = write_config("gics:\n  fhir:\n    base: http://gics\n");
        let err = AppConfig::load_from(Some(file.path()), env(&[])).unwrap_err();
        assert!(err.to_string().contains("app.http.auth.user"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = AppConfig::load_from(Some(&dir.path().join("bla.yml")), env(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn debug_output_hides_passwords() {
        let config = AppConfig::from_yaml_str(YAML).expect("config");
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("test"));
    }
}
