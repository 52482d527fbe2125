//! Configuration for nested initialization.
//!
//! [`AutoInitConfig`] is the per-type (or per-call) override for the
//! identifying attribute. [`Settings`] holds process-wide defaults and can be
//! loaded from `config/config.toml` or `AUTOINIT__*` environment variables
//! with [`Settings::load`].

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Attribute name used to match payloads when nothing else resolves.
pub const DEFAULT_IDENTIFYING_ATTR: &str = "id";

/// Payload key stripped before constructing new related instances.
pub const DEFAULT_SLUG_KEY: &str = "slug";

/// Identifying attribute override.
///
/// Attached to an [`EntityDef`](crate::EntityDef) it names the attribute used
/// to match incoming payloads for that type. Passed to
/// [`AutoInit::config`](crate::AutoInit::config) it applies to every related
/// type that carries no override of its own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AutoInitConfig {
    #[serde(default)]
    pub identifying_attr: Option<String>,
}

impl AutoInitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Config that matches payloads on `attr`.
    pub fn identifying_attr(attr: impl Into<String>) -> Self {
        Self {
            identifying_attr: Some(attr.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    #[serde(default = "default_fallback_attr")]
    pub fallback_attr: String,
    #[serde(default = "default_slug_key")]
    pub slug_key: String,
    /// Attribute names never auto-populated, in addition to `fallback_attr`.
    #[serde(default)]
    pub exclude: Vec<String>,
}

fn default_fallback_attr() -> String {
    DEFAULT_IDENTIFYING_ATTR.to_string()
}

fn default_slug_key() -> String {
    DEFAULT_SLUG_KEY.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            fallback_attr: default_fallback_attr(),
            slug_key: default_slug_key(),
            exclude: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from `config/config.toml`, falling back to env vars.
    ///
    /// Both sources are optional; absent keys take their defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config/config.toml")
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // An unreadable file is not fatal, env alone still applies
                if std::path::Path::new(path).exists() {
                    log::warn!(
                        "failed to load config file {}, falling back to env: {}",
                        path,
                        err
                    );
                }
                Config::builder()
                    .add_source(env_source())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {}, then env-only error: {}",
                            err, env_err
                        ))
                    })?
            }
        };

        settings.try_deserialize::<Settings>().map_err(|e| {
            ConfigError::Message(format!(
                "autoinit configuration could not be loaded from file or environment: {}",
                e
            ))
        })
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("AUTOINIT")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("exclude")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.fallback_attr, "id");
        assert_eq!(settings.slug_key, "slug");
        assert!(settings.exclude.is_empty());
    }

    #[test]
    fn test_auto_init_config_override() {
        assert_eq!(AutoInitConfig::new().identifying_attr, None);
        assert_eq!(
            AutoInitConfig::identifying_attr("code").identifying_attr.as_deref(),
            Some("code")
        );
    }

    #[test]
    fn test_settings_missing_file_uses_defaults() {
        let settings = Settings::load_from("does/not/exist.toml").unwrap();
        assert_eq!(settings.fallback_attr, "id");
    }

    #[test]
    fn test_settings_load_from_file() {
        let dir = std::env::temp_dir().join(format!("autoinit-settings-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "fallback_attr = \"uuid\"\nslug_key = \"handle\"\nexclude = [\"created_at\"]"
        )
        .unwrap();

        let settings = Settings::load_from(path.to_str().unwrap()).unwrap();
        assert_eq!(settings.fallback_attr, "uuid");
        assert_eq!(settings.slug_key, "handle");
        assert_eq!(settings.exclude, vec!["created_at".to_string()]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
