//! Service configuration, read once at startup and passed down explicitly.

use std::path::PathBuf;

use algobank_core::CodePolicy;
use algobank_validator::{AccessKey, ValidatorConfig};

pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3456";
pub const DEFAULT_STORAGE_ROOT: &str = "./algorithms";

/// Errors raised while reading the service configuration.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// The privacy access key is unset or empty.
    #[error("ALGOBANK_ACCESS_KEY must be set to a non-empty value")]
    MissingAccessKey,

    /// A boolean flag holds something other than a recognised literal.
    #[error("{name} must be one of true, false, 1, 0 (got {value:?})")]
    InvalidFlag { name: &'static str, value: String },
}

/// Everything the gateway needs to build its components.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_addr: String,
    pub storage_root: PathBuf,
    pub access_key: AccessKey,
    pub enable_cors: bool,
    /// Overrides the default forbidden libraries of both code policies.
    pub forbidden_libraries: Option<Vec<String>>,
    /// Overrides the default required libraries of both code policies.
    pub required_libraries: Option<Vec<String>>,
}

impl ServiceConfig {
    /// Defaults for everything except the access key.
    #[must_use]
    pub fn new(access_key: AccessKey) -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN_ADDR.to_owned(),
            storage_root: PathBuf::from(DEFAULT_STORAGE_ROOT),
            access_key,
            enable_cors: false,
            forbidden_libraries: None,
            required_libraries: None,
        }
    }

    /// Reads `ALGOBANK_*` variables from the process environment.
    ///
    /// # Errors
    /// See [`ServiceConfig::from_lookup`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    ///
    /// # Errors
    /// Returns [`ConfigError::MissingAccessKey`] when no key is configured and
    /// [`ConfigError::InvalidFlag`] for an unparseable `ALGOBANK_ENABLE_CORS`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let access_key = lookup("ALGOBANK_ACCESS_KEY")
            .map(AccessKey::new)
            .filter(|key| !key.is_empty())
            .ok_or(ConfigError::MissingAccessKey)?;
        let mut config = Self::new(access_key);

        if let Some(addr) = lookup("ALGOBANK_LISTEN_ADDR") {
            config.listen_addr = addr;
        }
        if let Some(root) = lookup("ALGOBANK_STORAGE_ROOT") {
            config.storage_root = PathBuf::from(root);
        }
        if let Some(flag) = lookup("ALGOBANK_ENABLE_CORS") {
            config.enable_cors = parse_flag("ALGOBANK_ENABLE_CORS", &flag)?;
        }
        config.forbidden_libraries = lookup("ALGOBANK_FORBIDDEN_LIBRARIES").map(|v| split_list(&v));
        config.required_libraries = lookup("ALGOBANK_REQUIRED_LIBRARIES").map(|v| split_list(&v));
        Ok(config)
    }

    /// Code policies and access key for the validators.
    #[must_use]
    pub fn validator_config(&self) -> ValidatorConfig {
        ValidatorConfig {
            main_policy: self.policy(CodePolicy::main()),
            privacy_policy: self.policy(CodePolicy::privacy()),
            access_key: self.access_key.clone(),
        }
    }

    fn policy(&self, mut policy: CodePolicy) -> CodePolicy {
        if let Some(forbidden) = &self.forbidden_libraries {
            policy = policy.forbidding(forbidden.clone());
        }
        if let Some(required) = &self.required_libraries {
            policy = policy.requiring(required.clone());
        }
        policy
    }
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_owned(),
        }),
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn access_key_is_required() {
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[])),
            Err(ConfigError::MissingAccessKey)
        ));
        assert!(matches!(
            ServiceConfig::from_lookup(lookup(&[("ALGOBANK_ACCESS_KEY", "")])),
            Err(ConfigError::MissingAccessKey)
        ));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = match ServiceConfig::from_lookup(lookup(&[("ALGOBANK_ACCESS_KEY", "k")])) {
            Ok(c) => c,
            Err(e) => panic!("config failed: {e}"),
        };
        assert_eq!(config.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.storage_root, PathBuf::from(DEFAULT_STORAGE_ROOT));
        assert!(!config.enable_cors);
        assert!(config.access_key.matches("k"));
        assert_eq!(config.validator_config().main_policy, CodePolicy::main());
        assert_eq!(config.validator_config().privacy_policy, CodePolicy::privacy());
    }

    #[test]
    fn library_lists_override_both_policies() {
        let config = match ServiceConfig::from_lookup(lookup(&[
            ("ALGOBANK_ACCESS_KEY", "k"),
            ("ALGOBANK_FORBIDDEN_LIBRARIES", "multiprocessing, subprocess ,,"),
            ("ALGOBANK_REQUIRED_LIBRARIES", "opalalgorithms"),
            ("ALGOBANK_ENABLE_CORS", "TRUE"),
        ])) {
            Ok(c) => c,
            Err(e) => panic!("config failed: {e}"),
        };
        assert!(config.enable_cors);
        let validators = config.validator_config();
        for policy in [validators.main_policy, validators.privacy_policy] {
            assert_eq!(policy.forbidden_libraries, vec!["multiprocessing", "subprocess"]);
            assert_eq!(policy.required_libraries, vec!["opalalgorithms"]);
        }
    }

    #[test]
    fn invalid_cors_flag_is_rejected() {
        let result = ServiceConfig::from_lookup(lookup(&[
            ("ALGOBANK_ACCESS_KEY", "k"),
            ("ALGOBANK_ENABLE_CORS", "maybe"),
        ]));
        assert!(matches!(result, Err(ConfigError::InvalidFlag { .. })));
    }
}
