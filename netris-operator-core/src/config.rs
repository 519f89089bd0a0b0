use std::{env::var, fs, io::ErrorKind, time::Duration};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_PATH_ENV: &str = "NETRIS_OPERATOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "/etc/netris-operator/config.yaml";

pub const CONTROLLER_HOST_ENV: &str = "CONTROLLER_HOST";
pub const CONTROLLER_LOGIN_ENV: &str = "CONTROLLER_LOGIN";
pub const CONTROLLER_PASSWORD_ENV: &str = "CONTROLLER_PASSWORD";
pub const CONTROLLER_INSECURE_ENV: &str = "CONTROLLER_INSECURE";
pub const DEV_MODE_ENV: &str = "NOPERATOR_DEV_MODE";

const DEFAULT_REQUEUE_SECS: u64 = 15;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file couldn't be read: {}", .0)]
    FileRead(std::io::Error),
    #[error("Config file couldn't be parsed: {}", .0)]
    FileParse(serde_yaml::Error),
    #[error("Env var couldn't be parsed: {}={}", .0, .1)]
    EnvParse(&'static str, String),
    #[error("Controller {} is unset!", .0)]
    MissingValue(&'static str),
}

/// Operator settings, read from the YAML config file and overridable through
/// the environment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OperatorConfig {
    pub controller: ControllerConfig,
    /// seconds between reconciliations of a healthy resource
    pub requeue_interval: Option<u64>,
    /// tenant assigned to L4LBs generated from LoadBalancer services
    pub l4lb_tenant: Option<String>,
    /// site assigned to L4LBs generated from LoadBalancer services
    pub l4lb_site: Option<String>,
    pub dev_mode: bool,
}

/// Connection details for the Netris controller.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ControllerConfig {
    #[serde(rename = "address")]
    pub host: String,
    pub login: String,
    pub password: String,
    /// skip TLS certificate verification
    pub insecure: bool,
}

impl OperatorConfig {
    /// Loads the config file (absence is fine, everything can come from the
    /// environment) and applies env overrides on top.
    pub fn load() -> Result<Self, ConfigError> {
        let path = var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_owned());
        let mut config = match fs::read_to_string(&path) {
            Ok(raw) => Self::from_yaml(&raw)?,
            Err(error) if error.kind() == ErrorKind::NotFound => Self::default(),
            Err(error) => return Err(ConfigError::FileRead(error)),
        };

        config.apply_env()?;
        config.validate()?;

        Ok(config)
    }

    pub fn requeue_interval(&self) -> Duration {
        Duration::from_secs(self.requeue_interval.unwrap_or(DEFAULT_REQUEUE_SECS))
    }

    fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(raw).map_err(ConfigError::FileParse)
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Ok(host) = var(CONTROLLER_HOST_ENV) {
            self.controller.host = host;
        }
        if let Ok(login) = var(CONTROLLER_LOGIN_ENV) {
            self.controller.login = login;
        }
        if let Ok(password) = var(CONTROLLER_PASSWORD_ENV) {
            self.controller.password = password;
        }
        if let Ok(insecure) = var(CONTROLLER_INSECURE_ENV) {
            self.controller.insecure = parse_bool(CONTROLLER_INSECURE_ENV, &insecure)?;
        }
        if let Ok(dev_mode) = var(DEV_MODE_ENV) {
            self.dev_mode = parse_bool(DEV_MODE_ENV, &dev_mode)?;
        }

        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.controller.host.is_empty() {
            return Err(ConfigError::MissingValue("address"));
        }
        if self.controller.login.is_empty() {
            return Err(ConfigError::MissingValue("login"));
        }
        if self.controller.password.is_empty() {
            return Err(ConfigError::MissingValue("password"));
        }

        Ok(())
    }
}

fn parse_bool(var_name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value {
        "1" => Ok(true),
        "0" => Ok(false),
        _ => value
            .parse()
            .map_err(|_| ConfigError::EnvParse(var_name, value.to_owned())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_parses_the_controller_section() {
        let config = OperatorConfig::from_yaml(
            "controller:\n  address: https://example.netris.io\n  login: admin\n  password: hunter2\n",
        )
        .unwrap();

        assert_eq!(config.controller.host, "https://example.netris.io");
        assert_eq!(config.controller.login, "admin");
        assert_eq!(config.controller.password, "hunter2");
        assert!(!config.controller.insecure);
        assert!(config.validate().is_ok());
        assert_eq!(config.requeue_interval(), Duration::from_secs(15));
    }

    #[test]
    fn config_tolerates_missing_sections_until_validation() {
        let config = OperatorConfig::from_yaml("requeueInterval: 30\n").unwrap();

        assert_eq!(config.requeue_interval(), Duration::from_secs(30));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingValue("address"))
        ));
    }

    #[test]
    fn bool_overrides_accept_numeric_forms() {
        assert!(parse_bool("X", "1").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(parse_bool("X", "true").unwrap());
        assert!(parse_bool("X", "yes").is_err());
    }
}
