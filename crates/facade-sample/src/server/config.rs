use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const ENV_MODEL_UUID: &str = "FACADE_MODEL_UUID";
const ENV_MODEL_NAME: &str = "FACADE_MODEL_NAME";
const ENV_DISABLED: &str = "FACADE_DISABLED";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid facade reference {0:?}, expected `Name` or `Name(version)`")]
    InvalidFacadeRef(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// A facade name, optionally pinned to one version.
///
/// Written `Name` (every version) or `Name(version)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FacadeRef {
    pub name: String,
    pub version: Option<u32>,
}

impl FacadeRef {
    pub fn matches(&self, name: &str, version: u32) -> bool {
        self.name == name && self.version.map_or(true, |v| v == version)
    }
}

impl FromStr for FacadeRef {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ConfigError::InvalidFacadeRef(s.to_string());
        let s = s.trim();

        let (name, version) = match s.strip_suffix(')') {
            Some(rest) => {
                let (name, version) = rest.split_once('(').ok_or_else(invalid)?;
                (name, Some(version.parse::<u32>().map_err(|_| invalid())?))
            }
            None => (s, None),
        };

        if name.is_empty() || name.contains(|c: char| c == '(' || c == ')' || c.is_whitespace()) {
            return Err(invalid());
        }
        Ok(Self {
            name: name.to_string(),
            version,
        })
    }
}

impl fmt::Display for FacadeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.version {
            Some(version) => write!(f, "{}({})", self.name, version),
            None => f.write_str(&self.name),
        }
    }
}

impl TryFrom<String> for FacadeRef {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FacadeRef> for String {
    fn from(value: FacadeRef) -> Self {
        value.to_string()
    }
}

/// Startup configuration of the API server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub model_uuid: String,
    pub model_name: String,
    pub owner_tag: String,
    /// Facades removed from the registry after every module has registered.
    pub disabled_facades: Vec<FacadeRef>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            model_uuid: "deadbeef-0bad-400d-8000-4b1d0d06f00d".to_string(),
            model_name: "default".to_string(),
            owner_tag: "user-admin".to_string(),
            disabled_facades: Vec::new(),
        }
    }
}

impl ServerConfig {
    /// Defaults overridden by `FACADE_MODEL_UUID`, `FACADE_MODEL_NAME` and
    /// `FACADE_DISABLED` (comma separated facade references).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(uuid) = lookup(ENV_MODEL_UUID) {
            if uuid.trim().is_empty() {
                return Err(ConfigError::Empty(ENV_MODEL_UUID));
            }
            config.model_uuid = uuid.trim().to_string();
        }
        if let Some(name) = lookup(ENV_MODEL_NAME) {
            if name.trim().is_empty() {
                return Err(ConfigError::Empty(ENV_MODEL_NAME));
            }
            config.model_name = name.trim().to_string();
        }
        if let Some(disabled) = lookup(ENV_DISABLED) {
            config.disabled_facades = disabled
                .split(',')
                .filter(|s| !s.trim().is_empty())
                .map(str::parse)
                .collect::<Result<_, _>>()?;
        }
        Ok(config)
    }

    pub fn is_disabled(&self, name: &str, version: u32) -> bool {
        self.disabled_facades.iter().any(|r| r.matches(name, version))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_parse_facade_ref() {
        let r: FacadeRef = "Block".parse().unwrap();
        assert_eq!((r.name.as_str(), r.version), ("Block", None));
        assert!(r.matches("Block", 7));

        let r: FacadeRef = " MigrationMaster(1) ".parse().unwrap();
        assert_eq!(r.to_string(), "MigrationMaster(1)");
        assert!(r.matches("MigrationMaster", 1));
        assert!(!r.matches("MigrationMaster", 2));

        for bad in ["", "(1)", "Block(", "Block(x)", "Block(-1)", "Bl ock", "Block(1)(2)"] {
            assert_eq!(
                bad.parse::<FacadeRef>(),
                Err(ConfigError::InvalidFacadeRef(bad.to_string())),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn test_from_lookup() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("FACADE_MODEL_UUID", "cafe"),
            ("FACADE_DISABLED", "Block, MigrationMaster(1),"),
        ]))
        .unwrap();

        assert_eq!(config.model_uuid, "cafe");
        assert_eq!(config.model_name, "default");
        assert!(config.is_disabled("Block", 2));
        assert!(config.is_disabled("MigrationMaster", 1));
        assert!(!config.is_disabled("MigrationMaster", 3));
    }

    #[test]
    fn test_from_lookup_rejects_bad_values() {
        assert_eq!(
            ServerConfig::from_lookup(lookup(&[("FACADE_MODEL_UUID", " ")])),
            Err(ConfigError::Empty("FACADE_MODEL_UUID"))
        );
        assert!(ServerConfig::from_lookup(lookup(&[("FACADE_DISABLED", "Block(two)")])).is_err());
    }

    #[test]
    fn test_config_json() {
        let config: ServerConfig =
            serde_json::from_str(r#"{"disabled_facades":["Block","MigrationMaster(2)"]}"#)
                .unwrap();
        assert_eq!(config.model_name, "default");
        assert_eq!(config.disabled_facades.len(), 2);

        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["disabled_facades"][1], "MigrationMaster(2)");
        assert!(serde_json::from_str::<ServerConfig>(r#"{"disabled_facades":["("]}"#).is_err());
    }
}
