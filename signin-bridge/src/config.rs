//! Bridge configuration, supplied as JSON by the host at install time.
//!
//! ```json
//! {
//!   "max_request_id": 4294967295,
//!   "logging": { "enabled": true, "filter": "signin_bridge=debug", "json": false }
//! }
//! ```
//!
//! Every field is optional.

use serde::Deserialize;

use crate::error::BridgeError;
use crate::request::IdAllocator;

/// Default tracing directive when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "signin_bridge=info";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Request ids wrap back to 1 when the counter reaches this value.
    pub max_request_id: u32,
    pub logging: LoggingConfig,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            max_request_id: IdAllocator::DEFAULT_MAX,
            logging: LoggingConfig::default(),
        }
    }
}

impl BridgeConfig {
    pub fn from_json(json: &str) -> Result<Self, BridgeError> {
        let config: BridgeConfig = serde_json::from_str(json).map_err(BridgeError::Config)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), BridgeError> {
        if self.max_request_id < 2 {
            return Err(BridgeError::InvalidConfig(format!(
                "max_request_id must be at least 2, got {}",
                self.max_request_id
            )));
        }
        Ok(())
    }
}

/// Log output for hosts that load the bridge as a dynamic library and have no
/// tracing subscriber of their own.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Install a subscriber during `signin_bridge_install`.
    pub enabled: bool,
    /// Fallback filter directive; `RUST_LOG` takes precedence.
    pub filter: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            filter: DEFAULT_LOG_FILTER.to_string(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_gives_defaults() {
        let config = BridgeConfig::from_json("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
        assert_eq!(config.max_request_id, u32::MAX);
        assert!(!config.logging.enabled);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_partial_logging_section() {
        let config =
            BridgeConfig::from_json(r#"{"max_request_id": 16, "logging": {"enabled": true}}"#).unwrap();
        assert_eq!(config.max_request_id, 16);
        assert!(config.logging.enabled);
        assert!(!config.logging.json);
        assert_eq!(config.logging.filter, DEFAULT_LOG_FILTER);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            BridgeConfig::from_json("not json"),
            Err(BridgeError::Config(_))
        ));
    }

    #[test]
    fn test_max_request_id_too_small() {
        let err = BridgeConfig::from_json(r#"{"max_request_id": 1}"#).unwrap_err();
        assert!(matches!(err, BridgeError::InvalidConfig(_)));
        assert!(err.to_string().contains("at least 2"));
    }
}
