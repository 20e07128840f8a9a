//! Router configuration
//!
//! The suppression window and the row-identifier field name are policy, not
//! magic numbers: both vary per deployment and belong in configuration the
//! embedding application loads alongside its own settings. Serde-derived so
//! the struct can sit in a larger config file.

use recache_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the invalidation router
///
/// # Example
///
/// ```toml
/// # How long a local write suppresses its own echoed notification (ms)
/// suppression_window_ms = 3000
///
/// # Payload field carrying the row's primary key
/// row_id_field = "id"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Echo-suppression window in milliseconds.
    ///
    /// A locally recorded write suppresses matching notifications for this
    /// long; after it elapses, the same notification is processed normally.
    #[serde(default = "default_suppression_window_ms")]
    pub suppression_window_ms: u64,

    /// Name of the payload field carrying the row identifier.
    #[serde(default = "default_row_id_field")]
    pub row_id_field: String,

    /// Sweep expired mutation records after this many `record` calls.
    ///
    /// Purely a memory bound; correctness never depends on the sweep
    /// because lookups treat expired records as absent.
    #[serde(default = "default_sweep_every")]
    pub sweep_every: u32,
}

fn default_suppression_window_ms() -> u64 {
    3000
}

fn default_row_id_field() -> String {
    "id".to_string()
}

fn default_sweep_every() -> u32 {
    64
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            suppression_window_ms: default_suppression_window_ms(),
            row_id_field: default_row_id_field(),
            sweep_every: default_sweep_every(),
        }
    }
}

impl RouterConfig {
    /// Reject configurations that would disable suppression or sweeping
    ///
    /// # Errors
    /// Returns `Error::InvalidConfig` when the window is zero, the id field
    /// is blank, or the sweep cadence is zero.
    pub fn validate(&self) -> Result<()> {
        if self.suppression_window_ms == 0 {
            return Err(Error::InvalidConfig(
                "suppression_window_ms must be greater than zero".to_string(),
            ));
        }
        if self.row_id_field.trim().is_empty() {
            return Err(Error::InvalidConfig(
                "row_id_field must not be blank".to_string(),
            ));
        }
        if self.sweep_every == 0 {
            return Err(Error::InvalidConfig(
                "sweep_every must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Suppression window as a `Duration`
    pub fn suppression_window(&self) -> Duration {
        Duration::from_millis(self.suppression_window_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = RouterConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.suppression_window(), Duration::from_millis(3000));
        assert_eq!(config.row_id_field, "id");
    }

    #[test]
    fn test_zero_window_rejected() {
        let config = RouterConfig {
            suppression_window_ms: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("suppression_window_ms"));
    }

    #[test]
    fn test_blank_id_field_rejected() {
        let config = RouterConfig {
            row_id_field: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_sweep_rejected() {
        let config = RouterConfig {
            sweep_every: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_deserialization_fills_defaults() {
        let config: RouterConfig = serde_json::from_str(r#"{"suppression_window_ms": 1500}"#).unwrap();
        assert_eq!(config.suppression_window_ms, 1500);
        assert_eq!(config.row_id_field, "id");
        assert_eq!(config.sweep_every, 64);
    }
}
