//! Registry Configuration
//!
//! Configuration can be set programmatically or loaded from environment variables.
//!
//! # Environment Variables
//!
//! All environment variables use the `OBJREG_` prefix:
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `OBJREG_MAX_OBJECTS` | Hard maximum number of slots | 2097152 |
//! | `OBJREG_DISREGARD_RESERVE` | Slots reserved for the disregard pool (0 = disabled) | 0 |
//! | `OBJREG_PREALLOCATE` | Materialize every slot at initialization ("true"/"false") | false |
//! | `OBJREG_RECYCLE_INDICES` | Reuse freed general-pool indices | true |
//! | `OBJREG_DUMP_COUNTS_ON_OVERFLOW` | Log a census when capacity is exhausted | false |
//! | `OBJREG_CENSUS_MIN_INSTANCES` | Types with at most this many instances are folded | 10 |
//! | `OBJREG_CENSUS_MAX_PRINTED_PERCENT` | Stop printing once this share of instances is shown | 95 |
//! | `OBJREG_LOG_LEVEL` | Log level (off/error/warn/info/debug/trace) | info |
//!
//! # Example
//!
//! ```rust,ignore
//! use object_registry::config::RegistryConfig;
//!
//! let config = RegistryConfig::from_env();
//!
//! let config = RegistryConfig::builder()
//!     .max_objects(1 << 20)
//!     .disregard_reserve(64 * 1024)
//!     .build()?;
//! ```

use std::env;

use thiserror::Error;

use crate::log::LogLevel;

/// Census printing limits.
#[derive(Debug, Clone, PartialEq)]
pub struct CensusConfig {
    /// Types with this many instances or fewer are folded into the summary line.
    /// Default: 10.
    pub min_instances: usize,

    /// Printing stops once this fraction of all instances has been printed.
    /// Default: 0.95.
    pub max_printed_fraction: f64,
}

impl Default for CensusConfig {
    fn default() -> Self {
        Self {
            min_instances: 10,
            max_printed_fraction: 0.95,
        }
    }
}

/// Complete registry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryConfig {
    /// Hard maximum number of slots.
    /// Default: 2M.
    pub max_objects: usize,

    /// Slots reserved up front for the disregard pool. 0 disables the pool.
    /// Default: 0.
    pub disregard_reserve: usize,

    /// Materialize all slot storage at initialization instead of on demand.
    /// Default: false.
    pub preallocate: bool,

    /// Return freed general-pool indices to the free list.
    /// Default: true.
    pub recycle_indices: bool,

    /// Log the census before failing on capacity exhaustion.
    /// Default: false.
    pub dump_counts_on_overflow: bool,

    /// Census printing limits.
    pub census: CensusConfig,

    /// Minimum level for the crate's logger.
    /// Default: Info.
    pub log_level: LogLevel,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            max_objects: 2 * 1024 * 1024,
            disregard_reserve: 0,
            preallocate: false,
            recycle_indices: true,
            dump_counts_on_overflow: false,
            census: CensusConfig::default(),
            log_level: LogLevel::Info,
        }
    }
}

impl RegistryConfig {
    /// Create a new builder for RegistryConfig.
    pub fn builder() -> RegistryConfigBuilder {
        RegistryConfigBuilder::new()
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their default values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(val) = parse_env_usize("OBJREG_MAX_OBJECTS") {
            if val > 0 {
                config.max_objects = val;
            }
        }

        if let Some(val) = parse_env_usize("OBJREG_DISREGARD_RESERVE") {
            config.disregard_reserve = val;
        }

        if let Some(val) = parse_env_bool("OBJREG_PREALLOCATE") {
            config.preallocate = val;
        }

        if let Some(val) = parse_env_bool("OBJREG_RECYCLE_INDICES") {
            config.recycle_indices = val;
        }

        if let Some(val) = parse_env_bool("OBJREG_DUMP_COUNTS_ON_OVERFLOW") {
            config.dump_counts_on_overflow = val;
        }

        if let Some(val) = parse_env_usize("OBJREG_CENSUS_MIN_INSTANCES") {
            config.census.min_instances = val;
        }

        if let Some(val) = parse_env_usize("OBJREG_CENSUS_MAX_PRINTED_PERCENT") {
            if (1..=100).contains(&val) {
                config.census.max_printed_fraction = val as f64 / 100.0;
            }
        }

        if let Ok(val) = env::var("OBJREG_LOG_LEVEL") {
            if let Some(level) = LogLevel::parse(&val) {
                config.log_level = level;
            }
        }

        config
    }

    /// Whether the disregard pool is in use.
    pub fn disregard_enabled(&self) -> bool {
        self.disregard_reserve > 0
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_objects == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_objects",
                message: "must be at least 1".into(),
            });
        }

        if self.max_objects > i32::MAX as usize {
            return Err(ConfigError::InvalidValue {
                field: "max_objects",
                message: format!("must not exceed {}", i32::MAX),
            });
        }

        if self.disregard_reserve > self.max_objects {
            return Err(ConfigError::InvalidValue {
                field: "disregard_reserve",
                message: format!("must not exceed max_objects ({})", self.max_objects),
            });
        }

        let fraction = self.census.max_printed_fraction;
        if !(fraction > 0.0 && fraction <= 1.0) {
            return Err(ConfigError::InvalidValue {
                field: "census.max_printed_fraction",
                message: "must be in (0, 1]".into(),
            });
        }

        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Invalid configuration value.
    #[error("invalid configuration for '{field}': {message}")]
    InvalidValue {
        /// Field name.
        field: &'static str,
        /// Error message.
        message: String,
    },
}

/// Builder for RegistryConfig.
#[derive(Debug, Clone, Default)]
pub struct RegistryConfigBuilder {
    config: RegistryConfig,
}

impl RegistryConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hard maximum number of slots.
    pub fn max_objects(mut self, n: usize) -> Self {
        self.config.max_objects = n;
        self
    }

    /// Set the disregard-pool reservation (0 disables the pool).
    pub fn disregard_reserve(mut self, n: usize) -> Self {
        self.config.disregard_reserve = n;
        self
    }

    /// Materialize all slots at initialization.
    pub fn preallocate(mut self, enabled: bool) -> Self {
        self.config.preallocate = enabled;
        self
    }

    /// Enable or disable free-index recycling.
    pub fn recycle_indices(mut self, enabled: bool) -> Self {
        self.config.recycle_indices = enabled;
        self
    }

    /// Log a census before failing on capacity exhaustion.
    pub fn dump_counts_on_overflow(mut self, enabled: bool) -> Self {
        self.config.dump_counts_on_overflow = enabled;
        self
    }

    /// Set the census folding threshold.
    pub fn census_min_instances(mut self, n: usize) -> Self {
        self.config.census.min_instances = n;
        self
    }

    /// Set the census printed-fraction limit.
    pub fn census_max_printed_fraction(mut self, fraction: f64) -> Self {
        self.config.census.max_printed_fraction = fraction;
        self
    }

    /// Set the log level.
    pub fn log_level(mut self, level: LogLevel) -> Self {
        self.config.log_level = level;
        self
    }

    /// Build the configuration.
    ///
    /// This validates the configuration and returns an error if invalid.
    pub fn build(self) -> Result<RegistryConfig, ConfigError> {
        self.config.validate()?;
        Ok(self.config)
    }

    /// Build the configuration without validation.
    pub fn build_unchecked(self) -> RegistryConfig {
        self.config
    }
}

fn parse_env_usize(name: &str) -> Option<usize> {
    env::var(name).ok().and_then(|s| s.trim().parse().ok())
}

fn parse_env_bool(name: &str) -> Option<bool> {
    env::var(name)
        .ok()
        .and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RegistryConfig::default();
        assert_eq!(config.max_objects, 2 * 1024 * 1024);
        assert_eq!(config.disregard_reserve, 0);
        assert!(!config.disregard_enabled());
        assert!(!config.preallocate);
        assert!(config.recycle_indices);
        assert!(!config.dump_counts_on_overflow);
        assert_eq!(config.census.min_instances, 10);
        assert_eq!(config.census.max_printed_fraction, 0.95);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = RegistryConfig::builder()
            .max_objects(1000)
            .disregard_reserve(100)
            .preallocate(true)
            .recycle_indices(false)
            .dump_counts_on_overflow(true)
            .census_min_instances(3)
            .census_max_printed_fraction(0.5)
            .log_level(LogLevel::Debug)
            .build()
            .unwrap();

        assert_eq!(config.max_objects, 1000);
        assert_eq!(config.disregard_reserve, 100);
        assert!(config.disregard_enabled());
        assert!(config.preallocate);
        assert!(!config.recycle_indices);
        assert!(config.dump_counts_on_overflow);
        assert_eq!(config.census.min_instances, 3);
        assert_eq!(config.census.max_printed_fraction, 0.5);
        assert_eq!(config.log_level, LogLevel::Debug);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = RegistryConfig::builder().max_objects(0).build().unwrap_err();
        assert!(err.to_string().contains("max_objects"));
    }

    #[test]
    fn test_capacity_above_index_range_rejected() {
        let result = RegistryConfig::builder()
            .max_objects(i32::MAX as usize + 1)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_reserve_larger_than_capacity_rejected() {
        let result = RegistryConfig::builder()
            .max_objects(10)
            .disregard_reserve(11)
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_bad_fraction_rejected() {
        assert!(RegistryConfig::builder()
            .census_max_printed_fraction(0.0)
            .build()
            .is_err());
        assert!(RegistryConfig::builder()
            .census_max_printed_fraction(1.5)
            .build()
            .is_err());
    }

    #[test]
    fn test_build_unchecked_skips_validation() {
        let config = RegistryConfig::builder().max_objects(0).build_unchecked();
        assert_eq!(config.max_objects, 0);
    }

    #[test]
    fn test_from_env_with_no_vars() {
        let config = RegistryConfig::from_env();
        assert!(config.max_objects > 0);
        assert!(config.census.max_printed_fraction > 0.0);
    }
}
