//! Synthesis constants and environment driven settings.

use std::env;
use std::path::PathBuf;

/// Prefix length of every subnet carved out of a network block.
pub const SUBNET_MASK: u8 = 27;

/// Number of zones used when a network spec does not name one.
pub const DEFAULT_ZONE_COUNT: i64 = 2;

/// Addresses the cloud keeps for itself in every subnet.
pub const RESERVED_ADDRESSES_PER_SUBNET: u64 = 5;

pub const DEFAULT_SCENARIO_FILE: &str = "scenarios/ping_me.json";
pub const DEFAULT_LOG_CONFIG: &str = "log4rs.yml";

pub const ENV_SCENARIO_FILE: &str = "TOPOLOGY_SCENARIO_FILE";
pub const ENV_OUTPUT_DIR: &str = "TOPOLOGY_OUTPUT_DIR";
pub const ENV_LOG_CONFIG: &str = "TOPOLOGY_LOG_CONFIG";

/// Runtime settings for the binary, read after `dotenv` has loaded `.env`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub scenario_file: PathBuf,
    pub output_dir: PathBuf,
    pub log_config: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            scenario_file: PathBuf::from(DEFAULT_SCENARIO_FILE),
            output_dir: PathBuf::from("."),
            log_config: PathBuf::from(DEFAULT_LOG_CONFIG),
        }
    }
}

impl Settings {
    /// Build settings from the process environment, falling back to defaults.
    pub fn from_env() -> Settings {
        Settings::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Settings
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Settings::default();
        let path = |key: &str, default: PathBuf| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or(default)
        };
        Settings {
            scenario_file: path(ENV_SCENARIO_FILE, defaults.scenario_file),
            output_dir: path(ENV_OUTPUT_DIR, defaults.output_dir),
            log_config: path(ENV_LOG_CONFIG, defaults.log_config),
        }
    }
}
