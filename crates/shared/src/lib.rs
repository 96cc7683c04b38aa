// navmerge - Shared Library
// Logging and configuration used by the navmerge tools

pub mod config;
pub mod log;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "NavMerge_";

/// Default configuration file name
pub const DEFAULT_CONFIG: &str = "navmerge.conf";
