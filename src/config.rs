//! Configuration management with environment variable support.
//!
//! Centralized configuration for the reporting pipeline, mirroring the
//! switches the test framework recognizes at run time.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `ZEST_OUTPUT_DIR` | Output directory for reports and screenshots | `test-results` |
//! | `PRINT_TEST_RESULTS` | Render the console report (`true` to enable) | off |
//! | `SAVE_SCREENSHOTS` | Export screenshot attachments to disk (`true`) | off |
//! | `UPDATE_TEST_RESULTS` | Push results to Zephyr after the run (`true`) | off |
//! | `ZEPHYR_API_URL` | Zephyr API base URL | empty |
//! | `ZEPHYR_API_KEY` | Zephyr bearer token | empty |
//! | `ZEPHYR_TEST_CYCLE_KEY` | Zephyr test cycle to update | empty |
//! | `ZEST_SYNC_PAUSE_SECS` | Pause after each Zephyr update | `3` |
//! | `ZEST_HTTP_CONNECT_TIMEOUT` | HTTP connect timeout in seconds | `10` |
//!
//! Boolean switches compare literally against the string `true`.

use std::env;
use std::sync::OnceLock;

// ============================================================================
// Default Values
// ============================================================================

/// Default output directory, relative to the process working directory
pub const DEFAULT_OUTPUT_DIR: &str = "test-results";

/// Default pause after each Zephyr update (seconds)
pub const DEFAULT_SYNC_PAUSE_SECS: u64 = 3;

/// Default HTTP connect timeout (seconds)
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Environment Variable Names
// ============================================================================

/// Environment variable for the output directory
pub const ENV_OUTPUT_DIR: &str = "ZEST_OUTPUT_DIR";

/// Environment variable enabling console rendering
pub const ENV_PRINT_RESULTS: &str = "PRINT_TEST_RESULTS";

/// Environment variable enabling screenshot export
pub const ENV_SAVE_SCREENSHOTS: &str = "SAVE_SCREENSHOTS";

/// Environment variable enabling Zephyr sync
pub const ENV_UPDATE_RESULTS: &str = "UPDATE_TEST_RESULTS";

/// Environment variable for the Zephyr API base URL
pub const ENV_ZEPHYR_API_URL: &str = "ZEPHYR_API_URL";

/// Environment variable for the Zephyr bearer token
pub const ENV_ZEPHYR_API_KEY: &str = "ZEPHYR_API_KEY";

/// Environment variable for the Zephyr test cycle key
pub const ENV_ZEPHYR_CYCLE_KEY: &str = "ZEPHYR_TEST_CYCLE_KEY";

/// Environment variable for the post-update pause
pub const ENV_SYNC_PAUSE: &str = "ZEST_SYNC_PAUSE_SECS";

/// Environment variable for the HTTP connect timeout
pub const ENV_CONNECT_TIMEOUT: &str = "ZEST_HTTP_CONNECT_TIMEOUT";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Centralized configuration for the reporting pipeline
#[derive(Debug, Clone)]
pub struct Config {
    /// Report output and console settings
    pub reporter: ReporterSettings,
    /// Screenshot export settings
    pub screenshots: ScreenshotSettings,
    /// Zephyr integration settings
    pub zephyr: ZephyrSettings,
}

/// Report output and console settings
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    /// Directory where the JSON report is written
    pub output_dir: String,
    /// Whether to render the console report
    pub print_to_console: bool,
}

/// Screenshot export settings
#[derive(Debug, Clone)]
pub struct ScreenshotSettings {
    /// Whether to write PNG attachments to disk
    pub save_to_disk: bool,
}

/// Zephyr integration settings
#[derive(Debug, Clone)]
pub struct ZephyrSettings {
    /// API base URL (e.g., "https://api.zephyrscale.example/v2/")
    pub api_url: String,
    /// Bearer token
    pub api_key: String,
    /// Test cycle whose executions are updated
    pub test_cycle_key: String,
    /// Whether to push results after the run
    pub update_results: bool,
    /// Pause after each execution update (seconds)
    pub sync_pause_secs: u64,
    /// HTTP connect timeout (seconds)
    pub connect_timeout_secs: u64,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            reporter: ReporterSettings::from_env(),
            screenshots: ScreenshotSettings::from_env(),
            zephyr: ZephyrSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            reporter: ReporterSettings::defaults(),
            screenshots: ScreenshotSettings::defaults(),
            zephyr: ZephyrSettings::defaults(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ReporterSettings {
    /// Create reporter settings from environment variables
    pub fn from_env() -> Self {
        Self {
            output_dir: env::var(ENV_OUTPUT_DIR)
                .unwrap_or_else(|_| DEFAULT_OUTPUT_DIR.to_string()),
            print_to_console: env_flag(ENV_PRINT_RESULTS),
        }
    }

    /// Create reporter settings with defaults
    pub fn defaults() -> Self {
        Self {
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            print_to_console: false,
        }
    }
}

impl ScreenshotSettings {
    /// Create screenshot settings from environment variables
    pub fn from_env() -> Self {
        Self {
            save_to_disk: env_flag(ENV_SAVE_SCREENSHOTS),
        }
    }

    /// Create screenshot settings with defaults
    pub fn defaults() -> Self {
        Self {
            save_to_disk: false,
        }
    }
}

impl ZephyrSettings {
    /// Create Zephyr settings from environment variables
    pub fn from_env() -> Self {
        Self {
            api_url: env::var(ENV_ZEPHYR_API_URL).unwrap_or_default(),
            api_key: env::var(ENV_ZEPHYR_API_KEY).unwrap_or_default(),
            test_cycle_key: env::var(ENV_ZEPHYR_CYCLE_KEY).unwrap_or_default(),
            update_results: env_flag(ENV_UPDATE_RESULTS),
            sync_pause_secs: env::var(ENV_SYNC_PAUSE)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_SYNC_PAUSE_SECS),
            connect_timeout_secs: env::var(ENV_CONNECT_TIMEOUT)
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_CONNECT_TIMEOUT_SECS),
        }
    }

    /// Create Zephyr settings with defaults
    pub fn defaults() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            test_cycle_key: String::new(),
            update_results: false,
            sync_pause_secs: DEFAULT_SYNC_PAUSE_SECS,
            connect_timeout_secs: DEFAULT_CONNECT_TIMEOUT_SECS,
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// A switch is on only when its variable is exactly "true".
fn env_flag(name: &str) -> bool {
    env::var(name).map(|v| v == "true").unwrap_or(false)
}

/// Get the report output directory (convenience function)
pub fn output_dir() -> String {
    get().reporter.output_dir.clone()
}

/// Whether the console report is enabled (convenience function)
pub fn print_results() -> bool {
    get().reporter.print_to_console
}

/// Whether screenshot export is enabled (convenience function)
pub fn save_screenshots() -> bool {
    get().screenshots.save_to_disk
}

/// Whether Zephyr sync is enabled (convenience function)
pub fn update_results() -> bool {
    get().zephyr.update_results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.reporter.output_dir, DEFAULT_OUTPUT_DIR);
        assert!(!config.reporter.print_to_console);
        assert!(!config.screenshots.save_to_disk);
        assert!(!config.zephyr.update_results);
        assert_eq!(config.zephyr.sync_pause_secs, DEFAULT_SYNC_PAUSE_SECS);
        assert_eq!(
            config.zephyr.connect_timeout_secs,
            DEFAULT_CONNECT_TIMEOUT_SECS
        );
    }

    #[test]
    fn test_env_flag_requires_exact_true() {
        // Unset variables are off.
        assert!(!env_flag("ZEST_FLAG_THAT_IS_NEVER_SET"));
    }
}
