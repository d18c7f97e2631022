//! User configuration at `~/.spoonkeeper/config.json`.
//!
//! Every field has a serde default, so a partial file (or no file at all)
//! yields a usable config.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::advice::AdviceConfig;
use crate::ledger::{DEFAULT_DAILY_TOTAL, MAX_DAILY_TOTAL, MIN_DAILY_TOTAL};

/// Environment variable that overrides `advice.apiKey`.
pub const ADVICE_API_KEY_ENV: &str = "SPOONKEEPER_ADVICE_API_KEY";

const DEFAULT_LOAD_TIMEOUT_SECS: u64 = 5;
const DEFAULT_RECOVERY_EXIT_DELAY_MS: u64 = 3500;

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_daily_total() -> u32 {
    DEFAULT_DAILY_TOTAL
}

fn default_load_timeout_secs() -> u64 {
    DEFAULT_LOAD_TIMEOUT_SECS
}

fn default_recovery_exit_delay_ms() -> u64 {
    DEFAULT_RECOVERY_EXIT_DELAY_MS
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// IANA timezone that decides where one day ends.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    /// Budget given to a brand-new ledger.
    #[serde(default = "default_daily_total")]
    pub default_daily_total: u32,
    #[serde(default = "default_load_timeout_secs")]
    pub load_timeout_secs: u64,
    #[serde(default = "default_recovery_exit_delay_ms")]
    pub recovery_exit_delay_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database_path: Option<PathBuf>,
    #[serde(default)]
    pub advice: AdviceConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timezone: default_timezone(),
            default_daily_total: default_daily_total(),
            load_timeout_secs: default_load_timeout_secs(),
            recovery_exit_delay_ms: default_recovery_exit_delay_ms(),
            database_path: None,
            advice: AdviceConfig::default(),
        }
    }
}

impl Config {
    /// Parsed timezone. Unknown names fall back to UTC.
    pub fn tz(&self) -> Tz {
        match self.timezone.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                log::warn!("Unknown timezone '{}', using UTC", self.timezone);
                Tz::UTC
            }
        }
    }

    /// Starting budget, bounded to what the catalog UI allows.
    pub fn daily_total(&self) -> u32 {
        self.default_daily_total.clamp(MIN_DAILY_TOTAL, MAX_DAILY_TOTAL)
    }

    pub fn load_timeout(&self) -> Duration {
        Duration::from_secs(self.load_timeout_secs)
    }

    pub fn recovery_exit_delay(&self) -> Duration {
        Duration::from_millis(self.recovery_exit_delay_ms)
    }
}

pub fn config_path() -> Result<PathBuf, String> {
    let home = dirs::home_dir().ok_or("Could not find home directory")?;
    Ok(home.join(".spoonkeeper").join("config.json"))
}

/// Load config from the default path, applying the environment key override.
pub fn load_config() -> Result<Config, String> {
    let path = config_path()?;
    let config = load_config_from(&path)?;
    Ok(apply_api_key_override(config, std::env::var(ADVICE_API_KEY_ENV).ok()))
}

/// Missing file gives defaults. A file that exists but does not parse is an error.
pub fn load_config_from(path: &Path) -> Result<Config, String> {
    if !path.exists() {
        log::info!("No config at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    let content =
        fs::read_to_string(path).map_err(|e| format!("Failed to read config: {}", e))?;
    let config: Config =
        serde_json::from_str(&content).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(config)
}

/// An environment key wins over the file.
pub fn apply_api_key_override(mut config: Config, env_key: Option<String>) -> Config {
    if let Some(key) = env_key.filter(|k| !k.trim().is_empty()) {
        config.advice.api_key = Some(key);
    }
    config
}

pub fn save_config(config: &Config) -> Result<(), String> {
    save_config_to(&config_path()?, config)
}

pub fn save_config_to(path: &Path, config: &Config) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config dir: {}", e))?;
        }
    }

    let content = serde_json::to_string_pretty(config)
        .map_err(|e| format!("Failed to serialize config: {}", e))?;
    fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}
