//! Gentle advice from recent check-ins.
//!
//! The provider contract is infallible: every failure resolves to a fixed,
//! calm string that is displayed verbatim.

pub mod client;
pub mod prompts;

use std::time::Duration;

use async_trait::async_trait;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::types::CheckIn;

use self::client::AdviceClient;

/// How many check-ins (newest first) the advice service looks at.
pub const MAX_INSIGHT_CHECK_INS: usize = 5;

pub const NOT_CONFIGURED: &str = "Advice isn't set up yet.";
pub const WAITING_FOR_DATA: &str = "Waiting for a check-in before looking for patterns...";
pub const UNAVAILABLE: &str = "Insight is unavailable for a moment.";
pub const GENTLE_DEFAULT: &str = "Take gentle care of yourself today.";

/// Advice service configuration stored in ~/.spoonkeeper/config.json.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdviceConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}

fn default_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_timeout_secs() -> u64 {
    20
}

impl Default for AdviceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            api_key: None,
            model: default_model(),
            endpoint: default_endpoint(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// The key must never reach a log line.
impl std::fmt::Debug for AdviceConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdviceConfig")
            .field("enabled", &self.enabled)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AdviceConfig {
    /// Key to use, if any. Blank keys count as missing.
    pub fn usable_key(&self) -> Option<&str> {
        if !self.enabled {
            return None;
        }
        self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[async_trait]
pub trait AdviceProvider: Send + Sync {
    /// `recent` is newest first, at most `MAX_INSIGHT_CHECK_INS` entries.
    async fn get_insight(&self, recent: &[CheckIn]) -> String;
}

/// Advice backed by the generative model, with fixed fallbacks.
pub struct GentleAdvisor {
    client: Option<AdviceClient>,
    timezone: Tz,
}

impl GentleAdvisor {
    pub fn new(config: &AdviceConfig, timezone: Tz) -> Self {
        let client = config.usable_key().map(|key| AdviceClient::new(key, config));
        if client.is_none() {
            log::info!("Advice service not configured; insights use the fallback text");
        }
        Self { client, timezone }
    }
}

#[async_trait]
impl AdviceProvider for GentleAdvisor {
    async fn get_insight(&self, recent: &[CheckIn]) -> String {
        let Some(client) = &self.client else {
            return NOT_CONFIGURED.to_string();
        };
        let Some(prompt) = prompts::build_insight_prompt(recent, self.timezone) else {
            return WAITING_FOR_DATA.to_string();
        };

        match client.generate(&prompt).await {
            Ok(text) if text.trim().is_empty() => GENTLE_DEFAULT.to_string(),
            Ok(text) => text.trim().to_string(),
            Err(e) => {
                log::warn!("Insight request failed: {}", e);
                UNAVAILABLE.to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_in() -> CheckIn {
        CheckIn {
            id: "c1".to_string(),
            timestamp: 1_770_890_400_000,
            sensory_load: 40,
            social_battery: 60,
            emotional_intensity: 20,
            physical_fatigue: 30,
            note: None,
        }
    }

    fn configured(endpoint: &str) -> AdviceConfig {
        AdviceConfig {
            api_key: Some("test-key".to_string()),
            endpoint: endpoint.to_string(),
            timeout_secs: 2,
            ..AdviceConfig::default()
        }
    }

    #[tokio::test]
    async fn test_missing_key_wins_over_empty_input() {
        let advisor = GentleAdvisor::new(&AdviceConfig::default(), Tz::UTC);
        assert_eq!(advisor.get_insight(&[]).await, NOT_CONFIGURED);
        assert_eq!(advisor.get_insight(&[check_in()]).await, NOT_CONFIGURED);
    }

    #[tokio::test]
    async fn test_empty_input_waits_for_data() {
        let advisor = GentleAdvisor::new(&configured("http://127.0.0.1:1"), Tz::UTC);
        assert_eq!(advisor.get_insight(&[]).await, WAITING_FOR_DATA);
    }

    #[tokio::test]
    async fn test_unreachable_service_resolves_to_apology() {
        let advisor = GentleAdvisor::new(&configured("http://127.0.0.1:1"), Tz::UTC);
        assert_eq!(advisor.get_insight(&[check_in()]).await, UNAVAILABLE);
    }

    #[test]
    fn test_blank_or_disabled_key_is_unusable() {
        let mut config = configured("http://x");
        assert_eq!(config.usable_key(), Some("test-key"));
        config.api_key = Some("   ".to_string());
        assert_eq!(config.usable_key(), None);
        config.api_key = Some("k".to_string());
        config.enabled = false;
        assert_eq!(config.usable_key(), None);
        assert!(!format!("{:?}", configured("http://x")).contains("test-key"));
    }
}
