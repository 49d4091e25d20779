//! Sectioned configuration file (§6) — `campaign`, `logging`, `comms`, `scoring`.
//!
//! Reading the file off disk is the host-process's job (an external
//! collaborator per the design); this module only parses the section text
//! into typed, validated structs once it has been read, the way the teacher's
//! `rules/loader.rs` turns raw TOML tables into typed rule sets.

use std::collections::HashMap;

use crate::core::error::{CoreError, Result};

/// `[campaign]` section.
#[derive(Debug, Clone)]
pub struct CampaignConfig {
    /// Maximum infantry occupants per node; support ferries top nodes up to
    /// this and bases are seeded to it at stage 0.
    pub max_infantry: u32,
    /// Unit types the server may mint for dynamic red AA groups.
    pub aa_red: Vec<String>,
    /// Unit types the server may mint for dynamic blue AA groups.
    pub aa_blue: Vec<String>,
}

impl Default for CampaignConfig {
    fn default() -> Self {
        Self {
            max_infantry: 20,
            aa_red: vec!["Igla".to_string()],
            aa_blue: vec!["Chaparral".to_string()],
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// `tracing`-style filter directive, e.g. `"campaign_engine=info"`.
    pub level: String,
    /// Optional path to additionally write logs to.
    pub file: Option<String>,
}

/// `[comms]` section — the outbound webhook.
#[derive(Debug, Clone, Default)]
pub struct CommsConfig {
    pub webhook_url: Option<String>,
    pub username: String,
}

/// `[scoring]` section.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub per_reason: HashMap<String, f64>,
    pub unit_distance_max_multiplier: f64,
    pub unit_base_score: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        let mut per_reason = HashMap::new();
        per_reason.insert("player_eject".to_string(), 5.0);
        per_reason.insert("player_death".to_string(), 10.0);
        per_reason.insert("ai_eject".to_string(), 1.0);
        per_reason.insert("ai_death".to_string(), 2.0);
        Self {
            per_reason,
            unit_distance_max_multiplier: 0.5,
            unit_base_score: 1.0,
        }
    }
}

/// Snapshot compatibility floor. A persisted campaign whose
/// `software_version` compares lower than this is treated as
/// [`CoreError::IncompatibleSnapshot`] and discarded.
pub const DEFAULT_MINIMUM_VERSION: &str = "1.0.0.0";

#[derive(Debug, Clone)]
pub struct Config {
    pub campaign: CampaignConfig,
    pub logging: LoggingConfig,
    pub comms: CommsConfig,
    pub scoring: ScoringConfig,
    pub minimum_snapshot_version: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            campaign: CampaignConfig::default(),
            logging: LoggingConfig::default(),
            comms: CommsConfig::default(),
            scoring: ScoringConfig::default(),
            minimum_snapshot_version: DEFAULT_MINIMUM_VERSION.to_string(),
        }
    }
}

impl Config {
    /// Parse a sectioned config file's text. Missing sections fall back to
    /// defaults; a present section with an unparsable required key fails.
    pub fn from_str(text: &str) -> Result<Config> {
        let doc: toml::Value = text
            .parse()
            .map_err(|e| CoreError::Internal(format!("invalid config: {e}")))?;

        let mut config = Config::default();

        if let Some(campaign) = doc.get("campaign").and_then(|v| v.as_table()) {
            if let Some(n) = campaign.get("MAX_INFANTRY").and_then(|v| v.as_integer()) {
                config.campaign.max_infantry = n.max(0) as u32;
            }
            if let Some(list) = campaign.get("AA_RED").and_then(|v| v.as_array()) {
                config.campaign.aa_red = parse_string_array(list);
            }
            if let Some(list) = campaign.get("AA_BLUE").and_then(|v| v.as_array()) {
                config.campaign.aa_blue = parse_string_array(list);
            }
        }

        if let Some(logging) = doc.get("logging").and_then(|v| v.as_table()) {
            if let Some(level) = logging.get("level").and_then(|v| v.as_str()) {
                config.logging.level = level.to_string();
            }
            if let Some(file) = logging.get("file").and_then(|v| v.as_str()) {
                config.logging.file = Some(file.to_string());
            }
        }

        if let Some(comms) = doc.get("comms").and_then(|v| v.as_table()) {
            if let Some(url) = comms.get("webhook_url").and_then(|v| v.as_str()) {
                config.comms.webhook_url = Some(url.to_string());
            }
            if let Some(username) = comms.get("username").and_then(|v| v.as_str()) {
                config.comms.username = username.to_string();
            }
        }

        if let Some(scoring) = doc.get("scoring").and_then(|v| v.as_table()) {
            for (reason, amount) in scoring {
                if let Some(v) = amount.as_float() {
                    config.scoring.per_reason.insert(reason.clone(), v);
                } else if let Some(v) = amount.as_integer() {
                    config.scoring.per_reason.insert(reason.clone(), v as f64);
                }
            }
            if let Some(v) = scoring
                .get("UNIT_DISTANCE_MAX_MULTIPLIER")
                .and_then(|v| v.as_float())
            {
                config.scoring.unit_distance_max_multiplier = v;
            }
            if let Some(v) = scoring.get("UNIT_BASE_SCORE").and_then(|v| v.as_float()) {
                config.scoring.unit_base_score = v;
            }
        }

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.campaign.max_infantry == 0 {
            return Err(CoreError::Internal(
                "campaign.MAX_INFANTRY must be positive".into(),
            ));
        }
        if self.campaign.aa_red.is_empty() || self.campaign.aa_blue.is_empty() {
            return Err(CoreError::Internal(
                "campaign AA_RED/AA_BLUE must list at least one unit type".into(),
            ));
        }
        Ok(())
    }
}

fn parse_string_array(values: &[toml::Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| v.as_str().map(|s| s.to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn parses_campaign_section() {
        let text = r#"
            [campaign]
            MAX_INFANTRY = 24
            AA_RED = ["Igla", "Strela"]
            AA_BLUE = ["Chaparral"]

            [scoring]
            player_death = 12.5
            UNIT_BASE_SCORE = 2.0
        "#;
        let config = Config::from_str(text).unwrap();
        assert_eq!(config.campaign.max_infantry, 24);
        assert_eq!(config.campaign.aa_red, vec!["Igla", "Strela"]);
        assert_eq!(config.scoring.per_reason["player_death"], 12.5);
        assert_eq!(config.scoring.unit_base_score, 2.0);
    }
}
