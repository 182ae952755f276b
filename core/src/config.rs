use serde::{Deserialize, Serialize};

use crate::*;

/// Tunables of the game. Every field has a default, so a rules file only needs
/// to name what it changes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameRules {
    pub round: RoundRules,
    pub progress: ProgressRules,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundRules {
    /// How long two face-up cards stay visible before they are compared.
    pub resolve_delay_ms: u64,
    /// Length of the full-board reveal a hint buys.
    pub hint_reveal_secs: u64,
}

impl RoundRules {
    pub const fn hint_reveal_ms(&self) -> u64 {
        self.hint_reveal_secs.saturating_mul(1000)
    }
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            resolve_delay_ms: 1000,
            hint_reveal_secs: 10,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressRules {
    /// Prefix put in front of every persisted key.
    pub namespace: String,
    pub starting_hints: u32,
    pub starting_reward_credits: u32,
    pub hints_per_reward: u32,
    /// Completing a level below this one unlocks its successor.
    pub max_progression_level: Level,
    pub total_levels: Level,
    pub interstitial_cooldown_ms: u64,
}

impl Default for ProgressRules {
    fn default() -> Self {
        Self {
            namespace: "@twin_match:".to_string(),
            starting_hints: 3,
            starting_reward_credits: 3,
            hints_per_reward: 3,
            max_progression_level: 30,
            total_levels: 200,
            interstitial_cooldown_ms: 5 * 60 * 1000,
        }
    }
}

impl GameRules {
    pub fn from_toml_str(raw: &str) -> core::result::Result<Self, ConfigError> {
        let rules: Self = toml::from_str(raw)?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.round.resolve_delay_ms == 0 {
            return Err(ConfigError::Invalid("round.resolve_delay_ms must be positive"));
        }
        if self.round.hint_reveal_secs == 0 {
            return Err(ConfigError::Invalid("round.hint_reveal_secs must be positive"));
        }
        if self.progress.total_levels == 0 {
            return Err(ConfigError::Invalid("progress.total_levels must be positive"));
        }
        if self.progress.max_progression_level > self.progress.total_levels {
            return Err(ConfigError::Invalid(
                "progress.max_progression_level cannot exceed progress.total_levels",
            ));
        }
        if self.progress.namespace.is_empty() {
            return Err(ConfigError::Invalid("progress.namespace cannot be empty"));
        }
        if self.progress.max_progression_level < self.progress.total_levels {
            log::warn!(
                "Levels {} to {} never unlock their successor on completion",
                self.progress.max_progression_level,
                self.progress.total_levels
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let rules = GameRules::from_toml_str("").unwrap();

        assert_eq!(rules, GameRules::default());
        assert_eq!(rules.round.hint_reveal_ms(), 10_000);
        assert_eq!(rules.progress.interstitial_cooldown_ms, 300_000);
    }

    #[test]
    fn partial_sections_override_only_named_fields() {
        let rules = GameRules::from_toml_str(
            r#"
            [round]
            hint_reveal_secs = 5

            [progress]
            starting_hints = 1
            namespace = "test:"
            "#,
        )
        .unwrap();

        assert_eq!(rules.round.hint_reveal_secs, 5);
        assert_eq!(rules.round.resolve_delay_ms, 1000);
        assert_eq!(rules.progress.starting_hints, 1);
        assert_eq!(rules.progress.starting_reward_credits, 3);
        assert_eq!(rules.progress.namespace, "test:");
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            GameRules::from_toml_str("[round]\nresolve_delay_ms = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameRules::from_toml_str("[progress]\nmax_progression_level = 300"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            GameRules::from_toml_str("[round]\nresolve_delay_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
