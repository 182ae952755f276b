use serde::{Deserialize, Serialize};

use crate::*;

pub const ANALYTICS_TARGET: &str = "twin_match::analytics";

/// Events reported while playing. Serialized with the event name under
/// `"event"` and the parameters alongside it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AnalyticsEvent {
    LevelStart {
        level: Level,
    },
    LevelComplete {
        level: Level,
        moves: u32,
        time_seconds: u64,
    },
    HintUsed {
        level: Level,
        hint_count: u32,
    },
    RewardedAdWatched {
        level: Level,
        reward_type: String,
    },
    InterstitialAdShown {
        level: Level,
    },
}

impl AnalyticsEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LevelStart { .. } => "level_start",
            Self::LevelComplete { .. } => "level_complete",
            Self::HintUsed { .. } => "hint_used",
            Self::RewardedAdWatched { .. } => "rewarded_ad_watched",
            Self::InterstitialAdShown { .. } => "interstitial_ad_shown",
        }
    }
}

/// Receiver of gameplay events. Recording must not fail the caller.
pub trait AnalyticsSink {
    fn record(&self, event: &AnalyticsEvent);
}

impl<A: AnalyticsSink + ?Sized> AnalyticsSink for &A {
    fn record(&self, event: &AnalyticsEvent) {
        (**self).record(event)
    }
}

/// Writes each event as one JSON line to the `log` facade.
#[derive(Copy, Clone, Debug, Default)]
pub struct LogAnalytics;

impl AnalyticsSink for LogAnalytics {
    fn record(&self, event: &AnalyticsEvent) {
        match serde_json::to_string(event) {
            Ok(json) => log::info!(target: ANALYTICS_TARGET, "{json}"),
            Err(err) => log::warn!(target: ANALYTICS_TARGET, "Dropped {}: {err}", event.name()),
        }
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct NoopAnalytics;

impl AnalyticsSink for NoopAnalytics {
    fn record(&self, _event: &AnalyticsEvent) {}
}
