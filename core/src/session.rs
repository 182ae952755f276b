use serde::Serialize;

use crate::*;

/// Global hint and reward-credit balances as last read from the progress store.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Balances {
    pub hints: u32,
    pub reward_credits: u32,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum HintOutcome {
    /// A reveal is already running or the round is over.
    Ignored,
    /// Out of hints, but a rewarded ad can buy more.
    OfferRewardedAd { reward_credits: u32 },
    /// Out of hints and reward credits.
    Unavailable,
    Revealing {
        hints_remaining: u32,
        expires_at_ms: u64,
    },
}

impl HintOutcome {
    pub const fn has_update(self) -> bool {
        matches!(self, Self::Revealing { .. })
    }
}

/// Where the host should go once a completed round is dismissed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NextLevel {
    Navigate(Level),
    /// An interstitial is on screen; navigate once it closes.
    AwaitInterstitialClose(Level),
    /// The last level was played.
    Finish,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    #[serde(flatten)]
    pub round: RoundSnapshot,
    pub hints: u32,
    pub reward_credits: u32,
}

impl SessionSnapshot {
    pub fn status_line(&self) -> String {
        self.round.status_line()
    }
}

/// One level being played: a [`RoundEngine`] wired to durable progress,
/// analytics and the ad providers.
///
/// The session reads the clock on every call, so the host only has to forward
/// taps and hint requests and call [`Session::tick`] at (or after)
/// [`Session::next_deadline`].
pub struct Session<'a, S, C> {
    progress: &'a ProgressStore<S, C>,
    analytics: &'a dyn AnalyticsSink,
    engine: RoundEngine,
    balances: Balances,
}

impl<'a, S: KeyValueStore, C: Clock> Session<'a, S, C> {
    pub async fn start(
        progress: &'a ProgressStore<S, C>,
        analytics: &'a dyn AnalyticsSink,
        rules: RoundRules,
        level: Level,
        generator: &mut impl DeckGenerator,
    ) -> Result<Self> {
        if level == 0 || level > progress.rules().total_levels {
            return Err(GameError::InvalidLevel(level));
        }
        let deck = generator.generate(level)?;
        let balances = Balances {
            hints: progress.global_hints().await.into_value(),
            reward_credits: progress.reward_remaining().await.into_value(),
        };

        let mut engine = RoundEngine::new(level, deck, rules);
        engine.start(progress.clock().now_millis());
        log::info!(
            "Level {level} started with {} pairs, {} hints, {} reward credits",
            engine.total_pairs(),
            balances.hints,
            balances.reward_credits
        );
        analytics.record(&AnalyticsEvent::LevelStart { level });

        Ok(Self {
            progress,
            analytics,
            engine,
            balances,
        })
    }

    pub fn level(&self) -> Level {
        self.engine.level()
    }

    pub fn engine(&self) -> &RoundEngine {
        &self.engine
    }

    pub fn balances(&self) -> Balances {
        self.balances
    }

    pub fn is_complete(&self) -> bool {
        self.engine.is_complete()
    }

    pub fn flip(&mut self, card_id: CardId) -> FlipOutcome {
        let now = self.now();
        self.engine.flip(card_id, now)
    }

    /// Runs whatever is due. A completion found here is persisted before the
    /// events are returned.
    pub async fn tick(&mut self) -> Vec<RoundEvent> {
        let now = self.now();
        let events = self.engine.advance(now);
        for event in &events {
            if let RoundEvent::Completed(completion) = event {
                self.record_completion(*completion).await;
            }
        }
        events
    }

    pub async fn request_hint(&mut self) -> HintOutcome {
        if !self.engine.can_reveal_hint() {
            return HintOutcome::Ignored;
        }

        self.balances.hints = self.progress.global_hints().await.into_value();
        if self.balances.hints == 0 {
            let reward_credits = self.progress.reward_remaining().await.into_value();
            self.balances.reward_credits = reward_credits;
            return if reward_credits > 0 {
                HintOutcome::OfferRewardedAd { reward_credits }
            } else {
                HintOutcome::Unavailable
            };
        }

        let hints_remaining = self.progress.use_global_hint().await.into_value();
        self.balances.hints = hints_remaining;
        let Some(expires_at_ms) = self.engine.begin_hint_reveal(self.now()) else {
            return HintOutcome::Ignored;
        };
        self.analytics.record(&AnalyticsEvent::HintUsed {
            level: self.level(),
            hint_count: hints_remaining,
        });
        HintOutcome::Revealing {
            hints_remaining,
            expires_at_ms,
        }
    }

    /// Shows the rewarded ad if it is ready, otherwise asks for a reload.
    pub fn show_rewarded_ad(&self, ad: &mut impl RewardedAdProvider) -> AdPresentation {
        if ad.is_loaded() {
            ad.show();
            return AdPresentation::Shown;
        }
        log::debug!("Rewarded ad not loaded, reloading");
        ad.load();
        AdPresentation::NOT_READY
    }

    /// Called by the host once the rewarded ad reports the reward.
    pub async fn on_reward_granted(&mut self) -> Balances {
        let bonus = self.progress.rules().hints_per_reward;
        let hints = self.progress.add_global_hints(bonus).await.into_value();
        let reward_credits = self.progress.use_reward().await.into_value();
        self.balances = Balances {
            hints,
            reward_credits,
        };
        log::info!("Reward granted, {hints} hints and {reward_credits} credits left");
        self.analytics.record(&AnalyticsEvent::RewardedAdWatched {
            level: self.level(),
            reward_type: "hints".to_string(),
        });
        self.balances
    }

    /// Decides how to leave a completed round: straight to the next level,
    /// through an interstitial when its cooldown allows, or out after the last
    /// level.
    pub async fn next_level(&mut self, ad: &mut impl InterstitialAdProvider) -> NextLevel {
        let level = self.level();
        if level >= self.progress.rules().total_levels {
            return NextLevel::Finish;
        }
        let next = level + 1;

        let due = self.progress.should_show_interstitial_ad().await.into_value();
        if due && ad.is_loaded() {
            let _ = self.progress.save_last_interstitial_ad_time().await;
            self.analytics
                .record(&AnalyticsEvent::InterstitialAdShown { level });
            ad.show();
            return NextLevel::AwaitInterstitialClose(next);
        }
        NextLevel::Navigate(next)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.engine.next_deadline()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            round: self.engine.snapshot(),
            hints: self.balances.hints,
            reward_credits: self.balances.reward_credits,
        }
    }

    /// Ends the session, dropping any pending resolution or hint timer.
    pub fn leave(mut self) -> usize {
        self.engine.cancel_timers()
    }

    async fn record_completion(&mut self, completion: RoundCompletion) {
        if self
            .progress
            .complete_level(completion.level)
            .await
            .is_degraded()
        {
            log::warn!("Completion of level {} may not have been saved", completion.level);
        }
        self.analytics.record(&AnalyticsEvent::LevelComplete {
            level: completion.level,
            moves: completion.moves,
            time_seconds: completion.elapsed_ms / 1000,
        });
    }

    fn now(&self) -> u64 {
        self.progress.clock().now_millis()
    }
}
