use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    Idle,
    AwaitingFirstFlip,
    AwaitingSecondFlip,
    ResolvingMatch,
    Complete,
}

impl RoundPhase {
    pub const fn is_complete(self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl Default for RoundPhase {
    fn default() -> Self {
        Self::Idle
    }
}

/// Why a flip request left the board untouched.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipRejection {
    NotStarted,
    UnknownCard,
    AlreadyFaceUp,
    AlreadyMatched,
    PairPending,
    HintActive,
    RoundComplete,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FlipOutcome {
    Rejected(FlipRejection),
    FirstFlipped,
    /// Second card of a move is up; the pair is compared at `resolve_at_ms`.
    PairFlipped { resolve_at_ms: u64 },
}

impl FlipOutcome {
    pub const fn has_update(self) -> bool {
        !matches!(self, Self::Rejected(_))
    }
}

/// Final numbers of a finished round, handed to the presentation layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundCompletion {
    pub level: Level,
    pub moves: u32,
    pub elapsed_ms: u64,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RoundEvent {
    PairResolved {
        first: CardId,
        second: CardId,
        matched: bool,
    },
    HintExpired,
    Completed(RoundCompletion),
}

#[derive(Clone, Debug, PartialEq)]
struct HintReveal {
    saved: Vec<CardFace>,
    expires_at_ms: u64,
}

/// State machine of a single round.
///
/// All time is passed in by the caller as epoch milliseconds. Deferred work
/// (pair resolution, the end of a hint reveal) sits in the round's own
/// [`TimerQueue`] and only runs from [`RoundEngine::advance`].
#[derive(Clone, Debug, PartialEq)]
pub struct RoundEngine {
    level: Level,
    deck: Deck,
    rules: RoundRules,
    phase: RoundPhase,
    unresolved: SmallVec<[usize; 2]>,
    moves: u32,
    matched_pairs: u32,
    hint: Option<HintReveal>,
    timers: TimerQueue,
    started_at_ms: u64,
    now_ms: u64,
    completion: Option<RoundCompletion>,
}

impl RoundEngine {
    pub fn new(level: Level, deck: Deck, rules: RoundRules) -> Self {
        let matched_pairs = (deck.matched_count() / 2) as u32;
        Self {
            level,
            deck,
            rules,
            phase: Default::default(),
            unresolved: SmallVec::new(),
            moves: 0,
            matched_pairs,
            hint: None,
            timers: TimerQueue::new(),
            started_at_ms: 0,
            now_ms: 0,
            completion: None,
        }
    }

    pub fn start(&mut self, now_ms: u64) {
        if self.phase != RoundPhase::Idle {
            return;
        }
        self.started_at_ms = now_ms;
        self.now_ms = now_ms;
        self.phase = RoundPhase::AwaitingFirstFlip;
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn matched_pairs(&self) -> u32 {
        self.matched_pairs
    }

    pub fn total_pairs(&self) -> u32 {
        self.deck.total_pairs() as u32
    }

    pub fn is_complete(&self) -> bool {
        self.phase.is_complete()
    }

    pub fn completion(&self) -> Option<RoundCompletion> {
        self.completion
    }

    pub fn hint_active(&self) -> bool {
        self.hint.is_some()
    }

    /// Whole seconds left on the hint reveal, rounded up.
    pub fn hint_seconds_remaining(&self) -> u64 {
        self.hint.as_ref().map_or(0, |hint| {
            hint.expires_at_ms.saturating_sub(self.now_ms).div_ceil(1000)
        })
    }

    pub fn unresolved(&self) -> impl Iterator<Item = CardId> + '_ {
        self.unresolved
            .iter()
            .map(|&position| self.deck.cards()[position].id)
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> impl Iterator<Item = &ScheduledTimer> {
        self.timers.iter()
    }

    pub fn elapsed_ms(&self) -> u64 {
        match self.completion {
            Some(completion) => completion.elapsed_ms,
            None => self.now_ms.saturating_sub(self.started_at_ms),
        }
    }

    pub fn flip(&mut self, card_id: CardId, now_ms: u64) -> FlipOutcome {
        use FlipOutcome::*;
        use FlipRejection::*;

        let rejection = if self.phase.is_complete() {
            Some(RoundComplete)
        } else if self.hint.is_some() {
            Some(HintActive)
        } else if self.phase == RoundPhase::Idle {
            Some(NotStarted)
        } else if self.unresolved.len() >= 2 {
            Some(PairPending)
        } else {
            None
        };
        if let Some(reason) = rejection {
            log::trace!("flip of card {card_id} rejected: {reason:?}");
            return Rejected(reason);
        }

        let Some(position) = self.deck.position_of(card_id) else {
            return Rejected(UnknownCard);
        };
        let card = &mut self.deck.cards_mut()[position];
        if card.is_matched {
            return Rejected(AlreadyMatched);
        }
        if card.is_flipped {
            return Rejected(AlreadyFaceUp);
        }

        card.is_flipped = true;
        self.unresolved.push(position);
        self.observe(now_ms);

        if self.unresolved.len() < 2 {
            self.phase = RoundPhase::AwaitingSecondFlip;
            return FirstFlipped;
        }

        self.moves += 1;
        self.phase = RoundPhase::ResolvingMatch;
        let resolve_at_ms = now_ms.saturating_add(self.rules.resolve_delay_ms);
        self.timers.schedule(TimerKind::ResolveMatch, resolve_at_ms);
        PairFlipped { resolve_at_ms }
    }

    pub fn can_reveal_hint(&self) -> bool {
        !self.phase.is_complete() && self.hint.is_none()
    }

    /// Turns every card face up until the reveal expires, returning the expiry
    /// time. The faces are captured before anything is changed so the expiry
    /// can put back exactly what was there.
    pub fn begin_hint_reveal(&mut self, now_ms: u64) -> Option<u64> {
        if !self.can_reveal_hint() {
            return None;
        }
        self.observe(now_ms);

        let saved = self.deck.cards().iter().map(Card::face).collect();
        for card in self.deck.cards_mut() {
            card.is_flipped = true;
        }

        let expires_at_ms = now_ms.saturating_add(self.rules.hint_reveal_ms());
        self.timers.schedule(TimerKind::HintExpiry, expires_at_ms);
        self.hint = Some(HintReveal {
            saved,
            expires_at_ms,
        });
        Some(expires_at_ms)
    }

    /// Runs every deferred callback due at `now_ms`.
    pub fn advance(&mut self, now_ms: u64) -> Vec<RoundEvent> {
        self.observe(now_ms);
        let mut events = Vec::new();

        while let Some(timer) = self.timers.pop_due(now_ms) {
            match timer.kind {
                TimerKind::ResolveMatch => {
                    // hold the comparison until the reveal is over
                    if let Some(hint) = &self.hint
                        && self.timers.is_scheduled(TimerKind::HintExpiry)
                    {
                        let held_until = hint.expires_at_ms;
                        self.timers.schedule(TimerKind::ResolveMatch, held_until);
                        continue;
                    }
                    self.resolve_pending(timer.due_ms, &mut events);
                }
                TimerKind::HintExpiry => {
                    if self.end_hint_reveal() {
                        events.push(RoundEvent::HintExpired);
                    }
                }
            }
        }

        events
    }

    /// Completes the round if every pair is matched. Only the first call that
    /// finds the board solved returns the completion.
    pub fn check_completion(&mut self) -> Option<RoundCompletion> {
        self.complete_if_solved(self.now_ms)
    }

    /// Drops every pending callback so nothing mutates the round after the
    /// player leaves it.
    pub fn cancel_timers(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        if cancelled > 0 {
            log::debug!("level {} left with {cancelled} pending timers", self.level);
        }
        cancelled
    }

    pub fn snapshot(&self) -> RoundSnapshot {
        let cards = self
            .deck
            .cards()
            .iter()
            .map(|card| CardView {
                id: card.id,
                icon: if card.is_face_up() {
                    self.deck.icon_name(card)
                } else {
                    HIDDEN_ICON
                },
                face_up: card.is_face_up(),
                matched: card.is_matched,
            })
            .collect();

        RoundSnapshot {
            level: self.level,
            grid: self.deck.grid(),
            cards,
            moves: self.moves,
            matched_pairs: self.matched_pairs,
            total_pairs: self.total_pairs(),
            phase: self.phase,
            hint_active: self.hint_active(),
            hint_seconds_remaining: self.hint_seconds_remaining(),
            complete: self.is_complete(),
        }
    }

    fn resolve_pending(&mut self, at_ms: u64, events: &mut Vec<RoundEvent>) {
        let [first, second] = self.unresolved[..] else {
            log::warn!("pair resolution fired with {} unresolved cards", self.unresolved.len());
            self.unresolved.clear();
            return;
        };
        self.unresolved.clear();

        let cards = self.deck.cards_mut();
        let matched = cards[first].icon == cards[second].icon;
        for position in [first, second] {
            if matched {
                cards[position].is_matched = true;
            } else {
                cards[position].is_flipped = false;
            }
        }
        events.push(RoundEvent::PairResolved {
            first: cards[first].id,
            second: cards[second].id,
            matched,
        });

        self.phase = RoundPhase::AwaitingFirstFlip;
        if matched {
            self.matched_pairs += 1;
            if let Some(completion) = self.complete_if_solved(at_ms) {
                events.push(RoundEvent::Completed(completion));
            }
        }
    }

    fn complete_if_solved(&mut self, at_ms: u64) -> Option<RoundCompletion> {
        if self.phase.is_complete() || self.matched_pairs < self.total_pairs() {
            return None;
        }

        self.phase = RoundPhase::Complete;
        let completion = RoundCompletion {
            level: self.level,
            moves: self.moves,
            elapsed_ms: at_ms.saturating_sub(self.started_at_ms),
        };
        self.completion = Some(completion);
        log::debug!(
            "level {} complete in {} moves, {} ms",
            completion.level,
            completion.moves,
            completion.elapsed_ms
        );
        Some(completion)
    }

    fn end_hint_reveal(&mut self) -> bool {
        let Some(hint) = self.hint.take() else {
            return false;
        };
        for (card, face) in self.deck.cards_mut().iter_mut().zip(hint.saved) {
            card.set_face(face);
        }
        true
    }

    fn observe(&mut self, now_ms: u64) {
        self.now_ms = self.now_ms.max(now_ms);
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    /// Icon name, or the hidden face while the card is down.
    pub icon: &'static str,
    pub face_up: bool,
    pub matched: bool,
}

/// Everything the presentation layer needs to draw one frame of a round.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RoundSnapshot {
    pub level: Level,
    pub grid: GridSize,
    pub cards: Vec<CardView>,
    pub moves: u32,
    pub matched_pairs: u32,
    pub total_pairs: u32,
    pub phase: RoundPhase,
    pub hint_active: bool,
    pub hint_seconds_remaining: u64,
    pub complete: bool,
}

impl RoundSnapshot {
    /// Header line: the hint countdown while a reveal runs, the score otherwise.
    pub fn status_line(&self) -> String {
        if self.hint_active && self.hint_seconds_remaining > 0 {
            format!("{}s", self.hint_seconds_remaining)
        } else {
            format!(
                "Moves: {} | Pairs: {}/{}",
                self.moves, self.matched_pairs, self.total_pairs
            )
        }
    }
}
