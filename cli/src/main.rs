use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use futures::executor::block_on;
use tracing_subscriber::filter::LevelFilter;
use twin_match_core::{
    CardId, Clock, Deck, DeckGenerator, FlipOutcome, GameRules, Level, LogAnalytics, ManualClock,
    NextLevel, NoAds, ProgressStore, RandomDeckGenerator, RoundEvent, RoundSnapshot, Session,
    SystemClock,
};

mod file_store;

use file_store::FileStore;

type Progress<'a> = ProgressStore<&'a FileStore, &'a dyn Clock>;

#[derive(Parser, Debug)]
#[command(version, about = "Inspect and drive twin-match progress", long_about = None)]
struct Args {
    /// What log level to use
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,

    /// Progress file, created on first write
    #[arg(long, default_value = "twin-match-progress.json")]
    data: PathBuf,

    /// TOML file overriding the default rules
    #[arg(long)]
    rules: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show unlocked and completed levels and the hint and reward balances
    Status,
    /// Forget levels and balances, keeping the interstitial cooldown
    Reset,
    /// Record a level as completed without playing it
    Complete { level: Level },
    /// Print the deck a level is dealt
    Deck {
        level: Level,
        /// Force a seed instead of random
        #[arg(short, long)]
        seed: Option<u64>,
    },
    /// Let a bot play a level on a simulated clock
    Play {
        level: Level,
        /// Force a seed instead of random
        #[arg(short, long)]
        seed: Option<u64>,
        /// Spend a hint before the first flip
        #[arg(long)]
        hint: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_max_level(level_filter(args.verbose.log_level_filter()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let rules = load_rules(args.rules.as_deref())?;
    let backend = FileStore::open(&args.data)?;
    log::debug!("Using {}", backend.path().display());

    match args.command {
        Command::Status => {
            let progress = Progress::new(&backend, &SystemClock, rules.progress.clone());
            block_on(status(&progress))
        }
        Command::Reset => {
            let progress = Progress::new(&backend, &SystemClock, rules.progress.clone());
            if block_on(progress.reset_progress()).is_degraded() {
                bail!("Progress was only partially reset");
            }
            println!("Progress reset");
            Ok(())
        }
        Command::Complete { level } => {
            check_level(&rules, level)?;
            let progress = Progress::new(&backend, &SystemClock, rules.progress.clone());
            if let Some(err) = block_on(progress.complete_level(level)).error() {
                bail!("Could not save completion of level {level}: {err}");
            }
            println!("Level {level} completed");
            Ok(())
        }
        Command::Deck { level, seed } => {
            check_level(&rules, level)?;
            let seed = pick_seed(seed);
            let deck = RandomDeckGenerator::new(seed).generate(level)?;
            println!(
                "Level {level}, seed {seed}, {}x{} grid",
                deck.grid().rows,
                deck.grid().cols
            );
            print_deck(&deck);
            Ok(())
        }
        Command::Play { level, seed, hint } => {
            check_level(&rules, level)?;
            block_on(play(&backend, &rules, level, pick_seed(seed), hint))
        }
    }
}

fn level_filter(filter: log::LevelFilter) -> LevelFilter {
    match filter {
        log::LevelFilter::Off => LevelFilter::OFF,
        log::LevelFilter::Error => LevelFilter::ERROR,
        log::LevelFilter::Warn => LevelFilter::WARN,
        log::LevelFilter::Info => LevelFilter::INFO,
        log::LevelFilter::Debug => LevelFilter::DEBUG,
        log::LevelFilter::Trace => LevelFilter::TRACE,
    }
}

fn load_rules(path: Option<&Path>) -> anyhow::Result<GameRules> {
    let Some(path) = path else {
        return Ok(GameRules::default());
    };
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Could not read rules from {}", path.display()))?;
    GameRules::from_toml_str(&raw).with_context(|| format!("Invalid rules in {}", path.display()))
}

fn check_level(rules: &GameRules, level: Level) -> anyhow::Result<()> {
    let total = rules.progress.total_levels;
    if level == 0 || level > total {
        bail!("Level must be between 1 and {total}");
    }
    Ok(())
}

fn pick_seed(seed: Option<u64>) -> u64 {
    let seed = seed.unwrap_or_else(rand::random);
    log::debug!("seed: {seed}");
    seed
}

async fn status(progress: &Progress<'_>) -> anyhow::Result<()> {
    let overview = progress.level_overview().await;
    if let Some(err) = overview.error() {
        log::warn!("Progress partially unreadable: {err}");
    }
    let overview = overview.into_value();

    let unlocked: Vec<Level> = overview
        .iter()
        .filter(|status| status.unlocked)
        .map(|status| status.level)
        .collect();
    let completed: Vec<Level> = overview
        .iter()
        .filter(|status| status.completed)
        .map(|status| status.level)
        .collect();

    println!("Unlocked:       {}", ranges(&unlocked));
    println!("Completed:      {}", ranges(&completed));
    println!("Hints:          {}", progress.global_hints().await.into_value());
    println!("Reward credits: {}", progress.reward_remaining().await.into_value());

    let last_ad = progress
        .last_interstitial_ad_time()
        .await
        .into_value()
        .and_then(|millis| chrono::DateTime::from_timestamp_millis(millis as i64))
        .map_or_else(|| "never".to_string(), |shown_at| shown_at.to_rfc3339());
    let due = progress.should_show_interstitial_ad().await.into_value();
    println!(
        "Interstitial:   last {last_ad}, {}",
        if due { "due" } else { "cooling down" }
    );
    Ok(())
}

fn print_deck(deck: &Deck) {
    for row in deck.as_grid().rows() {
        let line: Vec<String> = row
            .iter()
            .map(|card| format!("{:>2} {:<16}", card.id, deck.icon_name(card)))
            .collect();
        println!("{}", line.join(" ").trim_end());
    }
}

async fn play(
    backend: &FileStore,
    rules: &GameRules,
    level: Level,
    seed: u64,
    hint: bool,
) -> anyhow::Result<()> {
    let clock = ManualClock::new(SystemClock.now_millis());
    let progress = Progress::new(backend, &clock, rules.progress.clone());
    let analytics = LogAnalytics;
    let mut generator = RandomDeckGenerator::new(seed);
    let mut session =
        Session::start(&progress, &analytics, rules.round, level, &mut generator).await?;
    let mut bot = Bot::default();

    if hint {
        println!("Hint: {:?}", session.request_hint().await);
        bot.observe(&session.snapshot().round);
        while let Some(deadline) = session.next_deadline() {
            clock.set(deadline);
            report(&session.tick().await);
        }
    }

    let max_flips = session.engine().deck().len() * 4;
    let mut flips = 0;
    while !session.is_complete() {
        if flips > max_flips {
            bail!("Bot gave up on level {level} after {flips} flips");
        }

        let snapshot = session.snapshot().round;
        bot.observe(&snapshot);
        let first = match bot.known_pair() {
            Some(first) => first,
            None => bot.unseen(&snapshot).context("No card left to flip")?,
        };
        flip(&mut session, first)?;

        let snapshot = session.snapshot().round;
        bot.observe(&snapshot);
        let second = match bot.partner_of(first) {
            Some(second) => second,
            None => bot.unseen(&snapshot).context("No card left to flip")?,
        };
        flip(&mut session, second)?;
        bot.observe(&session.snapshot().round);
        flips += 2;

        if let Some(deadline) = session.next_deadline() {
            clock.set(deadline);
            report(&session.tick().await);
        }
        println!("{}", session.snapshot().status_line());
    }

    match session.next_level(&mut NoAds).await {
        NextLevel::Navigate(next) | NextLevel::AwaitInterstitialClose(next) => {
            println!("Next up: level {next}")
        }
        NextLevel::Finish => println!("That was the last level"),
    }
    session.leave();
    Ok(())
}

fn flip<S, C>(session: &mut Session<'_, S, C>, card: CardId) -> anyhow::Result<()>
where
    S: twin_match_core::KeyValueStore,
    C: Clock,
{
    match session.flip(card) {
        FlipOutcome::Rejected(reason) => bail!("Flip of card {card} rejected: {reason:?}"),
        _ => Ok(()),
    }
}

fn report(events: &[RoundEvent]) {
    for event in events {
        match event {
            RoundEvent::PairResolved {
                first,
                second,
                matched,
            } => println!(
                "{first:>3} + {second:<3} {}",
                if *matched { "match" } else { "miss" }
            ),
            RoundEvent::HintExpired => println!("Hint over"),
            RoundEvent::Completed(completion) => println!(
                "Level {} complete: {} moves in {} s",
                completion.level,
                completion.moves,
                completion.elapsed_ms / 1000
            ),
        }
    }
}

/// Remembers every face it has seen and plays the first pair it knows.
#[derive(Debug, Default)]
struct Bot {
    seen: BTreeMap<CardId, &'static str>,
}

impl Bot {
    fn observe(&mut self, snapshot: &RoundSnapshot) {
        for card in &snapshot.cards {
            if card.matched {
                self.seen.remove(&card.id);
            } else if card.face_up {
                self.seen.insert(card.id, card.icon);
            }
        }
    }

    fn known_pair(&self) -> Option<CardId> {
        self.seen
            .keys()
            .copied()
            .find(|&id| self.partner_of(id).is_some())
    }

    fn partner_of(&self, id: CardId) -> Option<CardId> {
        let icon = self.seen.get(&id)?;
        self.seen
            .iter()
            .find(|&(&other, other_icon)| other != id && other_icon == icon)
            .map(|(&other, _)| other)
    }

    fn unseen(&self, snapshot: &RoundSnapshot) -> Option<CardId> {
        snapshot
            .cards
            .iter()
            .find(|card| !card.face_up && !card.matched && !self.seen.contains_key(&card.id))
            .map(|card| card.id)
    }
}

/// Compacts sorted levels into `1-6, 9` form.
fn ranges(levels: &[Level]) -> String {
    let mut spans: Vec<(Level, Level)> = Vec::new();
    for &level in levels {
        match spans.last_mut() {
            Some((_, end)) if *end + 1 == level => *end = level,
            _ => spans.push((level, level)),
        }
    }
    if spans.is_empty() {
        return "none".to_string();
    }
    spans
        .iter()
        .map(|&(start, end)| {
            if start == end {
                start.to_string()
            } else {
                format!("{start}-{end}")
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}
