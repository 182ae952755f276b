//! Core of the twin-match memory game: deck generation, the per-round state
//! machine, and the persistent progress and reward economy.

pub use ads::*;
pub use analytics::*;
pub use card::*;
pub use clock::*;
pub use config::*;
pub use deck::*;
pub use engine::*;
pub use error::*;
pub use progress::*;
pub use session::*;
pub use storage::*;
pub use timer::*;
pub use types::*;

mod ads;
mod analytics;
mod card;
mod clock;
mod config;
mod deck;
mod engine;
mod error;
mod progress;
mod session;
mod storage;
mod timer;
mod types;
