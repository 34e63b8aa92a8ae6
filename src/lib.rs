//! Vibe Farm: the engine of an emoji clicker game.
//!
//! The player earns vibes by clicking and from buildings, then opens a farm
//! where crops are grown, harvested into stock and turned into bio-vibes.
//! This crate holds the rules and the save format. Rendering lives in the
//! host, which drives a [`VibeGame`] through commands and per-frame calls.

pub mod actions;
pub mod catalog;
pub mod config;
pub mod economy;
pub mod effects;
pub mod game;
pub mod logic;
pub mod save;
pub mod scheduler;
pub mod state;
pub mod time;

pub use actions::Command;
pub use catalog::{BuildingId, MarketItemId, Rank, VeggieId, RANKS};
pub use config::{ConfigError, EngineConfig};
pub use effects::{BoundingBox, EffectSink, Observer, ScreenPoint};
pub use game::{LoopHandle, VibeGame};
pub use save::{FileStorage, MemoryStorage, SaveError, Storage, StorageError};
pub use scheduler::TickReport;
pub use state::{GameState, LogBook, LogEntry, Plot, PlotStage, Tone};
pub use time::{Clock, FrameClock, ManualClock, SystemClock};
