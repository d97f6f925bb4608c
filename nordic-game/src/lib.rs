//! Nordic Traveller Game Engine
//!
//! Platform-agnostic core of the Nordic Traveller board game: the city,
//! country and road network, the arrival economy, the travel clock and the
//! deterministic log that lets a seeded session be replayed exactly.
//! This crate does no file I/O; logs leave the engine through [`LogStorage`].

pub mod atlas;
pub mod city;
pub mod country;
pub mod game;
pub mod game_log;
pub mod network;
pub mod player;
pub mod position;
pub mod rng;
pub mod road;
pub mod settings;

use std::cell::RefCell;
use std::rc::Rc;
use thiserror::Error;

// Re-export commonly used types
pub use atlas::{Atlas, CityId, CountryId, Pixel};
pub use city::{City, CityKind, Traveller, toll};
pub use country::{Country, CountryKind, robbery_loss, standard_bonus};
pub use game::{Arrival, DEFAULT_TOTAL_TIME, Game, GameError, StepOutcome};
pub use game_log::{ABORT_MARKER, GameLog, LogError};
pub use network::{CityDef, CountryDef, NORDIC_NETWORK_JSON, NetworkDef, NetworkError, RoadDef};
pub use player::{Controller, Player, Strategy, TravelView};
pub use position::Position;
pub use rng::GameRng;
pub use road::Road;
pub use settings::{Settings, SettingsError, StrategyFlags, StrategyKind};

/// Errors raised by a [`LogStorage`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("log storage I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("log storage unavailable: {0}")]
    Unavailable(String),
}

/// Trait for abstracting where finished game logs are written
/// Platform-specific implementations should provide this
pub trait LogStorage {
    /// Persist the log of a finished game
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be written.
    fn save_log(&mut self, log: &GameLog) -> Result<(), StorageError>;
}

/// Keeps saved logs in memory. Clones share the same buffer, so a caller can
/// hand one clone to a [`Game`] and read the saves back through another.
#[derive(Debug, Clone, Default)]
pub struct MemoryLogStorage {
    saved: Rc<RefCell<Vec<String>>>,
}

impl MemoryLogStorage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every saved log in text form, oldest first.
    #[must_use]
    pub fn saved(&self) -> Vec<String> {
        self.saved.borrow().clone()
    }

    #[must_use]
    pub fn last(&self) -> Option<String> {
        self.saved.borrow().last().cloned()
    }
}

impl LogStorage for MemoryLogStorage {
    fn save_log(&mut self, log: &GameLog) -> Result<(), StorageError> {
        self.saved.borrow_mut().push(log.to_string());
        Ok(())
    }
}
