//! Players and what drives their destination choices.

use std::cmp::Ordering;
use std::fmt;

use crate::atlas::{Atlas, CityId, CountryId};
use crate::city::Traveller;
use crate::game_log::GameLog;
use crate::position::Position;
use crate::rng::GameRng;
use crate::settings::{Settings, StrategyKind};

/// Read-only snapshot handed to a [`Strategy`] when its player is idle.
#[derive(Debug, Clone, Copy)]
pub struct TravelView<'a> {
    pub atlas: &'a Atlas,
    pub position: Position,
    pub money: i64,
}

/// Decision policy of a computer-controlled player.
///
/// `choose` is only consulted once the player has arrived. It may draw from
/// the shared stream; those draws happen in the player's turn and so are part
/// of the replayed sequence.
pub trait Strategy: fmt::Debug {
    fn kind(&self) -> StrategyKind;

    fn choose(&mut self, view: &TravelView<'_>, rng: &mut GameRng) -> Option<CityId>;
}

/// What moves a player.
#[derive(Debug)]
pub enum Controller {
    /// Interactive player driven by city clicks.
    Manual,
    /// Interactive player fed the choices of a recorded game.
    Replay(GameLog),
    /// Computer player.
    Auto(Box<dyn Strategy>),
}

impl Controller {
    /// Manual and replay controllers stand for the interactive player.
    #[must_use]
    pub const fn is_interactive(&self) -> bool {
        matches!(self, Self::Manual | Self::Replay(_))
    }

    #[must_use]
    pub fn strategy_kind(&self) -> Option<StrategyKind> {
        match self {
            Self::Auto(strategy) => Some(strategy.kind()),
            Self::Manual | Self::Replay(_) => None,
        }
    }

    #[must_use]
    pub const fn replay_log(&self) -> Option<&GameLog> {
        match self {
            Self::Replay(log) => Some(log),
            Self::Manual | Self::Auto(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct Player {
    name: String,
    money: i64,
    initial_money: i64,
    position: Position,
    start: Position,
    /// Country the current leg started in; `None` until the first departure.
    country_from: Option<CountryId>,
    controller: Controller,
}

impl Player {
    #[must_use]
    pub fn new(name: &str, position: Position, controller: Controller) -> Self {
        Self {
            name: name.to_string(),
            money: 0,
            initial_money: 0,
            position,
            start: position,
            country_from: None,
            controller,
        }
    }

    /// Start (and restart after bankruptcy) with `money`.
    #[must_use]
    pub fn with_money(mut self, money: i64) -> Self {
        self.money = money;
        self.initial_money = money;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn money(&self) -> i64 {
        self.money
    }

    #[must_use]
    pub const fn initial_money(&self) -> i64 {
        self.initial_money
    }

    #[must_use]
    pub const fn position(&self) -> Position {
        self.position
    }

    #[must_use]
    pub const fn country_from(&self) -> Option<CountryId> {
        self.country_from
    }

    #[must_use]
    pub const fn controller(&self) -> &Controller {
        &self.controller
    }

    pub fn set_controller(&mut self, controller: Controller) {
        self.controller = controller;
    }

    /// Place the player. The position is also where a reset returns it to.
    pub fn set_position(&mut self, position: Position) {
        self.position = position;
        self.start = position;
        self.country_from = None;
    }

    /// Back to the initial money and the last placed position.
    pub fn reset(&mut self) {
        self.money = self.initial_money;
        self.position = self.start;
        self.country_from = None;
    }

    /// Head for `dest`.
    ///
    /// In transit only a click on the city just left does anything: the
    /// player turns around. Once arrived, the leg starts from the current city
    /// and its country becomes the country of origin.
    pub fn travel_to(&mut self, dest: CityId, atlas: &Atlas) {
        if !self.position.has_arrived() {
            if dest == self.position.from() {
                self.position.turn_around();
            }
            return;
        }
        let here = self.position.to();
        self.country_from = atlas.country_of(here);
        self.position = atlas.ready_to_travel(here, dest);
    }

    /// The arrival view of this player. Before the first departure the
    /// country of the city the leg started from stands in as origin.
    #[must_use]
    pub fn traveller(&self, atlas: &Atlas) -> Option<Traveller> {
        let country_from = self
            .country_from
            .or_else(|| atlas.country_of(self.position.from()))?;
        Some(Traveller {
            money: self.money,
            country_from,
        })
    }

    /// One tick of travel: an idle computer player picks a destination, then
    /// the player moves one unit. Reaching the destination runs its arrival
    /// policy and returns the city with the money delta applied.
    pub fn step(
        &mut self,
        atlas: &mut Atlas,
        settings: &Settings,
        rng: &mut GameRng,
    ) -> Option<(CityId, i64)> {
        if self.position.has_arrived() {
            let choice = match &mut self.controller {
                Controller::Auto(strategy) => {
                    let view = TravelView {
                        atlas,
                        position: self.position,
                        money: self.money,
                    };
                    strategy.choose(&view, rng)
                }
                Controller::Manual | Controller::Replay(_) => None,
            };
            if let Some(dest) = choice {
                self.travel_to(dest, atlas);
            }
        }

        if !self.position.move_one() || !self.position.has_arrived() {
            return None;
        }
        let city = self.position.to();
        let traveller = self.traveller(atlas)?;
        let delta = atlas.arrive(city, &traveller, settings, rng)?;
        self.money += delta;
        Some((city, delta))
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Player {}

impl PartialOrd for Player {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Player {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name)
    }
}
