//! The game: atlas, players, the shared stream and the countdown clock.

use log::{debug, info, warn};
use serde::Serialize;
use thiserror::Error;

use crate::atlas::{Atlas, CityId, CountryId, Pixel};
use crate::city::CityKind;
use crate::country::{CountryKind, robbery_loss};
use crate::game_log::GameLog;
use crate::network::{NetworkDef, NetworkError};
use crate::player::{Controller, Player};
use crate::position::Position;
use crate::rng::GameRng;
use crate::settings::Settings;
use crate::{LogStorage, StorageError};

/// Ticks in a game unless changed with [`Game::set_total_time`].
pub const DEFAULT_TOTAL_TIME: u32 = 50;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("no interactive player to replay the log with")]
    NoInteractivePlayer,
}

/// Money changing hands when a player reaches a city.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arrival {
    pub player: String,
    pub city: CityId,
    pub city_name: String,
    pub delta: i64,
}

/// What happened during one [`Game::step`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StepOutcome {
    /// 1-based tick this step ran as; `None` when the game was already over.
    pub tick: Option<u32>,
    pub arrivals: Vec<Arrival>,
    /// Players sent back to their initial state after going broke.
    pub resets: Vec<String>,
    pub finished: bool,
}

pub struct Game {
    atlas: Atlas,
    players: Vec<Player>,
    rng: GameRng,
    seed: u64,
    settings: Settings,
    total_time: u32,
    time_left: u32,
    aborted: bool,
    log: GameLog,
    storage: Option<Box<dyn LogStorage>>,
}

impl std::fmt::Debug for Game {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Game")
            .field("seed", &self.seed)
            .field("settings", &self.settings)
            .field("players", &self.players)
            .field("time_left", &self.time_left)
            .field("aborted", &self.aborted)
            .finish_non_exhaustive()
    }
}

impl Game {
    #[must_use]
    pub fn new(seed: u64, settings: Settings) -> Self {
        Self {
            atlas: Atlas::new(),
            players: Vec::new(),
            rng: GameRng::from_seed(seed),
            seed,
            settings,
            total_time: DEFAULT_TOTAL_TIME,
            time_left: DEFAULT_TOTAL_TIME,
            aborted: false,
            log: GameLog::new(seed, settings),
            storage: None,
        }
    }

    /// Build a game over the map described by `def`.
    ///
    /// # Errors
    ///
    /// Returns an error if the definition does not describe a valid map.
    pub fn from_network(def: &NetworkDef, seed: u64, settings: Settings) -> Result<Self, NetworkError> {
        let mut game = Self::new(seed, settings);
        game.atlas = def.build()?;
        Ok(game)
    }

    #[must_use]
    pub const fn atlas(&self) -> &Atlas {
        &self.atlas
    }

    /// Register a country; see [`Atlas::add_country`].
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken.
    pub fn add_country(&mut self, name: &str, kind: CountryKind) -> Result<CountryId, NetworkError> {
        self.atlas.add_country(name, kind)
    }

    pub fn add_city(
        &mut self,
        country: CountryId,
        name: &str,
        value: i64,
        kind: CityKind,
    ) -> Option<CityId> {
        self.atlas.add_city(country, name, value, kind)
    }

    pub fn add_roads(&mut self, a: CityId, b: CityId, length: u32) {
        self.atlas.add_roads(a, b, length);
    }

    /// Connect two cities by name.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first unknown city.
    pub fn add_roads_by_name(&mut self, a: &str, b: &str, length: u32) -> Result<(), NetworkError> {
        self.atlas.add_roads_by_name(a, b, length)
    }

    #[must_use]
    pub fn city_by_name(&self, name: &str) -> Option<CityId> {
        self.atlas.city_by_name(name)
    }

    pub fn put_position(&mut self, city: CityId, pixel: Pixel) {
        self.atlas.put_position(city, pixel);
    }

    #[must_use]
    pub fn pixel_of(&self, city: CityId) -> Option<Pixel> {
        self.atlas.pixel_of(city)
    }

    /// Add a player, keeping players sorted by name.
    pub fn add_player(&mut self, player: Player) {
        self.players.push(player);
        self.players.sort();
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn player(&self, name: &str) -> Option<&Player> {
        self.players.iter().find(|player| player.name() == name)
    }

    /// The interactive player: the first with a manual or replay controller.
    #[must_use]
    pub fn gui_player(&self) -> Option<&Player> {
        self.players
            .iter()
            .find(|player| player.controller().is_interactive())
    }

    fn gui_player_mut(&mut self) -> Option<&mut Player> {
        self.players
            .iter_mut()
            .find(|player| player.controller().is_interactive())
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn log(&self) -> &GameLog {
        &self.log
    }

    #[must_use]
    pub const fn rng(&self) -> &GameRng {
        &self.rng
    }

    #[must_use]
    pub const fn steps_left(&self) -> u32 {
        self.time_left
    }

    #[must_use]
    pub const fn total_time(&self) -> u32 {
        self.total_time
    }

    /// Length of games started by the next [`Game::reset`].
    pub fn set_total_time(&mut self, total_time: u32) {
        self.total_time = total_time;
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    #[must_use]
    pub const fn ongoing(&self) -> bool {
        !self.aborted && self.time_left != 0
    }

    /// 1-based index of the tick the next step will run as.
    #[must_use]
    pub const fn current_tick(&self) -> u32 {
        self.total_time.saturating_sub(self.time_left) + 1
    }

    /// Where the final log goes when the clock runs out.
    pub fn set_log_storage(&mut self, storage: Box<dyn LogStorage>) {
        self.storage = Some(storage);
    }

    /// Hand the current log to the configured storage. Without storage this
    /// does nothing.
    ///
    /// # Errors
    ///
    /// Returns the storage's error when the write fails.
    pub fn save_log(&mut self) -> Result<(), StorageError> {
        match self.storage.as_mut() {
            Some(storage) => storage.save_log(&self.log),
            None => Ok(()),
        }
    }

    /// Robbery amount drawn from the shared stream with the current settings.
    pub fn loss(&mut self) -> i64 {
        robbery_loss(&self.settings, &mut self.rng)
    }

    /// Uniformly random country, then a uniformly random city of it in name
    /// order. `None` when that country has no cities or there are no
    /// countries at all.
    pub fn random_starting_position(&mut self) -> Option<Position> {
        let countries = self.atlas.country_ids();
        let country = countries[self.rng.index(countries.len())?];
        let cities = self.atlas.cities_of(country);
        let city = cities[self.rng.index(cities.len())?];
        Some(Position::at(city))
    }

    /// Send the interactive player towards `city` and record the choice.
    ///
    /// Only a click that changes where the player is heading is recorded, and
    /// only the first such click of a tick: later clicks in the same tick are
    /// ignored. Nothing happens once the game is over. Returns whether the
    /// click took effect.
    pub fn click_city(&mut self, city: CityId) -> bool {
        if !self.ongoing() {
            return false;
        }
        let tick = self.current_tick();
        let name = self.atlas.city_name(city).to_string();
        if self.log.choice(tick).is_some() {
            debug!("tick {tick}: ignored click on {name}, tick already has a choice");
            return false;
        }
        let Some(player) = self
            .players
            .iter_mut()
            .find(|player| player.controller().is_interactive())
        else {
            return false;
        };
        let before = (player.position(), player.country_from());
        player.travel_to(city, &self.atlas);
        if (player.position(), player.country_from()) == before {
            return false;
        }
        self.log.add(tick, &name);
        debug!("tick {tick}: clicked {name}");
        true
    }

    /// Stop the game before its next tick, recording the abort in the log.
    pub fn abort(&mut self) {
        if !self.ongoing() {
            return;
        }
        let tick = self.current_tick();
        self.log.abort(tick);
        self.aborted = true;
        info!("game aborted at tick {tick}");
    }

    /// Replay `log` with the interactive player: the log's seed and settings
    /// are adopted and the game restarts with that seed.
    ///
    /// # Errors
    ///
    /// Returns an error when no player is interactive.
    pub fn play_log(&mut self, log: GameLog) -> Result<(), GameError> {
        let seed = log.seed();
        let settings = *log.settings();
        let player = self.gui_player_mut().ok_or(GameError::NoInteractivePlayer)?;
        player.set_controller(Controller::Replay(log));
        self.seed = seed;
        self.settings = settings;
        info!("replaying log with seed {seed}");
        self.reset(true, false);
        Ok(())
    }

    /// Start over.
    ///
    /// Unless `repeat` is set a new seed is drawn from the current stream.
    /// Countries and players are reset and every player is placed in a random
    /// starting city. `remove_log` turns a replaying player back into a
    /// manual one.
    pub fn reset(&mut self, repeat: bool, remove_log: bool) {
        if !repeat {
            self.seed = self.rng.next_seed();
        }
        self.rng = GameRng::from_seed(self.seed);
        self.log = GameLog::new(self.seed, self.settings);
        self.time_left = self.total_time;
        self.aborted = false;

        if remove_log {
            for player in &mut self.players {
                if matches!(player.controller(), Controller::Replay(_)) {
                    player.set_controller(Controller::Manual);
                }
            }
        }

        self.atlas.reset();
        self.players.sort();
        for index in 0..self.players.len() {
            let start = self.random_starting_position();
            let player = &mut self.players[index];
            player.reset();
            if let Some(position) = start {
                player.set_position(position);
            }
        }
        info!(
            "game reset with seed {} for {} players",
            self.seed,
            self.players.len()
        );
    }

    /// Advance the clock one tick.
    ///
    /// A replaying player's choice for this tick is applied first. Players
    /// then move in name order; a player whose strategy is switched off in
    /// the settings sits the tick out. A player left with negative money is
    /// reset. The tick that runs the clock out saves the log.
    pub fn step(&mut self) -> StepOutcome {
        if !self.ongoing() {
            return StepOutcome::default();
        }
        let tick = self.current_tick();
        self.apply_replay_choice(tick);
        if self.aborted {
            return StepOutcome {
                tick: Some(tick),
                finished: true,
                ..StepOutcome::default()
            };
        }

        let mut outcome = StepOutcome {
            tick: Some(tick),
            ..StepOutcome::default()
        };
        for player in &mut self.players {
            if let Some(kind) = player.controller().strategy_kind()
                && !self.settings.is_active(kind)
            {
                continue;
            }
            if let Some((city, delta)) = player.step(&mut self.atlas, &self.settings, &mut self.rng)
            {
                let city_name = self.atlas.city_name(city).to_string();
                debug!(
                    "tick {tick}: {} arrived at {city_name} ({delta:+})",
                    player.name()
                );
                outcome.arrivals.push(Arrival {
                    player: player.name().to_string(),
                    city,
                    city_name,
                    delta,
                });
            }
            if player.money() < 0 {
                debug!("tick {tick}: {} went broke", player.name());
                player.reset();
                outcome.resets.push(player.name().to_string());
            }
        }

        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            outcome.finished = true;
            if let Err(err) = self.save_log() {
                warn!("unable to save log: {err}");
            }
        }
        outcome
    }

    fn apply_replay_choice(&mut self, tick: u32) {
        let Some(log) = self
            .gui_player()
            .and_then(|player| player.controller().replay_log())
        else {
            return;
        };
        let choice = log.choice(tick).map(str::to_string);
        let aborts = log.aborted_at() == Some(tick);
        if let Some(choice) = choice {
            match self.atlas.city_by_name(&choice) {
                Some(city) => {
                    self.click_city(city);
                }
                None => warn!("tick {tick}: replayed choice {choice:?} is not a city"),
            }
        }
        if aborts {
            self.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryLogStorage;
    use crate::player::{Strategy, TravelView};
    use crate::settings::{StrategyFlags, StrategyKind};

    #[derive(Debug)]
    struct Stay;

    impl Strategy for Stay {
        fn kind(&self) -> StrategyKind {
            StrategyKind::Random
        }

        fn choose(&mut self, _view: &TravelView<'_>, _rng: &mut GameRng) -> Option<CityId> {
            None
        }
    }

    fn small_game(seed: u64, settings: Settings) -> Game {
        let mut game = Game::new(seed, settings);
        let denmark = game.add_country("Denmark", CountryKind::Standard).unwrap();
        let sweden = game.add_country("Sweden", CountryKind::Mafia).unwrap();
        let cph = game
            .add_city(denmark, "Copenhagen", 300, CityKind::Capital)
            .unwrap();
        let odense = game.add_city(denmark, "Odense", 60, CityKind::Plain).unwrap();
        let malmo = game.add_city(sweden, "Malmö", 100, CityKind::Border).unwrap();
        game.add_roads(cph, odense, 2);
        game.add_roads(cph, malmo, 1);
        game.add_player(Player::new("GUI", Position::at(cph), Controller::Manual).with_money(100));
        game
    }

    #[test]
    fn clock_counts_down_and_stops() {
        let mut game = small_game(7, Settings::default());
        game.set_total_time(3);
        game.reset(true, false);
        assert_eq!(game.steps_left(), 3);
        assert_eq!(game.step().tick, Some(1));
        assert_eq!(game.step().tick, Some(2));
        let last = game.step();
        assert_eq!(last.tick, Some(3));
        assert!(last.finished);
        assert!(!game.ongoing());
        assert_eq!(game.step(), StepOutcome::default());
        assert_eq!(game.steps_left(), 0);
    }

    #[test]
    fn final_tick_saves_log() {
        let mut game = small_game(7, Settings::default());
        let storage = MemoryLogStorage::new();
        game.set_log_storage(Box::new(storage.clone()));
        game.set_total_time(2);
        game.reset(true, false);
        let malmo = game.city_by_name("Malmö").unwrap();
        game.click_city(malmo);
        game.step();
        assert!(storage.last().is_none());
        game.step();
        let saved = storage.last().unwrap();
        assert_eq!(saved, game.log().to_string());
    }

    #[test]
    fn click_records_one_based_tick() {
        let mut game = small_game(1, Settings::default());
        game.reset(true, false);
        let cph = game.city_by_name("Copenhagen").unwrap();
        let odense = game.city_by_name("Odense").unwrap();
        game.players[0].set_position(Position::at(cph));
        assert!(game.click_city(odense));
        game.step();
        game.step();
        game.click_city(odense);
        assert_eq!(game.log().choice(1), Some("Odense"));
        assert_eq!(game.log().choice(3), Some("Odense"));
    }

    #[test]
    fn abort_stops_future_ticks() {
        let mut game = small_game(1, Settings::default());
        game.reset(true, false);
        game.step();
        game.abort();
        assert!(!game.ongoing());
        assert!(game.is_aborted());
        assert_eq!(game.log().aborted_at(), Some(2));
        let left = game.steps_left();
        assert_eq!(game.step(), StepOutcome::default());
        assert_eq!(game.steps_left(), left);
    }

    #[test]
    fn only_first_effective_click_of_a_tick_is_recorded() {
        let mut game = small_game(1, Settings::default());
        game.reset(true, false);
        let cph = game.city_by_name("Copenhagen").unwrap();
        let odense = game.city_by_name("Odense").unwrap();
        let malmo = game.city_by_name("Malmö").unwrap();
        game.players[0].set_position(Position::at(cph));

        assert!(game.click_city(odense));
        let heading = game.gui_player().unwrap().position();
        assert!(!game.click_city(malmo));
        assert_eq!(game.gui_player().unwrap().position(), heading);
        assert_eq!(game.log().choice(1), Some("Odense"));
        assert_eq!(game.log().len(), 1);
    }

    #[test]
    fn click_that_changes_nothing_is_not_recorded() {
        let mut game = small_game(1, Settings::default());
        game.reset(true, false);
        let cph = game.city_by_name("Copenhagen").unwrap();
        let odense = game.city_by_name("Odense").unwrap();
        let malmo = game.city_by_name("Malmö").unwrap();
        game.players[0].set_position(Position::new(cph, odense, 2));

        assert!(!game.click_city(malmo));
        assert!(game.log().is_empty());
        assert!(game.click_city(cph));
        assert_eq!(game.log().choice(1), Some("Copenhagen"));
    }

    #[test]
    fn clicks_after_the_game_ends_are_ignored() {
        let mut game = small_game(1, Settings::default());
        game.reset(true, false);
        let cph = game.city_by_name("Copenhagen").unwrap();
        let odense = game.city_by_name("Odense").unwrap();
        game.players[0].set_position(Position::at(cph));
        game.step();
        game.abort();
        let position = game.gui_player().unwrap().position();
        assert!(!game.click_city(odense));
        assert_eq!(game.gui_player().unwrap().position(), position);
        assert_eq!(game.log().choice(2), None);
        assert_eq!(game.log().aborted_at(), Some(2));

        let mut game = small_game(1, Settings::default());
        game.set_total_time(1);
        game.reset(true, false);
        game.players[0].set_position(Position::at(cph));
        game.step();
        assert!(!game.ongoing());
        assert!(!game.click_city(odense));
        assert!(game.log().is_empty());
    }

    #[test]
    fn reset_with_new_seed_draws_from_stream() {
        let mut game = small_game(1, Settings::default());
        let expected = GameRng::from_seed(1).next_seed();
        game.reset(false, false);
        assert_eq!(game.seed(), expected);
        assert_eq!(game.log().seed(), expected);
    }

    #[test]
    fn repeated_reset_places_players_identically() {
        let mut game = small_game(11, Settings::default());
        game.reset(true, false);
        let first = game.players()[0].position();
        game.reset(true, false);
        assert_eq!(game.players()[0].position(), first);
        assert!(first.has_arrived());
    }

    #[test]
    fn disabled_strategy_sits_out() {
        let settings = Settings::new(20, 20, 10, 50, StrategyFlags::all())
            .unwrap()
            .with_active(StrategyKind::Random, false);
        let mut game = small_game(3, settings);
        let odense = game.city_by_name("Odense").unwrap();
        game.add_player(Player::new(
            "Random",
            Position::new(odense, game.city_by_name("Copenhagen").unwrap(), 1),
            Controller::Auto(Box::new(Stay)),
        ));
        game.step();
        let random = game.player("Random").unwrap();
        assert_eq!(random.position().distance(), 1);
        assert_eq!(random.money(), 0);
    }

    #[test]
    fn broke_player_is_reset() {
        let settings = Settings::new(100, 100, 10, 50, StrategyFlags::all()).unwrap();
        let mut game = small_game(5, settings);
        let cph = game.city_by_name("Copenhagen").unwrap();
        let malmo = game.city_by_name("Malmö").unwrap();
        game.add_player(
            Player::new("Traveller", Position::new(cph, malmo, 1), Controller::Manual)
                .with_money(40),
        );
        let outcome = game.step();
        let arrival = outcome
            .arrivals
            .iter()
            .find(|arrival| arrival.player == "Traveller")
            .unwrap();
        assert_eq!(arrival.city, malmo);
        assert!((-90..=-50).contains(&arrival.delta));
        assert_eq!(outcome.resets, ["Traveller"]);
        let player = game.player("Traveller").unwrap();
        assert_eq!(player.money(), 40);
        assert_eq!(player.position(), Position::new(cph, malmo, 1));
        assert_eq!(game.atlas().city(malmo).unwrap().value(), 140);
    }

    #[test]
    fn play_log_requires_interactive_player() {
        let mut game = Game::new(1, Settings::default());
        let log = GameLog::new(1, Settings::default());
        assert_eq!(game.play_log(log), Err(GameError::NoInteractivePlayer));
    }

    #[test]
    fn loss_uses_robbery_bounds() {
        let settings = Settings::new(20, 20, 15, 15, StrategyFlags::all()).unwrap();
        let mut game = Game::new(2, settings);
        assert_eq!(game.loss(), 15);
        assert_eq!(game.rng().draws(), 1);
    }

    #[test]
    fn starting_position_needs_a_map() {
        let mut game = Game::new(2, Settings::default());
        assert_eq!(game.random_starting_position(), None);
        assert_eq!(game.rng().draws(), 0);
    }
}
