use anyhow::{Context, Result, bail};
use nordic_game::{Controller, Game, GameLog, NetworkDef, Player, Position, Settings};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::roamer::Roamer;
use super::storage::FileLogStorage;

/// Money every player starts (and restarts) with.
pub const START_MONEY: i64 = 100;

/// Name of the interactive player.
pub const GUI_PLAYER: &str = "GUI";

/// Everything needed to set up identical games for a run and its replay.
#[derive(Debug, Clone)]
pub struct GameSetup {
    pub network: NetworkDef,
    pub settings: Settings,
    pub seed: u64,
    pub steps: u32,
    pub roamers: usize,
}

impl GameSetup {
    /// Fresh game with the interactive player and the roamers, not yet reset.
    pub fn build(&self) -> Result<Game> {
        let mut game = Game::from_network(&self.network, self.seed, self.settings)
            .context("network definition is invalid")?;
        let Some(first) = game.atlas().country_ids().first().copied() else {
            bail!("network defines no countries");
        };
        let Some(start) = game.atlas().cities_of(first).first().copied() else {
            bail!("country {} has no cities", game.atlas().country(first).map_or("?", |c| c.name()));
        };
        let start = Position::at(start);

        game.add_player(Player::new(GUI_PLAYER, start, Controller::Manual).with_money(START_MONEY));
        for index in 1..=self.roamers {
            game.add_player(
                Player::new(
                    &format!("Roamer {index}"),
                    start,
                    Controller::Auto(Box::new(Roamer)),
                )
                .with_money(START_MONEY),
            );
        }
        game.set_total_time(self.steps);
        Ok(game)
    }

    /// Same map and players, seed and settings taken from `log`.
    #[must_use]
    pub fn for_log(&self, log: &GameLog) -> Self {
        Self {
            seed: log.seed(),
            settings: *log.settings(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub money: i64,
    pub from: String,
    pub to: String,
    pub distance: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CitySummary {
    pub name: String,
    pub country: String,
    pub value: i64,
    pub initial_value: i64,
}

/// Observable end state of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    pub ticks_played: u32,
    pub aborted: bool,
    pub players: Vec<PlayerSummary>,
    pub cities: Vec<CitySummary>,
}

impl GameSummary {
    #[must_use]
    pub fn of(game: &Game) -> Self {
        let atlas = game.atlas();
        let players = game
            .players()
            .iter()
            .map(|player| {
                let position = player.position();
                PlayerSummary {
                    name: player.name().to_string(),
                    money: player.money(),
                    from: atlas.city_name(position.from()).to_string(),
                    to: atlas.city_name(position.to()).to_string(),
                    distance: position.distance(),
                }
            })
            .collect();
        let mut cities = Vec::new();
        for country in atlas.country_ids() {
            let country_name = atlas.country(*country).map_or("", |c| c.name());
            for id in atlas.cities_of(*country) {
                if let Some(city) = atlas.city(id) {
                    cities.push(CitySummary {
                        name: city.name().to_string(),
                        country: country_name.to_string(),
                        value: city.value(),
                        initial_value: city.initial_value(),
                    });
                }
            }
        }
        Self {
            seed: game.seed(),
            ticks_played: game.total_time() - game.steps_left(),
            aborted: game.is_aborted(),
            players,
            cities,
        }
    }
}

/// Result of re-serializing a parsed log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogVerification {
    pub seed: u64,
    pub choices: usize,
    pub header_matches: bool,
    pub choices_match: bool,
}

impl LogVerification {
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.header_matches && self.choices_match
    }
}

/// What one tester invocation did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TesterReport {
    pub mode: String,
    pub passed: bool,
    pub failures: Vec<String>,
    pub log_path: Option<String>,
    pub arrivals: usize,
    pub resets: usize,
    pub game: Option<GameSummary>,
    pub replay_matches: Option<bool>,
    pub verification: Option<LogVerification>,
}

impl TesterReport {
    fn new(mode: &str) -> Self {
        Self {
            mode: mode.to_string(),
            ..Self::default()
        }
    }

    fn fail(&mut self, failure: String) {
        log::warn!("{failure}");
        self.failures.push(failure);
    }

    fn finish(mut self) -> Self {
        self.passed = self.failures.is_empty();
        self
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct PlayStats {
    arrivals: usize,
    resets: usize,
}

/// Step `game` to the end, clicking the scripted cities at their ticks.
fn play_to_end(game: &mut Game, clicks: &BTreeMap<u32, String>) -> Result<PlayStats> {
    let mut stats = PlayStats::default();
    while game.ongoing() {
        let tick = game.current_tick();
        if let Some(name) = clicks.get(&tick) {
            let Some(city) = game.city_by_name(name) else {
                bail!("click at tick {tick} names unknown city {name:?}");
            };
            if !game.click_city(city) {
                log::debug!("tick {tick}: click on {name} changed nothing");
            }
        }
        let outcome = game.step();
        stats.arrivals += outcome.arrivals.len();
        stats.resets += outcome.resets.len();
    }
    Ok(stats)
}

/// Play a scripted game, save its log, then replay the saved file on a fresh
/// game and check both end in the same state.
pub fn run_scripted(
    setup: &GameSetup,
    clicks: &BTreeMap<u32, String>,
    save_path: &Path,
) -> Result<TesterReport> {
    let mut report = TesterReport::new("run");
    let mut game = setup.build()?;
    game.set_log_storage(Box::new(FileLogStorage::new(save_path)));
    game.reset(true, false);
    let stats = play_to_end(&mut game, clicks)?;
    let live = GameSummary::of(&game);
    report.arrivals = stats.arrivals;
    report.resets = stats.resets;
    report.log_path = Some(save_path.display().to_string());

    let text = fs::read_to_string(save_path)
        .with_context(|| format!("failed to read saved log {}", save_path.display()))?;
    let saved: GameLog = text.parse().context("saved log does not parse")?;
    if &saved != game.log() {
        report.fail("saved log differs from the game's log".to_string());
    }

    let replayed = replay(setup, saved)?;
    let matches = replayed == live;
    if !matches {
        report.fail(format!(
            "replay of seed {} diverged from the live game",
            live.seed
        ));
    }
    report.replay_matches = Some(matches);
    report.game = Some(live);
    Ok(report.finish())
}

/// Play `log` with the interactive player on a game built from `setup`.
pub fn replay(setup: &GameSetup, log: GameLog) -> Result<GameSummary> {
    let mut game = setup.for_log(&log).build()?;
    game.play_log(log).context("failed to start replay")?;
    play_to_end(&mut game, &BTreeMap::new())?;
    Ok(GameSummary::of(&game))
}

/// Load a log file and replay it.
pub fn replay_file(setup: &GameSetup, path: &Path) -> Result<TesterReport> {
    let mut report = TesterReport::new("replay");
    let log = load_log(path)?;
    report.log_path = Some(path.display().to_string());
    report.game = Some(replay(setup, log)?);
    Ok(report.finish())
}

/// Parse a log file, re-serialize it, and compare the two texts.
pub fn verify_file(path: &Path) -> Result<TesterReport> {
    let mut report = TesterReport::new("verify-log");
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read log {}", path.display()))?;
    let verification = verify_log_text(&text)?;
    if !verification.header_matches {
        report.fail("seed or settings lines change when re-serialized".to_string());
    }
    if !verification.choices_match {
        report.fail("choice lines change when re-serialized".to_string());
    }
    report.log_path = Some(path.display().to_string());
    report.verification = Some(verification);
    Ok(report.finish())
}

fn load_log(path: &Path) -> Result<GameLog> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read log {}", path.display()))?;
    text.parse()
        .with_context(|| format!("log {} is malformed", path.display()))
}

/// Header lines must survive byte-for-byte; choice lines as a multiset.
pub fn verify_log_text(text: &str) -> Result<LogVerification> {
    let log: GameLog = text.parse().context("log is malformed")?;
    let rendered = log.to_string();
    let original = lines(text);
    let again = lines(&rendered);
    let header = 1 + nordic_game::settings::SETTINGS_LINES;

    let header_matches = original.len() >= header && original[..header] == again[..header];
    let mut original_choices: Vec<&str> = original.iter().skip(header).copied().collect();
    let mut again_choices: Vec<&str> = again.iter().skip(header).copied().collect();
    original_choices.sort_unstable();
    again_choices.sort_unstable();

    Ok(LogVerification {
        seed: log.seed(),
        choices: log.len(),
        header_matches,
        choices_match: original_choices == again_choices,
    })
}

fn lines(text: &str) -> Vec<&str> {
    let mut lines: Vec<&str> = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line))
        .collect();
    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::clicks::parse_clicks;

    fn setup(seed: u64) -> GameSetup {
        GameSetup {
            network: NetworkDef::nordic().unwrap(),
            settings: Settings::default(),
            seed,
            steps: 30,
            roamers: 2,
        }
    }

    fn temp_log(label: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!(
            "nordic-runner-{label}-{}.log",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap_or_default()
                .as_nanos()
        ))
    }

    #[test]
    fn build_adds_interactive_player_and_roamers() {
        let game = setup(1).build().unwrap();
        assert_eq!(game.players().len(), 3);
        assert_eq!(game.gui_player().unwrap().name(), GUI_PLAYER);
        assert_eq!(game.total_time(), 30);
    }

    #[test]
    fn scripted_run_replays_identically() {
        let path = temp_log("run");
        let clicks = parse_clicks("1:Oslo,3:Copenhagen,5:Stockholm").unwrap();
        let report = run_scripted(&setup(2024), &clicks, &path).unwrap();
        assert!(report.passed, "failures: {:?}", report.failures);
        assert_eq!(report.replay_matches, Some(true));
        let game = report.game.unwrap();
        assert_eq!(game.ticks_played, 30);
        assert_eq!(game.players.len(), 3);

        let verify = verify_file(&path).unwrap();
        assert!(verify.passed);
    }

    #[test]
    fn unknown_click_city_is_an_error() {
        let path = temp_log("unknown");
        let clicks = parse_clicks("2:Atlantis").unwrap();
        let err = run_scripted(&setup(1), &clicks, &path).unwrap_err();
        assert!(err.to_string().contains("Atlantis"));
    }

    #[test]
    fn verification_ignores_choice_order() {
        let text = "7\ntoll 20\nrisk 20\nmin_robbery 10\nmax_robbery 50\nactive 1 1 1\n9 Oslo\n2 Bergen\n";
        let verification = verify_log_text(text).unwrap();
        assert!(verification.passed());
        assert_eq!(verification.seed, 7);
        assert_eq!(verification.choices, 2);
    }

    #[test]
    fn malformed_log_fails_verification() {
        assert!(verify_log_text("7\ntoll 200\n").is_err());
    }
}
