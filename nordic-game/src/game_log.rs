//! Deterministic record of a game session.
//!
//! A log holds the seed, the settings, and every destination chosen by the
//! interactive player keyed by the 1-based tick it took effect in. Text form,
//! one line each, `\r\n` separated:
//!
//! ```text
//! <seed>
//! <five settings lines>
//! <tick> <city name>
//! ...
//! ```
//!
//! Header lines round-trip byte-for-byte; choice lines are written in tick
//! order but compared as a set, so input order does not matter. An abort is
//! its own `<tick> Aborted` line, written last; it may share a tick with the
//! choice made just before it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::settings::{SETTINGS_LINES, Settings, SettingsError};

/// Choice recorded when a game is aborted.
pub const ABORT_MARKER: &str = "Aborted";

/// Errors raised when log text cannot be parsed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LogError {
    #[error("log is empty; expected a seed on the first line")]
    MissingSeed,
    #[error("log seed is malformed: {line:?}")]
    InvalidSeed { line: String },
    #[error("log settings are corrupted: {0}")]
    Settings(#[from] SettingsError),
    #[error("log line {line_no} is not `<tick> <city>`: {line:?}")]
    MalformedChoice { line_no: usize, line: String },
    #[error("log line {line_no} has an invalid tick: {tick:?}")]
    InvalidTick { line_no: usize, tick: String },
    #[error("log line {line_no} repeats tick {tick}")]
    DuplicateTick { line_no: usize, tick: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLog {
    seed: u64,
    settings: Settings,
    choices: BTreeMap<u32, String>,
    aborted_at: Option<u32>,
}

impl GameLog {
    #[must_use]
    pub const fn new(seed: u64, settings: Settings) -> Self {
        Self {
            seed,
            settings,
            choices: BTreeMap::new(),
            aborted_at: None,
        }
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Record that `city` was chosen at `tick`, replacing an earlier choice
    /// for the same tick.
    pub fn add(&mut self, tick: u32, city: &str) {
        self.choices.insert(tick, city.to_string());
    }

    /// Record that the game was aborted at `tick`.
    pub fn abort(&mut self, tick: u32) {
        self.aborted_at = Some(tick);
    }

    /// Tick the game was aborted at, if it was.
    #[must_use]
    pub const fn aborted_at(&self) -> Option<u32> {
        self.aborted_at
    }

    /// City chosen at `tick`, if any.
    #[must_use]
    pub fn choice(&self, tick: u32) -> Option<&str> {
        self.choices.get(&tick).map(String::as_str)
    }

    /// All choices in tick order.
    pub fn choices(&self) -> impl Iterator<Item = (u32, &str)> {
        self.choices
            .iter()
            .map(|(tick, city)| (*tick, city.as_str()))
    }

    /// Recorded lines after the header, the abort included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.choices.len() + usize::from(self.aborted_at.is_some())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Parse the text form.
    ///
    /// # Errors
    ///
    /// Returns an error naming the malformed part: seed, a settings field, or
    /// the first bad choice line.
    pub fn parse(text: &str) -> Result<Self, LogError> {
        let mut lines: Vec<&str> = text
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            lines.pop();
        }

        let seed_line = lines.first().ok_or(LogError::MissingSeed)?;
        let seed: u64 = seed_line.parse().map_err(|_| LogError::InvalidSeed {
            line: (*seed_line).to_string(),
        })?;
        if seed.to_string() != *seed_line {
            return Err(LogError::InvalidSeed {
                line: (*seed_line).to_string(),
            });
        }

        let header_end = 1 + SETTINGS_LINES;
        let settings_lines = lines.get(1..header_end.min(lines.len())).unwrap_or(&[]);
        let settings = Settings::from_lines(settings_lines)?;

        let mut log = Self::new(seed, settings);
        for (line_no, line) in lines.iter().enumerate().skip(header_end) {
            let (tick, city) = parse_choice(line_no, line)?;
            if city == ABORT_MARKER {
                if log.aborted_at.is_some() {
                    return Err(LogError::DuplicateTick { line_no, tick });
                }
                log.abort(tick);
                continue;
            }
            if log.choices.contains_key(&tick) {
                return Err(LogError::DuplicateTick { line_no, tick });
            }
            log.add(tick, city);
        }
        Ok(log)
    }
}

fn parse_choice(line_no: usize, line: &str) -> Result<(u32, &str), LogError> {
    let (tick_text, city) = line
        .split_once(' ')
        .filter(|(_, city)| !city.is_empty())
        .ok_or_else(|| LogError::MalformedChoice {
            line_no,
            line: line.to_string(),
        })?;
    let invalid = || LogError::InvalidTick {
        line_no,
        tick: tick_text.to_string(),
    };
    let tick: u32 = tick_text.parse().map_err(|_| invalid())?;
    if tick.to_string() != tick_text {
        return Err(invalid());
    }
    Ok((tick, city))
}

impl fmt::Display for GameLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\r\n", self.seed)?;
        write!(f, "{}", self.settings)?;
        for (tick, city) in &self.choices {
            write!(f, "{tick} {city}\r\n")?;
        }
        if let Some(tick) = self.aborted_at {
            write!(f, "{tick} {ABORT_MARKER}\r\n")?;
        }
        Ok(())
    }
}

impl FromStr for GameLog {
    type Err = LogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    const SAMPLE: &str = "1234567\r\n\
        toll 20\r\n\
        risk 20\r\n\
        min_robbery 10\r\n\
        max_robbery 50\r\n\
        active 1 1 1\r\n\
        17 Odense\r\n\
        3 Copenhagen\r\n\
        9 Nykøbing\r\n\
        41 Ny Stad\r\n";

    fn split(text: &str) -> Vec<String> {
        text.replace('\r', "")
            .split('\n')
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn parse_then_render_preserves_header_and_choice_set() {
        let log: GameLog = SAMPLE.parse().unwrap();
        let rendered = log.to_string();

        let input = split(SAMPLE);
        let output = split(&rendered);
        assert_eq!(input.len(), output.len());
        assert_eq!(input[..6], output[..6]);
        let in_choices: HashSet<&String> = input[6..].iter().collect();
        let out_choices: HashSet<&String> = output[6..].iter().collect();
        assert_eq!(in_choices, out_choices);
        assert!(rendered.ends_with("\r\n"));
    }

    #[test]
    fn parsed_fields_are_accessible() {
        let log: GameLog = SAMPLE.parse().unwrap();
        assert_eq!(log.seed(), 1_234_567);
        assert_eq!(log.settings(), &Settings::default());
        assert_eq!(log.choice(3), Some("Copenhagen"));
        assert_eq!(log.choice(41), Some("Ny Stad"));
        assert_eq!(log.choice(4), None);
        assert_eq!(log.len(), 4);
        let ticks: Vec<u32> = log.choices().map(|(tick, _)| tick).collect();
        assert_eq!(ticks, [3, 9, 17, 41]);
    }

    #[test]
    fn header_only_log_has_no_choices() {
        let log = GameLog::new(99, Settings::default());
        let parsed: GameLog = log.to_string().parse().unwrap();
        assert!(parsed.is_empty());
        assert_eq!(parsed, log);
    }

    #[test]
    fn abort_is_recorded_as_marker() {
        let mut log = GameLog::new(5, Settings::default());
        log.add(2, "Aarhus");
        log.abort(7);
        assert_eq!(log.choice(7), None);
        assert_eq!(log.aborted_at(), Some(7));
        assert_eq!(log.len(), 2);
        assert!(log.to_string().ends_with("2 Aarhus\r\n7 Aborted\r\n"));
    }

    #[test]
    fn abort_may_share_a_tick_with_a_choice() {
        let mut log = GameLog::new(5, Settings::default());
        log.add(4, "Aarhus");
        log.abort(4);
        let parsed: GameLog = log.to_string().parse().unwrap();
        assert_eq!(parsed, log);
        assert_eq!(parsed.choice(4), Some("Aarhus"));
        assert_eq!(parsed.aborted_at(), Some(4));
    }

    #[test]
    fn malformed_seed_is_reported() {
        let err = GameLog::parse("abc\r\ntoll 20\r\n").unwrap_err();
        assert_eq!(
            err,
            LogError::InvalidSeed {
                line: "abc".to_string()
            }
        );
        assert_eq!(GameLog::parse("\r\n").unwrap_err(), LogError::MissingSeed);
    }

    #[test]
    fn truncated_settings_are_reported() {
        let err = GameLog::parse("12\r\ntoll 20\r\nrisk 20\r\n").unwrap_err();
        assert_eq!(
            err,
            LogError::Settings(SettingsError::MissingLine {
                field: "min_robbery"
            })
        );
    }

    #[test]
    fn malformed_choices_are_reported() {
        let header = "12\r\ntoll 20\r\nrisk 20\r\nmin_robbery 10\r\nmax_robbery 50\r\nactive 1 1 1\r\n";

        let err = GameLog::parse(&format!("{header}Odense\r\n")).unwrap_err();
        assert_eq!(
            err,
            LogError::MalformedChoice {
                line_no: 6,
                line: "Odense".to_string()
            }
        );

        let err = GameLog::parse(&format!("{header}x Odense\r\n")).unwrap_err();
        assert!(matches!(err, LogError::InvalidTick { line_no: 6, .. }));

        let err = GameLog::parse(&format!("{header}4 Odense\r\n4 Aarhus\r\n")).unwrap_err();
        assert_eq!(err, LogError::DuplicateTick { line_no: 7, tick: 4 });

        let err = GameLog::parse(&format!("{header}4 Aborted\r\n6 Aborted\r\n")).unwrap_err();
        assert_eq!(err, LogError::DuplicateTick { line_no: 7, tick: 6 });
    }

    #[test]
    fn unix_line_endings_parse() {
        let unix = SAMPLE.replace("\r\n", "\n");
        let log: GameLog = unix.parse().unwrap();
        assert_eq!(log, SAMPLE.parse::<GameLog>().unwrap());
    }
}
