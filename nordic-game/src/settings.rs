//! Game settings and their five-line text form.
//!
//! The same text is used for the settings file and for lines 1-5 of a game
//! log, so rendering must reproduce a parsed line byte-for-byte.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub const DEFAULT_TOLL_PERCENT: u8 = 20;
pub const DEFAULT_RISK: u8 = 20;
pub const DEFAULT_MIN_ROBBERY: i64 = 10;
pub const DEFAULT_MAX_ROBBERY: i64 = 50;

/// Number of lines a settings block occupies.
pub const SETTINGS_LINES: usize = 5;

const FIELD_TOLL: &str = "toll";
const FIELD_RISK: &str = "risk";
const FIELD_MIN_ROBBERY: &str = "min_robbery";
const FIELD_MAX_ROBBERY: &str = "max_robbery";
const FIELD_ACTIVE: &str = "active";

/// Computer-controlled strategy families that settings can switch off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Random,
    Greedy,
    Smart,
}

impl StrategyKind {
    pub const ALL: [Self; 3] = [Self::Random, Self::Greedy, Self::Smart];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Random => "random",
            Self::Greedy => "greedy",
            Self::Smart => "smart",
        }
    }
}

/// Per-strategy enable flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyFlags {
    pub random: bool,
    pub greedy: bool,
    pub smart: bool,
}

impl StrategyFlags {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            random: true,
            greedy: true,
            smart: true,
        }
    }

    #[must_use]
    pub const fn is_active(self, kind: StrategyKind) -> bool {
        match kind {
            StrategyKind::Random => self.random,
            StrategyKind::Greedy => self.greedy,
            StrategyKind::Smart => self.smart,
        }
    }

    pub fn set(&mut self, kind: StrategyKind, active: bool) {
        match kind {
            StrategyKind::Random => self.random = active,
            StrategyKind::Greedy => self.greedy = active,
            StrategyKind::Smart => self.smart = active,
        }
    }
}

impl Default for StrategyFlags {
    fn default() -> Self {
        Self::all()
    }
}

/// Errors raised when settings values or their text form are invalid.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettingsError {
    #[error("settings line `{field}` is missing")]
    MissingLine { field: &'static str },
    #[error("settings line `{field}` is malformed: {line:?}")]
    MalformedLine { field: &'static str, line: String },
    #[error("{field} must be between {min} and {max} (got {value})")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        value: i64,
    },
    #[error("robbery bounds invalid (min {min} > max {max})")]
    RobberyBounds { min: i64, max: i64 },
    #[error("settings line `{field}` is not in canonical form: {line:?}")]
    NonCanonical { field: &'static str, line: String },
}

/// Read-only economic knobs for a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Settings {
    toll_percent: u8,
    risk: u8,
    min_robbery: i64,
    max_robbery: i64,
    active: StrategyFlags,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            toll_percent: DEFAULT_TOLL_PERCENT,
            risk: DEFAULT_RISK,
            min_robbery: DEFAULT_MIN_ROBBERY,
            max_robbery: DEFAULT_MAX_ROBBERY,
            active: StrategyFlags::all(),
        }
    }
}

impl Settings {
    /// Build validated settings.
    ///
    /// # Errors
    ///
    /// Returns an error if a percentage exceeds 100, a robbery bound is
    /// negative, or the minimum robbery exceeds the maximum.
    pub fn new(
        toll_percent: u8,
        risk: u8,
        min_robbery: i64,
        max_robbery: i64,
        active: StrategyFlags,
    ) -> Result<Self, SettingsError> {
        check_range(FIELD_TOLL, i64::from(toll_percent), 0, 100)?;
        check_range(FIELD_RISK, i64::from(risk), 0, 100)?;
        check_range(FIELD_MIN_ROBBERY, min_robbery, 0, i64::from(i32::MAX))?;
        check_range(FIELD_MAX_ROBBERY, max_robbery, 0, i64::from(i32::MAX))?;
        if min_robbery > max_robbery {
            return Err(SettingsError::RobberyBounds {
                min: min_robbery,
                max: max_robbery,
            });
        }
        Ok(Self {
            toll_percent,
            risk,
            min_robbery,
            max_robbery,
            active,
        })
    }

    /// Percentage of a foreign traveller's money a border city collects.
    #[must_use]
    pub const fn toll_percent(&self) -> u8 {
        self.toll_percent
    }

    /// Mafia threshold: a `[1, 100]` roll at or below it is a robbery.
    #[must_use]
    pub const fn risk(&self) -> u8 {
        self.risk
    }

    #[must_use]
    pub const fn min_robbery(&self) -> i64 {
        self.min_robbery
    }

    #[must_use]
    pub const fn max_robbery(&self) -> i64 {
        self.max_robbery
    }

    #[must_use]
    pub const fn active(&self) -> StrategyFlags {
        self.active
    }

    #[must_use]
    pub const fn is_active(&self, kind: StrategyKind) -> bool {
        self.active.is_active(kind)
    }

    /// Copy of these settings with one strategy switched on or off.
    #[must_use]
    pub fn with_active(mut self, kind: StrategyKind, active: bool) -> Self {
        self.active.set(kind, active);
        self
    }

    /// Canonical text lines, in file order.
    #[must_use]
    pub fn to_lines(&self) -> [String; SETTINGS_LINES] {
        let flag = |on: bool| if on { '1' } else { '0' };
        [
            format!("{FIELD_TOLL} {}", self.toll_percent),
            format!("{FIELD_RISK} {}", self.risk),
            format!("{FIELD_MIN_ROBBERY} {}", self.min_robbery),
            format!("{FIELD_MAX_ROBBERY} {}", self.max_robbery),
            format!(
                "{FIELD_ACTIVE} {} {} {}",
                flag(self.active.random),
                flag(self.active.greedy),
                flag(self.active.smart)
            ),
        ]
    }

    /// Parse the five settings lines.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first field that is missing, malformed,
    /// out of range, or not written the way [`Settings::to_lines`] writes it.
    pub fn from_lines(lines: &[&str]) -> Result<Self, SettingsError> {
        let line = |idx: usize, field: &'static str| {
            lines
                .get(idx)
                .copied()
                .ok_or(SettingsError::MissingLine { field })
        };

        let toll = parse_number(line(0, FIELD_TOLL)?, FIELD_TOLL)?;
        let risk = parse_number(line(1, FIELD_RISK)?, FIELD_RISK)?;
        let min_robbery = parse_number(line(2, FIELD_MIN_ROBBERY)?, FIELD_MIN_ROBBERY)?;
        let max_robbery = parse_number(line(3, FIELD_MAX_ROBBERY)?, FIELD_MAX_ROBBERY)?;
        let active = parse_flags(line(4, FIELD_ACTIVE)?)?;

        check_range(FIELD_TOLL, toll, 0, 100)?;
        check_range(FIELD_RISK, risk, 0, 100)?;
        let settings = Self::new(
            u8::try_from(toll).unwrap_or(u8::MAX),
            u8::try_from(risk).unwrap_or(u8::MAX),
            min_robbery,
            max_robbery,
            active,
        )?;

        let fields = [
            FIELD_TOLL,
            FIELD_RISK,
            FIELD_MIN_ROBBERY,
            FIELD_MAX_ROBBERY,
            FIELD_ACTIVE,
        ];
        for ((field, rendered), original) in fields.iter().zip(settings.to_lines()).zip(lines) {
            if rendered != *original {
                return Err(SettingsError::NonCanonical {
                    field: *field,
                    line: (*original).to_string(),
                });
            }
        }
        Ok(settings)
    }
}

impl fmt::Display for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.to_lines() {
            write!(f, "{line}\r\n")?;
        }
        Ok(())
    }
}

impl FromStr for Settings {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lines: Vec<&str> = s
            .lines()
            .map(|line| line.strip_suffix('\r').unwrap_or(line))
            .filter(|line| !line.is_empty())
            .collect();
        Self::from_lines(&lines)
    }
}

fn check_range(field: &'static str, value: i64, min: i64, max: i64) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            field,
            min,
            max,
            value,
        })
    }
}

fn field_value<'a>(line: &'a str, field: &'static str) -> Result<&'a str, SettingsError> {
    line.strip_prefix(field)
        .and_then(|rest| rest.strip_prefix(' '))
        .ok_or_else(|| SettingsError::MalformedLine {
            field,
            line: line.to_string(),
        })
}

fn parse_number(line: &str, field: &'static str) -> Result<i64, SettingsError> {
    field_value(line, field)?
        .parse()
        .map_err(|_| SettingsError::MalformedLine {
            field,
            line: line.to_string(),
        })
}

fn parse_flags(line: &str) -> Result<StrategyFlags, SettingsError> {
    let malformed = || SettingsError::MalformedLine {
        field: FIELD_ACTIVE,
        line: line.to_string(),
    };
    let mut flags = StrategyFlags::all();
    let mut parts = field_value(line, FIELD_ACTIVE)?.split(' ');
    for kind in StrategyKind::ALL {
        let active = match parts.next() {
            Some("1") => true,
            Some("0") => false,
            _ => return Err(malformed()),
        };
        flags.set(kind, active);
    }
    if parts.next().is_some() {
        return Err(malformed());
    }
    Ok(flags)
}
