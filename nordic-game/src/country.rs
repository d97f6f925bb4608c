//! Countries: road bookkeeping for their own cities plus the bonus policy.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use crate::atlas::CityId;
use crate::city::City;
use crate::position::Position;
use crate::rng::GameRng;
use crate::road::Road;
use crate::settings::Settings;

/// Bonus policy of a country.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountryKind {
    #[default]
    Standard,
    /// Arrivals risk being robbed instead of receiving a bonus.
    Mafia,
}

impl CountryKind {
    /// Money a city with `value` pays out on arrival; negative for a robbery.
    ///
    /// The standard policy draws once when `value > 0` and not at all
    /// otherwise. The mafia policy always draws a `[1, 100]` roll first.
    pub fn bonus(self, value: i64, settings: &Settings, rng: &mut GameRng) -> i64 {
        match self {
            Self::Standard => standard_bonus(value, rng),
            Self::Mafia => {
                let roll = rng.range_inclusive(1, 100);
                if roll > i64::from(settings.risk()) {
                    standard_bonus(value, rng)
                } else {
                    -robbery_loss(settings, rng)
                }
            }
        }
    }
}

/// Uniform bonus in `[0, value]`, or `0` without a draw for a non-positive value.
pub fn standard_bonus(value: i64, rng: &mut GameRng) -> i64 {
    if value > 0 {
        rng.range_inclusive(0, value)
    } else {
        0
    }
}

/// How much a robbery takes: uniform in `[min_robbery, max_robbery]`.
pub fn robbery_loss(settings: &Settings, rng: &mut GameRng) -> i64 {
    settings.min_robbery()
        + rng.range_inclusive(0, settings.max_robbery() - settings.min_robbery())
}

/// A named country owning the adjacency lists of its cities.
///
/// Roads leaving a member city are stored even when they lead abroad, which
/// is what allows single-hop border crossings. Equality and hashing only look
/// at the name.
#[derive(Debug, Clone)]
pub struct Country {
    name: String,
    kind: CountryKind,
    network: BTreeMap<CityId, Vec<Road>>,
}

impl Country {
    #[must_use]
    pub fn new(name: &str, kind: CountryKind) -> Self {
        Self {
            name: name.to_string(),
            kind,
            network: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn kind(&self) -> CountryKind {
        self.kind
    }

    #[must_use]
    pub const fn network(&self) -> &BTreeMap<CityId, Vec<Road>> {
        &self.network
    }

    #[must_use]
    pub fn contains(&self, city: CityId) -> bool {
        self.network.contains_key(&city)
    }

    /// Register a member city with no roads yet. Existing roads are kept.
    pub(crate) fn insert_city(&mut self, city: CityId) {
        self.network.entry(city).or_default();
    }

    /// Snapshot of the roads leaving `city`; empty for a non-member.
    #[must_use]
    pub fn roads(&self, city: CityId) -> Vec<Road> {
        self.network.get(&city).cloned().unwrap_or_default()
    }

    /// Member cities sorted by name.
    #[must_use]
    pub fn cities(&self, cities: &[City]) -> Vec<CityId> {
        let mut ids: Vec<CityId> = self.network.keys().copied().collect();
        ids.sort_by(|a, b| {
            let name = |id: &CityId| cities.get(id.index()).map(City::name);
            name(a).cmp(&name(b))
        });
        ids
    }

    /// First member city called `name`.
    #[must_use]
    pub fn city(&self, name: &str, cities: &[City]) -> Option<CityId> {
        self.network
            .keys()
            .copied()
            .find(|id| cities.get(id.index()).is_some_and(|city| city.name() == name))
    }

    #[must_use]
    pub fn bonus(&self, value: i64, settings: &Settings, rng: &mut GameRng) -> i64 {
        self.kind.bonus(value, settings, rng)
    }

    /// Store `a -> b` if `a` is a member and `b -> a` if `b` is a member.
    pub fn add_roads(&mut self, a: CityId, b: CityId, length: u32) {
        if let Some(roads) = self.network.get_mut(&a) {
            roads.push(Road::new(a, b, length));
        }
        if let Some(roads) = self.network.get_mut(&b) {
            roads.push(Road::new(b, a, length));
        }
    }

    /// Stable-sort the roads leaving `city` by destination name.
    pub(crate) fn sort_roads(&mut self, city: CityId, cities: &[City]) {
        if let Some(roads) = self.network.get_mut(&city) {
            roads.sort_by(|x, y| x.cmp_by_name(y, cities));
        }
    }

    #[must_use]
    pub const fn position(&self, city: CityId) -> Position {
        Position::at(city)
    }

    /// Position for travelling the direct road `from -> to`.
    ///
    /// Staying put, or asking for a destination with no direct road in this
    /// country's bookkeeping, yields a zero-distance position at `from`.
    #[must_use]
    pub fn ready_to_travel(&self, from: CityId, to: CityId) -> Position {
        if from == to {
            return self.position(from);
        }
        self.network
            .get(&from)
            .and_then(|roads| roads.iter().find(|road| road.to() == to))
            .map_or_else(
                || self.position(from),
                |road| Position::new(from, to, road.length()),
            )
    }

    /// Restore every member city's initial value.
    pub fn reset(&self, cities: &mut [City]) {
        for id in self.network.keys() {
            if let Some(city) = cities.get_mut(id.index()) {
                city.reset();
            }
        }
    }
}

impl PartialEq for Country {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Country {}

impl Hash for Country {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
