//! Cities and their arrival policy.
//!
//! Draw order within one arrival is fixed: the toll is computed (no draw),
//! then the country's bonus draw(s), then a capital's desire draw. Changing
//! that order changes every later draw in the game.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::hash::{Hash, Hasher};

use crate::atlas::CountryId;
use crate::country::Country;
use crate::rng::GameRng;
use crate::settings::Settings;

/// Which arrival policy a city applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CityKind {
    #[default]
    Plain,
    /// Collects a toll from travellers coming from another country.
    Border,
    /// A border city that also taxes the traveller's desires.
    Capital,
}

/// What a city needs to know about the player arriving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Traveller {
    pub money: i64,
    pub country_from: CountryId,
}

#[derive(Debug, Clone, Serialize)]
pub struct City {
    name: String,
    value: i64,
    initial_value: i64,
    country: CountryId,
    kind: CityKind,
}

impl City {
    #[must_use]
    pub fn new(name: &str, value: i64, country: CountryId, kind: CityKind) -> Self {
        Self {
            name: name.to_string(),
            value,
            initial_value: value,
            country,
            kind,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn value(&self) -> i64 {
        self.value
    }

    #[must_use]
    pub const fn initial_value(&self) -> i64 {
        self.initial_value
    }

    #[must_use]
    pub const fn country(&self) -> CountryId {
        self.country
    }

    #[must_use]
    pub const fn kind(&self) -> CityKind {
        self.kind
    }

    pub fn change_value(&mut self, amount: i64) {
        self.value += amount;
    }

    pub fn reset(&mut self) {
        self.value = self.initial_value;
    }

    /// Resolve an arrival and return the amount to add to the traveller's money.
    ///
    /// `country` must be this city's own country; it decides the bonus.
    pub fn arrive(
        &mut self,
        country: &Country,
        traveller: &Traveller,
        settings: &Settings,
        rng: &mut GameRng,
    ) -> i64 {
        match self.kind {
            CityKind::Plain => self.pay_bonus(country, settings, rng),
            CityKind::Border => self.arrive_at_border(country, traveller, settings, rng),
            CityKind::Capital => {
                let bonus = self.arrive_at_border(country, traveller, settings, rng);
                let p_money = traveller.money + bonus;
                let desires = rng.range_inclusive(0, p_money.max(0));
                self.change_value(desires);
                bonus - desires
            }
        }
    }

    fn pay_bonus(&mut self, country: &Country, settings: &Settings, rng: &mut GameRng) -> i64 {
        let bonus = country.bonus(self.value, settings, rng);
        if bonus > 0 {
            self.value -= bonus;
        }
        bonus
    }

    fn arrive_at_border(
        &mut self,
        country: &Country,
        traveller: &Traveller,
        settings: &Settings,
        rng: &mut GameRng,
    ) -> i64 {
        if traveller.country_from == self.country {
            return self.pay_bonus(country, settings, rng);
        }
        let toll = toll(traveller.money, settings.toll_percent());
        let bonus = self.pay_bonus(country, settings, rng);
        self.change_value(toll);
        bonus - toll
    }
}

/// `floor(money * percent / 100)`.
#[must_use]
pub fn toll(money: i64, percent: u8) -> i64 {
    (money * i64::from(percent)).div_euclid(100)
}

impl PartialEq for City {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name && self.country == other.country
    }
}

impl Eq for City {}

impl Hash for City {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
        self.country.hash(state);
    }
}

impl PartialOrd for City {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for City {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.country.cmp(&other.country))
    }
}
