//! Arena that owns every city and country of a game.
//!
//! Positions, roads and players refer to cities and countries by id only.
//! Ids are indices handed out by one atlas and are never reused.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::city::{City, CityKind, Traveller};
use crate::country::{Country, CountryKind};
use crate::network::NetworkError;
use crate::position::Position;
use crate::rng::GameRng;
use crate::settings::Settings;

/// Handle to a city in an [`Atlas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CityId(usize);

impl CityId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Handle to a country in an [`Atlas`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(usize);

impl CountryId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

/// Screen location of a city, stored for the front end and never interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pixel {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Default)]
pub struct Atlas {
    cities: Vec<City>,
    countries: Vec<Country>,
    /// Country ids sorted by country name.
    by_name: Vec<CountryId>,
    pixels: HashMap<CityId, Pixel>,
}

impl Atlas {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a country.
    ///
    /// # Errors
    ///
    /// Returns an error if a country with the same name already exists, since
    /// countries are told apart by name.
    pub fn add_country(&mut self, name: &str, kind: CountryKind) -> Result<CountryId, NetworkError> {
        if self.countries.iter().any(|country| country.name() == name) {
            return Err(NetworkError::DuplicateCountry(name.to_string()));
        }
        let id = CountryId(self.countries.len());
        self.countries.push(Country::new(name, kind));
        self.by_name.push(id);
        let countries = &self.countries;
        self.by_name
            .sort_by(|a, b| countries[a.0].name().cmp(countries[b.0].name()));
        Ok(id)
    }

    /// Register a city as a member of `country`. Returns `None` when the
    /// country id does not belong to this atlas.
    pub fn add_city(
        &mut self,
        country: CountryId,
        name: &str,
        value: i64,
        kind: CityKind,
    ) -> Option<CityId> {
        let id = CityId(self.cities.len());
        self.countries.get_mut(country.0)?.insert_city(id);
        self.cities.push(City::new(name, value, country, kind));
        Some(id)
    }

    #[must_use]
    pub fn cities(&self) -> &[City] {
        &self.cities
    }

    #[must_use]
    pub fn city(&self, id: CityId) -> Option<&City> {
        self.cities.get(id.0)
    }

    pub fn city_mut(&mut self, id: CityId) -> Option<&mut City> {
        self.cities.get_mut(id.0)
    }

    #[must_use]
    pub fn country(&self, id: CountryId) -> Option<&Country> {
        self.countries.get(id.0)
    }

    /// Country ids in name order.
    #[must_use]
    pub fn country_ids(&self) -> &[CountryId] {
        &self.by_name
    }

    /// Countries in name order.
    pub fn countries(&self) -> impl Iterator<Item = &Country> {
        self.by_name.iter().map(|id| &self.countries[id.0])
    }

    #[must_use]
    pub fn country_of(&self, city: CityId) -> Option<CountryId> {
        self.city(city).map(City::country)
    }

    #[must_use]
    pub fn country_by_name(&self, name: &str) -> Option<CountryId> {
        self.by_name
            .iter()
            .copied()
            .find(|id| self.countries[id.0].name() == name)
    }

    /// Member cities of `country`, sorted by name.
    #[must_use]
    pub fn cities_of(&self, country: CountryId) -> Vec<CityId> {
        self.country(country)
            .map(|c| c.cities(&self.cities))
            .unwrap_or_default()
    }

    /// First city called `name`, searching countries in name order.
    #[must_use]
    pub fn city_by_name(&self, name: &str) -> Option<CityId> {
        self.countries()
            .find_map(|country| country.city(name, &self.cities))
    }

    #[must_use]
    pub fn city_name(&self, id: CityId) -> &str {
        self.city(id).map_or("", City::name)
    }

    /// Connect `a` and `b` in both directions in every country that owns
    /// either endpoint, then keep the touched road lists sorted by
    /// destination name.
    pub fn add_roads(&mut self, a: CityId, b: CityId, length: u32) {
        for country in &mut self.countries {
            country.add_roads(a, b, length);
            country.sort_roads(a, &self.cities);
            country.sort_roads(b, &self.cities);
        }
    }

    /// Connect two cities looked up by name.
    ///
    /// # Errors
    ///
    /// Returns an error naming the first city that does not exist.
    pub fn add_roads_by_name(&mut self, a: &str, b: &str, length: u32) -> Result<(), NetworkError> {
        let from = self
            .city_by_name(a)
            .ok_or_else(|| NetworkError::UnknownCity(a.to_string()))?;
        let to = self
            .city_by_name(b)
            .ok_or_else(|| NetworkError::UnknownCity(b.to_string()))?;
        self.add_roads(from, to, length);
        Ok(())
    }

    /// Where a traveller leaving `from` for `to` stands, resolved by the
    /// country that owns `from`.
    #[must_use]
    pub fn ready_to_travel(&self, from: CityId, to: CityId) -> Position {
        self.country_of(from)
            .and_then(|id| self.country(id))
            .map_or_else(|| Position::at(from), |c| c.ready_to_travel(from, to))
    }

    /// Run the arrival policy of `city`. Returns `None` for an unknown city.
    pub fn arrive(
        &mut self,
        city: CityId,
        traveller: &Traveller,
        settings: &Settings,
        rng: &mut GameRng,
    ) -> Option<i64> {
        let target = self.cities.get_mut(city.0)?;
        let country = self.countries.get(target.country().0)?;
        Some(target.arrive(country, traveller, settings, rng))
    }

    /// Restore every city of every country.
    pub fn reset(&mut self) {
        for country in &self.countries {
            country.reset(&mut self.cities);
        }
    }

    pub fn put_position(&mut self, city: CityId, pixel: Pixel) {
        self.pixels.insert(city, pixel);
    }

    #[must_use]
    pub fn pixel_of(&self, city: CityId) -> Option<Pixel> {
        self.pixels.get(&city).copied()
    }
}
