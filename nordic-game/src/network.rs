//! Network definitions: the countries, cities and roads a game is built from.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::atlas::{Atlas, Pixel};
use crate::city::CityKind;
use crate::country::CountryKind;

/// Bundled sample map of the Nordic countries.
pub const NORDIC_NETWORK_JSON: &str = include_str!("../assets/network.json");

/// Errors raised when a network definition does not describe a valid map.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NetworkError {
    #[error("No such city: '{0}'.")]
    UnknownCity(String),
    #[error("No such country: '{0}'.")]
    UnknownCountry(String),
    #[error("country '{0}' is defined twice")]
    DuplicateCountry(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountryDef {
    pub name: String,
    #[serde(default)]
    pub kind: CountryKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CityDef {
    pub name: String,
    pub country: String,
    pub value: i64,
    #[serde(default)]
    pub kind: CityKind,
    #[serde(default)]
    pub pixel: Option<Pixel>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadDef {
    pub from: String,
    pub to: String,
    pub length: u32,
}

/// Complete map description, usually loaded from JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct NetworkDef {
    #[serde(default)]
    pub countries: Vec<CountryDef>,
    #[serde(default)]
    pub cities: Vec<CityDef>,
    #[serde(default)]
    pub roads: Vec<RoadDef>,
}

impl NetworkDef {
    /// Load a network definition from a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON cannot be parsed into a network definition.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The bundled Nordic map.
    ///
    /// # Errors
    ///
    /// Returns an error if the bundled asset is not a valid definition.
    pub fn nordic() -> Result<Self, serde_json::Error> {
        Self::from_json(NORDIC_NETWORK_JSON)
    }

    /// Build the arena this definition describes. Every road is two-way.
    ///
    /// # Errors
    ///
    /// Returns an error for a duplicate country, a city in an undefined
    /// country, or a road naming an undefined city.
    pub fn build(&self) -> Result<Atlas, NetworkError> {
        let mut atlas = Atlas::new();
        for country in &self.countries {
            atlas.add_country(&country.name, country.kind)?;
        }
        for city in &self.cities {
            let country = atlas
                .country_by_name(&city.country)
                .ok_or_else(|| NetworkError::UnknownCountry(city.country.clone()))?;
            let id = atlas
                .add_city(country, &city.name, city.value, city.kind)
                .ok_or_else(|| NetworkError::UnknownCountry(city.country.clone()))?;
            if let Some(pixel) = city.pixel {
                atlas.put_position(id, pixel);
            }
        }
        for road in &self.roads {
            atlas.add_roads_by_name(&road.from, &road.to, road.length)?;
        }
        Ok(atlas)
    }
}
