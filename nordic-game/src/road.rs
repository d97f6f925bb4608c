use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::atlas::CityId;
use crate::city::City;

/// Immutable directed edge between two cities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Road {
    from: CityId,
    to: CityId,
    length: u32,
}

impl Road {
    #[must_use]
    pub const fn new(from: CityId, to: CityId, length: u32) -> Self {
        Self { from, to, length }
    }

    #[must_use]
    pub const fn from(&self) -> CityId {
        self.from
    }

    #[must_use]
    pub const fn to(&self) -> CityId {
        self.to
    }

    #[must_use]
    pub const fn length(&self) -> u32 {
        self.length
    }

    /// Total order by origin name, then destination name.
    #[must_use]
    pub fn cmp_by_name(&self, other: &Self, cities: &[City]) -> Ordering {
        let name = |id: CityId| cities.get(id.index()).map(City::name);
        if self.from == other.from {
            name(self.to).cmp(&name(other.to))
        } else {
            name(self.from).cmp(&name(other.from))
        }
    }
}
