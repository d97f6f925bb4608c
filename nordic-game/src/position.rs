use serde::{Deserialize, Serialize};

use crate::atlas::CityId;

/// Where a player is on its current leg.
///
/// `distance` counts the units still to travel towards `to` and never leaves
/// `[0, total]`. A position with `distance == 0` has arrived; turning around
/// can put it back in transit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    from: CityId,
    to: CityId,
    distance: u32,
    total: u32,
}

impl Position {
    /// Start a leg with `distance` units left; `total` is fixed to it.
    #[must_use]
    pub const fn new(from: CityId, to: CityId, distance: u32) -> Self {
        Self {
            from,
            to,
            distance,
            total: distance,
        }
    }

    /// Zero-distance position standing in a city.
    #[must_use]
    pub const fn at(city: CityId) -> Self {
        Self::new(city, city, 0)
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
    pub const fn distance(&self) -> u32 {
        self.distance
    }

    #[must_use]
    pub const fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub const fn has_arrived(&self) -> bool {
        self.distance == 0
    }

    /// Advance one unit. Returns `false` without changing anything when
    /// already arrived.
    pub fn move_one(&mut self) -> bool {
        if self.distance > 0 {
            self.distance -= 1;
            true
        } else {
            false
        }
    }

    /// Reverse along the same road, keeping the progress made.
    pub fn turn_around(&mut self) {
        std::mem::swap(&mut self.from, &mut self.to);
        self.distance = self.total - self.distance;
    }
}
