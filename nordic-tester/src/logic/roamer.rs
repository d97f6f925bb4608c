use nordic_game::{CityId, GameRng, Strategy, StrategyKind, TravelView};

/// Computer player that takes a uniformly random road out of its city.
/// Gives headless runs traffic and stream draws beyond the scripted clicks.
#[derive(Debug, Clone, Copy, Default)]
pub struct Roamer;

impl Strategy for Roamer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Random
    }

    fn choose(&mut self, view: &TravelView<'_>, rng: &mut GameRng) -> Option<CityId> {
        let here = view.position.to();
        let country = view.atlas.country(view.atlas.country_of(here)?)?;
        let roads = country.roads(here);
        let index = rng.index(roads.len())?;
        Some(roads[index].to())
    }
}
