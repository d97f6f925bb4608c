use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;

/// Parse `--clicks` input: comma-separated `<tick>:<city>` pairs.
///
/// Ticks are 1-based like the log's, and each may appear once since a game
/// takes at most one click per tick. Blank entries are skipped.
pub fn parse_clicks(input: &str) -> Result<BTreeMap<u32, String>> {
    let mut clicks = BTreeMap::new();
    for token in input.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let Some((tick, city)) = token.split_once(':') else {
            bail!("click {token:?} is not `<tick>:<city>`");
        };
        let tick: u32 = tick
            .trim()
            .parse()
            .with_context(|| format!("click {token:?} has an invalid tick"))?;
        if tick == 0 {
            bail!("click {token:?}: ticks start at 1");
        }
        let city = city.trim();
        if city.is_empty() {
            bail!("click {token:?} names no city");
        }
        if let Some(earlier) = clicks.insert(tick, city.to_string()) {
            bail!("tick {tick} is clicked twice ({earlier:?} and {city:?})");
        }
    }
    Ok(clicks)
}
