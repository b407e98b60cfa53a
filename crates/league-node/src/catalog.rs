//! Tier catalog seed data.

use league_core::{TierCatalog, TierDefinition};
use league_engine::{Error, Result};
use std::path::Path;

/// The compiled-in seed catalog, lowest tier first.
///
/// Deployments override it with `LEAGUE_TIERS_FILE`, a JSON array of
/// tier definitions.
pub fn default_catalog() -> TierCatalog {
    let tiers = [
        ("ISINMA", 1, 20, 0),
        ("BRONZE", 2, 20, 10),
        ("SILVER", 3, 15, 15),
        ("GOLD", 4, 10, 20),
        ("PLATINUM", 5, 0, 25),
    ]
    .into_iter()
    .map(|(name, order, promote, demote)| {
        TierDefinition::new(name, order, promote, demote, 5, 30)
            .expect("seed catalog entries are valid")
    })
    .collect();
    TierCatalog::new(tiers).expect("seed catalog is valid")
}

/// Load a catalog from a JSON file of tier definitions.
pub fn catalog_from_file<P: AsRef<Path>>(path: P) -> Result<TierCatalog> {
    let data = std::fs::read(path)?;
    let tiers: Vec<TierDefinition> = serde_json::from_slice(&data)?;
    TierCatalog::new(tiers).map_err(Error::from)
}
