//! Tier definitions and the ordered tier catalog.

use crate::error::DomainError;
use serde::{Deserialize, Serialize};

/// A named skill bracket with ordering and promotion/demotion rules.
///
/// Seed/catalog data, immutable after construction. Order 1 is the
/// lowest tier; `promote_percent == 0` marks the highest tier and
/// `demote_percent == 0` marks the lowest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierDefinition {
    /// Unique tier name, e.g. "ISINMA".
    pub name: String,

    /// Rank among tiers, 1 = lowest.
    pub order: u32,

    /// Percentage of a room promoted at finalize (0-100).
    pub promote_percent: u8,

    /// Percentage of a room demoted at finalize (0-100).
    pub demote_percent: u8,

    /// Minimum intended room population.
    pub min_room_size: u32,

    /// Hard population cap per room.
    pub max_room_size: u32,
}

impl TierDefinition {
    /// Validate and construct a tier definition.
    ///
    /// Rejects empty names, zero order, inverted or zero room bounds,
    /// and percentages out of range or summing past 100.
    pub fn new(
        name: impl Into<String>,
        order: u32,
        promote_percent: u8,
        demote_percent: u8,
        min_room_size: u32,
        max_room_size: u32,
    ) -> Result<Self, DomainError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::EmptyTierName);
        }
        if order == 0 {
            return Err(DomainError::InvalidTierOrder(order));
        }
        if min_room_size == 0 || max_room_size < min_room_size {
            return Err(DomainError::InvalidRoomBounds {
                name,
                min: min_room_size,
                max: max_room_size,
            });
        }
        for value in [promote_percent, demote_percent] {
            if value > 100 {
                return Err(DomainError::PercentOutOfRange { name: name.clone(), value });
            }
        }
        let sum = promote_percent as u16 + demote_percent as u16;
        if sum > 100 {
            return Err(DomainError::PercentSumExceeded { name, sum });
        }
        Ok(Self {
            name,
            order,
            promote_percent,
            demote_percent,
            min_room_size,
            max_room_size,
        })
    }

    /// Highest tier: nobody promotes out of it.
    pub fn is_top(&self) -> bool {
        self.promote_percent == 0
    }

    /// Lowest tier: nobody demotes out of it.
    pub fn is_bottom(&self) -> bool {
        self.demote_percent == 0
    }
}

/// Ordered, immutable set of tiers.
///
/// Lookups only; "not found" is `None`, never an error.
#[derive(Debug, Clone)]
pub struct TierCatalog {
    /// Tiers ascending by order.
    tiers: Vec<TierDefinition>,
}

impl TierCatalog {
    /// Build a catalog from tier definitions.
    ///
    /// Sorts ascending by order and rejects duplicate names or orders
    /// and the empty set (the lowest tier is the join fallback, so at
    /// least one tier must exist).
    pub fn new(mut tiers: Vec<TierDefinition>) -> Result<Self, DomainError> {
        if tiers.is_empty() {
            return Err(DomainError::EmptyCatalog);
        }
        tiers.sort_by_key(|t| t.order);
        for pair in tiers.windows(2) {
            if pair[0].order == pair[1].order {
                return Err(DomainError::DuplicateTier(format!("order {}", pair[0].order)));
            }
            if pair[0].name == pair[1].name {
                return Err(DomainError::DuplicateTier(pair[0].name.clone()));
            }
        }
        // Orders are unique; names still need a full check since the
        // sort only groups by order.
        for (i, tier) in tiers.iter().enumerate() {
            if tiers[..i].iter().any(|t| t.name == tier.name) {
                return Err(DomainError::DuplicateTier(tier.name.clone()));
            }
        }
        Ok(Self { tiers })
    }

    /// Look up a tier by name.
    pub fn get(&self, name: &str) -> Option<&TierDefinition> {
        self.tiers.iter().find(|t| t.name == name)
    }

    /// All tiers, ascending by order.
    pub fn all_ordered(&self) -> &[TierDefinition] {
        &self.tiers
    }

    /// The tier one step above the given order, if any.
    pub fn next_of(&self, order: u32) -> Option<&TierDefinition> {
        self.tiers.iter().find(|t| t.order == order + 1)
    }

    /// The tier one step below the given order, if any.
    pub fn prev_of(&self, order: u32) -> Option<&TierDefinition> {
        order.checked_sub(1).and_then(|prev| self.tiers.iter().find(|t| t.order == prev))
    }

    /// The lowest-order tier (the fallback for unknown user tiers).
    pub fn lowest(&self) -> &TierDefinition {
        // Non-empty by construction.
        &self.tiers[0]
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    /// Always false; kept for API completeness.
    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(name: &str, order: u32, promote: u8, demote: u8) -> TierDefinition {
        TierDefinition::new(name, order, promote, demote, 5, 20).unwrap()
    }

    fn catalog() -> TierCatalog {
        TierCatalog::new(vec![
            tier("GOLD", 3, 0, 25),
            tier("ISINMA", 1, 20, 0),
            tier("SILVER", 2, 15, 15),
        ])
        .unwrap()
    }

    #[test]
    fn rejects_empty_name() {
        assert_eq!(
            TierDefinition::new("  ", 1, 10, 10, 5, 20),
            Err(DomainError::EmptyTierName)
        );
    }

    #[test]
    fn rejects_bad_bounds() {
        assert!(matches!(
            TierDefinition::new("X", 1, 10, 10, 0, 20),
            Err(DomainError::InvalidRoomBounds { .. })
        ));
        assert!(matches!(
            TierDefinition::new("X", 1, 10, 10, 30, 20),
            Err(DomainError::InvalidRoomBounds { .. })
        ));
    }

    #[test]
    fn rejects_percent_sum_over_100() {
        assert_eq!(
            TierDefinition::new("X", 1, 60, 50, 5, 20),
            Err(DomainError::PercentSumExceeded { name: "X".into(), sum: 110 })
        );
    }

    #[test]
    fn top_and_bottom_markers() {
        assert!(tier("ISINMA", 1, 20, 0).is_bottom());
        assert!(tier("GOLD", 3, 0, 25).is_top());
        assert!(!tier("SILVER", 2, 15, 15).is_top());
    }

    #[test]
    fn catalog_orders_ascending() {
        let names: Vec<_> = catalog().all_ordered().iter().map(|t| t.name.clone()).collect();
        assert_eq!(names, vec!["ISINMA", "SILVER", "GOLD"]);
    }

    #[test]
    fn catalog_rejects_duplicate_order() {
        let result = TierCatalog::new(vec![tier("A", 1, 10, 0), tier("B", 1, 10, 0)]);
        assert!(matches!(result, Err(DomainError::DuplicateTier(_))));
    }

    #[test]
    fn catalog_rejects_duplicate_name() {
        let result = TierCatalog::new(vec![tier("A", 1, 10, 0), tier("A", 2, 10, 0)]);
        assert_eq!(result.unwrap_err(), DomainError::DuplicateTier("A".into()));
    }

    #[test]
    fn catalog_rejects_empty() {
        assert_eq!(TierCatalog::new(vec![]).unwrap_err(), DomainError::EmptyCatalog);
    }

    #[test]
    fn next_and_prev_walk_orders() {
        let cat = catalog();
        assert_eq!(cat.next_of(1).unwrap().name, "SILVER");
        assert_eq!(cat.prev_of(2).unwrap().name, "ISINMA");
        assert!(cat.next_of(3).is_none());
        assert!(cat.prev_of(1).is_none());
        assert!(cat.prev_of(0).is_none());
    }

    #[test]
    fn lowest_is_fallback() {
        assert_eq!(catalog().lowest().name, "ISINMA");
    }

    #[test]
    fn get_by_name() {
        assert!(catalog().get("SILVER").is_some());
        assert!(catalog().get("UNKNOWN").is_none());
    }
}
