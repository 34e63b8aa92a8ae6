//! Derived economy values: pure functions of a state snapshot.

use std::collections::BTreeMap;

use crate::catalog::{BuildingId, MarketItemId, VeggieId, RANKS};
use crate::state::GameState;

/// Cost growth per owned unit.
pub const COST_GROWTH: f64 = 1.15;

/// Production and yield bonus per active fertilizer.
const FERTILIZER_BONUS: f64 = 0.1;

/// Vibes per second from all buildings, boosted by active fertilizer.
pub fn production_rate(state: &GameState) -> f64 {
    let base: f64 = BuildingId::all()
        .iter()
        .map(|b| state.owned(*b) as f64 * b.base_prod())
        .sum();
    base * fertilizer_multiplier(state)
}

/// Vibes gained per manual click.
pub fn click_power(state: &GameState) -> f64 {
    let power = 1.0 + production_rate(state) * 0.05;
    let feed = state.farming.upgrade_count(MarketItemId::CursorFeed);
    power * (1.0 + feed as f64 * 0.5)
}

/// Price of the next unit of `building`: `floor(base × 1.15^owned)`.
/// Kept in `f64` so the curve keeps climbing past `u64::MAX`; it only
/// becomes infinite (never affordable) beyond ~5000 units.
pub fn purchase_cost(building: BuildingId, inventory: &BTreeMap<BuildingId, u32>) -> f64 {
    let owned = inventory.get(&building).copied().unwrap_or(0);
    (building.base_cost() * COST_GROWTH.powf(owned as f64)).floor()
}

/// Price of the next extra plot: `500 × 2^owned`.
pub fn extra_plot_cost(extra_plots_owned: u32) -> u64 {
    500u64.saturating_mul(1u64.checked_shl(extra_plots_owned).unwrap_or(u64::MAX))
}

/// Bio-vibe price of a market item at the current state.
pub fn market_item_cost(state: &GameState, item: MarketItemId) -> u64 {
    match item {
        MarketItemId::ExtraPlot => extra_plot_cost(state.farming.extra_plots),
        other => other.cost() as u64,
    }
}

/// Stock gained from harvesting one plot of `veggie`.
pub fn crop_yield(state: &GameState, veggie: VeggieId) -> u64 {
    (veggie.base_yield() * fertilizer_multiplier(state)).floor() as u64
}

/// Growth speed factor: 2 with the veggie's GMO upgrade, otherwise 1.
pub fn gmo_rate(state: &GameState, veggie: VeggieId) -> u32 {
    if state.farming.upgrade_count(veggie.gmo_item()) > 0 {
        2
    } else {
        1
    }
}

/// Bio-vibes from converting `stock` units of `veggie` at `conversion_rate`.
pub fn conversion_value(veggie: VeggieId, stock: f64, conversion_rate: f64) -> f64 {
    (stock * veggie.factory_rate() * conversion_rate).floor()
}

/// Index of the highest rank whose threshold does not exceed `total_vibes`.
pub fn rank_index_for(total_vibes: f64) -> usize {
    RANKS
        .iter()
        .rposition(|r| total_vibes >= r.threshold)
        .unwrap_or(0)
}

fn fertilizer_multiplier(state: &GameState) -> f64 {
    1.0 + state.farming.fertilizer.active as f64 * FERTILIZER_BONUS
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn arb_building() -> impl Strategy<Value = BuildingId> {
        proptest::sample::select(BuildingId::all().to_vec())
    }

    proptest! {
        #[test]
        fn prop_purchase_cost_strictly_increases(
            building in arb_building(),
            count in 0u32..4_000,
        ) {
            let mut inv = BTreeMap::new();
            inv.insert(building, count);
            let before = purchase_cost(building, &inv);
            inv.insert(building, count + 1);
            let after = purchase_cost(building, &inv);
            prop_assert!(after > before, "cost did not increase: {} -> {}", before, after);
        }

        #[test]
        fn prop_purchase_cost_deterministic(
            building in arb_building(),
            count in 0u32..150,
        ) {
            let mut inv = BTreeMap::new();
            inv.insert(building, count);
            prop_assert_eq!(purchase_cost(building, &inv), purchase_cost(building, &inv.clone()));
        }

        #[test]
        fn prop_production_linear_in_count(
            building in arb_building(),
            count in 1u32..1000,
        ) {
            let mut s = GameState::new(0);
            s.inventory.insert(building, count);
            let a = production_rate(&s);
            s.inventory.insert(building, count * 2);
            let b = production_rate(&s);
            prop_assert!((b / a - 2.0).abs() < 1e-9);
        }

        #[test]
        fn prop_click_power_at_least_one(
            cursors in 0u32..500,
            feed in 0u32..10,
        ) {
            let mut s = GameState::new(0);
            s.inventory.insert(BuildingId::Cursor, cursors);
            s.farming.upgrades.insert(MarketItemId::CursorFeed, feed);
            prop_assert!(click_power(&s) >= 1.0);
        }

        #[test]
        fn prop_rank_index_monotonic(a in 0.0f64..1e13, b in 0.0f64..1e13) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(rank_index_for(lo) <= rank_index_for(hi));
        }
    }
}
