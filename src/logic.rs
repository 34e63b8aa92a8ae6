//! Vibe Farm game logic. State transitions, fully testable.
//!
//! Every operation validates first and then applies its whole effect, or
//! leaves the state untouched. Both outcomes leave a line in the log.

use crate::catalog::{
    BuildingId, MarketItemId, VeggieId, BASE_GROW_SECS, MAX_EXTRA_PLOTS, PLANT_COST,
    STARTER_BIO_VIBES,
};
use crate::economy;
use crate::state::{GameState, LogBook, Plot, PlotStage, Tone};

/// How much `conversion_rate` each conveyor upgrade adds.
pub const CONVEYOR_RATE_STEP: f64 = 0.5;

/// Result of a successful harvest.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Harvest {
    pub plot_id: usize,
    pub veggie: VeggieId,
    pub amount: u64,
}

/// Manual click. Returns the vibes gained.
pub fn click(state: &mut GameState) -> f64 {
    let power = economy::click_power(state);
    state.earn(power);
    power
}

/// Try to buy one building. Returns true if successful.
pub fn buy_building(state: &mut GameState, log: &mut LogBook, building: BuildingId) -> bool {
    let cost = economy::purchase_cost(building, &state.inventory);
    if state.vibes < cost {
        log.add(
            format!("Not enough vibes for {}!", building.name()),
            Tone::Warning,
        );
        return false;
    }

    state.vibes -= cost;
    *state.inventory.entry(building).or_insert(0) += 1;
    log.add(format!("Bought {}", building.name()), Tone::Success);

    if building == BuildingId::GardenPatch && !state.farming.unlocked {
        state.farming.unlocked = true;
        state.farming.bio_vibes += STARTER_BIO_VIBES;
        log.add(
            format!(
                "The farm is open! +{} Bio-Vibes to get started.",
                STARTER_BIO_VIBES
            ),
            Tone::Milestone,
        );
    }
    true
}

/// Plant a seed in an empty plot. `veggie` falls back to the plot's previous
/// crop when absent or not unlocked.
pub fn plant(
    state: &mut GameState,
    log: &mut LogBook,
    plot_id: usize,
    veggie: Option<VeggieId>,
) -> bool {
    let farm = &state.farming;
    if !farm.unlocked {
        log.add("Unlock the farm first!", Tone::Warning);
        return false;
    }
    let plot = match farm.plot(plot_id) {
        Some(p) => p,
        None => {
            log.add(format!("There is no plot #{}.", plot_id), Tone::Warning);
            return false;
        }
    };
    if plot.stage != PlotStage::Empty {
        log.add("That plot is already in use.", Tone::Warning);
        return false;
    }
    if farm.bio_vibes < PLANT_COST {
        log.add("Not enough Bio-Vibes to plant!", Tone::Warning);
        return false;
    }

    let veggie = veggie
        .filter(|v| farm.is_unlocked(*v))
        .unwrap_or(plot.veggie_type);
    let grow_time = BASE_GROW_SECS / economy::gmo_rate(state, veggie) as f64;

    state.farming.bio_vibes -= PLANT_COST;
    if let Some(plot) = state.farming.plot_mut(plot_id) {
        plot.stage = PlotStage::Growing;
        plot.veggie_type = veggie;
        plot.max_time = grow_time;
        plot.timer = grow_time;
    }
    log.add(
        format!("Planted {} {}.", veggie.emoji(), veggie.name()),
        Tone::Plant,
    );
    true
}

/// Harvest a ripe plot into stock. Unripe or missing plots are ignored.
pub fn harvest(state: &mut GameState, log: &mut LogBook, plot_id: usize) -> Option<Harvest> {
    let veggie = match state.farming.plot(plot_id) {
        Some(p) if p.stage == PlotStage::Ripe => p.veggie_type,
        _ => return None,
    };
    let amount = economy::crop_yield(state, veggie);

    if let Some(plot) = state.farming.plot_mut(plot_id) {
        plot.stage = PlotStage::Empty;
        plot.timer = 0.0;
    }
    *state.farming.stocks.entry(veggie).or_insert(0.0) += amount as f64;
    log.add(
        format!("Harvested {} {} {}!", amount, veggie.emoji(), veggie.name()),
        Tone::Harvest,
    );
    Some(Harvest {
        plot_id,
        veggie,
        amount,
    })
}

/// Try to buy a farm market item. `now_ms` restarts the fertilizer decay
/// clock when the first active unit is added.
pub fn buy_market_item(
    state: &mut GameState,
    log: &mut LogBook,
    item: MarketItemId,
    now_ms: u64,
) -> bool {
    let farm = &state.farming;
    if !farm.unlocked {
        log.add("Unlock the farm first!", Tone::Warning);
        return false;
    }
    if !item.stackable() && farm.upgrade_count(item) > 0 {
        log.add(format!("You already own {}.", item.name()), Tone::Warning);
        return false;
    }
    if item == MarketItemId::ExtraPlot && farm.extra_plots >= MAX_EXTRA_PLOTS {
        log.add("No room for more plots!", Tone::Warning);
        return false;
    }
    if item == MarketItemId::Conveyor && !farm.factory.enabled {
        log.add("Build the Veggie Factory first!", Tone::Warning);
        return false;
    }
    let cost = economy::market_item_cost(state, item) as f64;
    if state.farming.bio_vibes < cost {
        log.add(
            format!("Not enough Bio-Vibes for {}!", item.name()),
            Tone::Warning,
        );
        return false;
    }

    let farm = &mut state.farming;
    farm.bio_vibes -= cost;
    *farm.upgrades.entry(item).or_insert(0) += 1;

    match item {
        MarketItemId::Factory => {
            farm.factory.enabled = true;
            farm.factory.conversion_rate = 1.0;
            log.add("The Veggie Factory is online!", Tone::Milestone);
        }
        MarketItemId::Conveyor => {
            farm.factory.conversion_rate += CONVEYOR_RATE_STEP;
            log.add(
                format!(
                    "Bought {}! Conversion rate x{}",
                    item.name(),
                    farm.factory.conversion_rate
                ),
                Tone::Harvest,
            );
        }
        MarketItemId::ExtraPlot => {
            farm.extra_plots += 1;
            let id = farm.plots.len();
            farm.plots.push(Plot::empty(id));
            log.add(
                format!("Bought {}! ({} plots)", item.name(), farm.plots.len()),
                Tone::Harvest,
            );
        }
        MarketItemId::Fertilizer => {
            if farm.fertilizer.active == 0 {
                farm.fertilizer.last_decay_time = now_ms;
            }
            farm.fertilizer.purchased += 1;
            farm.fertilizer.active += 1;
            log.add(
                format!(
                    "Bought {}! ({} active)",
                    item.name(),
                    farm.fertilizer.active
                ),
                Tone::Harvest,
            );
        }
        _ => {
            log.add(format!("Bought {}!", item.name()), Tone::Harvest);
        }
    }
    true
}

/// Convert one veggie's stock by hand at the base rate. Returns bio-vibes gained.
pub fn convert_veggie_stocks(state: &mut GameState, log: &mut LogBook, veggie: VeggieId) -> f64 {
    let stock = state.farming.stock(veggie);
    if stock <= 0.0 {
        log.add(format!("No {} to convert.", veggie.name()), Tone::Warning);
        return 0.0;
    }
    let gained = economy::conversion_value(veggie, stock, 1.0);
    state.farming.stocks.insert(veggie, 0.0);
    state.farming.bio_vibes += gained;
    log.add(
        format!(
            "Converted {} {} into {} Bio-Vibes.",
            stock,
            veggie.name(),
            gained
        ),
        Tone::Harvest,
    );
    gained
}

/// Convert every stock through the factory. Returns bio-vibes gained.
pub fn convert_stocks_to_bio_vibes(state: &mut GameState, log: &mut LogBook) -> f64 {
    if !state.farming.factory.enabled {
        log.add("The Veggie Factory is not built yet.", Tone::Warning);
        return 0.0;
    }
    if state.farming.stocks.values().all(|s| *s <= 0.0) {
        log.add("Nothing to convert.", Tone::Warning);
        return 0.0;
    }
    let gained = factory_convert(state);
    log.add(
        format!("The factory produced {} Bio-Vibes.", gained),
        Tone::Harvest,
    );
    gained
}

/// Convert all non-zero stocks at the factory rate without logging.
/// Shared by the bulk command and the scheduler's auto-conversion.
pub(crate) fn factory_convert(state: &mut GameState) -> f64 {
    let rate = state.farming.factory.conversion_rate;
    let mut gained = 0.0;
    for (veggie, stock) in state.farming.stocks.iter_mut() {
        if *stock > 0.0 {
            gained += economy::conversion_value(*veggie, *stock, rate);
            *stock = 0.0;
        }
    }
    state.farming.bio_vibes += gained;
    gained
}

/// Unlock a new vegetable. Returns true if successful.
pub fn unlock_veggie(state: &mut GameState, log: &mut LogBook, veggie: VeggieId) -> bool {
    let farm = &mut state.farming;
    if !farm.unlocked {
        log.add("Unlock the farm first!", Tone::Warning);
        return false;
    }
    if farm.is_unlocked(veggie) {
        log.add(format!("{} is already unlocked.", veggie.name()), Tone::Warning);
        return false;
    }
    let cost = veggie.unlock_cost();
    if farm.bio_vibes < cost {
        log.add(
            format!("Not enough Bio-Vibes to unlock {}!", veggie.name()),
            Tone::Warning,
        );
        return false;
    }
    farm.bio_vibes -= cost;
    farm.unlocked_veggies.insert(veggie);
    log.add(
        format!("Unlocked {} {}!", veggie.emoji(), veggie.name()),
        Tone::Milestone,
    );
    true
}

/// Choose the seed the UI plants by default.
pub fn select_veggie(state: &mut GameState, log: &mut LogBook, veggie: VeggieId) -> bool {
    if !state.farming.is_unlocked(veggie) {
        log.add(format!("{} is still locked.", veggie.name()), Tone::Warning);
        return false;
    }
    state.farming.selected_veggie_type = veggie;
    true
}
