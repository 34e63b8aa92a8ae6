//! `VibeGame`: owns the state and wires the engine to its collaborators.
//!
//! Commands run the pure logic, then persist on success and notify the
//! effect sink. `frame` is called from the host's animation-frame callback
//! while the loop handle from `start_loop` is alive.

use std::cell::Cell;
use std::rc::Rc;

use tracing::{debug, warn};

use crate::actions::Command;
use crate::catalog::{BuildingId, MarketItemId, Rank, VeggieId, RANKS};
use crate::config::EngineConfig;
use crate::economy;
use crate::effects::{self, BoundingBox, EffectSink, Observer, ScreenPoint};
use crate::logic::{self, Harvest};
use crate::save::{self, Storage};
use crate::scheduler::{Scheduler, TickReport};
use crate::state::{GameState, LogBook, Tone};
use crate::time::{Clock, FrameClock};

/// Viewport used for harvest popups until the host reports its size.
const DEFAULT_VIEWPORT: (f64, f64) = (1280.0, 720.0);

/// Disposer for the frame loop. Dropping it does not stop the loop;
/// call `cancel`.
#[derive(Clone, Debug)]
pub struct LoopHandle {
    running: Rc<Cell<bool>>,
}

impl LoopHandle {
    pub fn cancel(&self) {
        self.running.set(false);
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }
}

pub struct VibeGame {
    state: GameState,
    log: LogBook,
    scheduler: Scheduler,
    frame_clock: FrameClock,
    clock: Box<dyn Clock>,
    storage: Option<Box<dyn Storage>>,
    effects: Option<Box<dyn EffectSink>>,
    observer: Option<Box<dyn Observer>>,
    config: EngineConfig,
    viewport: (f64, f64),
    loop_flag: Option<Rc<Cell<bool>>>,
}

impl VibeGame {
    /// Fresh game with no storage or collaborators attached.
    pub fn new(config: EngineConfig, clock: Box<dyn Clock>) -> Self {
        let now = clock.now_ms();
        Self {
            state: GameState::new(now),
            log: LogBook::new(config.log_capacity),
            scheduler: Scheduler::with_intervals(
                0,
                config.factory_interval_secs,
                config.autosave_interval_secs,
            ),
            frame_clock: FrameClock::new(),
            clock,
            storage: None,
            effects: None,
            observer: None,
            config,
            viewport: DEFAULT_VIEWPORT,
            loop_flag: None,
        }
    }

    /// Attach `storage` and resume from it when it holds a save.
    pub fn open(config: EngineConfig, clock: Box<dyn Clock>, storage: Box<dyn Storage>) -> Self {
        let mut game = Self::new(config, clock).with_storage(storage);
        game.restore();
        game
    }

    /// Browser session: `Date.now()` and localStorage when it is available.
    #[cfg(target_arch = "wasm32")]
    pub fn browser(config: EngineConfig) -> Self {
        let clock = Box::new(crate::time::BrowserClock);
        match save::LocalStorage::open() {
            Some(storage) => Self::open(config, clock, Box::new(storage)),
            None => {
                warn!("localStorage unavailable, progress will not be saved");
                Self::new(config, clock)
            }
        }
    }

    pub fn with_storage(mut self, storage: Box<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn with_effects(mut self, effects: Box<dyn EffectSink>) -> Self {
        self.effects = Some(effects);
        self
    }

    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn set_viewport(&mut self, width: f64, height: f64) {
        self.viewport = (width, height);
    }

    /// Replace the in-memory state with the persisted one. Returns false
    /// when there is nothing usable to load.
    pub fn restore(&mut self) -> bool {
        self.stamp_log();
        match save::load_game(self.storage.as_deref(), &self.config.storage_key) {
            Some(loaded) => {
                self.state = loaded.state;
                self.scheduler.set_rank_index(loaded.rank_index);
                self.log.add("Welcome back!", Tone::Info);
                debug!(rank = loaded.rank_index, "save restored");
                true
            }
            None => false,
        }
    }

    // ── Read access ─────────────────────────────────────────────

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn log(&self) -> &LogBook {
        &self.log
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rank_index(&self) -> usize {
        self.scheduler.rank_index()
    }

    pub fn rank(&self) -> &'static Rank {
        let idx = self.rank_index().min(RANKS.len() - 1);
        &RANKS[idx]
    }

    pub fn production_rate(&self) -> f64 {
        economy::production_rate(&self.state)
    }

    pub fn click_power(&self) -> f64 {
        economy::click_power(&self.state)
    }

    pub fn building_cost(&self, building: BuildingId) -> f64 {
        economy::purchase_cost(building, &self.state.inventory)
    }

    pub fn market_cost(&self, item: MarketItemId) -> u64 {
        economy::market_item_cost(&self.state, item)
    }

    pub fn crop_yield(&self, veggie: VeggieId) -> u64 {
        economy::crop_yield(&self.state, veggie)
    }

    // ── Commands ────────────────────────────────────────────────

    /// Manual click. Not persisted on its own; the autosave picks it up.
    pub fn click(&mut self, pointer: Option<ScreenPoint>) -> f64 {
        let gained = logic::click(&mut self.state);
        if let (Some(at), Some(fx)) = (pointer, self.effects.as_mut()) {
            fx.floating_text(at, &format!("+{}", format_amount(gained)), true);
        }
        gained
    }

    pub fn buy_building(&mut self, building: BuildingId) -> bool {
        self.stamp_log();
        if !logic::buy_building(&mut self.state, &mut self.log, building) {
            return false;
        }
        self.persist();
        if let Some(fx) = self.effects.as_mut() {
            fx.building_bought(building);
        }
        true
    }

    /// Plant the selected veggie in `plot`.
    pub fn plant(&mut self, plot: usize) -> bool {
        let veggie = self.state.farming.selected_veggie_type;
        self.plant_veggie(plot, Some(veggie))
    }

    pub fn plant_veggie(&mut self, plot: usize, veggie: Option<VeggieId>) -> bool {
        self.stamp_log();
        let planted = logic::plant(&mut self.state, &mut self.log, plot, veggie);
        if planted {
            self.persist();
        }
        planted
    }

    pub fn harvest(
        &mut self,
        plot: usize,
        pointer: Option<ScreenPoint>,
        element: Option<BoundingBox>,
    ) -> Option<Harvest> {
        self.stamp_log();
        let harvest = logic::harvest(&mut self.state, &mut self.log, plot)?;
        self.persist();
        if let Some(fx) = self.effects.as_mut() {
            let at = effects::resolve_anchor(pointer, element, self.viewport);
            let text = format!("+{}{}", harvest.amount, harvest.veggie.emoji());
            fx.floating_text(at, &text, true);
        }
        Some(harvest)
    }

    pub fn buy_market_item(&mut self, item: MarketItemId) -> bool {
        let now = self.clock.now_ms();
        self.log.set_time(now);
        let bought = logic::buy_market_item(&mut self.state, &mut self.log, item, now);
        if bought {
            self.persist();
        }
        bought
    }

    pub fn convert_veggie(&mut self, veggie: VeggieId) -> f64 {
        self.stamp_log();
        let gained = logic::convert_veggie_stocks(&mut self.state, &mut self.log, veggie);
        if gained > 0.0 {
            self.persist();
        }
        gained
    }

    pub fn convert_all(&mut self) -> f64 {
        self.stamp_log();
        let gained = logic::convert_stocks_to_bio_vibes(&mut self.state, &mut self.log);
        if gained > 0.0 {
            self.persist();
        }
        gained
    }

    pub fn unlock_veggie(&mut self, veggie: VeggieId) -> bool {
        self.stamp_log();
        let unlocked = logic::unlock_veggie(&mut self.state, &mut self.log, veggie);
        if unlocked {
            self.persist();
        }
        unlocked
    }

    pub fn select_veggie(&mut self, veggie: VeggieId) -> bool {
        self.stamp_log();
        let selected = logic::select_veggie(&mut self.state, &mut self.log, veggie);
        if selected {
            self.persist();
        }
        selected
    }

    /// Wipe the save and start over.
    pub fn reset(&mut self) {
        self.stamp_log();
        if let Err(e) = save::delete_save(self.storage.as_deref(), &self.config.storage_key) {
            warn!(error = %e, "failed to delete save data");
        }
        self.state = GameState::new(self.clock.now_ms());
        self.scheduler = Scheduler::with_intervals(
            0,
            self.config.factory_interval_secs,
            self.config.autosave_interval_secs,
        );
        self.log.clear();
        self.log.add("Fresh start. Good vibes only.", Tone::Info);
        debug!("game reset");
    }

    /// Dispatch a UI command. Returns whether the game state changed.
    pub fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Click { pointer } => self.click(pointer) > 0.0,
            Command::BuyBuilding(b) => self.buy_building(b),
            Command::Plant { plot } => self.plant(plot),
            Command::Harvest {
                plot,
                pointer,
                element,
            } => self.harvest(plot, pointer, element).is_some(),
            Command::BuyMarketItem(item) => self.buy_market_item(item),
            Command::ConvertVeggie(v) => self.convert_veggie(v) > 0.0,
            Command::ConvertAll => self.convert_all() > 0.0,
            Command::UnlockVeggie(v) => self.unlock_veggie(v),
            Command::SelectVeggie(v) => self.select_veggie(v),
            Command::Reset => {
                self.reset();
                true
            }
        }
    }

    // ── Frame loop ──────────────────────────────────────────────

    /// Advance the simulation to `now_ms`.
    pub fn frame(&mut self, now_ms: u64) -> TickReport {
        self.log.set_time(now_ms);
        let dt = self.frame_clock.update(now_ms);
        let report = self
            .scheduler
            .tick(&mut self.state, &mut self.log, dt, now_ms);

        if let (Some(rank), Some(obs)) = (report.evolved_to, self.observer.as_mut()) {
            obs.on_evolve(rank);
        }
        if report.autosave_due {
            self.persist();
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.on_tick();
        }
        report
    }

    /// Start (or restart) the frame loop. Any previous handle is cancelled.
    pub fn start_loop(&mut self) -> LoopHandle {
        if let Some(old) = self.loop_flag.take() {
            old.set(false);
        }
        let running = Rc::new(Cell::new(true));
        self.loop_flag = Some(Rc::clone(&running));
        self.frame_clock = FrameClock::starting_at(self.clock.now_ms());
        LoopHandle { running }
    }

    /// One iteration of the loop, reading the injected clock. Returns false
    /// once the loop is cancelled; the host stops rescheduling then.
    pub fn run_frame(&mut self) -> bool {
        let running = self.loop_flag.as_ref().is_some_and(|f| f.get());
        if !running {
            return false;
        }
        let now = self.clock.now_ms();
        self.frame(now);
        true
    }

    fn stamp_log(&mut self) {
        let now = self.clock.now_ms();
        self.log.set_time(now);
    }

    /// Save now. Failures are logged, never raised.
    pub fn persist(&self) {
        if let Err(e) = save::save_game(
            self.storage.as_deref(),
            &self.config.storage_key,
            &self.state,
        ) {
            warn!(error = %e, "failed to save game");
        }
    }
}

/// Compact display of a click gain: whole numbers without decimals.
fn format_amount(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as u64)
    } else {
        format!("{:.1}", value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::save::MemoryStorage;
    use crate::time::ManualClock;
    use std::cell::RefCell;

    fn game() -> (VibeGame, Rc<ManualClock>) {
        let clock = Rc::new(ManualClock::new(1_000));
        let game = VibeGame::new(EngineConfig::default(), Box::new(Rc::clone(&clock)));
        (game, clock)
    }

    #[derive(Default)]
    struct Events {
        bought: Vec<BuildingId>,
        texts: Vec<(ScreenPoint, String)>,
        evolved: Vec<usize>,
        ticks: u32,
    }

    struct Recorder(Rc<RefCell<Events>>);

    impl EffectSink for Recorder {
        fn building_bought(&mut self, building: BuildingId) {
            self.0.borrow_mut().bought.push(building);
        }
        fn floating_text(&mut self, at: ScreenPoint, text: &str, _is_click: bool) {
            self.0.borrow_mut().texts.push((at, text.to_string()));
        }
    }

    impl Observer for Recorder {
        fn on_evolve(&mut self, rank_index: usize) {
            self.0.borrow_mut().evolved.push(rank_index);
        }
        fn on_tick(&mut self) {
            self.0.borrow_mut().ticks += 1;
        }
    }

    #[test]
    fn works_without_collaborators() {
        let (mut g, _) = game();
        g.click(Some(ScreenPoint::new(5.0, 5.0)));
        assert_eq!(g.state().vibes, 1.0);
        g.state.vibes = 100.0;
        assert!(g.buy_building(BuildingId::Cursor));
        g.frame(2_000);
        g.reset();
        assert_eq!(g.state().vibes, 0.0);
    }

    #[test]
    fn buy_notifies_effect_sink() {
        let events = Rc::new(RefCell::new(Events::default()));
        let (g, _) = game();
        let mut g = g.with_effects(Box::new(Recorder(Rc::clone(&events))));
        g.state.vibes = 20.0;
        assert!(g.buy_building(BuildingId::Cursor));
        assert!(!g.buy_building(BuildingId::Cursor));
        assert_eq!(events.borrow().bought, vec![BuildingId::Cursor]);
    }

    #[test]
    fn click_popup_only_with_pointer() {
        let events = Rc::new(RefCell::new(Events::default()));
        let (g, _) = game();
        let mut g = g.with_effects(Box::new(Recorder(Rc::clone(&events))));
        g.click(None);
        g.click(Some(ScreenPoint::new(3.0, 4.0)));
        let texts = &events.borrow().texts;
        assert_eq!(texts.len(), 1);
        assert_eq!(texts[0], (ScreenPoint::new(3.0, 4.0), "+1".to_string()));
    }

    #[test]
    fn observer_sees_ticks_and_evolution() {
        let events = Rc::new(RefCell::new(Events::default()));
        let (g, _) = game();
        let mut g = g.with_observer(Box::new(Recorder(Rc::clone(&events))));
        g.frame(1_000);
        g.state.earn(1_000.0);
        g.frame(1_016);
        g.frame(1_032);
        assert_eq!(events.borrow().ticks, 3);
        assert_eq!(events.borrow().evolved, vec![1]);
        assert_eq!(g.rank().name, RANKS[1].name);
    }

    #[test]
    fn successful_commands_persist() {
        let storage = Rc::new(MemoryStorage::new());
        let (g, _) = game();
        let mut g = g.with_storage(Box::new(Rc::clone(&storage)));
        g.state.vibes = 10.0;
        assert!(!g.buy_building(BuildingId::Cursor));
        assert!(storage.is_empty());
        g.state.vibes = 15.0;
        assert!(g.buy_building(BuildingId::Cursor));
        assert_eq!(storage.len(), 1);
    }

    #[test]
    fn loop_stops_after_cancel() {
        let (mut g, clock) = game();
        g.state.inventory.insert(BuildingId::Grandma, 1);
        assert!(!g.run_frame());

        let handle = g.start_loop();
        clock.advance_secs(1.0);
        assert!(g.run_frame());
        assert!((g.state().vibes - 3.0).abs() < 1e-9);

        handle.cancel();
        assert!(!handle.is_running());
        clock.advance_secs(1.0);
        assert!(!g.run_frame());
        assert!((g.state().vibes - 3.0).abs() < 1e-9);
    }

    #[test]
    fn log_entries_are_stamped_with_the_clock() {
        let (mut g, clock) = game();
        g.state.vibes = 10.0;
        clock.set(42_000);
        assert!(!g.buy_building(BuildingId::Cursor));
        assert_eq!(g.log().latest().unwrap().time, 42_000);

        g.state.farming.plots[0].stage = crate::state::PlotStage::Growing;
        g.state.farming.plots[0].timer = 10.0;
        g.frame(50_000);
        g.frame(70_000);
        let ripe = g.log().latest().unwrap();
        assert_eq!(ripe.text, "A crop is ripe!");
        assert_eq!(ripe.time, 70_000);
    }

    #[test]
    fn restarting_loop_cancels_old_handle() {
        let (mut g, _) = game();
        let first = g.start_loop();
        let second = g.start_loop();
        assert!(!first.is_running());
        assert!(second.is_running());
    }

    #[test]
    fn commands_dispatch() {
        let (mut g, _) = game();
        assert!(g.handle_command(Command::Click { pointer: None }));
        assert!(!g.handle_command(Command::BuyBuilding(BuildingId::Portal)));
        assert!(!g.handle_command(Command::Plant { plot: 0 }));
        assert!(!g.handle_command(Command::ConvertAll));
        assert!(g.handle_command(Command::Reset));
        assert_eq!(g.state().total_vibes, 0.0);
    }

    #[test]
    fn format_amounts() {
        assert_eq!(format_amount(1.0), "1");
        assert_eq!(format_amount(1.5), "1.5");
    }
}
