/// Game state definitions: the persisted aggregate and the player-facing log.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use crate::catalog::{BuildingId, MarketItemId, VeggieId, BASE_PLOTS, MAX_EXTRA_PLOTS};

/// Growth stage of a plot. Serialized as 0 / 1 / 2.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum PlotStage {
    #[default]
    Empty,
    Growing,
    Ripe,
}

impl From<PlotStage> for u8 {
    fn from(stage: PlotStage) -> u8 {
        match stage {
            PlotStage::Empty => 0,
            PlotStage::Growing => 1,
            PlotStage::Ripe => 2,
        }
    }
}

impl TryFrom<u8> for PlotStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(PlotStage::Empty),
            1 => Ok(PlotStage::Growing),
            2 => Ok(PlotStage::Ripe),
            other => Err(format!("invalid plot stage {other}")),
        }
    }
}

/// A single farming slot.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Plot {
    pub id: usize,
    pub stage: PlotStage,
    /// Seconds until ripe while growing. May dip below zero on the ripening tick.
    pub timer: f64,
    pub max_time: f64,
    pub veggie_type: VeggieId,
}

impl Plot {
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    /// Growth progress in `0.0..=1.0`, for progress bars.
    pub fn progress(&self) -> f64 {
        match self.stage {
            PlotStage::Empty => 0.0,
            PlotStage::Ripe => 1.0,
            PlotStage::Growing if self.max_time > 0.0 => {
                (1.0 - self.timer / self.max_time).clamp(0.0, 1.0)
            }
            PlotStage::Growing => 0.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FactoryState {
    pub enabled: bool,
    pub conversion_rate: f64,
}

impl Default for FactoryState {
    fn default() -> Self {
        Self {
            enabled: false,
            conversion_rate: 1.0,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FertilizerState {
    /// Lifetime purchases.
    pub purchased: u32,
    /// Units still in effect.
    pub active: u32,
    /// Epoch milliseconds of the last whole-hour decay step.
    pub last_decay_time: u64,
}

/// The farming sub-aggregate. Inert until `unlocked`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FarmingState {
    pub unlocked: bool,
    pub bio_vibes: f64,
    pub plots: Vec<Plot>,
    pub upgrades: BTreeMap<MarketItemId, u32>,
    pub stocks: BTreeMap<VeggieId, f64>,
    pub unlocked_veggies: BTreeSet<VeggieId>,
    pub factory: FactoryState,
    pub fertilizer: FertilizerState,
    pub extra_plots: u32,
    pub selected_veggie_type: VeggieId,
}

impl FarmingState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            unlocked: false,
            bio_vibes: 0.0,
            plots: (0..BASE_PLOTS).map(Plot::empty).collect(),
            upgrades: BTreeMap::new(),
            stocks: VeggieId::all().iter().map(|v| (*v, 0.0)).collect(),
            unlocked_veggies: BTreeSet::from([VeggieId::Carrot]),
            factory: FactoryState::default(),
            fertilizer: FertilizerState {
                last_decay_time: now_ms,
                ..FertilizerState::default()
            },
            extra_plots: 0,
            selected_veggie_type: VeggieId::Carrot,
        }
    }

    /// Purchase count of a market upgrade (0 if never bought).
    pub fn upgrade_count(&self, item: MarketItemId) -> u32 {
        self.upgrades.get(&item).copied().unwrap_or(0)
    }

    pub fn stock(&self, veggie: VeggieId) -> f64 {
        self.stocks.get(&veggie).copied().unwrap_or(0.0)
    }

    pub fn is_unlocked(&self, veggie: VeggieId) -> bool {
        self.unlocked_veggies.contains(&veggie)
    }

    pub fn plot(&self, id: usize) -> Option<&Plot> {
        self.plots.iter().find(|p| p.id == id)
    }

    pub fn plot_mut(&mut self, id: usize) -> Option<&mut Plot> {
        self.plots.iter_mut().find(|p| p.id == id)
    }

    /// Total plots the farm should have.
    pub fn plot_capacity(&self) -> usize {
        BASE_PLOTS + self.extra_plots as usize
    }
}

impl Default for FarmingState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Full persisted state of a run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameState {
    /// Spendable vibes.
    pub vibes: f64,
    /// Lifetime vibes earned. Never decreases.
    pub total_vibes: f64,
    /// Epoch milliseconds when this run began.
    pub start_time: u64,
    pub inventory: BTreeMap<BuildingId, u32>,
    pub farming: FarmingState,
}

impl GameState {
    pub fn new(now_ms: u64) -> Self {
        Self {
            vibes: 0.0,
            total_vibes: 0.0,
            start_time: now_ms,
            inventory: BuildingId::all().iter().map(|b| (*b, 0)).collect(),
            farming: FarmingState::new(now_ms),
        }
    }

    /// Owned count of a building (0 if absent).
    pub fn owned(&self, building: BuildingId) -> u32 {
        self.inventory.get(&building).copied().unwrap_or(0)
    }

    /// Credit earned vibes to both the wallet and the lifetime total.
    pub fn earn(&mut self, amount: f64) {
        if amount > 0.0 {
            self.vibes += amount;
            self.total_vibes += amount;
        }
    }

    /// Repair a state read from storage so the invariants hold again.
    /// States produced by the engine itself pass through unchanged.
    pub fn sanitize(&mut self) {
        if !self.vibes.is_finite() || self.vibes < 0.0 {
            self.vibes = 0.0;
        }
        if !self.total_vibes.is_finite() || self.total_vibes < 0.0 {
            self.total_vibes = self.vibes;
        }

        let farm = &mut self.farming;
        if !farm.bio_vibes.is_finite() || farm.bio_vibes < 0.0 {
            farm.bio_vibes = 0.0;
        }
        farm.extra_plots = farm.extra_plots.min(MAX_EXTRA_PLOTS);
        let capacity = farm.plot_capacity();
        farm.plots.truncate(capacity);
        while farm.plots.len() < capacity {
            let id = farm.plots.len();
            farm.plots.push(Plot::empty(id));
        }
        for (idx, plot) in farm.plots.iter_mut().enumerate() {
            plot.id = idx;
        }
        farm.unlocked_veggies.insert(VeggieId::Carrot);
        if !farm.is_unlocked(farm.selected_veggie_type) {
            farm.selected_veggie_type = VeggieId::Carrot;
        }
        for stock in farm.stocks.values_mut() {
            if !stock.is_finite() || *stock < 0.0 {
                *stock = 0.0;
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(0)
    }
}

/// Presentation tone of a log line. `tag()` is the severity tag handed to the UI.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Plant,
    Harvest,
    Warning,
    Save,
    Milestone,
}

impl Tone {
    pub fn tag(&self) -> &'static str {
        match self {
            Tone::Info => "text-gray-300",
            Tone::Success => "text-green-400",
            Tone::Plant => "text-green-300",
            Tone::Harvest => "text-orange-400",
            Tone::Warning => "text-red-400",
            Tone::Save => "text-blue-400",
            Tone::Milestone => "text-yellow-400",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogEntry {
    pub text: String,
    pub tone: Tone,
    /// Epoch milliseconds when the entry was written.
    pub time: u64,
}

/// Bounded player-facing message log, newest first.
#[derive(Clone, Debug)]
pub struct LogBook {
    entries: VecDeque<LogEntry>,
    capacity: usize,
    now_ms: u64,
}

pub const DEFAULT_LOG_CAPACITY: usize = 50;

impl LogBook {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
            now_ms: 0,
        }
    }

    /// Timestamp stamped on entries added from now on.
    pub fn set_time(&mut self, now_ms: u64) {
        self.now_ms = now_ms;
    }

    pub fn add(&mut self, text: impl Into<String>, tone: Tone) {
        self.entries.push_front(LogEntry {
            text: text.into(),
            tone,
            time: self.now_ms,
        });
        self.entries.truncate(self.capacity);
    }

    /// The most recent entry.
    pub fn latest(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Entries from newest to oldest.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LogBook {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_CAPACITY)
    }
}
