//! Per-frame update: production, crop timers, fertilizer decay, factory
//! auto-conversion, rank evolution and the autosave cadence.

use tracing::debug;

use crate::catalog::RANKS;
use crate::economy;
use crate::logic;
use crate::state::{GameState, LogBook, PlotStage, Tone};

pub const MS_PER_HOUR: u64 = 60 * 60 * 1000;
pub const DEFAULT_AUTOSAVE_SECS: f64 = 30.0;
pub const DEFAULT_FACTORY_SECS: f64 = 5.0;

/// What happened during one tick, for the caller to act on.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    pub produced: f64,
    /// Plot ids that became ripe.
    pub ripened: Vec<usize>,
    /// Fertilizer units that wore off.
    pub decayed: u32,
    /// Bio-vibes produced by the factory.
    pub converted: f64,
    /// New rank index, reported once per threshold crossing.
    pub evolved_to: Option<usize>,
    pub autosave_due: bool,
}

/// Timers that live across ticks but are not persisted.
#[derive(Clone, Debug)]
pub struct Scheduler {
    rank_index: usize,
    factory_timer: f64,
    autosave_timer: f64,
    factory_interval: f64,
    autosave_interval: f64,
}

impl Scheduler {
    pub fn new(rank_index: usize) -> Self {
        Self::with_intervals(rank_index, DEFAULT_FACTORY_SECS, DEFAULT_AUTOSAVE_SECS)
    }

    pub fn with_intervals(rank_index: usize, factory_secs: f64, autosave_secs: f64) -> Self {
        Self {
            rank_index,
            factory_timer: 0.0,
            autosave_timer: 0.0,
            factory_interval: factory_secs,
            autosave_interval: autosave_secs,
        }
    }

    pub fn rank_index(&self) -> usize {
        self.rank_index
    }

    /// Resync after a load or reset.
    pub fn set_rank_index(&mut self, rank_index: usize) {
        self.rank_index = rank_index;
    }

    /// Advance the game by `dt` seconds, with `now_ms` as the wall clock.
    pub fn tick(
        &mut self,
        state: &mut GameState,
        log: &mut LogBook,
        dt: f64,
        now_ms: u64,
    ) -> TickReport {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        let mut report = TickReport::default();

        // Production
        let produced = economy::production_rate(state) * dt;
        state.earn(produced);
        report.produced = produced;

        // Crops
        tick_plots(state, log, dt, &mut report);

        // Fertilizer
        report.decayed = decay_fertilizer(state, now_ms);
        if report.decayed > 0 {
            log.add(
                format!("{} fertilizer wore off.", report.decayed),
                Tone::Info,
            );
        }

        // Factory
        if state.farming.factory.enabled {
            self.factory_timer += dt;
            if self.factory_timer >= self.factory_interval {
                self.factory_timer -= self.factory_interval;
                report.converted = logic::factory_convert(state);
                if report.converted > 0.0 {
                    debug!(bio_vibes = report.converted, "factory auto-conversion");
                }
            }
        }

        // Rank
        if let Some(next) = RANKS.get(self.rank_index + 1) {
            if state.total_vibes >= next.threshold {
                self.rank_index += 1;
                report.evolved_to = Some(self.rank_index);
                log.add(format!("You evolved into {}!", next.name), Tone::Milestone);
                debug!(rank = self.rank_index, "rank evolved");
            }
        }

        // Autosave
        self.autosave_timer += dt;
        if self.autosave_timer >= self.autosave_interval {
            self.autosave_timer = 0.0;
            report.autosave_due = true;
            log.add("Game Saved", Tone::Save);
        }

        report
    }
}

fn tick_plots(state: &mut GameState, log: &mut LogBook, dt: f64, report: &mut TickReport) {
    for plot in &mut state.farming.plots {
        if plot.stage != PlotStage::Growing {
            continue;
        }
        plot.timer -= dt;
        if plot.timer <= 0.0 {
            plot.stage = PlotStage::Ripe;
            report.ripened.push(plot.id);
        }
    }
    for _ in &report.ripened {
        log.add("A crop is ripe!", Tone::Success);
    }
}

/// Remove one active fertilizer per whole hour since the last decay step.
/// The clock advances by whole hours only so partial progress is kept.
fn decay_fertilizer(state: &mut GameState, now_ms: u64) -> u32 {
    let fert = &mut state.farming.fertilizer;
    if fert.active == 0 {
        return 0;
    }
    let hours = now_ms.saturating_sub(fert.last_decay_time) / MS_PER_HOUR;
    if hours == 0 {
        return 0;
    }
    let removed = hours.min(fert.active as u64) as u32;
    fert.active -= removed;
    fert.last_decay_time += hours * MS_PER_HOUR;
    removed
}
