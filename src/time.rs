//! Time sources and the variable-step frame clock.
//!
//! The host calls `VibeGame::frame` from its animation-frame callback with a
//! wall-clock timestamp. `FrameClock` turns consecutive timestamps into a
//! delta in seconds; game logic then scales every rate by that delta, so
//! there is no fixed timestep. Timestamps are epoch milliseconds because
//! fertilizer decay is measured against persisted wall-clock times.

use std::cell::Cell;

/// Injected wall-clock source (epoch milliseconds).
pub trait Clock {
    fn now_ms(&self) -> u64;
}

/// `std::time::SystemTime` clock for native hosts.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}

/// `Date.now()` clock. `SystemTime::now()` panics on wasm32-unknown-unknown.
#[cfg(target_arch = "wasm32")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserClock;

#[cfg(target_arch = "wasm32")]
impl Clock for BrowserClock {
    fn now_ms(&self) -> u64 {
        js_sys::Date::now().max(0.0) as u64
    }
}

/// Clock driven by hand, for tests and replays.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<u64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Cell::new(start_ms),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.set(now_ms);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }

    pub fn advance_secs(&self, secs: f64) {
        self.advance_ms((secs * 1000.0).round() as u64);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for std::rc::Rc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}

/// Converts frame timestamps into elapsed seconds.
#[derive(Debug, Default)]
pub struct FrameClock {
    /// Timestamp of the last update (ms), None if first frame
    last_timestamp: Option<u64>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start counting from `now_ms` without producing a delta.
    pub fn starting_at(now_ms: u64) -> Self {
        Self {
            last_timestamp: Some(now_ms),
        }
    }

    /// Feed the current timestamp. Returns seconds since the previous call.
    /// The first frame and clocks running backwards yield 0.
    pub fn update(&mut self, now_ms: u64) -> f64 {
        let delta_ms = match self.last_timestamp {
            Some(prev) => now_ms.saturating_sub(prev),
            None => 0,
        };
        if self.last_timestamp.is_none_or(|prev| now_ms >= prev) {
            self.last_timestamp = Some(now_ms);
        }
        delta_ms as f64 / 1000.0
    }
}
