//! Simulation time model.
//!
//! # Design
//!
//! Two clocks run side by side:
//!
//! - `Tick` counts the steps the driver has taken.  It decides which steps
//!   re-check existing associations (`tick % check_interval == 0`).
//! - `SimTime` is the simulation's own clock as reported by the controller,
//!   stored as integer milliseconds.  SUMO step lengths are decimal seconds
//!   (`1`, `0.5`, `0.1`), so millisecond integers keep every timestamp exact
//!   and make `(timestamp, vehicle)` joins in the metrics engine reliable.

use std::fmt;

// ── Tick ─────────────────────────────────────────────────────────────────────

/// An absolute driver step counter.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Tick(pub u64);

impl Tick {
    pub const ZERO: Tick = Tick(0);

    /// Return the tick `n` steps after `self`.
    #[inline]
    pub fn offset(self, n: u64) -> Tick {
        Tick(self.0 + n)
    }

    /// `true` if this tick falls on a multiple of `interval`.  An interval
    /// of 0 never matches.
    #[inline]
    pub fn is_multiple_of(self, interval: u64) -> bool {
        interval > 0 && self.0 % interval == 0
    }
}

impl fmt::Display for Tick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}", self.0)
    }
}

// ── SimTime ───────────────────────────────────────────────────────────────────

/// Simulation time in whole milliseconds.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimTime(pub u64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0);

    #[inline]
    pub fn from_secs(secs: u64) -> Self {
        SimTime(secs * 1_000)
    }

    /// Convert decimal seconds, rounding to the nearest millisecond.
    ///
    /// Returns `None` for negative or non-finite input.
    pub fn try_from_secs_f64(secs: f64) -> Option<Self> {
        if !secs.is_finite() || secs < 0.0 {
            return None;
        }
        Some(SimTime((secs * 1_000.0).round() as u64))
    }

    #[inline]
    pub fn as_millis(self) -> u64 {
        self.0
    }

    #[inline]
    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / 1_000.0
    }
}

impl fmt::Display for SimTime {
    /// Seconds, without a trailing fraction for whole seconds (`10`, `10.5`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_secs_f64())
    }
}

// ── SimConfig ─────────────────────────────────────────────────────────────────

/// Top-level association-run configuration.
///
/// Assembled by the application crate from its command line and validated by
/// the simulation builder.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimConfig {
    /// Maximum vehicle-to-site distance in metres before re-association.
    pub threshold_m: f64,

    /// Existing associations are re-checked every N steps.  1 = every step.
    /// New and unassociated vehicles are resolved on every step regardless.
    /// Events are written on the same steps.
    pub check_interval_steps: u64,

    /// Stop once the controller's clock passes this time.  `None` runs until
    /// the controller reports the end of the simulation.
    pub end_time: Option<SimTime>,

    /// Master RNG seed for generated catalogs.
    pub seed: u64,

    /// Log progress every N steps.  0 disables progress logging.
    pub progress_interval_steps: u64,
}

impl SimConfig {
    /// Configuration with the command-line defaults (2 km threshold, check
    /// every step, one simulated day).
    pub fn with_threshold(threshold_m: f64) -> Self {
        Self {
            threshold_m,
            check_interval_steps:    1,
            end_time:                Some(SimTime::from_secs(86_400)),
            seed:                    42,
            progress_interval_steps: 0,
        }
    }

    /// `true` if `time` lies beyond the configured end.
    #[inline]
    pub fn is_past_end(&self, time: SimTime) -> bool {
        self.end_time.is_some_and(|end| time > end)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::with_threshold(2_000.0)
    }
}
