//! `ProgressLogger` — reports run progress through the `log` facade.

use std::time::Instant;

use log::info;

use ct_core::{SimTime, Tick};
use ct_sim::{AssociationEvent, RunSummary, SimObserver};

/// A [`SimObserver`] that logs a progress line every `interval` steps and
/// the run summary at the end.
///
/// An interval of 0 logs only the summary.
pub struct ProgressLogger {
    interval:      u64,
    started:       Instant,
    window_events: u64,
}

impl ProgressLogger {
    pub fn new(interval: u64) -> Self {
        Self { interval, started: Instant::now(), window_events: 0 }
    }
}

impl SimObserver for ProgressLogger {
    fn on_step_end(&mut self, tick: Tick, time: SimTime, events: &[AssociationEvent]) {
        self.window_events += events.len() as u64;
        if tick.offset(1).is_multiple_of(self.interval) {
            info!(
                "step {} (t={time} s): {} events in the last {} steps",
                tick.0 + 1,
                self.window_events,
                self.interval
            );
            self.window_events = 0;
        }
    }

    fn on_sim_end(&mut self, summary: &RunSummary) {
        info!(
            "finished after {} steps (t={} s) in {:.1?}: {} events, {} without a site, {} site changes",
            summary.steps,
            summary.last_time,
            self.started.elapsed(),
            summary.events,
            summary.unassociated_events,
            summary.changes
        );
    }
}
