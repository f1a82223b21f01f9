//! Simulation observer trait for progress reporting.

use ct_core::{SimTime, Tick};

use crate::AssociationEvent;

/// Totals of one association run.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Steps evaluated.
    pub steps:               u64,
    /// Events appended to the sink.
    pub events:              u64,
    /// Site changes over all vehicles.
    pub changes:             u64,
    /// Events without a site.
    pub unassociated_events: u64,
    /// Simulation time of the last evaluated step.
    pub last_time:           SimTime,
}

/// Callbacks invoked by [`Sim::run`][crate::Sim::run] at key points in the
/// step loop.
///
/// All methods have default no-op implementations so implementors only need to
/// override what they care about.
pub trait SimObserver {
    /// Called before the controller is advanced.
    fn on_step_start(&mut self, _tick: Tick) {}

    /// Called after the step has been evaluated and its events appended.
    /// `events` is empty on steps that are not check steps.
    fn on_step_end(&mut self, _tick: Tick, _time: SimTime, _events: &[AssociationEvent]) {}

    /// Called once after the last step, when the sink has been finished.
    fn on_sim_end(&mut self, _summary: &RunSummary) {}
}

/// A [`SimObserver`] that does nothing.  Use when you need to call `run` but
/// don't want progress callbacks.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}
