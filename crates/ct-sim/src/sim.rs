//! The `Sim` struct and its step loop.

use log::{debug, info};

use ct_core::{SimConfig, Tick, XyPoint};
use ct_spatial::{CoordinateTransformer, SiteResolver};

use crate::{
    AssociationEvent, AssociationTracker, EventSink, RunSummary, SimError, SimObserver, SimResult,
    SimulationController, VehiclePos, VehicleSample,
};

// ── Sim ───────────────────────────────────────────────────────────────────────

/// The association driver.
///
/// Each step:
///
/// 1. **Advance** the controller; stop if it is finished or its clock has
///    passed `config.end_time`.
/// 2. **Departures**: forget every vehicle the controller reports as gone;
///    mark teleported vehicles for a fresh resolve.
/// 3. **Evaluate** every live vehicle in controller order: project its
///    position, run the tracker.  Associated vehicles are only re-checked on
///    steps that are multiples of `config.check_interval_steps`.
/// 4. **Emit**: on those check steps, append one event per live vehicle to
///    the sink as a single batch.
///
/// Create via [`SimBuilder`][crate::SimBuilder].
pub struct Sim<C: SimulationController, R: SiteResolver> {
    pub config: SimConfig,

    /// Source of vehicle positions.
    pub controller: C,

    pub resolver: R,

    /// Per-vehicle association state.
    pub tracker: AssociationTracker,

    /// Required when the controller reports geographic positions.
    pub transformer: Option<CoordinateTransformer>,

    tick:    Tick,
    summary: RunSummary,
}

impl<C: SimulationController, R: SiteResolver> Sim<C, R> {
    pub(crate) fn new(
        config:      SimConfig,
        controller:  C,
        resolver:    R,
        transformer: Option<CoordinateTransformer>,
    ) -> Self {
        Self {
            tracker: AssociationTracker::new(config.threshold_m),
            config,
            controller,
            resolver,
            transformer,
            tick:    Tick::ZERO,
            summary: RunSummary::default(),
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Run until the controller is exhausted or the end time is passed, then
    /// finish the sink and close the controller.
    ///
    /// On error the run stops immediately; batches already appended stay in
    /// the sink.
    pub fn run<S, O>(&mut self, sink: &mut S, observer: &mut O) -> SimResult<RunSummary>
    where
        S: EventSink,
        O: SimObserver,
    {
        info!(
            "association run: threshold {} m, check every {} step(s), end {}",
            self.config.threshold_m,
            self.config.check_interval_steps,
            self.config
                .end_time
                .map_or_else(|| "when the simulation ends".to_owned(), |t| format!("at {t} s")),
        );

        while self.step(sink, observer)? {}

        sink.finish().map_err(|e| SimError::Sink(Box::new(e)))?;
        self.controller.close()?;
        observer.on_sim_end(&self.summary);
        Ok(self.summary)
    }

    /// Run at most `n` steps.  The controller and the end time can still
    /// stop the loop early.  Does not finish the sink.
    ///
    /// Returns the number of steps evaluated.  Useful for tests and
    /// incremental stepping.
    pub fn run_steps<S, O>(&mut self, n: u64, sink: &mut S, observer: &mut O) -> SimResult<u64>
    where
        S: EventSink,
        O: SimObserver,
    {
        let mut done = 0;
        while done < n && self.step(sink, observer)? {
            done += 1;
        }
        Ok(done)
    }

    /// The next step's tick.
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    /// Totals so far.
    pub fn summary(&self) -> RunSummary {
        self.summary
    }

    // ── Core step processing ──────────────────────────────────────────────

    fn step<S, O>(&mut self, sink: &mut S, observer: &mut O) -> SimResult<bool>
    where
        S: EventSink,
        O: SimObserver,
    {
        let tick = self.tick;
        observer.on_step_start(tick);

        if !self.controller.advance()? {
            debug!("controller finished at {tick}");
            return Ok(false);
        }
        let time = self.controller.time();
        if self.config.is_past_end(time) {
            debug!("end time reached at t={time}");
            return Ok(false);
        }

        for vehicle in self.controller.departed_vehicles()? {
            if self.tracker.forget(vehicle.as_str()).is_some() {
                debug!("{vehicle} left the simulation at t={time}");
            }
        }

        for vehicle in self.controller.teleported_vehicles()? {
            if self.tracker.force_resolve(vehicle.as_str()) {
                debug!("{vehicle} teleported at t={time}, resolving again");
            }
        }

        let samples = self.controller.live_vehicle_positions()?;
        let recheck = tick.is_multiple_of(self.config.check_interval_steps);
        let mut events = Vec::with_capacity(if recheck { samples.len() } else { 0 });

        for sample in samples {
            let pos = self.project(&sample)?;
            let obs = self.tracker.observe(&sample.id, pos, recheck, &self.resolver);
            if obs.changed() {
                debug!(
                    "t={time} {}: {:?} -> {:?} ({:.1} m)",
                    sample.id, obs.previous, obs.current, obs.distance
                );
            }
            if recheck {
                events.push(AssociationEvent {
                    vehicle:  sample.id,
                    time,
                    site:     obs.current.site(),
                    distance: obs.distance,
                    pos,
                });
            }
        }

        if !events.is_empty() {
            sink.append(&events).map_err(|e| SimError::Sink(Box::new(e)))?;
        }

        self.summary.steps += 1;
        self.summary.events += events.len() as u64;
        self.summary.unassociated_events += events.iter().filter(|e| e.site.is_none()).count() as u64;
        self.summary.changes = self.tracker.total_changes();
        self.summary.last_time = time;

        observer.on_step_end(tick, time, &events);
        self.tick = tick.offset(1);
        Ok(true)
    }

    fn project(&self, sample: &VehicleSample) -> SimResult<XyPoint> {
        let pos = match sample.pos {
            VehiclePos::Projected(p) => p,
            VehiclePos::Geographic(g) => match &self.transformer {
                Some(t) => t.to_projected(g),
                None => {
                    return Err(SimError::Config(
                        "geographic vehicle positions need a network file for projection".into(),
                    ));
                }
            },
        };
        if !(pos.x.is_finite() && pos.y.is_finite()) {
            return Err(SimError::simulation(format!(
                "vehicle {} has a non-finite position {pos}",
                sample.id
            )));
        }
        Ok(pos)
    }
}
