//! Fluent builder for constructing a [`Sim`].

use ct_core::SimConfig;
use ct_spatial::{CoordinateTransformer, SiteResolver};

use crate::{Sim, SimError, SimResult, SimulationController};

/// Fluent builder for [`Sim<C, R>`].
///
/// # Required inputs
///
/// - [`SimConfig`] — threshold, check interval, end time, …
/// - `C: SimulationController` — TraCI, FCD replay, or a test double
/// - `R: SiteResolver` — built over the site catalog
///
/// # Optional inputs
///
/// | Method               | Default | Needed when                              |
/// |----------------------|---------|------------------------------------------|
/// | `.transformer(t)`    | none    | the controller reports lat/long          |
///
/// # Example
///
/// ```rust,ignore
/// let resolver = RTreeResolver::new(&catalog);
/// let mut sim = SimBuilder::new(config, FcdReplay::open(&path, false)?, resolver)
///     .transformer(transformer)
///     .build()?;
/// let summary = sim.run(&mut writer, &mut NoopObserver)?;
/// ```
pub struct SimBuilder<C: SimulationController, R: SiteResolver> {
    config:      SimConfig,
    controller:  C,
    resolver:    R,
    transformer: Option<CoordinateTransformer>,
}

impl<C: SimulationController, R: SiteResolver> SimBuilder<C, R> {
    pub fn new(config: SimConfig, controller: C, resolver: R) -> Self {
        Self { config, controller, resolver, transformer: None }
    }

    pub fn transformer(mut self, transformer: CoordinateTransformer) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Validate the configuration and return a ready-to-run [`Sim`].
    pub fn build(self) -> SimResult<Sim<C, R>> {
        let c = &self.config;
        if !(c.threshold_m.is_finite() && c.threshold_m > 0.0) {
            return Err(SimError::Config(format!(
                "distance threshold must be a positive number of metres, got {}",
                c.threshold_m
            )));
        }
        if c.check_interval_steps == 0 {
            return Err(SimError::Config("check interval must be at least one step".into()));
        }
        Ok(Sim::new(self.config, self.controller, self.resolver, self.transformer))
    }
}
