//! `ct-sim` — the vehicle-to-site association driver.
//!
//! # Step loop
//!
//! ```text
//! for tick in 0..:
//!   ① Advance     — controller.advance(); stop when finished or past end_time.
//!   ② Departures  — tracker forgets vehicles that left for good.
//!   ③ Evaluate    — for each live vehicle, in controller order:
//!                     project position (geo → network plane if needed)
//!                     tracker.observe(vehicle, pos, recheck, resolver)
//!   ④ Emit        — on check ticks, append one AssociationEvent per vehicle
//!                   to the sink as one batch.
//! ```
//!
//! # Controllers
//!
//! | Type               | Source                                           |
//! |--------------------|--------------------------------------------------|
//! | [`TraciController`] | live SUMO process over TraCI                    |
//! | [`FcdReplay`]      | recorded `--fcd-output` trace                    |
//!
//! # Cargo features
//!
//! | Feature   | Effect                                                  |
//! |-----------|---------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for the tracker map.          |
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use ct_sim::{FcdReplay, NoopObserver, SimBuilder};
//! use ct_spatial::RTreeResolver;
//!
//! let resolver = RTreeResolver::new(&catalog);
//! let mut sim = SimBuilder::new(config, FcdReplay::open(&trace, false)?, resolver).build()?;
//! let mut events = Vec::new();
//! let summary = sim.run(&mut events, &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod controller;
pub mod error;
pub mod event;
pub mod fcd;
pub mod observer;
pub mod sim;
pub mod tracker;
pub mod traci;


pub use builder::SimBuilder;
pub use controller::{SimulationController, VehiclePos, VehicleSample};
pub use error::{SimError, SimResult};
pub use event::{AssociationEvent, EventSink};
pub use fcd::FcdReplay;
pub use observer::{NoopObserver, RunSummary, SimObserver};
pub use sim::Sim;
pub use tracker::{Association, AssociationTracker, Observation, TrackerState};
pub use traci::{TraciController, TraciOptions};
