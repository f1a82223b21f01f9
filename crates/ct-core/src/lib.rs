//! `ct-core` — foundational types for the `celltrack` association engine.
//!
//! This crate is a dependency of every other `ct-*` crate.  It intentionally
//! has no `ct-*` dependencies and minimal external ones (only `rand` and
//! `thiserror`, plus optional `serde`).
//!
//! # What lives here
//!
//! | Module          | Contents                                              |
//! |-----------------|-------------------------------------------------------|
//! | [`ids`]         | `SiteIdx`, `VehicleId`                                |
//! | [`geo`]         | `GeoPoint`, `XyPoint`, `Bounds`                       |
//! | [`time`]        | `Tick`, `SimTime`, `SimConfig`                        |
//! | [`rng`]         | `SimRng` (site generation)                            |
//! | [`error`]       | `CtError`, `CtResult`                                 |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public value types.  |

pub mod error;
pub mod geo;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use error::{CtError, CtResult};
pub use geo::{Bounds, GeoPoint, XyPoint};
pub use ids::{SiteIdx, VehicleId};
pub use rng::SimRng;
pub use time::{SimConfig, SimTime, Tick};
