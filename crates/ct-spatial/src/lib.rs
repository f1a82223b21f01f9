//! `ct-spatial` — projection, the cell-site catalog, and nearest-site lookup.
//!
//! # Crate layout
//!
//! | Module         | Contents                                                  |
//! |----------------|-----------------------------------------------------------|
//! | [`projection`] | `NetLocation`, `UtmZone`, `CoordinateTransformer`         |
//! | [`catalog`]    | `CellSite`, `SiteCatalog` (loaded / generated)            |
//! | [`resolver`]   | `SiteResolver` trait, brute-force and R-tree resolvers    |
//! | [`extract`]    | `extract_city_sites` for raw operator tables              |
//! | [`error`]      | `SpatialError`, `SpatialResult<T>`                        |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on `ct-core` value types.  |

pub mod catalog;
pub mod error;
pub mod extract;
pub mod projection;
pub mod resolver;


pub use catalog::{CellSite, SiteCatalog};
pub use error::{SpatialError, SpatialResult};
pub use extract::{extract_city_sites, ExtractedSite};
pub use projection::{CoordinateTransformer, NetLocation, UtmZone};
pub use resolver::{BruteForceResolver, RTreeResolver, Resolution, SiteResolver};
