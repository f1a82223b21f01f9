//! celltrack — associates vehicles of a SUMO traffic simulation with the
//! nearest mobile-network cell site.
//!
//! Three binaries share this library:
//!
//! | Binary              | Does                                                       |
//! |---------------------|------------------------------------------------------------|
//! | `sites_extraction`  | filter an operator site table down to one city             |
//! | `sites_association` | run the simulation and log vehicle ↔ site associations     |
//! | `sites_analysis`    | compute one metric over a finished log                     |
//!
//! Each module holds the `clap` arguments of one binary and a `run`
//! function, so the whole pipeline can be driven from tests.

pub mod analysis;
pub mod association;
pub mod extraction;
pub mod logging;

#[cfg(test)]
mod tests;
