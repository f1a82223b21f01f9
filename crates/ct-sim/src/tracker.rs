//! Per-vehicle association state machine.
//!
//! ```text
//!                     resolve finds s'
//!   Unassociated ──────────────────────────► Associated(s')
//!        ▲  │ resolve finds nothing               │
//!        │  └──────────┘                          │ d(s) > threshold, recheck:
//!        │                                        │   resolve finds s'  → Associated(s')
//!        └────────────────────────────────────────┘   resolve finds nothing
//! ```
//!
//! `Associated(s)` with `d(s) <= threshold` keeps `s` without a resolver
//! call, unless a forced re-resolve is pending.  On steps where `recheck`
//! is false an associated vehicle keeps its site unconditionally; its
//! distance is still refreshed.

use ct_core::{SiteIdx, VehicleId, XyPoint};
use ct_spatial::SiteResolver;

#[cfg(feature = "fx-hash")]
type VehicleMap<V> = rustc_hash::FxHashMap<VehicleId, V>;
#[cfg(not(feature = "fx-hash"))]
type VehicleMap<V> = std::collections::HashMap<VehicleId, V>;

/// Current association of one vehicle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum Association {
    #[default]
    Unassociated,
    Associated(SiteIdx),
}

impl Association {
    pub fn site(self) -> Option<SiteIdx> {
        match self {
            Association::Associated(s) => Some(s),
            Association::Unassociated  => None,
        }
    }

    fn from_site(site: Option<SiteIdx>) -> Self {
        site.map_or(Association::Unassociated, Association::Associated)
    }
}

/// Tracker entry for one vehicle.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TrackerState {
    pub association:   Association,
    /// Distance to the associated site, or to the nearest site when
    /// unassociated.
    pub last_distance: f64,
    /// Number of evaluations that changed the site, including the first
    /// association.
    pub changes:       u64,
    /// Set by [`AssociationTracker::force_resolve`]: the next evaluation
    /// consults the resolver even if the site is still in range.
    pub resolve_next:  bool,
}

impl Default for TrackerState {
    fn default() -> Self {
        Self {
            association:   Association::Unassociated,
            last_distance: f64::INFINITY,
            changes:       0,
            resolve_next:  false,
        }
    }
}

/// Result of one [`AssociationTracker::observe`] call.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Observation {
    pub previous: Association,
    pub current:  Association,
    pub distance: f64,
    /// `true` if the resolver was consulted.
    pub resolved: bool,
}

impl Observation {
    pub fn changed(&self) -> bool {
        self.previous != self.current
    }
}

/// Owns the state of every vehicle seen and not yet departed.
#[derive(Debug)]
pub struct AssociationTracker {
    threshold_m:   f64,
    states:        VehicleMap<TrackerState>,
    total_changes: u64,
}

impl AssociationTracker {
    pub fn new(threshold_m: f64) -> Self {
        Self { threshold_m, states: VehicleMap::default(), total_changes: 0 }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold_m
    }

    /// Evaluate `vehicle` at `pos`.  Unknown vehicles start `Unassociated`.
    pub fn observe<R: SiteResolver + ?Sized>(
        &mut self,
        vehicle:  &VehicleId,
        pos:      XyPoint,
        recheck:  bool,
        resolver: &R,
    ) -> Observation {
        let threshold = self.threshold_m;
        let state = self.states.entry(vehicle.clone()).or_default();
        let previous = state.association;

        let force = std::mem::take(&mut state.resolve_next);

        let kept = match previous {
            Association::Associated(_) if force => None,
            Association::Associated(site) => resolver
                .distance_to(site, pos)
                .filter(|&d| !recheck || d <= threshold),
            Association::Unassociated => None,
        };

        let (current, distance, resolved) = match kept {
            Some(d) => (previous, d, false),
            None => {
                let res = resolver.resolve(pos, threshold);
                (Association::from_site(res.site), res.distance, true)
            }
        };

        state.association = current;
        state.last_distance = distance;
        if current != previous {
            state.changes += 1;
            self.total_changes += 1;
        }
        Observation { previous, current, distance, resolved }
    }

    /// Make the next evaluation of a known vehicle resolve from scratch,
    /// e.g. after it was moved by a teleport.  Its current site and change
    /// count are kept, so landing on the same site is not a change.
    pub fn force_resolve(&mut self, vehicle: &str) -> bool {
        match self.states.get_mut(vehicle) {
            Some(state) => {
                state.resolve_next = true;
                true
            }
            None => false,
        }
    }

    /// Drop a departed vehicle.  A later sighting starts fresh.
    pub fn forget(&mut self, vehicle: &str) -> Option<TrackerState> {
        self.states.remove(vehicle)
    }

    pub fn state(&self, vehicle: &str) -> Option<&TrackerState> {
        self.states.get(vehicle)
    }

    /// Site changes recorded for `vehicle` since it was last forgotten.
    pub fn changes(&self, vehicle: &str) -> u64 {
        self.states.get(vehicle).map_or(0, |s| s.changes)
    }

    /// Site changes over the whole run, departed vehicles included.
    pub fn total_changes(&self) -> u64 {
        self.total_changes
    }

    /// Number of vehicles currently tracked.
    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
