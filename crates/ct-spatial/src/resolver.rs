//! Nearest-site resolution.
//!
//! # Semantics
//!
//! The nearest site is the one with the smallest Euclidean distance in the
//! network plane, computed as [`XyPoint::distance`].  Equal distances go to
//! the site with the lower [`SiteIdx`].  The nearest site is returned only if
//! its distance is `<= threshold`; otherwise the resolution carries no site
//! but still reports the minimum distance found (`f64::INFINITY` for an empty
//! catalog).
//!
//! [`BruteForceResolver`] is the reference definition.  [`RTreeResolver`]
//! answers the same queries through an `rstar` R-tree and must agree with it
//! bit for bit.

use rstar::{PointDistance, RTree, RTreeObject, AABB};

use ct_core::{SiteIdx, XyPoint};

use crate::SiteCatalog;

// ── Resolution ────────────────────────────────────────────────────────────────

/// Outcome of one resolution.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Resolution {
    pub site:     Option<SiteIdx>,
    /// Distance to `site`, or to the nearest site at all when `site` is
    /// `None`.
    pub distance: f64,
}

impl Resolution {
    pub const NONE: Resolution = Resolution { site: None, distance: f64::INFINITY };
}

// ── SiteResolver trait ────────────────────────────────────────────────────────

/// Pluggable nearest-site lookup.
pub trait SiteResolver {
    /// The nearest site to `pos` and its distance, ignoring any threshold.
    /// `None` only for an empty catalog.
    fn nearest(&self, pos: XyPoint) -> Option<(SiteIdx, f64)>;

    /// Distance from `pos` to `site`, with the same formula as `nearest`.
    fn distance_to(&self, site: SiteIdx, pos: XyPoint) -> Option<f64>;

    /// Nearest site within `threshold` metres.
    fn resolve(&self, pos: XyPoint, threshold: f64) -> Resolution {
        match self.nearest(pos) {
            Some((site, distance)) if distance <= threshold => {
                Resolution { site: Some(site), distance }
            }
            Some((_, distance)) => Resolution { site: None, distance },
            None => Resolution::NONE,
        }
    }
}

impl<R: SiteResolver + ?Sized> SiteResolver for Box<R> {
    fn nearest(&self, pos: XyPoint) -> Option<(SiteIdx, f64)> {
        (**self).nearest(pos)
    }

    fn distance_to(&self, site: SiteIdx, pos: XyPoint) -> Option<f64> {
        (**self).distance_to(site, pos)
    }

    fn resolve(&self, pos: XyPoint, threshold: f64) -> Resolution {
        (**self).resolve(pos, threshold)
    }
}

// ── BruteForceResolver ────────────────────────────────────────────────────────

/// Linear scan over every site.  O(n) per query.
#[derive(Clone, Debug)]
pub struct BruteForceResolver {
    positions: Vec<XyPoint>,
}

impl BruteForceResolver {
    pub fn new(catalog: &SiteCatalog) -> Self {
        Self { positions: catalog.all_sites().iter().map(|s| s.pos).collect() }
    }
}

impl SiteResolver for BruteForceResolver {
    fn nearest(&self, pos: XyPoint) -> Option<(SiteIdx, f64)> {
        let mut best: Option<(usize, f64)> = None;
        for (i, site) in self.positions.iter().enumerate() {
            let d = pos.distance(*site);
            // Strict `<`: the first site at a given distance wins.
            if best.is_none_or(|(_, bd)| d < bd) {
                best = Some((i, d));
            }
        }
        best.map(|(i, d)| (SiteIdx(i as u32), d))
    }

    fn distance_to(&self, site: SiteIdx, pos: XyPoint) -> Option<f64> {
        self.positions.get(site.index()).map(|p| pos.distance(*p))
    }
}

// ── RTreeResolver ─────────────────────────────────────────────────────────────

/// Entry stored in the R-tree: a site position with its catalog index.
#[derive(Clone, Debug)]
struct SiteEntry {
    point: [f64; 2],
    idx:   SiteIdx,
}

impl RTreeObject for SiteEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for SiteEntry {
    /// Same arithmetic as [`XyPoint::distance_2`], so the walk order agrees
    /// with the brute-force scan.
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        XyPoint::new(self.point[0], self.point[1]).distance_2(XyPoint::new(point[0], point[1]))
    }
}

/// R-tree backed resolver.  O(log n) per query.
///
/// Neighbours are visited in ascending squared distance.  Every candidate
/// whose squared distance is within a relative 1e-9 of the first one is
/// re-measured with [`XyPoint::distance`]; the smallest `(distance, idx)`
/// pair wins.  This reproduces the brute-force tie-break exactly, including
/// ties created by rounding in the square root.
pub struct RTreeResolver {
    tree:      RTree<SiteEntry>,
    positions: Vec<XyPoint>,
}

impl RTreeResolver {
    pub fn new(catalog: &SiteCatalog) -> Self {
        let positions: Vec<XyPoint> = catalog.all_sites().iter().map(|s| s.pos).collect();
        let entries = positions
            .iter()
            .enumerate()
            .map(|(i, p)| SiteEntry { point: [p.x, p.y], idx: SiteIdx(i as u32) })
            .collect();
        Self { tree: RTree::bulk_load(entries), positions }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

impl SiteResolver for RTreeResolver {
    fn nearest(&self, pos: XyPoint) -> Option<(SiteIdx, f64)> {
        let query = [pos.x, pos.y];
        let mut walk = self.tree.nearest_neighbor_iter_with_distance_2(&query);

        let (first, first_d2) = walk.next()?;
        let limit = first_d2 + first_d2 * 1e-9 + 1e-9;

        let mut best = (pos.distance(self.positions[first.idx.index()]), first.idx);
        for (entry, d2) in walk {
            if d2 > limit {
                break;
            }
            let d = pos.distance(self.positions[entry.idx.index()]);
            if d < best.0 || (d == best.0 && entry.idx < best.1) {
                best = (d, entry.idx);
            }
        }
        Some((best.1, best.0))
    }

    fn distance_to(&self, site: SiteIdx, pos: XyPoint) -> Option<f64> {
        self.positions.get(site.index()).map(|p| pos.distance(*p))
    }
}
