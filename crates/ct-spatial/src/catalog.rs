//! The cell-site catalog.
//!
//! Sites are stored in a flat `Vec` in stable catalog order (file order for
//! loaded catalogs, generation order for synthetic ones).  A [`SiteIdx`] is a
//! position in that `Vec`; the external string id is only needed again when
//! events are written.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{debug, info};

use ct_core::{Bounds, CtError, GeoPoint, SimRng, SiteIdx, XyPoint};

use crate::{CoordinateTransformer, SpatialError, SpatialResult};

/// A radio base station.
#[derive(Clone, Debug, PartialEq)]
pub struct CellSite {
    pub id:  String,
    /// Geographic position.  `None` for generated sites on a network without
    /// projection metadata.
    pub geo: Option<GeoPoint>,
    /// Position in the network plane.
    pub pos: XyPoint,
}

/// Immutable, ordered set of cell sites.
#[derive(Clone, Debug, Default)]
pub struct SiteCatalog {
    sites:    Vec<CellSite>,
    by_id:    HashMap<String, SiteIdx>,
}

impl SiteCatalog {
    /// Build a catalog from already-constructed sites.
    ///
    /// # Errors
    ///
    /// [`SpatialError::DuplicateSite`] if two sites share an id.  `line` in the
    /// error is the 1-based position of the second occurrence.
    pub fn from_sites(sites: Vec<CellSite>) -> SpatialResult<Self> {
        let mut catalog = SiteCatalog::default();
        for (i, site) in sites.into_iter().enumerate() {
            catalog.push(site, "<memory>", i as u64 + 1)?;
        }
        Ok(catalog)
    }

    fn push(&mut self, site: CellSite, source_name: &str, line: u64) -> SpatialResult<()> {
        let idx = SiteIdx::try_from(self.sites.len())
            .map_err(|_| CtError::Config("too many cell sites".into()))?;
        if self.by_id.contains_key(&site.id) {
            return Err(SpatialError::DuplicateSite {
                id: site.id,
                source_name: source_name.to_owned(),
                line,
            });
        }
        self.by_id.insert(site.id.clone(), idx);
        self.sites.push(site);
        Ok(())
    }

    // ── Loaded mode ───────────────────────────────────────────────────────

    /// Load a comma-separated site table and project every row.
    ///
    /// The first three columns, by position, are id, latitude and longitude.
    /// The header row is skipped; further columns are ignored.
    pub fn load_csv(path: &Path, transformer: &CoordinateTransformer) -> SpatialResult<Self> {
        let file = File::open(path)?;
        let catalog = Self::load_reader(file, &path.display().to_string(), transformer)?;
        info!("loaded {} cell sites from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    /// Like [`load_csv`](Self::load_csv) but reads from any source.
    /// `source_name` is used in error messages.
    pub fn load_reader<R: Read>(
        reader: R,
        source_name: &str,
        transformer: &CoordinateTransformer,
    ) -> SpatialResult<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut catalog = SiteCatalog::default();
        let mut record = csv::StringRecord::new();
        loop {
            match rdr.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => break,
                Err(e) => return Err(SpatialError::from_csv(source_name, e)),
            }
            let line = record.position().map(|p| p.line()).unwrap_or(0);
            if record.len() < 3 {
                return Err(CtError::malformed(
                    source_name,
                    line,
                    format!("expected at least 3 fields (id, lat, long), found {}", record.len()),
                )
                .into());
            }
            let coord = |i: usize, what: &str| -> SpatialResult<f64> {
                record[i].parse::<f64>().map_err(|_| {
                    CtError::malformed(
                        source_name,
                        line,
                        format!("{what} {:?} is not a number", &record[i]),
                    )
                    .into()
                })
            };
            let geo = GeoPoint::new(coord(1, "latitude")?, coord(2, "longitude")?);
            if !geo.is_valid() {
                return Err(CtError::malformed(
                    source_name,
                    line,
                    format!("coordinate {geo} is out of range"),
                )
                .into());
            }

            let pos = transformer.to_projected(geo);
            debug!("site {} at {geo} -> {pos}", &record[0]);
            catalog.push(CellSite { id: record[0].to_owned(), geo: Some(geo), pos }, source_name, line)?;
        }
        Ok(catalog)
    }

    // ── Generated mode ────────────────────────────────────────────────────

    /// Place `count` synthetic sites uniformly inside `bounds`.
    ///
    /// The bounds are truncated to whole metres and positions are drawn as
    /// integers from the inclusive range, so the result depends only on the
    /// seed of `rng`.  Site ids are `"0".."count-1"`.
    pub fn generate(
        count: usize,
        bounds: Bounds,
        transformer: Option<&CoordinateTransformer>,
        rng: &mut SimRng,
    ) -> SpatialResult<Self> {
        if count == 0 {
            return Err(CtError::Config("the number of generated cell sites must be positive".into()).into());
        }
        if !bounds.is_valid() {
            return Err(CtError::Config(format!("invalid generation bounds {bounds}")).into());
        }

        let (x0, x1) = (bounds.min.x.trunc() as i64, bounds.max.x.trunc() as i64);
        let (y0, y1) = (bounds.min.y.trunc() as i64, bounds.max.y.trunc() as i64);

        let mut catalog = SiteCatalog::default();
        catalog.sites.reserve(count);
        for i in 0..count {
            let x = rng.gen_range(x0..=x1);
            let y = rng.gen_range(y0..=y1);
            let pos = XyPoint::new(x as f64, y as f64);
            let geo = transformer.map(|t| t.to_geographic(pos));
            catalog.push(CellSite { id: i.to_string(), geo, pos }, "<generated>", i as u64 + 1)?;
        }
        info!("generated {count} cell sites inside {bounds}");
        Ok(catalog)
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    /// All sites in catalog order.
    pub fn all_sites(&self) -> &[CellSite] {
        &self.sites
    }

    pub fn get(&self, idx: SiteIdx) -> Option<&CellSite> {
        self.sites.get(idx.index())
    }

    /// External id of the site at `idx`.
    pub fn id_of(&self, idx: SiteIdx) -> Option<&str> {
        self.get(idx).map(|s| s.id.as_str())
    }

    pub fn index_of(&self, id: &str) -> Option<SiteIdx> {
        self.by_id.get(id).copied()
    }

    /// External ids in catalog order, indexable by `SiteIdx::index()`.
    pub fn labels(&self) -> Vec<String> {
        self.sites.iter().map(|s| s.id.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
