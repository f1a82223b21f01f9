//! Coordinate transformation anchored to a SUMO network description.
//!
//! # Where the numbers come from
//!
//! Every SUMO `.net.xml` carries one `<location>` element near the top:
//!
//! ```xml
//! <location netOffset="-395000.00,-4990000.00"
//!           convBoundary="0.00,0.00,12500.00,9800.00"
//!           origBoundary="7.58,45.00,7.75,45.13"
//!           projParameter="+proj=utm +zone=32 +ellps=WGS84 +datum=WGS84 +units=m +no_defs"/>
//! ```
//!
//! Network coordinates are UTM coordinates shifted by `netOffset`:
//!
//! ```text
//! net = utm(lat, lon) + netOffset
//! ```
//!
//! Only UTM on WGS-84 is supported.  That is what `netconvert` writes for
//! OSM imports, and it lets the transform be computed here instead of through
//! an external PROJ installation.
//!
//! The file is streamed with `quick-xml` and reading stops at the first
//! `<location>`; the (large) edge and junction sections are never parsed.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use ct_core::{Bounds, GeoPoint, XyPoint};

use crate::{SpatialError, SpatialResult};

// ── WGS-84 / UTM constants ────────────────────────────────────────────────────

const WGS84_A:      f64 = 6_378_137.0;
const WGS84_F:      f64 = 1.0 / 298.257_223_563;
const UTM_K0:       f64 = 0.9996;
const FALSE_EAST:   f64 = 500_000.0;
const FALSE_NORTH:  f64 = 10_000_000.0;

// ── NetLocation ───────────────────────────────────────────────────────────────

/// The projection metadata of a SUMO network (`<location>` attributes).
#[derive(Clone, Debug, PartialEq)]
pub struct NetLocation {
    /// Added to UTM coordinates to obtain network coordinates.
    pub net_offset:     XyPoint,
    /// Network bounding box in network coordinates.
    pub conv_boundary:  Bounds,
    /// Geographic bounding box `[lon_min, lat_min, lon_max, lat_max]`, if
    /// present.
    pub orig_boundary:  Option<[f64; 4]>,
    /// Raw PROJ parameter string; `"!"` means "not geo-referenced".
    pub proj_parameter: String,
}

impl NetLocation {
    /// Read the `<location>` element of a network file.
    pub fn from_path(path: &Path) -> SpatialResult<Self> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
            .map_err(|e| match e {
                SpatialError::Projection(msg) => {
                    SpatialError::Projection(format!("{}: {msg}", path.display()))
                }
                other => other,
            })
    }

    /// Like [`from_path`](Self::from_path) but accepts any buffered source.
    pub fn from_reader<R: BufRead>(source: R) -> SpatialResult<Self> {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        let mut buf = Vec::new();

        loop {
            match reader.read_event_into(&mut buf) {
                Ok(Event::Empty(tag)) | Ok(Event::Start(tag))
                    if tag.name().as_ref() == b"location" =>
                {
                    return Self::from_tag(&tag);
                }
                Ok(Event::Eof) => {
                    return Err(SpatialError::Projection(
                        "network description has no <location> element".into(),
                    ));
                }
                Err(e) => {
                    return Err(SpatialError::NetworkXml(format!(
                        "at byte {}: {e}",
                        reader.buffer_position()
                    )));
                }
                _ => {}
            }
            buf.clear();
        }
    }

    fn from_tag(tag: &BytesStart<'_>) -> SpatialResult<Self> {
        let mut net_offset     = None;
        let mut conv_boundary  = None;
        let mut orig_boundary  = None;
        let mut proj_parameter = None;

        for attr in tag.attributes() {
            let attr = attr.map_err(|e| SpatialError::NetworkXml(e.to_string()))?;
            let value = attr
                .unescape_value()
                .map_err(|e| SpatialError::NetworkXml(e.to_string()))?;
            match attr.key.as_ref() {
                b"netOffset" => {
                    let [x, y] = parse_floats::<2>("netOffset", &value)?;
                    net_offset = Some(XyPoint::new(x, y));
                }
                b"convBoundary" => {
                    let [x0, y0, x1, y1] = parse_floats::<4>("convBoundary", &value)?;
                    conv_boundary = Some(Bounds::new(XyPoint::new(x0, y0), XyPoint::new(x1, y1)));
                }
                b"origBoundary" => {
                    orig_boundary = Some(parse_floats::<4>("origBoundary", &value)?);
                }
                b"projParameter" => proj_parameter = Some(value.trim().to_owned()),
                _ => {}
            }
        }

        let missing = |what: &str| {
            SpatialError::Projection(format!("<location> lacks the {what} attribute"))
        };
        let location = NetLocation {
            net_offset:     net_offset.ok_or_else(|| missing("netOffset"))?,
            conv_boundary:  conv_boundary.ok_or_else(|| missing("convBoundary"))?,
            orig_boundary,
            proj_parameter: proj_parameter.ok_or_else(|| missing("projParameter"))?,
        };
        debug!(
            "network location: offset {} boundary {} proj {:?}",
            location.net_offset, location.conv_boundary, location.proj_parameter
        );
        Ok(location)
    }

    /// `true` if the network is geo-referenced at all.
    pub fn has_projection(&self) -> bool {
        !self.proj_parameter.is_empty() && self.proj_parameter != "!"
    }
}

fn parse_floats<const N: usize>(what: &str, value: &str) -> SpatialResult<[f64; N]> {
    let mut out = [0.0; N];
    let mut parts = value.split(',');
    for slot in out.iter_mut() {
        let part = parts.next().ok_or_else(|| {
            SpatialError::NetworkXml(format!("{what}={value:?}: expected {N} comma-separated numbers"))
        })?;
        *slot = part.trim().parse::<f64>().map_err(|_| {
            SpatialError::NetworkXml(format!("{what}={value:?}: {part:?} is not a number"))
        })?;
    }
    if parts.next().is_some() {
        return Err(SpatialError::NetworkXml(format!(
            "{what}={value:?}: expected {N} comma-separated numbers"
        )));
    }
    Ok(out)
}

// ── UtmZone ───────────────────────────────────────────────────────────────────

/// A WGS-84 UTM zone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct UtmZone {
    pub zone:  u8,
    pub south: bool,
}

impl UtmZone {
    /// Parse a PROJ parameter string such as
    /// `+proj=utm +zone=32 +ellps=WGS84 +datum=WGS84 +units=m +no_defs`.
    pub fn from_proj(proj: &str) -> SpatialResult<Self> {
        let proj = proj.trim();
        if proj.is_empty() || proj == "!" {
            return Err(SpatialError::Projection(
                "network is not geo-referenced (projParameter=\"!\")".into(),
            ));
        }

        let mut kind  = None;
        let mut zone  = None;
        let mut south = false;
        for token in proj.split_whitespace() {
            let token = token.trim_start_matches('+');
            let (key, value) = token.split_once('=').unwrap_or((token, ""));
            match key {
                "proj" => kind = Some(value),
                "zone" => {
                    zone = Some(value.parse::<u8>().map_err(|_| {
                        SpatialError::Projection(format!("invalid UTM zone {value:?}"))
                    })?);
                }
                "south" => south = true,
                "ellps" | "datum" if !value.eq_ignore_ascii_case("WGS84") => {
                    return Err(SpatialError::Projection(format!(
                        "unsupported {key} {value:?}: only WGS84 is supported"
                    )));
                }
                "units" if value != "m" => {
                    return Err(SpatialError::Projection(format!("unsupported units {value:?}")));
                }
                _ => {}
            }
        }

        match kind {
            Some("utm") => {}
            Some(other) => {
                return Err(SpatialError::Projection(format!(
                    "unsupported projection {other:?}: only +proj=utm is supported"
                )));
            }
            None => {
                return Err(SpatialError::Projection(format!("no +proj in {proj:?}")));
            }
        }
        let zone = zone
            .filter(|z| (1..=60).contains(z))
            .ok_or_else(|| SpatialError::Projection(format!("missing or invalid +zone in {proj:?}")))?;

        Ok(UtmZone { zone, south })
    }

    /// Longitude of the zone's central meridian, in degrees.
    pub fn central_meridian(self) -> f64 {
        f64::from(self.zone) * 6.0 - 183.0
    }

    /// Geographic → UTM easting/northing (metres).
    pub fn forward(self, p: GeoPoint) -> XyPoint {
        let e2  = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);

        let phi    = p.lat.to_radians();
        let lambda = (p.lon - self.central_meridian()).to_radians();
        let (sin_phi, cos_phi) = phi.sin_cos();
        let tan_phi = sin_phi / cos_phi;

        let n = WGS84_A / (1.0 - e2 * sin_phi * sin_phi).sqrt();
        let t = tan_phi * tan_phi;
        let c = ep2 * cos_phi * cos_phi;
        let a = cos_phi * lambda;
        let m = meridian_arc(phi, e2);

        let a2 = a * a;
        let a3 = a2 * a;
        let a4 = a3 * a;
        let a5 = a4 * a;
        let a6 = a5 * a;

        let x = UTM_K0 * n
            * (a + (1.0 - t + c) * a3 / 6.0
                + (5.0 - 18.0 * t + t * t + 72.0 * c - 58.0 * ep2) * a5 / 120.0)
            + FALSE_EAST;
        let mut y = UTM_K0
            * (m + n * tan_phi
                * (a2 / 2.0
                    + (5.0 - t + 9.0 * c + 4.0 * c * c) * a4 / 24.0
                    + (61.0 - 58.0 * t + t * t + 600.0 * c - 330.0 * ep2) * a6 / 720.0));
        if self.south {
            y += FALSE_NORTH;
        }
        XyPoint::new(x, y)
    }

    /// UTM easting/northing (metres) → geographic.
    pub fn inverse(self, p: XyPoint) -> GeoPoint {
        let e2  = WGS84_F * (2.0 - WGS84_F);
        let ep2 = e2 / (1.0 - e2);
        let e4  = e2 * e2;
        let e6  = e4 * e2;

        let x = p.x - FALSE_EAST;
        let y = if self.south { p.y - FALSE_NORTH } else { p.y };

        let m  = y / UTM_K0;
        let mu = m / (WGS84_A * (1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0));

        let sqrt_1_e2 = (1.0 - e2).sqrt();
        let e1 = (1.0 - sqrt_1_e2) / (1.0 + sqrt_1_e2);
        let phi1 = mu
            + (3.0 * e1 / 2.0 - 27.0 * e1.powi(3) / 32.0) * (2.0 * mu).sin()
            + (21.0 * e1 * e1 / 16.0 - 55.0 * e1.powi(4) / 32.0) * (4.0 * mu).sin()
            + (151.0 * e1.powi(3) / 96.0) * (6.0 * mu).sin()
            + (1097.0 * e1.powi(4) / 512.0) * (8.0 * mu).sin();

        let (sin_phi1, cos_phi1) = phi1.sin_cos();
        let tan_phi1 = sin_phi1 / cos_phi1;
        let c1 = ep2 * cos_phi1 * cos_phi1;
        let t1 = tan_phi1 * tan_phi1;
        let w  = 1.0 - e2 * sin_phi1 * sin_phi1;
        let n1 = WGS84_A / w.sqrt();
        let r1 = WGS84_A * (1.0 - e2) / w.powf(1.5);
        let d  = x / (n1 * UTM_K0);

        let d2 = d * d;
        let d3 = d2 * d;
        let d4 = d3 * d;
        let d5 = d4 * d;
        let d6 = d5 * d;

        let phi = phi1
            - (n1 * tan_phi1 / r1)
                * (d2 / 2.0
                    - (5.0 + 3.0 * t1 + 10.0 * c1 - 4.0 * c1 * c1 - 9.0 * ep2) * d4 / 24.0
                    + (61.0 + 90.0 * t1 + 298.0 * c1 + 45.0 * t1 * t1 - 252.0 * ep2 - 3.0 * c1 * c1)
                        * d6
                        / 720.0);
        let lambda = (d - (1.0 + 2.0 * t1 + c1) * d3 / 6.0
            + (5.0 - 2.0 * c1 + 28.0 * t1 - 3.0 * c1 * c1 + 8.0 * ep2 + 24.0 * t1 * t1) * d5 / 120.0)
            / cos_phi1;

        GeoPoint::new(phi.to_degrees(), self.central_meridian() + lambda.to_degrees())
    }
}

/// Meridian arc length from the equator to latitude `phi` (radians).
fn meridian_arc(phi: f64, e2: f64) -> f64 {
    let e4 = e2 * e2;
    let e6 = e4 * e2;
    WGS84_A
        * ((1.0 - e2 / 4.0 - 3.0 * e4 / 64.0 - 5.0 * e6 / 256.0) * phi
            - (3.0 * e2 / 8.0 + 3.0 * e4 / 32.0 + 45.0 * e6 / 1024.0) * (2.0 * phi).sin()
            + (15.0 * e4 / 256.0 + 45.0 * e6 / 1024.0) * (4.0 * phi).sin()
            - (35.0 * e6 / 3072.0) * (6.0 * phi).sin())
}

// ── CoordinateTransformer ─────────────────────────────────────────────────────

/// Geographic ⇄ network-plane conversion for one network.
///
/// Immutable after construction; every method is a pure function of its
/// input.
#[derive(Clone, Debug, PartialEq)]
pub struct CoordinateTransformer {
    utm:        UtmZone,
    net_offset: XyPoint,
    boundary:   Bounds,
}

impl CoordinateTransformer {
    pub fn new(utm: UtmZone, net_offset: XyPoint, boundary: Bounds) -> Self {
        Self { utm, net_offset, boundary }
    }

    /// Build from parsed network metadata.
    ///
    /// # Errors
    ///
    /// [`SpatialError::Projection`] if the network is not geo-referenced or
    /// uses a projection other than WGS-84 UTM.
    pub fn from_location(location: &NetLocation) -> SpatialResult<Self> {
        let utm = UtmZone::from_proj(&location.proj_parameter)?;
        Ok(Self::new(utm, location.net_offset, location.conv_boundary))
    }

    /// Read the network file and build the transformer in one go.
    pub fn from_net_file(path: &Path) -> SpatialResult<Self> {
        let location = NetLocation::from_path(path)?;
        Self::from_location(&location).map_err(|e| match e {
            SpatialError::Projection(msg) => {
                SpatialError::Projection(format!("{}: {msg}", path.display()))
            }
            other => other,
        })
    }

    /// Geographic → network plane.
    pub fn to_projected(&self, p: GeoPoint) -> XyPoint {
        let utm = self.utm.forward(p);
        XyPoint::new(utm.x + self.net_offset.x, utm.y + self.net_offset.y)
    }

    /// Network plane → geographic.
    pub fn to_geographic(&self, p: XyPoint) -> GeoPoint {
        self.utm
            .inverse(XyPoint::new(p.x - self.net_offset.x, p.y - self.net_offset.y))
    }

    /// Network bounding box (`convBoundary`).
    pub fn boundary(&self) -> Bounds {
        self.boundary
    }

    pub fn utm_zone(&self) -> UtmZone {
        self.utm
    }
}
