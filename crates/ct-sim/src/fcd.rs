//! Replay of SUMO floating-car-data traces.
//!
//! ```xml
//! <fcd-export>
//!     <timestep time="0.00">
//!         <vehicle id="veh0" x="5012.20" y="1820.61" angle="90.00" speed="13.89" lane="e12_0"/>
//!     </timestep>
//! </fcd-export>
//! ```
//!
//! With `--fcd-output.geo` SUMO writes longitude in `x` and latitude in `y`.
//! The file is streamed one `<timestep>` at a time.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::debug;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use ct_core::{GeoPoint, SimTime, VehicleId, XyPoint};

use crate::{SimError, SimResult, SimulationController, VehiclePos, VehicleSample};

/// [`SimulationController`] over a recorded FCD trace.
///
/// Traces carry no departure information, so [`departed_vehicles`] is
/// always empty.
///
/// [`departed_vehicles`]: SimulationController::departed_vehicles
pub struct FcdReplay<R: BufRead> {
    reader: Reader<R>,
    geo:    bool,
    time:   SimTime,
    live:   Vec<VehicleSample>,
    buf:    Vec<u8>,
    done:   bool,
}

impl FcdReplay<BufReader<File>> {
    pub fn open(path: &Path, geo: bool) -> SimResult<Self> {
        let file = File::open(path)?;
        Ok(Self::new(BufReader::new(file), geo))
    }
}

impl<R: BufRead> FcdReplay<R> {
    pub fn new(source: R, geo: bool) -> Self {
        let mut reader = Reader::from_reader(source);
        reader.config_mut().trim_text(true);
        Self { reader, geo, time: SimTime::ZERO, live: Vec::new(), buf: Vec::new(), done: false }
    }

    fn xml_error(&self, e: impl std::fmt::Display) -> SimError {
        SimError::simulation(format!("FCD trace at byte {}: {e}", self.reader.buffer_position()))
    }

    fn vehicle(&self, tag: &BytesStart<'_>) -> SimResult<VehicleSample> {
        let mut id = None;
        let mut x = None;
        let mut y = None;
        for attr in tag.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e))?;
            let value = attr.unescape_value().map_err(|e| self.xml_error(e))?;
            match attr.key.as_ref() {
                b"id" => id = Some(value.into_owned()),
                b"x" => x = Some(parse_coord(&value).ok_or_else(|| self.xml_error(format!("bad x {value:?}")))?),
                b"y" => y = Some(parse_coord(&value).ok_or_else(|| self.xml_error(format!("bad y {value:?}")))?),
                _ => {}
            }
        }
        let (Some(id), Some(x), Some(y)) = (id, x, y) else {
            return Err(self.xml_error("<vehicle> needs id, x and y"));
        };
        let pos = if self.geo {
            VehiclePos::Geographic(GeoPoint::new(y, x))
        } else {
            VehiclePos::Projected(XyPoint::new(x, y))
        };
        Ok(VehicleSample { id: VehicleId::from(id), pos })
    }

    fn timestep_time(&self, tag: &BytesStart<'_>) -> SimResult<SimTime> {
        for attr in tag.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e))?;
            if attr.key.as_ref() == b"time" {
                let value = attr.unescape_value().map_err(|e| self.xml_error(e))?;
                return value
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(SimTime::try_from_secs_f64)
                    .ok_or_else(|| self.xml_error(format!("bad timestep time {value:?}")));
            }
        }
        Err(self.xml_error("<timestep> without time"))
    }
}

fn parse_coord(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

impl<R: BufRead> SimulationController for FcdReplay<R> {
    fn advance(&mut self) -> SimResult<bool> {
        if self.done {
            return Ok(false);
        }
        self.live.clear();

        // Find the next <timestep>.
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf).map_err(|e| {
                SimError::simulation(format!("FCD trace: {e}"))
            })?;
            match event {
                Event::Start(tag) if tag.name().as_ref() == b"timestep" => {
                    let tag = tag.into_owned();
                    self.time = self.timestep_time(&tag)?;
                    break;
                }
                Event::Empty(tag) if tag.name().as_ref() == b"timestep" => {
                    let tag = tag.into_owned();
                    self.time = self.timestep_time(&tag)?;
                    return Ok(true);
                }
                Event::Eof => {
                    self.done = true;
                    return Ok(false);
                }
                _ => {}
            }
        }

        // Collect its vehicles.
        loop {
            self.buf.clear();
            let event = self.reader.read_event_into(&mut self.buf).map_err(|e| {
                SimError::simulation(format!("FCD trace: {e}"))
            })?;
            match event {
                Event::Empty(tag) | Event::Start(tag) if tag.name().as_ref() == b"vehicle" => {
                    let tag = tag.into_owned();
                    let sample = self.vehicle(&tag)?;
                    self.live.push(sample);
                }
                Event::End(tag) if tag.name().as_ref() == b"timestep" => break,
                Event::Eof => {
                    return Err(SimError::simulation("FCD trace ends inside a <timestep>"));
                }
                _ => {}
            }
        }
        debug!("fcd t={}: {} vehicles", self.time, self.live.len());
        Ok(true)
    }

    fn time(&self) -> SimTime {
        self.time
    }

    fn departed_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        Ok(Vec::new())
    }

    fn live_vehicle_positions(&mut self) -> SimResult<Vec<VehicleSample>> {
        Ok(std::mem::take(&mut self.live))
    }
}
