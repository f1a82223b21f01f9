//! Live SUMO control over the TraCI TCP protocol.
//!
//! # Session
//!
//! ```text
//! launch   sumo -c <cfg> --remote-port <port>, connect to 127.0.0.1:<port>
//! init     subscribe simulation vars: time, departed / arrived /
//!          teleport-ending ids, min expected vehicles (a reply without
//!          a result is an error)
//! step     simulationStep(0) → status + subscription responses
//!            sim response     → clock, id lists
//!            vehicle response → live positions
//!          subscribe each newly departed vehicle to VAR_POSITION
//! close    CMD_CLOSE, wait for the process
//! ```
//!
//! The run ends once SUMO reports no more expected vehicles.

pub mod codec;

use std::io::{Read, Write};
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use ct_core::{Bounds, SimTime, VehicleId, XyPoint};

use crate::{SimError, SimResult, SimulationController, VehiclePos, VehicleSample};
use codec::*;

/// How to start SUMO.
#[derive(Clone, Debug)]
pub struct TraciOptions {
    /// `sumo` or `sumo-gui`, or a full path.
    pub binary:           PathBuf,
    /// The `.sumocfg` to load.
    pub config:           PathBuf,
    pub port:             u16,
    pub connect_attempts: u32,
    pub retry_delay:      Duration,
}

impl TraciOptions {
    pub fn new(config: impl Into<PathBuf>) -> Self {
        Self {
            binary:           PathBuf::from("sumo"),
            config:           config.into(),
            port:             8813,
            connect_attempts: 50,
            retry_delay:      Duration::from_millis(100),
        }
    }
}

const SIM_VARS: [u8; 5] = [
    VAR_TIME,
    VAR_DEPARTED_VEHICLES_IDS,
    VAR_ARRIVED_VEHICLES_IDS,
    VAR_TELEPORT_ENDING_VEHICLES_IDS,
    VAR_MIN_EXPECTED_VEHICLES,
];

/// [`SimulationController`] backed by a TraCI connection.
pub struct TraciController<S: Read + Write = TcpStream> {
    stream:       S,
    child:        Option<Child>,
    time:         SimTime,
    min_expected: i32,
    live:         Vec<VehicleSample>,
    departed:     Vec<VehicleId>,
    teleported:   Vec<VehicleId>,
    closed:       bool,
}

impl TraciController<TcpStream> {
    /// Start SUMO and connect to it.
    pub fn launch(options: &TraciOptions) -> SimResult<Self> {
        let mut child = Command::new(&options.binary)
            .arg("-c")
            .arg(&options.config)
            .arg("--remote-port")
            .arg(options.port.to_string())
            .stdin(Stdio::null())
            .spawn()
            .map_err(|e| {
                SimError::simulation(format!("cannot start {}: {e}", options.binary.display()))
            })?;
        info!(
            "started {} -c {} (pid {}), port {}",
            options.binary.display(),
            options.config.display(),
            child.id(),
            options.port
        );

        let stream = match connect(&mut child, options) {
            Ok(s) => s,
            Err(e) => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(e);
            }
        };
        let mut controller = Self::from_stream(stream)?;
        controller.child = Some(child);
        Ok(controller)
    }
}

fn connect(child: &mut Child, options: &TraciOptions) -> SimResult<TcpStream> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        match TcpStream::connect(("127.0.0.1", options.port)) {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!("connected to TraCI after {attempt} attempt(s)");
                return Ok(stream);
            }
            Err(e) if attempt >= options.connect_attempts => {
                return Err(SimError::simulation(format!(
                    "cannot connect to TraCI port {}: {e}",
                    options.port
                )));
            }
            Err(_) => {
                if let Some(status) = child.try_wait()? {
                    return Err(SimError::simulation(format!(
                        "{} exited before accepting connections ({status})",
                        options.binary.display()
                    )));
                }
                thread::sleep(options.retry_delay);
            }
        }
    }
}

impl<S: Read + Write> TraciController<S> {
    /// Take over an established connection and subscribe to the
    /// simulation variables.
    pub fn from_stream(stream: S) -> SimResult<Self> {
        let mut controller = Self {
            stream,
            child:        None,
            time:         SimTime::ZERO,
            min_expected: 0,
            live:         Vec::new(),
            departed:     Vec::new(),
            teleported:   Vec::new(),
            closed:       false,
        };

        let body = controller.request(&subscribe(CMD_SUBSCRIBE_SIM_VARIABLE, "", &SIM_VARS))?;
        let mut dec = Decoder::new(&body);
        dec.status(CMD_SUBSCRIBE_SIM_VARIABLE)?;
        if dec.is_empty() {
            return Err(SimError::simulation(
                "TraCI sent no result for the simulation variable subscription",
            ));
        }
        let (id, content) = dec.command()?;
        let response = Decoder::subscription(id, content)?;
        // Ids reported before the first step are not acted on.
        let mut ignored = Vec::new();
        controller.apply_sim(&response, &mut ignored)?;
        controller.departed.clear();
        controller.teleported.clear();
        debug!("TraCI ready at t={}, {} vehicles expected", controller.time, controller.min_expected);
        Ok(controller)
    }

    /// Minimum number of vehicles still expected, as last reported.
    pub fn min_expected(&self) -> i32 {
        self.min_expected
    }

    /// The underlying connection.
    pub fn stream(&self) -> &S {
        &self.stream
    }

    fn request(&mut self, message: &[u8]) -> SimResult<Vec<u8>> {
        send(&mut self.stream, message)?;
        receive(&mut self.stream)
    }

    fn apply_sim(&mut self, response: &SubscriptionResponse, new_vehicles: &mut Vec<String>) -> SimResult<()> {
        for (var, value) in &response.vars {
            let value = value.as_ref().map_err(|msg| {
                SimError::simulation(format!("simulation variable 0x{var:02x}: {msg}"))
            })?;
            match (*var, value) {
                (VAR_TIME, TraciValue::Double(t)) => {
                    self.time = SimTime::try_from_secs_f64(*t)
                        .ok_or_else(|| SimError::simulation(format!("invalid simulation time {t}")))?;
                }
                (VAR_DEPARTED_VEHICLES_IDS, TraciValue::StringList(ids)) => {
                    new_vehicles.extend(ids.iter().cloned());
                }
                (VAR_ARRIVED_VEHICLES_IDS, TraciValue::StringList(ids)) => {
                    self.departed.extend(ids.iter().map(|id| VehicleId::from(id.as_str())));
                }
                (VAR_TELEPORT_ENDING_VEHICLES_IDS, TraciValue::StringList(ids)) => {
                    self.teleported.extend(ids.iter().map(|id| VehicleId::from(id.as_str())));
                }
                (VAR_MIN_EXPECTED_VEHICLES, TraciValue::Int(n)) => self.min_expected = *n,
                (var, value) => {
                    return Err(SimError::simulation(format!(
                        "unexpected {} for simulation variable 0x{var:02x}",
                        value.type_name()
                    )));
                }
            }
        }
        Ok(())
    }

    fn apply_vehicle(&mut self, response: &SubscriptionResponse) {
        for (var, value) in &response.vars {
            match (*var, value) {
                (VAR_POSITION, Ok(TraciValue::Position(p))) => self.live.push(VehicleSample {
                    id:  VehicleId::from(response.object_id.as_str()),
                    pos: VehiclePos::Projected(*p),
                }),
                (var, Err(msg)) => {
                    warn!("vehicle {} variable 0x{var:02x}: {msg}", response.object_id);
                }
                (var, Ok(value)) => {
                    warn!(
                        "vehicle {}: ignoring {} for variable 0x{var:02x}",
                        response.object_id,
                        value.type_name()
                    );
                }
            }
        }
    }

    fn subscribe_vehicle(&mut self, id: &str) -> SimResult<()> {
        let body = self.request(&subscribe(CMD_SUBSCRIBE_VEHICLE_VARIABLE, id, &[VAR_POSITION]))?;
        let mut dec = Decoder::new(&body);
        dec.status(CMD_SUBSCRIBE_VEHICLE_VARIABLE)?;
        if !dec.is_empty() {
            let (rid, content) = dec.command()?;
            let response = Decoder::subscription(rid, content)?;
            self.apply_vehicle(&response);
        }
        Ok(())
    }
}

impl<S: Read + Write> SimulationController for TraciController<S> {
    fn advance(&mut self) -> SimResult<bool> {
        if self.closed || self.min_expected <= 0 {
            return Ok(false);
        }

        let body = self.request(&simulation_step())?;
        let mut dec = Decoder::new(&body);
        dec.status(CMD_SIMSTEP)?;
        let responses = dec.step_responses()?;

        self.live.clear();
        self.departed.clear();
        self.teleported.clear();
        let mut new_vehicles = Vec::new();
        for response in &responses {
            match response.response_id {
                RESPONSE_SUBSCRIBE_SIM_VARIABLE => self.apply_sim(response, &mut new_vehicles)?,
                RESPONSE_SUBSCRIBE_VEHICLE_VARIABLE => self.apply_vehicle(response),
                other => debug!("ignoring TraCI response 0x{other:02x} for {}", response.object_id),
            }
        }
        for id in &new_vehicles {
            self.subscribe_vehicle(id)?;
        }
        Ok(true)
    }

    fn time(&self) -> SimTime {
        self.time
    }

    fn departed_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        Ok(std::mem::take(&mut self.departed))
    }

    fn teleported_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        Ok(std::mem::take(&mut self.teleported))
    }

    fn live_vehicle_positions(&mut self) -> SimResult<Vec<VehicleSample>> {
        Ok(std::mem::take(&mut self.live))
    }

    fn net_boundary(&mut self) -> SimResult<Option<Bounds>> {
        let body = self.request(&get_sim_variable(VAR_NET_BOUNDING_BOX))?;
        let mut dec = Decoder::new(&body);
        dec.status(CMD_GET_SIM_VARIABLE)?;
        let (id, mut content) = dec.command()?;
        if id != RESPONSE_GET_SIM_VARIABLE {
            return Err(SimError::simulation(format!("unexpected TraCI response 0x{id:02x}")));
        }
        let _var = content.u8()?;
        let _object = content.string()?;
        match content.value()? {
            TraciValue::Polygon(points) if !points.is_empty() => {
                let mut min = XyPoint::new(f64::INFINITY, f64::INFINITY);
                let mut max = XyPoint::new(f64::NEG_INFINITY, f64::NEG_INFINITY);
                for p in points {
                    min = XyPoint::new(min.x.min(p.x), min.y.min(p.y));
                    max = XyPoint::new(max.x.max(p.x), max.y.max(p.y));
                }
                Ok(Some(Bounds::new(min, max)))
            }
            other => Err(SimError::simulation(format!(
                "unexpected {} for the network boundary",
                other.type_name()
            ))),
        }
    }

    fn close(&mut self) -> SimResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let body = self.request(&codec::close())?;
        Decoder::new(&body).status(CMD_CLOSE)?;
        if let Some(mut child) = self.child.take() {
            let status = child.wait()?;
            info!("SUMO exited ({status})");
        }
        Ok(())
    }
}

impl<S: Read + Write> Drop for TraciController<S> {
    fn drop(&mut self) {
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
    }
}
