//! The external-simulation capability interface.

use ct_core::{Bounds, GeoPoint, SimTime, VehicleId, XyPoint};

use crate::SimResult;

/// A vehicle position as reported by a controller.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum VehiclePos {
    /// Already in the network plane.
    Projected(XyPoint),
    /// WGS-84; the driver projects it before resolution.
    Geographic(GeoPoint),
}

/// One live vehicle at the current step.
#[derive(Clone, Debug, PartialEq)]
pub struct VehicleSample {
    pub id:  VehicleId,
    pub pos: VehiclePos,
}

impl VehicleSample {
    pub fn projected(id: impl Into<VehicleId>, x: f64, y: f64) -> Self {
        Self { id: id.into(), pos: VehiclePos::Projected(XyPoint::new(x, y)) }
    }
}

/// Minimal control surface over a step-based traffic simulation.
///
/// The driver calls, once per step and in this order: [`advance`],
/// [`time`], [`departed_vehicles`], [`teleported_vehicles`],
/// [`live_vehicle_positions`].
///
/// [`advance`]: SimulationController::advance
/// [`time`]: SimulationController::time
/// [`departed_vehicles`]: SimulationController::departed_vehicles
/// [`teleported_vehicles`]: SimulationController::teleported_vehicles
/// [`live_vehicle_positions`]: SimulationController::live_vehicle_positions
pub trait SimulationController {
    /// Advance the simulation by one step.
    ///
    /// Returns `Ok(false)` without stepping when the simulation is over.
    fn advance(&mut self) -> SimResult<bool>;

    /// Simulation clock after the last `advance`.
    fn time(&self) -> SimTime;

    /// Vehicles that permanently left the simulation during the last step.
    fn departed_vehicles(&mut self) -> SimResult<Vec<VehicleId>>;

    /// Vehicles that were moved (ended a teleport) during the last step and
    /// are still in the simulation.  Their site is resolved afresh.
    fn teleported_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        Ok(Vec::new())
    }

    /// Every vehicle currently in the simulation, in a stable order.
    fn live_vehicle_positions(&mut self) -> SimResult<Vec<VehicleSample>>;

    /// Network bounding box, for controllers that can ask the simulation.
    fn net_boundary(&mut self) -> SimResult<Option<Bounds>> {
        Ok(None)
    }

    /// Release the simulation.  Called once after the last step.
    fn close(&mut self) -> SimResult<()> {
        Ok(())
    }
}

impl<C: SimulationController + ?Sized> SimulationController for Box<C> {
    fn advance(&mut self) -> SimResult<bool> {
        (**self).advance()
    }

    fn time(&self) -> SimTime {
        (**self).time()
    }

    fn departed_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        (**self).departed_vehicles()
    }

    fn teleported_vehicles(&mut self) -> SimResult<Vec<VehicleId>> {
        (**self).teleported_vehicles()
    }

    fn live_vehicle_positions(&mut self) -> SimResult<Vec<VehicleSample>> {
        (**self).live_vehicle_positions()
    }

    fn net_boundary(&mut self) -> SimResult<Option<Bounds>> {
        (**self).net_boundary()
    }

    fn close(&mut self) -> SimResult<()> {
        (**self).close()
    }
}
