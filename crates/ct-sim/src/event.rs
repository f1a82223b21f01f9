//! Association events and the sink that persists them.

use ct_core::{SiteIdx, SimTime, VehicleId, XyPoint};

/// One `(vehicle, timestamp)` association record.
#[derive(Clone, Debug, PartialEq)]
pub struct AssociationEvent {
    pub vehicle:  VehicleId,
    pub time:     SimTime,
    /// `None` when no site is within the threshold.
    pub site:     Option<SiteIdx>,
    pub distance: f64,
    /// Vehicle position in the network plane.
    pub pos:      XyPoint,
}

/// Append-only destination for association events.
///
/// [`Sim::run`](crate::Sim::run) appends the events of each check step as one
/// batch, after the step has been fully evaluated, and calls
/// [`finish`](Self::finish) once at the end.  A sink should make each batch
/// durable before returning so that an aborted run leaves only complete
/// rows.
pub trait EventSink {
    type Error: std::error::Error + Send + Sync + 'static;

    fn append(&mut self, events: &[AssociationEvent]) -> Result<(), Self::Error>;

    /// Flush and close.  Idempotent.
    fn finish(&mut self) -> Result<(), Self::Error>;
}

/// Collects events in memory.
impl EventSink for Vec<AssociationEvent> {
    type Error = std::convert::Infallible;

    fn append(&mut self, events: &[AssociationEvent]) -> Result<(), Self::Error> {
        self.extend_from_slice(events);
        Ok(())
    }

    fn finish(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
