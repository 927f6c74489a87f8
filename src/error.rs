use crate::simulation::VehicleClass;

/// Input rejected at the boundary of the simulation core.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    #[error("unknown direction '{0}'")]
    UnknownDirection(String),

    #[error("unknown vehicle class '{0}'")]
    UnknownVehicleClass(String),

    /// Only ambulances and fire trucks may request signal preemption.
    #[error("{0} is not an emergency vehicle")]
    NotAnEmergencyVehicle(VehicleClass),
}
