//! Scenario setup: station configuration, validation, and world construction.

mod build;
mod params;

pub use build::{build_station, build_station_with_arrivals, StationModel};
pub use params::{
    AcquisitionPolicy, ArrivalProfile, FuelTypeConfig, PaymentMethodConfig, SimulationHorizon,
    StationConfig,
};
