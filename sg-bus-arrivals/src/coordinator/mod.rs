//! Refresh coordinators.
//!
//! Both coordinators share the same engine: a timer and on-demand
//! requests collapse into one in-flight refresh, whose result replaces the
//! published snapshot wholesale. Authentication failures are fatal and
//! stop the timer; anything else is retried on the next tick.

mod bus;
mod train;
mod update;


pub use bus::{BusArrivalsCoordinator, BusArrivalsSnapshot, BusArrivalsSource};
pub use train::{TrainAlertsCoordinator, TrainAlertsSource};
pub use update::{
    PollingHandle, REFRESH_DEADLINE, RefreshSource, UpdateCoordinator, UpdateError, UpdatePhase,
    UpdateState,
};
