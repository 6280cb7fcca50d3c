//! Core domain types for bus arrivals and train service alerts.
//!
//! These types are the normalized form of LTA DataMall responses. They are
//! immutable values: coordinators replace whole snapshots rather than
//! mutating them.

mod bus;
mod train;

pub use bus::{
    BUS_FEATURES, BUS_LOADS, BUS_TYPES, BusArrival, BusStop, NEXT_BUS_SLOTS, NextBus,
    ServiceCatalog,
};
pub use train::{
    TRAIN_LINES, TRAIN_STATUSES, TrainAlerts, TrainServiceAlert, TrainStatus,
    derive_train_service_alerts,
};
