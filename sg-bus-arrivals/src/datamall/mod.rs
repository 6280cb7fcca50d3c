//! LTA DataMall client.
//!
//! This module provides an HTTP client for the Singapore LTA DataMall API,
//! which publishes bus arrival predictions, bus stop and route listings,
//! and train service alerts.
//!
//! Key characteristics of DataMall:
//! - Every request carries the account key in an `AccountKey` header
//! - Listing endpoints return at most 500 records per call and are paged
//!   with a `$skip` query parameter
//! - Estimated arrivals are ISO 8601 timestamps with a `+08:00` offset,
//!   or an empty string when no estimate is available

mod client;
mod convert;
mod error;
mod paging;
mod types;

pub use client::{DataMallClient, DataMallConfig};
pub use convert::{compute_arrival_minutes, convert_bus_arrivals};
pub use error::TransitError;
pub use types::{
    BusArrivalResponse, BusRouteDto, BusStopDto, NextBusDto, ServiceArrivalDto,
    TrainServiceAlertsResponse,
};
