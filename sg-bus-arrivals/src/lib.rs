//! Singapore bus arrivals poller.
//!
//! Polls LTA DataMall for bus arrival predictions at tracked stops and for
//! train service alerts, and publishes fresh per-entity values to a host
//! application on a fixed cadence.

pub mod api;
pub mod catalog;
pub mod config;
pub mod coordinator;
pub mod datamall;
pub mod domain;
pub mod sensor;
pub mod setup;
pub mod web;
