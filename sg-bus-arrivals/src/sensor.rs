//! Per-entity value projection.
//!
//! Each tracked (stop, service) pair and each train line is exposed as a
//! set of named values. Rather than one type per value, every value is a
//! `(key, extractor)` pair applied uniformly to the latest snapshot.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::config::TrackedEntry;
use crate::coordinator::BusArrivalsSnapshot;
use crate::domain::{BusArrival, NextBus, TRAIN_LINES, TrainAlerts, TrainServiceAlert};

/// A projected value. `null` when upstream had nothing to report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SensorValue {
    Minutes(Option<u32>),
    Text(Option<String>),
    List(Vec<String>),
}

/// A named value derived from a bus arrival.
pub struct BusSensorDescription {
    pub key: &'static str,
    pub value_fn: fn(&BusArrival) -> SensorValue,
}

/// A named value derived from a train line's alert state.
pub struct TrainSensorDescription {
    pub key: &'static str,
    pub value_fn: fn(&TrainServiceAlert) -> SensorValue,
}

fn slot(arrival: &BusArrival, slot: usize) -> Option<&NextBus> {
    arrival.next_bus(slot)
}

fn minutes(arrival: &BusArrival, n: usize) -> SensorValue {
    SensorValue::Minutes(slot(arrival, n).and_then(|b| b.minutes_to_arrival))
}

fn vehicle_type(arrival: &BusArrival, n: usize) -> SensorValue {
    SensorValue::Text(slot(arrival, n).and_then(|b| b.vehicle_type.clone()))
}

fn feature(arrival: &BusArrival, n: usize) -> SensorValue {
    SensorValue::Text(slot(arrival, n).and_then(|b| b.feature.clone()))
}

fn load(arrival: &BusArrival, n: usize) -> SensorValue {
    SensorValue::Text(slot(arrival, n).and_then(|b| b.load.clone()))
}

/// Values exposed for every tracked bus service.
pub static BUS_ARRIVAL_SENSORS: [BusSensorDescription; 12] = [
    BusSensorDescription { key: "next_bus_minutes", value_fn: |a| minutes(a, 0) },
    BusSensorDescription { key: "next_bus_minutes_2", value_fn: |a| minutes(a, 1) },
    BusSensorDescription { key: "next_bus_minutes_3", value_fn: |a| minutes(a, 2) },
    BusSensorDescription { key: "next_bus_type", value_fn: |a| vehicle_type(a, 0) },
    BusSensorDescription { key: "next_bus_type_2", value_fn: |a| vehicle_type(a, 1) },
    BusSensorDescription { key: "next_bus_type_3", value_fn: |a| vehicle_type(a, 2) },
    BusSensorDescription { key: "next_bus_feature", value_fn: |a| feature(a, 0) },
    BusSensorDescription { key: "next_bus_feature_2", value_fn: |a| feature(a, 1) },
    BusSensorDescription { key: "next_bus_feature_3", value_fn: |a| feature(a, 2) },
    BusSensorDescription { key: "next_bus_load", value_fn: |a| load(a, 0) },
    BusSensorDescription { key: "next_bus_load_2", value_fn: |a| load(a, 1) },
    BusSensorDescription { key: "next_bus_load_3", value_fn: |a| load(a, 2) },
];

/// Values exposed for every train line.
pub static TRAIN_ALERT_SENSORS: [TrainSensorDescription; 2] = [
    TrainSensorDescription {
        key: "status",
        value_fn: |alert| SensorValue::Text(Some(alert.status.as_str().to_string())),
    },
    TrainSensorDescription {
        key: "messages",
        value_fn: |alert| SensorValue::List(alert.messages.clone()),
    },
];

/// Projected values for one tracked bus service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusServiceReading {
    pub stop_code: String,
    pub service_number: String,
    pub description: String,
    /// False if the latest snapshot has no prediction for this service.
    pub available: bool,
    pub values: BTreeMap<&'static str, SensorValue>,
}

/// Projected values for one train line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainLineReading {
    pub line: String,
    pub available: bool,
    pub values: BTreeMap<&'static str, SensorValue>,
}

/// Project a tracked service from the latest snapshot.
///
/// Services missing from the snapshot project as all-null values.
pub fn project_bus_entry(
    snapshot: Option<&BusArrivalsSnapshot>,
    entry: &TrackedEntry,
) -> BusServiceReading {
    let found = snapshot
        .and_then(|s| s.get(&entry.stop_code))
        .and_then(|services| services.get(&entry.service_number));

    let empty;
    let arrival = match found {
        Some(arrival) => arrival,
        None => {
            empty = BusArrival::empty(&entry.stop_code, &entry.service_number);
            &empty
        }
    };

    BusServiceReading {
        stop_code: entry.stop_code.clone(),
        service_number: entry.service_number.clone(),
        description: entry.description.clone(),
        available: found.is_some(),
        values: BUS_ARRIVAL_SENSORS
            .iter()
            .map(|sensor| (sensor.key, (sensor.value_fn)(arrival)))
            .collect(),
    }
}

/// Project every train line from the latest alert map.
pub fn project_train_lines(alerts: Option<&TrainAlerts>) -> Vec<TrainLineReading> {
    TRAIN_LINES
        .iter()
        .map(|&line| match alerts.and_then(|a| a.get(line)) {
            Some(alert) => TrainLineReading {
                line: line.to_string(),
                available: true,
                values: TRAIN_ALERT_SENSORS
                    .iter()
                    .map(|sensor| (sensor.key, (sensor.value_fn)(alert)))
                    .collect(),
            },
            None => TrainLineReading {
                line: line.to_string(),
                available: false,
                values: TRAIN_ALERT_SENSORS
                    .iter()
                    .map(|sensor| (sensor.key, SensorValue::Text(None)))
                    .collect(),
            },
        })
        .collect()
}
