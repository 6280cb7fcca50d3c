//! Bus stop, arrival and service catalog types.

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

/// Number of upcoming buses reported per service.
pub const NEXT_BUS_SLOTS: usize = 3;

/// Vehicle types reported by DataMall (single deck, double deck, bendy).
pub const BUS_TYPES: &[&str] = &["sd", "dd", "bd"];

/// Accessibility features. `"none"` stands in for an empty upstream value.
pub const BUS_FEATURES: &[&str] = &["wab", "none"];

/// Passenger loads: seats available, standing available, limited standing.
pub const BUS_LOADS: &[&str] = &["sea", "sda", "lsd"];

/// A bus stop as listed by the upstream authority.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusStop {
    /// Five-digit stop code, e.g. "01012".
    pub code: String,
    pub road_name: String,
    pub description: String,
}

/// One upcoming bus for a service at a stop.
///
/// Every field is `None` when upstream has no estimate for this slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NextBus {
    /// Whole minutes until arrival, rounded down and never negative.
    pub minutes_to_arrival: Option<u32>,
    /// Lower-cased vehicle type, one of [`BUS_TYPES`].
    pub vehicle_type: Option<String>,
    /// Lower-cased accessibility feature, one of [`BUS_FEATURES`].
    pub feature: Option<String>,
    /// Lower-cased passenger load, one of [`BUS_LOADS`].
    pub load: Option<String>,
}

impl NextBus {
    /// A slot with no estimate.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if upstream supplied no estimate for this slot.
    pub fn is_empty(&self) -> bool {
        self.minutes_to_arrival.is_none()
    }
}

/// Arrival predictions for one service at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BusArrival {
    pub stop_code: String,
    pub service_number: String,
    pub operator: String,
    /// First, second and third upcoming bus, in that order.
    pub next_buses: [NextBus; NEXT_BUS_SLOTS],
}

impl BusArrival {
    /// An arrival record with all three slots empty.
    pub fn empty(stop_code: impl Into<String>, service_number: impl Into<String>) -> Self {
        Self {
            stop_code: stop_code.into(),
            service_number: service_number.into(),
            operator: String::new(),
            next_buses: Default::default(),
        }
    }

    /// The upcoming bus at `slot` (0-based).
    pub fn next_bus(&self, slot: usize) -> Option<&NextBus> {
        self.next_buses.get(slot)
    }
}

/// Mapping of stop code to the service numbers calling there.
///
/// Built once from a full crawl of the route listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceCatalog {
    stops: HashMap<String, BTreeSet<String>>,
}

impl ServiceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `service_number` calls at `stop_code`.
    pub fn insert(&mut self, stop_code: impl Into<String>, service_number: impl Into<String>) {
        self.stops
            .entry(stop_code.into())
            .or_default()
            .insert(service_number.into());
    }

    /// Services calling at a stop. Unknown stops have no services.
    pub fn services_at(&self, stop_code: &str) -> BTreeSet<String> {
        self.stops.get(stop_code).cloned().unwrap_or_default()
    }

    /// Number of stops in the catalog.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }
}
