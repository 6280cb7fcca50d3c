//! DataMall API response DTOs.
//!
//! These types map directly to the DataMall JSON responses. Fields the
//! client does not consume are omitted; serde ignores them.

use serde::Deserialize;

/// Wrapper used by every listing endpoint: `{"value": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

/// Entry from the `BusStops` listing.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusStopDto {
    pub bus_stop_code: String,
    #[serde(default)]
    pub road_name: String,
    #[serde(default)]
    pub description: String,
}

/// Entry from the `BusRoutes` listing. One per (service, direction, stop).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusRouteDto {
    pub service_no: String,
    pub bus_stop_code: String,
}

/// Response from `v3/BusArrival`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BusArrivalResponse {
    pub bus_stop_code: String,
    #[serde(default)]
    pub services: Vec<ServiceArrivalDto>,
}

/// Arrival predictions for one service.
///
/// DataMall always sends all three slots, but with empty strings when
/// there is nothing to report; missing slots are tolerated too.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ServiceArrivalDto {
    pub service_no: String,
    #[serde(default)]
    pub operator: String,
    #[serde(default)]
    pub next_bus: Option<NextBusDto>,
    #[serde(default)]
    pub next_bus2: Option<NextBusDto>,
    #[serde(default)]
    pub next_bus3: Option<NextBusDto>,
}

/// One upcoming bus, as sent by DataMall.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct NextBusDto {
    /// ISO 8601 timestamp, or empty if no estimate.
    #[serde(default)]
    pub estimated_arrival: String,
    /// SEA / SDA / LSD.
    #[serde(default)]
    pub load: String,
    /// WAB or empty.
    #[serde(default)]
    pub feature: String,
    /// SD / DD / BD.
    #[serde(default, rename = "Type")]
    pub vehicle_type: String,
}

/// Response from `TrainServiceAlerts`.
#[derive(Debug, Clone, Deserialize)]
pub struct TrainServiceAlertsResponse {
    pub value: TrainServiceAlertsValue,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TrainServiceAlertsValue {
    #[serde(default)]
    pub message: Vec<AlertMessageDto>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AlertMessageDto {
    #[serde(default)]
    pub content: String,
}
