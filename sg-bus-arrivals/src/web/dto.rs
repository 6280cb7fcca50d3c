//! Response DTOs for the web layer.

use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};

use crate::config::TrackedEntry;
use crate::coordinator::{UpdatePhase, UpdateState};
use crate::domain::BusStop;
use crate::sensor::{BusServiceReading, TrainLineReading};

/// Coordinator status as seen by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusDto {
    /// One of `pending`, `refreshing`, `ok`, `update_failed`, `needs_reauth`.
    pub state: &'static str,
    pub error: Option<String>,
    /// RFC 3339 time of the last published snapshot.
    pub last_updated: Option<String>,
}

impl<T> From<&UpdateState<T>> for StatusDto {
    fn from(state: &UpdateState<T>) -> Self {
        let label = if state.phase == UpdatePhase::Refreshing {
            "refreshing"
        } else if state.needs_reauth() {
            "needs_reauth"
        } else if state.last_error.is_some() {
            "update_failed"
        } else if state.data.is_some() {
            "ok"
        } else {
            "pending"
        };

        Self {
            state: label,
            error: state.last_error.as_ref().map(ToString::to_string),
            last_updated: state
                .last_updated
                .map(|t| t.to_rfc3339_opts(SecondsFormat::Secs, true)),
        }
    }
}

/// Response for `GET /bus-arrivals`.
#[derive(Debug, Clone, Serialize)]
pub struct BusArrivalsResponse {
    pub status: StatusDto,
    pub services: Vec<BusServiceReading>,
}

/// Response for `GET /train-service-alerts`.
#[derive(Debug, Clone, Serialize)]
pub struct TrainAlertsResponse {
    pub status: StatusDto,
    pub lines: Vec<TrainLineReading>,
}

/// Request body for `POST /tracked`.
#[derive(Debug, Clone, Deserialize)]
pub struct AddTrackedRequest {
    pub stop_code: String,
    pub service_numbers: Vec<String>,
}

/// Tracked entries, for `GET /tracked` and `POST /tracked`.
#[derive(Debug, Clone, Serialize)]
pub struct TrackedResponse {
    pub entries: Vec<TrackedEntry>,
}

/// Response for `GET /stops/{stop_code}/services`.
#[derive(Debug, Clone, Serialize)]
pub struct StopServicesResponse {
    pub stop: BusStop,
    /// Services at the stop that are not tracked yet.
    pub available: Vec<String>,
}

/// Error body.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Response for `POST /refresh`.
#[derive(Debug, Clone, Serialize)]
pub struct RefreshResponse {
    pub bus_arrivals: StatusDto,
    pub train_service_alerts: Option<StatusDto>,
}
