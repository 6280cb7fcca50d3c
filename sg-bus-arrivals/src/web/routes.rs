//! HTTP route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use tracing::{info, warn};

use crate::api::TransitApi;
use crate::config::ConfigError;
use crate::sensor::{project_bus_entry, project_train_lines};
use crate::setup::{
    ValidationError, add_tracked_services, available_services, validate_bus_stop,
};

use super::dto::*;
use super::state::AppState;

/// Create the application router.
pub fn create_router<A: TransitApi>(state: AppState<A>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/bus-arrivals", get(bus_arrivals::<A>))
        .route("/train-service-alerts", get(train_service_alerts::<A>))
        .route("/refresh", post(refresh::<A>))
        .route("/stops/:stop_code/services", get(stop_services::<A>))
        .route("/tracked", get(list_tracked::<A>).post(add_tracked::<A>))
        .route(
            "/tracked/:stop_code/:service_number",
            delete(remove_tracked::<A>),
        )
        .with_state(state)
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Latest readings for every tracked service.
pub(crate) async fn bus_arrivals<A: TransitApi>(
    State(state): State<AppState<A>>,
) -> Json<BusArrivalsResponse> {
    let update = state.bus_arrivals.state();
    let snapshot = update.data.as_deref();
    let entries = state.bus_arrivals.tracked().entries().await;

    let services = entries
        .iter()
        .map(|entry| project_bus_entry(snapshot, entry))
        .collect();

    Json(BusArrivalsResponse {
        status: StatusDto::from(&update),
        services,
    })
}

/// Latest status for every train line.
pub(crate) async fn train_service_alerts<A: TransitApi>(
    State(state): State<AppState<A>>,
) -> Response {
    let Some(coordinator) = &state.train_alerts else {
        return (StatusCode::NOT_FOUND, "train service alerts are not enabled").into_response();
    };

    let update = coordinator.state();
    Json(TrainAlertsResponse {
        status: StatusDto::from(&update),
        lines: project_train_lines(update.data.as_deref()),
    })
    .into_response()
}

/// Refresh every coordinator now, joining refreshes already in flight.
pub(crate) async fn refresh<A: TransitApi>(
    State(state): State<AppState<A>>,
) -> Json<RefreshResponse> {
    let train = async {
        match &state.train_alerts {
            Some(coordinator) => {
                // Failures are reflected in the coordinator state
                let _ = coordinator.request_refresh().await;
                Some(StatusDto::from(&coordinator.state()))
            }
            None => None,
        }
    };
    let bus = async {
        let _ = state.bus_arrivals.request_refresh().await;
        StatusDto::from(&state.bus_arrivals.state())
    };

    let (bus_arrivals, train_service_alerts) = tokio::join!(bus, train);
    Json(RefreshResponse {
        bus_arrivals,
        train_service_alerts,
    })
}

/// Validate a stop and list the services that can still be tracked there.
pub(crate) async fn stop_services<A: TransitApi>(
    State(state): State<AppState<A>>,
    Path(stop_code): Path<String>,
) -> Result<Json<StopServicesResponse>, AppError> {
    let stop = validate_bus_stop(state.api.as_ref(), &stop_code).await?;
    let available = available_services(&state.bus_arrivals, &stop.code).await?;
    Ok(Json(StopServicesResponse { stop, available }))
}

/// Every tracked service, in insertion order.
pub(crate) async fn list_tracked<A: TransitApi>(
    State(state): State<AppState<A>>,
) -> Json<TrackedResponse> {
    Json(TrackedResponse {
        entries: state.bus_arrivals.tracked().entries().await,
    })
}

/// Track services at a stop. Picked up by the next refresh.
pub(crate) async fn add_tracked<A: TransitApi>(
    State(state): State<AppState<A>>,
    Json(req): Json<AddTrackedRequest>,
) -> Result<(StatusCode, Json<TrackedResponse>), AppError> {
    let stop = validate_bus_stop(state.api.as_ref(), &req.stop_code).await?;
    let entries =
        add_tracked_services(state.bus_arrivals.tracked(), &stop, &req.service_numbers).await?;
    info!(stop_code = %stop.code, added = entries.len(), "Tracking bus services");

    Ok((StatusCode::CREATED, Json(TrackedResponse { entries })))
}

/// Stop tracking one service.
pub(crate) async fn remove_tracked<A: TransitApi>(
    State(state): State<AppState<A>>,
    Path((stop_code, service_number)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    if !state
        .bus_arrivals
        .tracked()
        .remove(&stop_code, &service_number)
        .await
    {
        return Err(AppError::NotFound {
            message: format!("service {service_number} at bus stop {stop_code} is not tracked"),
        });
    }

    info!(%stop_code, %service_number, "Stopped tracking bus service");
    Ok(StatusCode::NO_CONTENT)
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    BadRequest { message: String },
    Unauthorized { message: String },
    NotFound { message: String },
    Conflict { message: String },
    BadGateway { message: String },
}

impl From<ValidationError> for AppError {
    fn from(e: ValidationError) -> Self {
        let message = e.to_string();
        match e {
            ValidationError::InvalidAuth => AppError::Unauthorized { message },
            ValidationError::InvalidBusStopCode(_) => AppError::NotFound { message },
            ValidationError::AllServicesTracked(_)
            | ValidationError::AlreadyConfigured
            | ValidationError::Config(ConfigError::DuplicateEntry { .. }) => {
                AppError::Conflict { message }
            }
            ValidationError::CannotConnect(_) | ValidationError::Catalog(_) => {
                AppError::BadGateway { message }
            }
            ValidationError::ScanIntervalTooShort { .. }
            | ValidationError::NoServiceSelected
            | ValidationError::Config(_) => AppError::BadRequest { message },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::BadRequest { message } => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized { message } => (StatusCode::UNAUTHORIZED, message),
            AppError::NotFound { message } => (StatusCode::NOT_FOUND, message),
            AppError::Conflict { message } => (StatusCode::CONFLICT, message),
            AppError::BadGateway { message } => (StatusCode::BAD_GATEWAY, message),
        };

        warn!(status = status.as_u16(), error = %message, "Request rejected");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}
