//! Application state for the web layer.

use std::sync::Arc;

use crate::api::TransitApi;
use crate::coordinator::{BusArrivalsCoordinator, TrainAlertsCoordinator};

/// Shared application state.
pub struct AppState<A: TransitApi> {
    /// Transit API, for stop validation
    pub api: Arc<A>,

    /// Bus arrivals for tracked services
    pub bus_arrivals: BusArrivalsCoordinator<A>,

    /// Train service alerts, if enabled
    pub train_alerts: Option<TrainAlertsCoordinator<A>>,
}

impl<A: TransitApi> Clone for AppState<A> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            bus_arrivals: self.bus_arrivals.clone(),
            train_alerts: self.train_alerts.clone(),
        }
    }
}

impl<A: TransitApi> AppState<A> {
    /// Create a new app state.
    pub fn new(
        api: Arc<A>,
        bus_arrivals: BusArrivalsCoordinator<A>,
        train_alerts: Option<TrainAlertsCoordinator<A>>,
    ) -> Self {
        Self {
            api,
            bus_arrivals,
            train_alerts,
        }
    }
}
