//! Train service alerts refresh.

use std::sync::Arc;

use crate::api::TransitApi;
use crate::datamall::TransitError;
use crate::domain::TrainAlerts;

use super::update::{RefreshSource, UpdateCoordinator};

/// Fetches the per-line alert map in a single request.
pub struct TrainAlertsSource<A> {
    api: Arc<A>,
}

impl<A: TransitApi> TrainAlertsSource<A> {
    pub fn new(api: Arc<A>) -> Self {
        Self { api }
    }
}

impl<A: TransitApi> RefreshSource for TrainAlertsSource<A> {
    type Data = TrainAlerts;

    const NAME: &'static str = "train service alerts";

    async fn fetch(&self) -> Result<TrainAlerts, TransitError> {
        self.api.get_train_service_alerts().await
    }
}

pub type TrainAlertsCoordinator<A> = UpdateCoordinator<TrainAlertsSource<A>>;
