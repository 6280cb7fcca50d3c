//! Bus arrivals refresh.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use tokio::sync::watch;

use crate::api::TransitApi;
use crate::catalog::{CatalogError, ServiceCatalogCache};
use crate::config::{ScanInterval, TrackedServices};
use crate::datamall::TransitError;
use crate::domain::BusArrival;

use super::update::{PollingHandle, RefreshSource, UpdateCoordinator, UpdateError, UpdateState};

/// Arrivals keyed by stop code, then service number.
pub type BusArrivalsSnapshot = HashMap<String, HashMap<String, BusArrival>>;

/// Fetches arrivals for every tracked stop.
pub struct BusArrivalsSource<A> {
    api: Arc<A>,
    tracked: TrackedServices,
}

impl<A: TransitApi> BusArrivalsSource<A> {
    pub fn new(api: Arc<A>, tracked: TrackedServices) -> Self {
        Self { api, tracked }
    }
}

impl<A: TransitApi> RefreshSource for BusArrivalsSource<A> {
    type Data = BusArrivalsSnapshot;

    const NAME: &'static str = "bus arrivals";

    /// One concurrent request per distinct tracked stop. Any failure fails
    /// the whole batch.
    async fn fetch(&self) -> Result<BusArrivalsSnapshot, TransitError> {
        // Read fresh so entries added since the last tick are included
        let stop_codes: BTreeSet<String> = self.tracked.stop_codes().await;

        let responses = try_join_all(
            stop_codes
                .iter()
                .map(|stop_code| self.api.get_bus_arrivals(stop_code)),
        )
        .await?;

        let mut snapshot = BusArrivalsSnapshot::with_capacity(stop_codes.len());
        for (stop_code, arrivals) in stop_codes.into_iter().zip(responses) {
            let services = snapshot.entry(stop_code).or_default();
            for arrival in arrivals {
                services.insert(arrival.service_number.clone(), arrival);
            }
        }

        Ok(snapshot)
    }
}

/// Refreshes bus arrivals for tracked stops and answers service lookups
/// from the one-time catalog crawl.
pub struct BusArrivalsCoordinator<A: TransitApi> {
    updates: UpdateCoordinator<BusArrivalsSource<A>>,
    catalog: ServiceCatalogCache,
}

impl<A: TransitApi> Clone for BusArrivalsCoordinator<A> {
    fn clone(&self) -> Self {
        Self {
            updates: self.updates.clone(),
            catalog: self.catalog.clone(),
        }
    }
}

impl<A: TransitApi> BusArrivalsCoordinator<A> {
    /// Create the coordinator and start the catalog crawl in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(api: Arc<A>, tracked: TrackedServices, interval: ScanInterval) -> Self {
        let catalog = ServiceCatalogCache::spawn(api.clone());
        Self {
            updates: UpdateCoordinator::new(BusArrivalsSource::new(api, tracked), interval),
            catalog,
        }
    }

    /// Use a prepared update coordinator and catalog.
    pub fn from_parts(
        updates: UpdateCoordinator<BusArrivalsSource<A>>,
        catalog: ServiceCatalogCache,
    ) -> Self {
        Self { updates, catalog }
    }

    /// Services calling at a stop, waiting for the catalog crawl if needed.
    pub async fn get_bus_services(&self, stop_code: &str) -> Result<BTreeSet<String>, CatalogError> {
        self.catalog.get_bus_services(stop_code).await
    }

    /// Refresh now, or join the refresh already in flight.
    pub async fn request_refresh(&self) -> Result<Arc<BusArrivalsSnapshot>, UpdateError> {
        self.updates.request_refresh().await
    }

    pub fn start_polling(&self) -> PollingHandle {
        self.updates.start_polling()
    }

    pub fn state(&self) -> UpdateState<BusArrivalsSnapshot> {
        self.updates.state()
    }

    pub fn data(&self) -> Option<Arc<BusArrivalsSnapshot>> {
        self.updates.data()
    }

    pub fn subscribe(&self) -> watch::Receiver<UpdateState<BusArrivalsSnapshot>> {
        self.updates.subscribe()
    }

    /// Latest arrival for one service at one stop.
    pub fn arrival(&self, stop_code: &str, service_number: &str) -> Option<BusArrival> {
        self.data()?.get(stop_code)?.get(service_number).cloned()
    }

    /// The tracked entries this coordinator polls for.
    pub fn tracked(&self) -> &TrackedServices {
        &self.updates.source().tracked
    }
}
