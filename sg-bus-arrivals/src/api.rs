//! The transit data source consumed by coordinators and setup.
//!
//! Coordinators take an implementation of [`TransitApi`] as a parameter
//! rather than a concrete client, so tests can substitute an in-memory
//! provider.

use std::future::Future;

use crate::datamall::{DataMallClient, TransitError};
use crate::domain::{BusArrival, BusStop, ServiceCatalog, TrainAlerts};

/// Operations on the upstream transit API.
pub trait TransitApi: Send + Sync + 'static {
    /// Validate the credential.
    fn authenticate(&self) -> impl Future<Output = Result<(), TransitError>> + Send;

    /// Look up a stop by code. Not-found is `Ok(None)`.
    fn get_bus_stop(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<BusStop>, TransitError>> + Send;

    /// Crawl the complete stop → services catalog.
    fn get_all_bus_services(
        &self,
    ) -> impl Future<Output = Result<ServiceCatalog, TransitError>> + Send;

    /// Arrival predictions for every service at a stop.
    fn get_bus_arrivals(
        &self,
        stop_code: &str,
    ) -> impl Future<Output = Result<Vec<BusArrival>, TransitError>> + Send;

    /// Per-line train service status.
    fn get_train_service_alerts(
        &self,
    ) -> impl Future<Output = Result<TrainAlerts, TransitError>> + Send;
}

impl TransitApi for DataMallClient {
    fn authenticate(&self) -> impl Future<Output = Result<(), TransitError>> + Send {
        DataMallClient::authenticate(self)
    }

    fn get_bus_stop(
        &self,
        code: &str,
    ) -> impl Future<Output = Result<Option<BusStop>, TransitError>> + Send {
        DataMallClient::get_bus_stop(self, code)
    }

    fn get_all_bus_services(
        &self,
    ) -> impl Future<Output = Result<ServiceCatalog, TransitError>> + Send {
        DataMallClient::get_all_bus_services(self)
    }

    fn get_bus_arrivals(
        &self,
        stop_code: &str,
    ) -> impl Future<Output = Result<Vec<BusArrival>, TransitError>> + Send {
        DataMallClient::get_bus_arrivals(self, stop_code)
    }

    fn get_train_service_alerts(
        &self,
    ) -> impl Future<Output = Result<TrainAlerts, TransitError>> + Send {
        DataMallClient::get_train_service_alerts(self)
    }
}
