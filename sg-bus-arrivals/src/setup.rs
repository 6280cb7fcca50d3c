//! Configuration-time validation.
//!
//! These are the checks a configuration UI runs before it stores a
//! credential or starts tracking a service. Soft failures such as an
//! unknown stop code come back as [`ValidationError`] values the UI can
//! show next to the form.

use tracing::debug;

use crate::api::TransitApi;
use crate::catalog::CatalogError;
use crate::config::{ConfigError, ScanInterval, Settings, TrackedEntry, TrackedServices};
use crate::coordinator::BusArrivalsCoordinator;
use crate::datamall::TransitError;
use crate::domain::BusStop;

/// Why a configuration step was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("scan interval must be at least {min} seconds")]
    ScanIntervalTooShort { min: u64 },

    #[error("invalid API account key")]
    InvalidAuth,

    #[error("cannot connect to DataMall: {0}")]
    CannotConnect(String),

    #[error("no bus stop with code {0}")]
    InvalidBusStopCode(String),

    #[error("every service at bus stop {0} is already tracked")]
    AllServicesTracked(String),

    #[error("no bus service selected")]
    NoServiceSelected,

    #[error("train service alerts are already configured")]
    AlreadyConfigured,

    #[error("{0}")]
    Catalog(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<TransitError> for ValidationError {
    fn from(err: TransitError) -> Self {
        if err.is_authentication() {
            ValidationError::InvalidAuth
        } else {
            ValidationError::CannotConnect(err.to_string())
        }
    }
}

impl From<CatalogError> for ValidationError {
    fn from(err: CatalogError) -> Self {
        if err.is_authentication() {
            ValidationError::InvalidAuth
        } else {
            ValidationError::Catalog(err.to_string())
        }
    }
}

/// Check a candidate scan interval, then the credential behind `api`.
///
/// The interval is checked first so a bad value never costs a request.
pub async fn validate_account<A: TransitApi>(
    api: &A,
    scan_interval_secs: u64,
) -> Result<ScanInterval, ValidationError> {
    let interval = ScanInterval::new(scan_interval_secs).map_err(|_| {
        ValidationError::ScanIntervalTooShort {
            min: crate::config::MIN_SCAN_INTERVAL_SECS,
        }
    })?;

    api.authenticate().await?;
    Ok(interval)
}

/// Look up a stop code, turning not-found into a validation error.
pub async fn validate_bus_stop<A: TransitApi>(
    api: &A,
    stop_code: &str,
) -> Result<BusStop, ValidationError> {
    let stop_code = stop_code.trim();
    let bus_stop = api.get_bus_stop(stop_code).await?;
    debug!(stop_code, found = bus_stop.is_some(), "Validated bus stop");

    bus_stop.ok_or_else(|| ValidationError::InvalidBusStopCode(stop_code.to_string()))
}

/// Services at a stop that are not tracked yet, sorted.
///
/// Waits for the catalog crawl on first use.
pub async fn available_services<A: TransitApi>(
    coordinator: &BusArrivalsCoordinator<A>,
    stop_code: &str,
) -> Result<Vec<String>, ValidationError> {
    let all = coordinator.get_bus_services(stop_code).await?;
    let tracked = coordinator.tracked().services_at(stop_code).await;

    let available: Vec<String> = all.difference(&tracked).cloned().collect();
    if available.is_empty() {
        return Err(ValidationError::AllServicesTracked(stop_code.to_string()));
    }
    Ok(available)
}

/// Track the chosen services at a validated stop.
pub async fn add_tracked_services(
    tracked: &TrackedServices,
    bus_stop: &BusStop,
    service_numbers: &[String],
) -> Result<Vec<TrackedEntry>, ValidationError> {
    if service_numbers.is_empty() {
        return Err(ValidationError::NoServiceSelected);
    }

    let added: Vec<TrackedEntry> = service_numbers
        .iter()
        .map(|service_number| {
            TrackedEntry::new(&bus_stop.code, service_number, &bus_stop.description)
        })
        .collect();
    tracked.add_all(added.clone()).await?;
    Ok(added)
}

/// Turn on train service alerts. Only one such option may exist.
pub fn enable_train_service_alerts(settings: &mut Settings) -> Result<(), ValidationError> {
    if settings.train_service_alerts {
        return Err(ValidationError::AlreadyConfigured);
    }
    settings.train_service_alerts = true;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusArrival, ServiceCatalog, TrainAlerts};
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Provider with a fixed auth outcome and one known stop.
    struct SetupApi {
        auth_status: Option<u16>,
        calls: AtomicUsize,
    }

    impl SetupApi {
        fn new(auth_status: Option<u16>) -> Self {
            Self {
                auth_status,
                calls: AtomicUsize::new(0),
            }
        }

        fn check(&self) -> Result<(), TransitError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.auth_status {
                None => Ok(()),
                Some(401) => Err(TransitError::Authentication),
                Some(status) => Err(TransitError::General {
                    endpoint: "/BusServices".into(),
                    status,
                }),
            }
        }
    }

    impl TransitApi for SetupApi {
        async fn authenticate(&self) -> Result<(), TransitError> {
            self.check()
        }

        async fn get_bus_stop(&self, code: &str) -> Result<Option<BusStop>, TransitError> {
            self.check()?;
            Ok((code == "83139").then(|| BusStop {
                code: "83139".into(),
                road_name: "Still Rd".into(),
                description: "Opp Blk 1".into(),
            }))
        }

        async fn get_all_bus_services(&self) -> Result<ServiceCatalog, TransitError> {
            self.check()?;
            let mut catalog = ServiceCatalog::new();
            for service in ["15", "155", "43"] {
                catalog.insert("83139", service);
            }
            Ok(catalog)
        }

        async fn get_bus_arrivals(&self, _stop_code: &str) -> Result<Vec<BusArrival>, TransitError> {
            Ok(vec![])
        }

        async fn get_train_service_alerts(&self) -> Result<TrainAlerts, TransitError> {
            Ok(TrainAlerts::new())
        }
    }

    fn stop() -> BusStop {
        BusStop {
            code: "83139".into(),
            road_name: "Still Rd".into(),
            description: "Opp Blk 1".into(),
        }
    }

    #[tokio::test]
    async fn short_interval_rejected_before_any_request() {
        let api = SetupApi::new(None);
        let err = validate_account(&api, 19).await.unwrap_err();

        assert_eq!(err, ValidationError::ScanIntervalTooShort { min: 20 });
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn valid_account() {
        let api = SetupApi::new(None);
        let interval = validate_account(&api, 20).await.unwrap();
        assert_eq!(interval, ScanInterval::new(20).unwrap());
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn rejected_key_is_invalid_auth() {
        let api = SetupApi::new(Some(401));
        let err = validate_account(&api, 30).await.unwrap_err();
        assert_eq!(err, ValidationError::InvalidAuth);
        assert_eq!(api.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn server_error_is_cannot_connect() {
        let api = SetupApi::new(Some(500));
        let err = validate_account(&api, 30).await.unwrap_err();
        assert!(matches!(err, ValidationError::CannotConnect(_)));
    }

    #[tokio::test]
    async fn bus_stop_lookup() {
        let api = SetupApi::new(None);
        let found = validate_bus_stop(&api, " 83139 ").await.unwrap();
        assert_eq!(found.description, "Opp Blk 1");

        let err = validate_bus_stop(&api, "00000").await.unwrap_err();
        assert_eq!(err, ValidationError::InvalidBusStopCode("00000".into()));
    }

    #[tokio::test]
    async fn available_services_exclude_tracked() {
        let tracked = TrackedServices::new(vec![TrackedEntry::new("83139", "15", "Opp Blk 1")]).unwrap();
        let coordinator = BusArrivalsCoordinator::new(
            Arc::new(SetupApi::new(None)),
            tracked.clone(),
            ScanInterval::default(),
        );

        let available = available_services(&coordinator, "83139").await.unwrap();
        assert_eq!(available, vec!["155".to_string(), "43".to_string()]);

        let added = add_tracked_services(&tracked, &stop(), &available).await.unwrap();
        assert_eq!(added.len(), 2);
        assert_eq!(added[0].description, "Opp Blk 1");

        let err = available_services(&coordinator, "83139").await.unwrap_err();
        assert_eq!(err, ValidationError::AllServicesTracked("83139".into()));
    }

    #[tokio::test]
    async fn adding_requires_a_selection_and_rejects_duplicates() {
        let tracked = TrackedServices::default();
        let err = add_tracked_services(&tracked, &stop(), &[]).await.unwrap_err();
        assert_eq!(err, ValidationError::NoServiceSelected);

        add_tracked_services(&tracked, &stop(), &["15".to_string()]).await.unwrap();
        let err = add_tracked_services(&tracked, &stop(), &["15".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Config(ConfigError::DuplicateEntry { .. })));
    }

    #[tokio::test]
    async fn rejected_selection_leaves_tracked_list_unchanged() {
        let tracked =
            TrackedServices::new(vec![TrackedEntry::new("83139", "155", "Opp Blk 1")]).unwrap();

        let selection = ["15".to_string(), "155".to_string()];
        let err = add_tracked_services(&tracked, &stop(), &selection)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ValidationError::Config(ConfigError::DuplicateEntry {
                stop_code: "83139".into(),
                service_number: "155".into(),
            })
        );

        let entries = tracked.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].service_number, "155");
    }

    #[tokio::test]
    async fn repeated_service_in_selection_is_rejected() {
        let tracked = TrackedServices::default();
        let selection = ["15".to_string(), "43".to_string(), "15".to_string()];

        let err = add_tracked_services(&tracked, &stop(), &selection)
            .await
            .unwrap_err();
        assert!(matches!(err, ValidationError::Config(ConfigError::DuplicateEntry { .. })));
        assert!(tracked.is_empty().await);
    }

    #[test]
    fn train_alerts_are_a_singleton() {
        let mut settings = Settings::from_json(r#"{"api_key": "secret"}"#).unwrap();
        enable_train_service_alerts(&mut settings).unwrap();
        assert!(settings.train_service_alerts);
        assert_eq!(
            enable_train_service_alerts(&mut settings),
            Err(ValidationError::AlreadyConfigured)
        );
    }
}
