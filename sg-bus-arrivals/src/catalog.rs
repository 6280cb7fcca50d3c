//! One-time cache of the stop → services catalog.
//!
//! The route listing takes dozens of requests to crawl, so it is fetched
//! once in the background when the cache is created. Every caller awaits
//! the same crawl. A failed crawl is kept and returned to all callers;
//! recreate the cache to try again.

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tracing::{info, warn};

use crate::api::TransitApi;
use crate::datamall::TransitError;
use crate::domain::ServiceCatalog;

type CrawlResult = Result<Arc<ServiceCatalog>, CatalogError>;

/// The catalog crawl failed. Shared by every caller that awaited it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CatalogError {
    /// The crawl returned an API or transport error.
    #[error("service catalog unavailable: {0}")]
    Transit(Arc<TransitError>),

    /// The crawl task panicked or was cancelled.
    #[error("service catalog task aborted: {0}")]
    Aborted(String),
}

impl CatalogError {
    /// Returns true if the crawl failed because the credential was rejected.
    pub fn is_authentication(&self) -> bool {
        matches!(self, CatalogError::Transit(e) if e.is_authentication())
    }
}

/// Memoized background crawl of the service catalog.
#[derive(Clone)]
pub struct ServiceCatalogCache {
    crawl: Shared<BoxFuture<'static, CrawlResult>>,
}

impl ServiceCatalogCache {
    /// Start the crawl on the runtime and return a handle to its result.
    ///
    /// Must be called from within a Tokio runtime. The crawl runs to
    /// completion even if every handle is dropped.
    pub fn spawn<A: TransitApi>(api: Arc<A>) -> Self {
        let task = tokio::spawn(async move {
            match api.get_all_bus_services().await {
                Ok(catalog) => {
                    info!(stops = catalog.len(), "Service catalog ready");
                    Ok(Arc::new(catalog))
                }
                Err(e) => {
                    warn!(error = %e, "Service catalog crawl failed");
                    Err(CatalogError::Transit(Arc::new(e)))
                }
            }
        });

        let crawl = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(CatalogError::Aborted(e.to_string())),
            }
        }
        .boxed()
        .shared();

        Self { crawl }
    }

    /// Wait for the crawl and return the whole catalog.
    pub async fn catalog(&self) -> CrawlResult {
        self.crawl.clone().await
    }

    /// Services calling at `stop_code`, once the crawl has finished.
    pub async fn get_bus_services(&self, stop_code: &str) -> Result<BTreeSet<String>, CatalogError> {
        let catalog = self.catalog().await?;
        Ok(catalog.services_at(stop_code))
    }

    /// Returns the result if the crawl has already finished.
    pub fn peek(&self) -> Option<CrawlResult> {
        self.crawl.peek().cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusArrival, BusStop, TrainAlerts};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Provider whose only working call is the catalog crawl.
    struct CrawlOnly {
        crawls: AtomicUsize,
        fail: bool,
    }

    impl CrawlOnly {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                crawls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl TransitApi for CrawlOnly {
        async fn authenticate(&self) -> Result<(), TransitError> {
            Ok(())
        }

        async fn get_bus_stop(&self, _code: &str) -> Result<Option<BusStop>, TransitError> {
            Ok(None)
        }

        async fn get_all_bus_services(&self) -> Result<ServiceCatalog, TransitError> {
            self.crawls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if self.fail {
                return Err(TransitError::Authentication);
            }
            let mut catalog = ServiceCatalog::new();
            catalog.insert("83139", "15");
            catalog.insert("83139", "155");
            Ok(catalog)
        }

        async fn get_bus_arrivals(&self, _stop_code: &str) -> Result<Vec<BusArrival>, TransitError> {
            Ok(vec![])
        }

        async fn get_train_service_alerts(&self) -> Result<TrainAlerts, TransitError> {
            Ok(TrainAlerts::new())
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_crawl() {
        let api = CrawlOnly::new(false);
        let cache = ServiceCatalogCache::spawn(api.clone());

        let (a, b, c) = tokio::join!(
            cache.get_bus_services("83139"),
            cache.get_bus_services("83139"),
            cache.get_bus_services("00000"),
        );

        let expected: BTreeSet<String> = ["15", "155"].iter().map(|s| s.to_string()).collect();
        assert_eq!(a.unwrap(), expected);
        assert_eq!(b.unwrap(), expected);
        assert!(c.unwrap().is_empty());
        assert_eq!(api.crawls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn later_callers_reuse_finished_crawl() {
        let api = CrawlOnly::new(false);
        let cache = ServiceCatalogCache::spawn(api.clone());

        cache.catalog().await.unwrap();
        assert!(cache.peek().is_some());
        cache.get_bus_services("83139").await.unwrap();
        assert_eq!(api.crawls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_cached_for_every_caller() {
        let api = CrawlOnly::new(true);
        let cache = ServiceCatalogCache::spawn(api.clone());

        let first = cache.get_bus_services("83139").await.unwrap_err();
        let second = cache.get_bus_services("83139").await.unwrap_err();
        assert!(first.is_authentication());
        assert!(second.is_authentication());
        assert_eq!(api.crawls.load(Ordering::SeqCst), 1);
    }
}
