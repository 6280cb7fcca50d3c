//! DataMall HTTP client.
//!
//! Provides async methods for querying the DataMall API. Handles
//! authentication, pagination, and conversion to domain types.

use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::domain::{
    BusArrival, BusStop, ServiceCatalog, TrainAlerts, derive_train_service_alerts,
};

use super::convert::convert_bus_arrivals;
use super::error::TransitError;
use super::paging::{find_in_pages, for_each_page, skip_for_page};
use super::types::{
    BusArrivalResponse, BusRouteDto, BusStopDto, ListResponse, TrainServiceAlertsResponse,
};

/// Default base URL for the DataMall API.
const DEFAULT_BASE_URL: &str = "https://datamall2.mytransport.sg/ltaodataservice";

/// Header carrying the account key. Header names are case-insensitive.
const ACCOUNT_KEY_HEADER: &str = "accountkey";

/// Records per page on listing endpoints. Fixed by DataMall.
const DEFAULT_PAGE_SIZE: u32 = 500;

/// Maximum pages searched when looking up a single stop.
const DEFAULT_MAX_STOP_PAGES: u32 = 100;

/// Maximum pages crawled when building the service catalog.
const MAX_ROUTE_PAGES: u32 = 1000;

/// Bytes of a failed response body kept in the log.
const LOGGED_BODY_CHARS: usize = 500;

const BUS_SERVICES: &str = "/BusServices";
const BUS_STOPS: &str = "/BusStops";
const BUS_ROUTES: &str = "/BusRoutes";
const BUS_ARRIVAL: &str = "/v3/BusArrival";
const TRAIN_SERVICE_ALERTS: &str = "/TrainServiceAlerts";

/// Configuration for the DataMall client.
#[derive(Debug, Clone)]
pub struct DataMallConfig {
    /// Account key for authentication
    pub api_key: String,
    /// Base URL for the API (defaults to production DataMall)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Records per page on listing endpoints
    pub page_size: u32,
    /// Page ceiling for bus stop lookups
    pub max_stop_pages: u32,
}

impl DataMallConfig {
    /// Create a new config with the given account key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            page_size: DEFAULT_PAGE_SIZE,
            max_stop_pages: DEFAULT_MAX_STOP_PAGES,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the listing page size.
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the page ceiling for bus stop lookups.
    pub fn with_max_stop_pages(mut self, pages: u32) -> Self {
        self.max_stop_pages = pages;
        self
    }
}

/// DataMall API client.
#[derive(Debug, Clone)]
pub struct DataMallClient {
    http: reqwest::Client,
    base_url: String,
    page_size: u32,
    max_stop_pages: u32,
}

impl DataMallClient {
    /// Create a new DataMall client with the given configuration.
    pub fn new(config: DataMallConfig) -> Result<Self, TransitError> {
        let mut headers = HeaderMap::new();
        let mut api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| TransitError::InvalidApiKey)?;
        api_key.set_sensitive(true);
        headers.insert(ACCOUNT_KEY_HEADER, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            page_size: config.page_size,
            max_stop_pages: config.max_stop_pages,
        })
    }

    /// Verify the account key with a cheap request.
    pub async fn authenticate(&self) -> Result<(), TransitError> {
        self.request(BUS_SERVICES, &[]).await?;
        Ok(())
    }

    /// Look up a bus stop by code.
    ///
    /// Returns `Ok(None)` if the listing is exhausted, or the page ceiling
    /// is reached, without finding the stop.
    pub async fn get_bus_stop(&self, code: &str) -> Result<Option<BusStop>, TransitError> {
        let found = find_in_pages(
            self.max_stop_pages,
            |page| self.list_page::<BusStopDto>(BUS_STOPS, page),
            |stop| stop.bus_stop_code == code,
        )
        .await?;

        Ok(found.map(BusStop::from))
    }

    /// Crawl the full route listing into a stop → services catalog.
    ///
    /// This takes one request per 500 route records and is slow; use
    /// [`crate::catalog::ServiceCatalogCache`] instead of calling it on
    /// latency-sensitive paths.
    pub async fn get_all_bus_services(&self) -> Result<ServiceCatalog, TransitError> {
        let started = Instant::now();
        let mut catalog = ServiceCatalog::new();

        let pages = for_each_page(
            MAX_ROUTE_PAGES,
            |page| self.list_page::<BusRouteDto>(BUS_ROUTES, page),
            |routes| {
                for route in routes {
                    catalog.insert(route.bus_stop_code, route.service_no);
                }
            },
        )
        .await?;

        info!(
            pages,
            stops = catalog.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Built bus service catalog"
        );
        Ok(catalog)
    }

    /// Get arrival predictions for every service at a stop.
    pub async fn get_bus_arrivals(&self, stop_code: &str) -> Result<Vec<BusArrival>, TransitError> {
        let response: BusArrivalResponse = self
            .get_json(BUS_ARRIVAL, &[("BusStopCode", stop_code.to_string())])
            .await?;

        Ok(convert_bus_arrivals(&response, Utc::now()))
    }

    /// Get per-line train service status.
    pub async fn get_train_service_alerts(&self) -> Result<TrainAlerts, TransitError> {
        let response: TrainServiceAlertsResponse =
            self.get_json(TRAIN_SERVICE_ALERTS, &[]).await?;

        let messages: Vec<String> = response
            .value
            .message
            .into_iter()
            .map(|m| m.content)
            .filter(|content| !content.is_empty())
            .collect();

        Ok(derive_train_service_alerts(&messages))
    }

    /// Fetch one page of a listing endpoint.
    async fn list_page<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        page: u32,
    ) -> Result<Vec<T>, TransitError> {
        let skip = skip_for_page(page, self.page_size);
        let response: ListResponse<T> = self
            .get_json(endpoint, &[("$skip", skip.to_string())])
            .await?;
        Ok(response.value)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<T, TransitError> {
        let body = self.request(endpoint, query).await?;

        serde_json::from_str(&body).map_err(|e| TransitError::Json {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })
    }

    /// Issue a GET and return the body of a 200 response.
    async fn request(&self, endpoint: &str, query: &[(&str, String)]) -> Result<String, TransitError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let response = self.http.get(&url).query(query).send().await?;
        let status = response.status();
        debug!(endpoint, status = status.as_u16(), "Invoked DataMall API");

        if status == StatusCode::UNAUTHORIZED {
            return Err(TransitError::Authentication);
        }

        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!(
                endpoint,
                status = status.as_u16(),
                body = %body.chars().take(LOGGED_BODY_CHARS).collect::<String>(),
                "DataMall API call failed"
            );
            return Err(TransitError::General {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
