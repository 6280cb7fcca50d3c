use std::net::SocketAddr;
use std::sync::Arc;

use sg_bus_arrivals::config::{Settings, TrackedServices};
use sg_bus_arrivals::coordinator::{
    BusArrivalsCoordinator, TrainAlertsCoordinator, TrainAlertsSource,
};
use sg_bus_arrivals::datamall::{DataMallClient, DataMallConfig};
use sg_bus_arrivals::web::{AppState, create_router};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Settings file used when `SG_BUS_ARRIVALS_CONFIG` is not set.
const DEFAULT_CONFIG_PATH: &str = "sg_bus_arrivals.json";

/// Listen address used when `SG_BUS_ARRIVALS_ADDR` is not set.
const DEFAULT_ADDR: &str = "127.0.0.1:3000";

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load settings, letting the environment override the key
    let config_path = std::env::var("SG_BUS_ARRIVALS_CONFIG")
        .unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut settings = Settings::load(&config_path).expect("Failed to load settings");
    if let Ok(api_key) = std::env::var("DATAMALL_API_KEY") {
        settings = settings
            .with_api_key(api_key)
            .expect("DATAMALL_API_KEY is empty");
    }

    let client = DataMallClient::new(DataMallConfig::new(&settings.api_key))
        .expect("Failed to create DataMall client");

    // Fail fast on a bad credential
    if let Err(e) = client.authenticate().await {
        error!(error = %e, "Could not verify the DataMall account key");
        std::process::exit(1);
    }
    let api = Arc::new(client);

    let tracked =
        TrackedServices::new(settings.tracked.clone()).expect("Tracked services are not unique");
    info!(
        tracked = settings.tracked.len(),
        interval_secs = settings.scan_interval.secs(),
        "Starting bus arrivals polling"
    );

    let bus_arrivals =
        BusArrivalsCoordinator::new(api.clone(), tracked, settings.scan_interval);
    let _bus_polling = bus_arrivals.start_polling();

    let train_alerts = settings.train_service_alerts.then(|| {
        TrainAlertsCoordinator::new(
            TrainAlertsSource::new(api.clone()),
            settings.scan_interval,
        )
    });
    let _train_polling = train_alerts.as_ref().map(|c| c.start_polling());

    let state = AppState::new(api, bus_arrivals, train_alerts);
    let app = create_router(state);

    let addr: SocketAddr = std::env::var("SG_BUS_ARRIVALS_ADDR")
        .unwrap_or_else(|_| DEFAULT_ADDR.to_string())
        .parse()
        .expect("Invalid listen address");
    info!(%addr, "SG bus arrivals listening");
    info!("  GET  /bus-arrivals         - Tracked bus services");
    info!("  GET  /train-service-alerts - Train line status");
    info!("  POST /refresh              - Refresh now");
    info!("  GET  /stops/:code/services - Services available to track");
    info!("  GET|POST /tracked          - List or add tracked services");
    info!("  DELETE /tracked/:stop/:svc - Stop tracking a service");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind listen address");
    if let Err(e) = axum::serve(listener, app).await {
        warn!(error = %e, "Server stopped");
    }
}
