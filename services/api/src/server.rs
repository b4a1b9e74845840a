use crate::cli::ServeArgs;
use crate::infra::AppState;
use crate::routes::with_listing_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use estate_portal::config::{AppConfig, AppEnvironment};
use estate_portal::error::AppError;
use estate_portal::listings::{ListingService, ListingsState, MapLocator, PropstackClient};
use estate_portal::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    match config.listings.require_api_key() {
        Ok(_) => {}
        Err(err) if config.environment == AppEnvironment::Production => return Err(err.into()),
        Err(err) => warn!(error = %err, "listings requests will fail until the credential is set"),
    }
    if let Err(err) = config.maps.require_api_key() {
        warn!(error = %err, "detail maps only use listing coordinates");
    }

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let gateway = Arc::new(PropstackClient::from_config(&config.listings)?);
    let service = ListingService::new(gateway, config.listings.clone());
    let locator = MapLocator::from_config(&config.maps)?;
    let listings_state = Arc::new(ListingsState::new(service, locator));

    let app = with_listing_routes(listings_state)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "listings proxy ready");

    axum::serve(listener, app).await?;
    Ok(())
}
