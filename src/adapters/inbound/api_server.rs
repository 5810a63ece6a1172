//! GeoIP Lookup API Server
//!
//! HTTP API mapping requests to snapshot store lookups and rendering the
//! JSON response shape clients depend on.

use crate::application::{RefreshStats, RefreshStatus, SnapshotStore};
use crate::domain::entities::GeoRecord;
use crate::domain::errors::LookupError;
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{ConnectInfo, Path, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::UNIX_EPOCH;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

/// Lookup response, one flat object per address.
///
/// Fields the dataset lacks render as empty strings or zero.
#[derive(Debug, Serialize)]
pub struct GeoResponse {
    pub ip: String,
    pub country_code: String,
    pub country_name: String,
    pub continent: String,
    pub region_code: String,
    pub region_name: String,
    pub city: String,
    pub zip_code: String,
    pub time_zone: String,
    pub latitude: f64,
    pub longitude: f64,
    pub metro_code: u16,
}

impl GeoResponse {
    pub fn new(ip: String, record: GeoRecord) -> Self {
        Self {
            ip,
            country_code: record.country_code.unwrap_or_default(),
            country_name: record.country_name.unwrap_or_default(),
            continent: record.continent.unwrap_or_default(),
            region_code: record.region_code.unwrap_or_default(),
            region_name: record.region_name.unwrap_or_default(),
            city: record.city.unwrap_or_default(),
            zip_code: record.postal_code.unwrap_or_default(),
            time_zone: record.time_zone.unwrap_or_default(),
            latitude: record.latitude.unwrap_or_default(),
            longitude: record.longitude.unwrap_or_default(),
            metro_code: record.metro_code.unwrap_or_default(),
        }
    }
}

/// Error body. Never carries internal detail.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Dataset section of the health response.
#[derive(Debug, Serialize)]
pub struct DatasetHealth {
    pub database_type: String,
    pub build_epoch: u64,
    pub snapshot_version: u64,
    pub installed_at: u64,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub dataset: DatasetHealth,
    pub refresh: RefreshStatus,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub store: Arc<SnapshotStore>,
    pub refresh: Arc<RefreshStats>,
}

impl ApiState {
    pub fn new(store: Arc<SnapshotStore>, refresh: Arc<RefreshStats>) -> Self {
        Self { store, refresh }
    }
}

/// API Server for geolocation lookups.
pub struct ApiServer {
    listen_addr: String,
    route_prefix: String,
    allowed_origins: Vec<String>,
    state: ApiState,
}

impl ApiServer {
    pub fn new(
        listen_addr: String,
        route_prefix: String,
        allowed_origins: Vec<String>,
        state: ApiState,
    ) -> Self {
        Self {
            listen_addr,
            route_prefix,
            allowed_origins,
            state,
        }
    }

    /// Build the router with all routes and layers.
    pub fn router(&self) -> Router {
        let prefix = self.route_prefix.trim_end_matches('/');
        let client_route = if prefix.is_empty() { "/" } else { prefix };

        Router::new()
            // Lookup of the calling client
            .route(client_route, get(lookup_client_handler))
            // Lookup of an explicit address
            .route(&format!("{}/:ip", prefix), get(lookup_ip_handler))
            .route("/healthz", get(health_handler))
            .layer(cors_layer(&self.allowed_origins))
            .layer(middleware::map_response(allow_methods_header))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the API server until shutdown is initiated.
    #[cfg_attr(coverage_nightly, coverage(off))]
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!(
            "GeoIP API listening on {} (prefix {})",
            self.listen_addr,
            self.route_prefix
        );

        axum::serve(
            listener,
            self.router()
                .into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move { shutdown.wait().await })
        .await?;

        tracing::info!("GeoIP API stopped");
        Ok(())
    }
}

/// CORS policy: echo the request origin when it is allowed.
///
/// A list consisting of exactly `"*"` allows every origin.
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let allow_origin = if allowed_origins.len() == 1 && allowed_origins[0] == "*" {
        AllowOrigin::mirror_request()
    } else {
        AllowOrigin::list(
            allowed_origins
                .iter()
                .filter(|origin| origin.as_str() != "*")
                .filter_map(|origin| HeaderValue::from_str(origin).ok()),
        )
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET])
}

/// Advertise the allowed method on every response carrying an allowed
/// origin, not only on preflights.
async fn allow_methods_header(mut response: Response) -> Response {
    if response
        .headers()
        .contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN)
    {
        response.headers_mut().insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static("GET"),
        );
    }
    response
}

fn header_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
}

/// Address of the calling client.
///
/// `X-Real-IP` wins over `X-Forwarded-For`, which wins over the peer
/// address. Only the first element of a comma-separated list is used.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let raw = header_value(headers, "x-real-ip")
        .or_else(|| header_value(headers, "x-forwarded-for"))
        .map(str::to_string)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
        .unwrap_or_default();

    raw.split(',').next().unwrap_or_default().trim().to_string()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn lookup_response(state: &ApiState, ip: String) -> Response {
    match state.store.lookup(&ip) {
        Ok(record) => {
            tracing::info!("looking up IP '{}'", ip);
            Json(GeoResponse::new(ip, record)).into_response()
        }
        Err(LookupError::InvalidInput(_)) => {
            tracing::info!("invalid IP: '{}'", ip);
            error_response(StatusCode::BAD_REQUEST, "Invalid IP address")
        }
        Err(LookupError::NotFound) => {
            tracing::info!("IP '{}' not found", ip);
            error_response(StatusCode::NOT_FOUND, "Address not found")
        }
        Err(LookupError::Backend(e)) => {
            tracing::error!("lookup error for '{}': {}", ip, e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "Lookup error")
        }
    }
}

// Handler functions

async fn lookup_client_handler(
    State(state): State<ApiState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Response {
    let ip = client_ip(&headers, peer.map(|ConnectInfo(addr)| addr));
    lookup_response(&state, ip)
}

async fn lookup_ip_handler(State(state): State<ApiState>, Path(ip): Path<String>) -> Response {
    lookup_response(&state, ip)
}

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let snapshot = state.store.current();
    let info = snapshot.info();
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        dataset: DatasetHealth {
            database_type: info.database_type,
            build_epoch: info.build_epoch,
            snapshot_version: snapshot.version,
            installed_at: snapshot
                .installed_at
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0),
        },
        refresh: state.refresh.snapshot(),
    };
    Json(response)
}
