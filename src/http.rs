use std::{net::SocketAddr, time::Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;
use uuid::Uuid;

use crate::{app_state::AppState, error::ResolveError, logging::logger};

const MISSING_RADIO: &str = "Parameter 'radio' is required. Example: /recherche?radio=rdj";
const UNKNOWN_SOURCE: &str = "Parameter 'source' only accepts 'curated'";

type ApiResponse = Result<Response, ApiError>;

fn extract_request_id(headers: &HeaderMap) -> String {
    headers
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .map(|value| value.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

fn extract_client_ip(headers: &HeaderMap, remote: Option<&SocketAddr>) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| raw.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|value| value.to_str().ok())
                .map(|value| value.to_string())
        })
        .or_else(|| remote.map(|addr| addr.ip().to_string()))
}

async fn log_requests(request: Request<Body>, next: Next) -> Response {
    let request_id = extract_request_id(request.headers());
    let method = request.method().clone();
    let raw_url = request.uri().to_string();
    let remote = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| &info.0);
    let client_ip = extract_client_ip(request.headers(), remote);
    let user_agent = request
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());
    let started_at = Instant::now();

    logger().info(
        "request.received",
        json!({
            "requestId": request_id,
            "method": method.as_str(),
            "rawUrl": raw_url,
            "clientIp": client_ip,
            "userAgent": user_agent,
        }),
    );

    let mut response = next.run(request).await;
    let status = response.status().as_u16();
    let duration_ms = started_at.elapsed().as_secs_f64() * 1000.0;

    logger().info(
        "request.completed",
        json!({
            "requestId": request_id,
            "method": method.as_str(),
            "rawUrl": raw_url,
            "statusCode": status,
            "durationMs": duration_ms,
            "clientIp": client_ip,
        }),
    );

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(header::HeaderName::from_static("x-request-id"), value);
    }

    response
}

fn json_response<T>(status: StatusCode, payload: T) -> Response
where
    T: Serialize,
{
    (status, Json(payload)).into_response()
}

#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    NotFound(String),
}

#[derive(Serialize)]
struct ErrorResponse<'a> {
    error: &'a str,
}

impl From<ResolveError> for ApiError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::InvalidCountry(country) => ApiError::BadRequest(format!(
                "Parameter 'country' must be a two-letter code, got '{country}'"
            )),
            ResolveError::NotFound(name) => ApiError::NotFound(format!("Radio '{name}' not found")),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse { error: &message }),
            )
                .into_response(),
            ApiError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse { error: &message }),
            )
                .into_response(),
        }
    }
}

#[derive(Serialize)]
struct HealthResponse<'a> {
    status: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct RadiosQueryParams {
    #[serde(default)]
    country: Option<String>,
    #[serde(default, alias = "query")]
    q: Option<String>,
    #[serde(default)]
    source: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ResolveQueryParams {
    #[serde(default, alias = "name")]
    radio: Option<String>,
    #[serde(default)]
    country: Option<String>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/healthz", get(healthz))
        .route("/radios", get(list_radios))
        .route("/recherche", get(resolve_radio))
        .route("/resolve", get(resolve_radio))
        .with_state(state)
        .layer(middleware::from_fn(log_requests))
}

pub async fn serve(state: AppState) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], state.config.port));
    let router = build_router(state);

    let listener = TcpListener::bind(addr).await?;
    logger().info(
        "server.listening",
        json!({
            "address": addr.to_string()
        }),
    );

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn home(State(state): State<AppState>) -> Response {
    json_response(
        StatusCode::OK,
        json!({
            "message": "Radio resolver: OnlineRadioBox with Radio Browser fallback",
            "defaultCountry": state.config.default_country,
            "strategies": state.strategy_labels(),
            "routes": {
                "GET /radios?country=CC": "Aggregated station listing for a country",
                "GET /radios?country=CC&q=NAME": "OnlineRadioBox search results",
                "GET /radios?country=CC&source=curated": "Curated stations loaded from OnlineRadioBox",
                "GET /recherche?radio=NAME&country=CC": "Resolve one station to name, image and stream",
            },
            "example": "/recherche?radio=rdj",
        }),
    )
}

async fn healthz() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn list_radios(
    State(state): State<AppState>,
    Query(params): Query<RadiosQueryParams>,
) -> ApiResponse {
    let country = params.country.as_deref();
    let list = match params.source.as_deref().map(str::trim) {
        None | Some("") => state.list_radios(country, params.q.as_deref()).await?,
        Some(source) if source.eq_ignore_ascii_case("curated") => {
            state.list_curated(country).await?
        }
        Some(_) => return Err(ApiError::BadRequest(UNKNOWN_SOURCE.to_string())),
    };
    Ok(json_response(StatusCode::OK, list))
}

async fn resolve_radio(
    State(state): State<AppState>,
    Query(params): Query<ResolveQueryParams>,
) -> ApiResponse {
    let name = params
        .radio
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(MISSING_RADIO.to_string()))?;
    let record = state
        .resolve_radio(name, params.country.as_deref())
        .await?;
    Ok(json_response(StatusCode::OK, record))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            logger().error(
                "server.signal_error",
                json!({ "error": error.to_string() }),
            );
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(error) => {
                logger().error(
                    "server.signal_error",
                    json!({ "error": error.to_string() }),
                );
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    logger().info("server.shutdown", json!({}));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_id_prefers_header() {
        let mut headers = HeaderMap::new();
        headers.insert("x-request-id", HeaderValue::from_static("abc-123"));
        assert_eq!(extract_request_id(&headers), "abc-123");

        let generated = extract_request_id(&HeaderMap::new());
        assert!(Uuid::parse_str(&generated).is_ok());
    }

    #[test]
    fn client_ip_uses_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(
            extract_client_ip(&headers, None).as_deref(),
            Some("203.0.113.7")
        );
    }

    #[test]
    fn not_found_message_names_the_query() {
        let error = ApiError::from(ResolveError::NotFound("rdj".into()));
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn invalid_country_is_a_bad_request() {
        let error = ApiError::from(ResolveError::InvalidCountry("..".into()));
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
