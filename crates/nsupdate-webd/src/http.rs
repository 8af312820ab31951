//! HTTP surface
//!
//! A single GET endpoint on every path. This layer only translates between
//! axum and [`IncomingRequest`]; all decisions are made by the
//! [`UpdateHandler`].

use axum::Router;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderMap, HeaderValue, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use nsupdate_web_core::{Error, IncomingRequest, UpdateHandler};
use std::net::SocketAddr;
use std::sync::Arc;

/// Header set by a fronting reverse proxy
const X_REAL_IP: &str = "x-real-ip";

/// Build the application router
pub fn router(handler: Arc<UpdateHandler>) -> Router {
    Router::new()
        .route("/", get(update))
        .route("/{*path}", get(update))
        .with_state(handler)
}

async fn update(State(handler): State<Arc<UpdateHandler>>, request: Request) -> Response {
    let incoming = incoming_request(&request);

    match handler.handle(&incoming).await {
        Ok(outcome) => (StatusCode::OK, outcome.body().to_string()).into_response(),
        Err(e) => error_response(&e, handler.domain()),
    }
}

/// Extract what the pipeline needs from an axum request
fn incoming_request(request: &Request) -> IncomingRequest {
    let headers = request.headers();

    // Blank values count as absent, so `ip=` falls back to X-Real-IP
    let params = request
        .uri()
        .query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .filter(|(_, value)| !value.is_empty())
                .collect()
        })
        .unwrap_or_default();

    IncomingRequest {
        authorization: header_string(headers, header::AUTHORIZATION.as_str()),
        real_ip: header_string(headers, X_REAL_IP),
        params,
        peer: request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.to_string()),
    }
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Turn a pipeline error into a response, adding the Basic challenge for 401s
fn error_response(error: &Error, realm: &str) -> Response {
    let status =
        StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let mut response = (status, error.body()).into_response();

    if error.is_auth_challenge() {
        if let Ok(challenge) = HeaderValue::from_str(&format!("Basic realm=\"{}\"", realm)) {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, challenge);
        }
    }
    response
}
