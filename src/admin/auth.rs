use axum::{
    body::Body,
    extract::State,
    http::{header::AUTHORIZATION, Request, StatusCode},
    middleware::Next,
    response::Response,
};

use crate::http::server::AppState;

/// Header accepted as an alternative to `Authorization: Bearer <key>`.
pub const DASHBOARD_KEY_HEADER: &str = "x-dashboard-key";

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let expected = &state.config.dashboard.access_key;

    let bearer = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());
    if let Some(auth_val) = bearer {
        if auth_val == format!("Bearer {}", expected) {
            return Ok(next.run(request).await);
        }
    }

    let key = request
        .headers()
        .get(DASHBOARD_KEY_HEADER)
        .and_then(|h| h.to_str().ok());
    if key == Some(expected.as_str()) {
        return Ok(next.run(request).await);
    }

    Err(StatusCode::UNAUTHORIZED)
}
