//! Admin dashboard.
//!
//! A small status page plus a JSON API over the statistics tracker. The
//! page itself is public (the root handler redirects browsers here); the
//! API requires the configured access key.

pub mod auth;
pub mod handlers;

use axum::{
    middleware,
    routing::get,
    Router,
};

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/api/admin/stats", get(get_stats))
        .route("/api/admin/requests", get(get_requests))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ));

    Router::new()
        .route("/admin", get(dashboard_page))
        .merge(api)
        .with_state(state)
}
