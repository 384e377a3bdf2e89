//! Route guard for the conversion endpoints
//!
//! Consults the session provider's synchronous current-user snapshot before
//! a protected route runs. Browsers navigating to a page are redirected to
//! the login route; API callers get a 401. With no auth backend configured
//! the app is single-user and the guard waves everything through.

use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use std::sync::Arc;

pub async fn require_session(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    if !state.session.enabled() || state.session.current_user().is_some() {
        return next.run(request).await;
    }

    if wants_html(&request) {
        return Redirect::to("/login").into_response();
    }

    (
        StatusCode::UNAUTHORIZED,
        Json(serde_json::json!({ "error": "authentication required" })),
    )
        .into_response()
}

fn wants_html(request: &Request) -> bool {
    request
        .headers()
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|accept| accept.contains("text/html"))
}
