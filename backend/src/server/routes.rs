//! REST API routes

use crate::catalog::{self, ConversionOption, CONVERSION_OPTIONS};
use crate::server::guard;
use crate::session::{AuthError, Session, SignUpOutcome};
use crate::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

/// Create API routes
pub fn api_routes(state: Arc<AppState>) -> Router<Arc<AppState>> {
    // Conversions require a signed-in user; the catalog and the account
    // endpoints themselves do not
    let protected = Router::new()
        .route("/convert", post(start_conversion))
        .route("/attempt", get(current_attempt))
        .route("/attempt", delete(dismiss_attempt))
        .route_layer(middleware::from_fn_with_state(state, guard::require_session));

    Router::new()
        .merge(protected)
        // Catalog
        .route("/conversions", get(list_conversions))
        // Accounts
        .route("/auth/signup", post(sign_up))
        .route("/auth/signin", post(sign_in))
        .route("/auth/signout", post(sign_out))
        .route("/auth/recover", post(recover))
        .route("/auth/user", get(current_user))
        // Settings
        .route("/settings", get(get_settings))
}

// ============ Conversion Endpoints ============

/// List the conversion catalog
async fn list_conversions() -> Json<Vec<ConversionOption>> {
    Json(CONVERSION_OPTIONS.clone())
}

/// Response after starting a conversion attempt
#[derive(Debug, Serialize)]
pub struct StartConversionResponse {
    pub id: Uuid,
}

/// Start a conversion attempt from a multipart upload
///
/// Expects an `option` field naming a catalog entry and a `file` field with
/// the upload. Only one attempt is tracked; a new one replaces it.
async fn start_conversion(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<StartConversionResponse>, AppError> {
    let mut option_id: Option<String> = None;
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("unknown").to_string();

        match name.as_str() {
            "option" => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid option field: {e}")))?;
                option_id = Some(value);
            }
            "file" => {
                let file_name = field
                    .file_name()
                    .unwrap_or("upload")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {e}")))?;
                file = Some((file_name, bytes.to_vec()));
            }
            other => {
                return Err(AppError::BadRequest(format!("Unknown field: {other}")));
            }
        }
    }

    let option_id = option_id.ok_or_else(|| AppError::BadRequest("Missing option field".into()))?;
    let option = catalog::find_option(&option_id)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown conversion: {option_id}")))?;
    let (file_name, bytes) =
        file.ok_or_else(|| AppError::BadRequest("Missing file field".into()))?;

    let id = state.flow.start(file_name, bytes, option);

    Ok(Json(StartConversionResponse { id }))
}

/// Snapshot of the current conversion attempt
async fn current_attempt(State(state): State<Arc<AppState>>) -> Response {
    match state.flow.current() {
        Some(view) => Json(view).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

/// Dismiss the current conversion attempt
async fn dismiss_attempt(State(state): State<Arc<AppState>>) -> StatusCode {
    state.flow.dismiss();
    StatusCode::NO_CONTENT
}

// ============ Account Endpoints ============

/// Email/password credentials
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<SignUpOutcome>, AppError> {
    let outcome = state
        .session
        .sign_up(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(outcome))
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(credentials): Json<Credentials>,
) -> Result<Json<Session>, AppError> {
    let session = state
        .session
        .sign_in(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(session))
}

async fn sign_out(State(state): State<Arc<AppState>>) -> Result<StatusCode, AppError> {
    state.session.sign_out().await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Password recovery request
#[derive(Debug, Deserialize)]
pub struct RecoverRequest {
    pub email: String,
}

async fn recover(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RecoverRequest>,
) -> Result<StatusCode, AppError> {
    state.session.recover(&req.email).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// The signed-in user, if any
async fn current_user(State(state): State<Arc<AppState>>) -> Response {
    match state.session.current_user() {
        Some(user) => Json(user).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}

// ============ Settings Endpoints ============

/// Settings response (excluding sensitive data)
#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    pub server_port: u16,
    pub convert_api_configured: bool,
    pub auth_enabled: bool,
}

/// Get current settings
async fn get_settings(State(state): State<Arc<AppState>>) -> Json<SettingsResponse> {
    let settings = state.settings.read();
    Json(SettingsResponse {
        server_port: settings.server.port,
        convert_api_configured: !settings.convert_api.token.is_empty(),
        auth_enabled: state.session.enabled(),
    })
}

// ============ Error Handling ============

/// Application error type
#[derive(Debug)]
pub enum AppError {
    Internal(String),
    BadRequest(String),
    NotFound(String),
    Unauthorized(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
        };

        let body = Json(serde_json::json!({ "error": message }));
        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Disabled => AppError::BadRequest(err.to_string()),
            AuthError::Api { status, ref message } if (400..500).contains(&status) => {
                match status {
                    401 | 403 => AppError::Unauthorized(message.clone()),
                    _ => AppError::BadRequest(message.clone()),
                }
            }
            AuthError::Api { message, .. } => AppError::Internal(message),
            AuthError::Transport(e) => AppError::Internal(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_map_to_the_right_status_family() {
        let err: AppError = AuthError::Api {
            status: 401,
            message: "Invalid login credentials".into(),
        }
        .into();
        assert!(matches!(err, AppError::Unauthorized(_)));

        let err: AppError = AuthError::Api {
            status: 422,
            message: "Password too short".into(),
        }
        .into();
        assert!(matches!(err, AppError::BadRequest(_)));

        let err: AppError = AuthError::Api {
            status: 502,
            message: "upstream down".into(),
        }
        .into();
        assert!(matches!(err, AppError::Internal(_)));

        let err: AppError = AuthError::Disabled.into();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
