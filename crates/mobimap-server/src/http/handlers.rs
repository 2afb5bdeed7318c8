use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::{header::CONTENT_TYPE, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use mobimap_core::auth::token::SENTINEL_MARKER;
use mobimap_core::auth::AuthResult;
use mobimap_core::error::{MobimapError, Result};

use crate::app_state::AppState;
use crate::http::bearer_token;

pub const WELCOME_MESSAGE: &str = "hooray! welcome to our api!";
pub const SAVED_MESSAGE: &str =
    "Saved! You may need to reopen your browser in incognito mode next time you retrieve.";
pub const SAVE_FAILED_MESSAGE: &str = "Could not save";

#[derive(Debug, Serialize)]
pub struct MessageBody {
    pub message: &'static str,
}

/// GET /api
pub async fn api_root() -> Json<Value> {
    Json(json!({ "message": WELCOME_MESSAGE }))
}

/// GET /api/default
pub async fn default_config(State(app): State<AppState>) -> Json<Value> {
    Json(app.service().default_config().as_ref().clone())
}

/// GET /api/default/:email
pub async fn user_config(State(app): State<AppState>, Path(email): Path<String>) -> Json<Value> {
    Json(app.service().effective_config(&email).await.as_ref().clone())
}

/// POST /api/save/:email
pub async fn save_config(
    State(app): State<AppState>,
    Path(email): Path<String>,
    headers: HeaderMap,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Json<MessageBody> {
    // store failures are logged by the service
    let saved = match body {
        Ok(Json(doc)) => match authorize_save(&app, &headers, &email) {
            Ok(()) => app.service().save_config(&email, &doc).await.is_ok(),
            Err(e) => {
                tracing::warn!(email = %email, code = e.client_code().as_str(), error = %e, "save refused");
                false
            }
        },
        Err(rej) => {
            tracing::warn!(email = %email, error = %rej, "save body rejected");
            false
        }
    };

    Json(MessageBody {
        message: if saved { SAVED_MESSAGE } else { SAVE_FAILED_MESSAGE },
    })
}

/// Opt-in guard: the presented credential must validate to the path email.
fn authorize_save(app: &AppState, headers: &HeaderMap, email: &str) -> Result<()> {
    if !app.cfg().auth.require_token_for_save {
        return Ok(());
    }
    match check_credential(app, headers) {
        AuthResult::Allowed { email: who } if who == email => Ok(()),
        AuthResult::Allowed { email: who } => Err(MobimapError::Forbidden(format!(
            "credential belongs to {who}, not {email}"
        ))),
        AuthResult::Denied { errors } => Err(MobimapError::Forbidden(errors.join(", "))),
    }
}

fn check_credential(app: &AppState, headers: &HeaderMap) -> AuthResult {
    let credential = bearer_token(headers).unwrap_or(SENTINEL_MARKER);
    let result = app.validator().check_token_now(credential);
    let outcome = if result.is_allowed() { "allowed" } else { "denied" };
    app.metrics().auth_results.inc(&[("outcome", outcome)]);
    result
}

/// GET /api/auth
pub async fn whoami(State(app): State<AppState>, headers: HeaderMap) -> Json<AuthResult> {
    Json(check_credential(&app, &headers))
}

/// GET /metrics
pub async fn metrics(State(app): State<AppState>) -> Response {
    let mut res = app.metrics().render().into_response();
    res.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4"),
    );
    res
}
