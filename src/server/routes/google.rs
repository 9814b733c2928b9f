use crate::error::{FormsyncError, OauthError};
use crate::forms::schema_from_json;
use crate::server::router::FormsyncState;
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{Cookie, PrivateCookieJar, SameSite};
use serde::Deserialize;
use serde_json::json;
use subtle::ConstantTimeEq;
use time::Duration;
use tracing::{error, info};

const CSRF_COOKIE: &str = "google_oauth_csrf_token";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

/// GET /api/v1/google/auth/url
///
/// Returns the consent URL and stores its CSRF state in an encrypted cookie.
pub async fn auth_url(
    State(state): State<FormsyncState>,
    jar: PrivateCookieJar,
) -> Result<impl IntoResponse, FormsyncError> {
    let redirect = &state.services.google_cfg.redirect_url;
    let (url, csrf_token) = state.services.get_authorization_url(redirect).await?;

    let jar = jar.add(build_cookie(
        CSRF_COOKIE,
        csrf_token.secret().clone(),
        !state.insecure_cookie,
    ));

    info!("Dispatching Google consent URL for redirect {}", redirect);
    Ok((jar, Json(json!({ "url": url.as_str() }))))
}

/// GET /api/v1/google/auth/callback
pub async fn auth_callback(
    State(state): State<FormsyncState>,
    Query(params): Query<CallbackParams>,
    jar: PrivateCookieJar,
) -> Response {
    let expected_state = jar.get(CSRF_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(Cookie::from(CSRF_COOKIE));

    match process_callback(&state, params, expected_state).await {
        Ok(()) => {
            info!("Google OAuth callback accepted");
            (
                jar,
                Json(json!({ "message": "Authentication successful" })),
            )
                .into_response()
        }
        Err(err) => {
            error!("Google OAuth failure: {}", err);
            (jar, err).into_response()
        }
    }
}

async fn process_callback(
    state: &FormsyncState,
    params: CallbackParams,
    expected_state: Option<String>,
) -> Result<(), FormsyncError> {
    if let Some(denied) = params.error {
        return Err(flow_error("ACCESS_DENIED", format!("consent was not granted: {denied}")));
    }

    let code = params
        .code
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| flow_error("MISSING_CODE", "missing `code` query parameter".to_string()))?;
    let returned_state = params.state.as_deref().map(str::trim).unwrap_or_default();

    let expected_state = expected_state.ok_or_else(|| {
        flow_error(
            "OAUTH_SESSION_MISSING",
            "Missing OAuth session cookie".to_string(),
        )
    })?;

    if !bool::from(returned_state.as_bytes().ct_eq(expected_state.as_bytes())) {
        return Err(flow_error("CSRF_MISMATCH", "CSRF token mismatch".to_string()));
    }

    let redirect = &state.services.google_cfg.redirect_url;
    state.services.complete_authorization(code, redirect).await
}

fn flow_error(code: &str, message: String) -> FormsyncError {
    FormsyncError::AuthExchange(OauthError::Flow {
        code: code.to_string(),
        message,
    })
}

/// GET /api/v1/google/status
pub async fn status(State(state): State<FormsyncState>) -> impl IntoResponse {
    let authenticated = state.services.is_authenticated().await;
    Json(json!({ "authenticated": authenticated }))
}

/// POST /api/v1/google/forms
///
/// The body is decoded by hand so that a malformed schema surfaces as a validation error
/// rather than an extractor rejection.
pub async fn create_form(
    State(state): State<FormsyncState>,
    body: Bytes,
) -> Result<impl IntoResponse, FormsyncError> {
    let schema = schema_from_json(&body)?;
    let result = state.services.create_provider_form(&schema).await?;
    Ok(Json(result))
}

fn build_cookie(name: &'static str, value: String, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::minutes(15))
        .build()
}
