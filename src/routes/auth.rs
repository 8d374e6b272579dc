// SPDX-License-Identifier: MIT

//! Fitbit OAuth (PKCE) authentication routes.

use axum::{
    extract::{Query, State},
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::{create_jwt, Claims, SESSION_COOKIE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/oauth/fitbit/start", get(auth_start))
        .route("/oauth/fitbit/callback", get(auth_callback))
        .route("/oauth/fitbit/status", get(auth_status))
        .route("/oauth/fitbit/logout", get(logout))
}

/// Start the PKCE flow - redirect to Fitbit authorization.
async fn auth_start(State(state): State<Arc<AppState>>) -> Result<Redirect> {
    let (oauth_state, challenge) = state.tokens.begin_authorization()?;

    let scope = state.config.fitbit_scope.replace(' ', "+");
    let auth_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}&scope={}&state={}&code_challenge={}&code_challenge_method=S256",
        state.config.authorize_uri,
        state.config.fitbit_client_id,
        urlencoding::encode(&state.config.fitbit_redirect_uri),
        scope,
        oauth_state,
        challenge,
    );

    tracing::info!(state = %oauth_state, "Starting Fitbit OAuth flow");
    Ok(Redirect::temporary(&auth_url))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - verify state, exchange code for tokens, create session.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Fitbit");
        let redirect = format!("{}?error={}", state.config.frontend_url, error);
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let (code, oauth_state) = match (params.code, params.state) {
        (Some(code), Some(s)) => (code, s),
        _ => {
            return Err(AppError::BadRequest(
                "missing code or state parameter".to_string(),
            ))
        }
    };

    let record = state
        .tokens
        .complete_authorization(&code, &oauth_state, &state.config.fitbit_redirect_uri)
        .await?;

    let jwt = create_jwt(&record.fitbit_user_id, &state.config.jwt_signing_key)?;

    let cookie = Cookie::build((SESSION_COOKIE, jwt))
        .path("/")
        .http_only(true)
        .build();

    Ok((
        jar.add(cookie),
        Redirect::temporary(&state.config.frontend_url),
    ))
}

#[derive(Serialize)]
pub struct AuthStatusResponse {
    pub authenticated: bool,
    pub connected: bool,
}

/// Session/connection status for the frontend.
async fn auth_status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Json<AuthStatusResponse> {
    let subject = session_subject(&state, &jar);
    let connected = subject
        .as_deref()
        .map(|s| state.tokens.is_connected(s))
        .unwrap_or(false);

    Json(AuthStatusResponse {
        authenticated: subject.is_some(),
        connected,
    })
}

/// Logout - remove the token record and clear the session cookie.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    if let Some(subject) = session_subject(&state, &jar) {
        state.tokens.disconnect(&subject);
    }

    let jar = jar.remove(Cookie::build((SESSION_COOKIE, "")).path("/").build());
    (jar, Redirect::temporary("/"))
}

/// Decode the session cookie's subject, if any.
fn session_subject(state: &AppState, jar: &CookieJar) -> Option<String> {
    let token = jar.get(SESSION_COOKIE)?.value().to_string();
    let key = DecodingKey::from_secret(&state.config.jwt_signing_key);
    decode::<Claims>(&token, &key, &Validation::new(Algorithm::HS256))
        .ok()
        .map(|data| data.claims.sub)
}
