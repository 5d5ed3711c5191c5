use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts},
    http::request::Parts,
};
use time::Duration;
use tower_sessions::{cookie::SameSite, session, Expiry, Session, SessionManagerLayer, SessionStore};
use tracing::error;
use uuid::Uuid;

use crate::{config::SessionConfig, error::ApiError};

pub const SESSION_COOKIE: &str = "session";
const USER_ID_KEY: &str = "user_id";

/// Cookie-backed session middleware over a server-side record store.
pub fn session_layer<S>(store: S, cfg: &SessionConfig) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_secure(cfg.cookie_secure)
        .with_expiry(Expiry::OnInactivity(Duration::minutes(cfg.ttl_minutes)))
}

/// Binds the session to `user_id`. The id is rotated first so a session id
/// planted before login is never promoted.
pub async fn start_session(session: &Session, user_id: Uuid) -> Result<(), ApiError> {
    session.cycle_id().await.map_err(session_error)?;
    session
        .insert(USER_ID_KEY, user_id)
        .await
        .map_err(session_error)
}

/// Deletes the server-side record; the layer then expires the cookie.
pub async fn end_session(session: &Session) -> Result<(), ApiError> {
    session.flush().await.map_err(session_error)
}

fn session_error(e: session::Error) -> ApiError {
    error!(error = %e, "session store failure");
    ApiError::Internal(format!("session error: {e}"))
}

/// Account id bound to the request's session.
///
/// Page handlers take `Option<SessionUser>` and redirect; JSON handlers take
/// it directly and answer 401.
#[derive(Debug, Clone, Copy)]
pub struct SessionUser(pub Uuid);

impl<S> OptionalFromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        let session = Session::from_request_parts(parts, state)
            .await
            .map_err(|(_, msg)| ApiError::Internal(msg.into()))?;
        let user_id = session
            .get::<Uuid>(USER_ID_KEY)
            .await
            .map_err(session_error)?;
        Ok(user_id.map(SessionUser))
    }
}

impl<S> FromRequestParts<S> for SessionUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        <Self as OptionalFromRequestParts<S>>::from_request_parts(parts, state)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".into()))
    }
}
