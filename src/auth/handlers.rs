use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{FieldErrors, LoginForm, Page, PublicAccount, SignupForm},
        password::{hash_password, verify_dummy, verify_password},
        session::{end_session, start_session, SessionUser},
    },
    error::ApiError,
    state::AppState,
    store::{ClientInfo, LoginActivity, NewAccount, Profile, UsernameTaken},
};

const LOGIN_TEMPLATE: &str = "login.html";
const SIGNUP_TEMPLATE: &str = "signup.html";
const MAIN_TEMPLATE: &str = "main.html";

pub const LOGIN_PATH: &str = "/";
pub const MAIN_PATH: &str = "/main/";

pub async fn login_page() -> Json<Page> {
    Json(Page::new(LOGIN_TEMPLATE))
}

#[instrument(skip(state, session, client, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    client: ClientInfo,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let form = form.normalized();

    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(login_rerender(errors, &form.username));
    }

    let Some(account) = state.store.find_account_by_username(&form.username).await? else {
        verify_dummy(&form.password).await;
        warn!(username = %form.username, "login unknown username");
        return Ok(invalid_credentials(&form.username));
    };

    let ok = verify_password(&form.password, &account.password_hash).await?;
    record_attempt(&state, account.id, &client, ok).await;

    if !ok {
        warn!(user_id = %account.id, "login invalid password");
        return Ok(invalid_credentials(&form.username));
    }

    if let Err(e) = state.store.record_login(account.id, &client).await {
        warn!(error = %e, user_id = %account.id, "profile login stamp failed");
    }

    start_session(&session, account.id).await?;
    info!(user_id = %account.id, username = %account.username, "user logged in");
    Ok(Redirect::to(MAIN_PATH).into_response())
}

/// Appends to the login audit trail. Failures are logged and swallowed so
/// the audit never changes the outcome of a login.
async fn record_attempt(state: &AppState, user_id: Uuid, client: &ClientInfo, success: bool) {
    if let Err(e) = state
        .store
        .append_login_activity(user_id, client, success)
        .await
    {
        warn!(error = %e, %user_id, success, "login activity write failed");
    }
}

fn invalid_credentials(username: &str) -> Response {
    let mut errors = FieldErrors::default();
    errors.add("general", "Invalid credentials. Please try again.");
    login_rerender(errors, username)
}

fn login_rerender(errors: FieldErrors, username: &str) -> Response {
    Json(
        Page::new(LOGIN_TEMPLATE)
            .with_errors(errors)
            .with_value("username", username),
    )
    .into_response()
}

pub async fn signup_page() -> Json<Page> {
    Json(Page::new(SIGNUP_TEMPLATE))
}

#[instrument(skip(state, session, form))]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<SignupForm>,
) -> Result<Response, ApiError> {
    let form = form.normalized();

    let taken = if form.username.is_empty() {
        false
    } else {
        state.store.username_exists(&form.username).await?
    };

    let errors = form.validate(taken);
    if !errors.is_empty() {
        warn!(fields = errors.len(), "signup rejected");
        return Ok(signup_rerender(errors, &form));
    }

    let password_hash = hash_password(&form.password).await?;
    let created = state
        .store
        .create_account(NewAccount {
            username: form.username.clone(),
            password_hash,
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
        })
        .await;
    let account = match created {
        Ok(account) => account,
        // lost a race with a concurrent signup for the same name
        Err(e) if e.is::<UsernameTaken>() => {
            warn!(username = %form.username, "signup username taken on insert");
            return Ok(signup_rerender(form.validate(true), &form));
        }
        Err(e) => return Err(e.into()),
    };

    start_session(&session, account.id).await?;
    info!(user_id = %account.id, username = %account.username, "user registered");
    Ok(Redirect::to(MAIN_PATH).into_response())
}

fn signup_rerender(errors: FieldErrors, form: &SignupForm) -> Response {
    Json(
        Page::new(SIGNUP_TEMPLATE)
            .with_errors(errors)
            .with_value("first_name", &form.first_name)
            .with_value("last_name", &form.last_name)
            .with_value("username", &form.username),
    )
    .into_response()
}

#[instrument(skip(session, user))]
pub async fn logout(session: Session, user: Option<SessionUser>) -> Result<Response, ApiError> {
    if let Some(SessionUser(user_id)) = user {
        info!(%user_id, "user logged out");
    }
    end_session(&session).await?;
    Ok(Redirect::to(LOGIN_PATH).into_response())
}

#[instrument(skip(state, session, user))]
pub async fn main_page(
    State(state): State<AppState>,
    session: Session,
    user: Option<SessionUser>,
) -> Result<Response, ApiError> {
    let Some(SessionUser(user_id)) = user else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    match state.store.find_account(user_id).await? {
        Some(account) => {
            Ok(Json(Page::new(MAIN_TEMPLATE).with_user(account.into())).into_response())
        }
        None => {
            // session outlived its account
            warn!(%user_id, "session for missing account");
            end_session(&session).await?;
            Ok(Redirect::to(LOGIN_PATH).into_response())
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub account: PublicAccount,
    pub profile: Profile,
}

#[instrument(skip(state))]
pub async fn profile(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let account = state
        .store
        .find_account(user_id)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User not found".into()))?;
    let profile = state
        .store
        .get_profile(user_id)
        .await?
        .unwrap_or_else(|| Profile::empty(user_id));

    Ok(Json(ProfileResponse {
        account: account.into(),
        profile,
    }))
}

#[derive(Debug, Deserialize)]
pub struct ActivityQuery {
    #[serde(default = "default_activity_limit")]
    pub limit: i64,
}
fn default_activity_limit() -> i64 {
    20
}

#[instrument(skip(state))]
pub async fn login_activity(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
    Query(q): Query<ActivityQuery>,
) -> Result<Json<Vec<LoginActivity>>, ApiError> {
    let rows = state
        .store
        .list_login_activity(user_id, q.limit.clamp(1, 100))
        .await?;
    Ok(Json(rows))
}
