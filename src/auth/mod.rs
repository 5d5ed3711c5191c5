use crate::state::AppState;
use axum::{routing::get, Router};

pub mod dto;
pub mod handlers;
pub mod password;
pub mod session;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            handlers::LOGIN_PATH,
            get(handlers::login_page).post(handlers::login),
        )
        .route(handlers::MAIN_PATH, get(handlers::main_page))
        .route("/signup/", get(handlers::signup_page).post(handlers::signup))
        .route("/logout/", get(handlers::logout).post(handlers::logout))
        .route("/api/profile/", get(handlers::profile))
        .route("/api/login-activity/", get(handlers::login_activity))
}
