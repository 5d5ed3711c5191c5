use crate::state::AppState;
use axum::{routing::post, Router};

mod client;
pub mod dto;
pub mod handlers;

pub use client::{EvaluateError, Evaluator};

pub fn router() -> Router<AppState> {
    Router::new().route(
        "/api/evaluate/",
        post(handlers::evaluate_essay).fallback(handlers::post_only),
    )
}
