use crate::state::AppState;
use axum::{routing::get, Router};

pub mod dto;
pub mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/api/essays/",
            get(handlers::list_essays).post(handlers::create_essay),
        )
        .route(
            "/api/essays/{id}",
            get(handlers::get_essay)
                .put(handlers::update_essay)
                .delete(handlers::delete_essay),
        )
}
