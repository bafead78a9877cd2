use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod job;
pub mod pipeline;
pub mod service;
pub mod validator;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/animate", post(handler::animate))
        .route("/animate/{id}", get(handler::get_job))
        .route("/animate/{id}/{filename}", get(handler::get_artifact))
}
