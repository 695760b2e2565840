pub mod dto;
pub mod enhancer;
pub mod handlers;
pub mod repo;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
