mod dto;
pub mod handlers;
pub(crate) mod repo;
pub(crate) mod repo_types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
