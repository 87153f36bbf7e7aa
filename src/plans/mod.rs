mod dto;
pub mod handlers;
pub(crate) mod prompts;
mod schema;
pub(crate) mod services;
pub mod types;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::router()
}
