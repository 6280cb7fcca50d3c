//! HTTP surface for a host application.
//!
//! Exposes projected readings, coordinator status, and the explicit
//! refresh trigger.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
