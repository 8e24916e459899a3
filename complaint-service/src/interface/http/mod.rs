//! 投诉 REST 接口（axum）

pub mod client_ip;
pub mod error;
pub mod handler;
pub mod router;
pub mod state;
pub mod validation;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
