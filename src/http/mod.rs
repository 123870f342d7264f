//! HTTP transport for the match protocol

pub mod extract;
pub mod middleware;
pub mod protocol;
pub mod routes;

pub use routes::{build_router, AppError};
