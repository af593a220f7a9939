//! HTTP service exposing the shared room store

pub mod middleware;
pub mod routes;

pub use routes::{build_router, AppError};
