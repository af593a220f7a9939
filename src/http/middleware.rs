//! Request limiting middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;
use crate::http::routes::AppError;

/// Reject requests beyond the configured store rate
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if state.limiter.check().is_err() {
        warn!(path = %request.uri().path(), "Store request rate limited");
        return Err(AppError::TooManyRequests);
    }

    Ok(next.run(request).await)
}
