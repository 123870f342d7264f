//! Request middleware

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::warn;

use crate::app::AppState;

use super::routes::AppError;

/// Bucket for requests that do not address an existing match
const CREATE_BUCKET: &str = "create";

/// Rate-limit key for a match route: `/matches/{id}/...` maps to `{id}`
fn bucket(path: &str) -> String {
    path.trim_start_matches('/')
        .split('/')
        .nth(1)
        .filter(|id| !id.is_empty())
        .unwrap_or(CREATE_BUCKET)
        .to_string()
}

/// Reject requests beyond the per-second budget of the match they address
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let key = bucket(request.uri().path());
    if state.limiter.check_key(&key).is_err() {
        warn!(path = %request.uri().path(), bucket = %key, "Request rate limit exceeded");
        return Err(AppError::RateLimited);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn buckets_follow_the_match_id() {
        assert_eq!(bucket("/matches"), CREATE_BUCKET);
        assert_eq!(bucket("/matches/"), CREATE_BUCKET);
        assert_eq!(bucket("/matches/ab12cd34"), "ab12cd34");
        assert_eq!(bucket("/matches/ab12cd34/actions"), "ab12cd34");
    }
}
