//! Primary/fallback call shape.

use std::future::Future;

use souk_core::ApiResult;
use tracing::{debug, warn};

use crate::error::SessionError;

/// Runs `primary`, then `fallback` only if the primary's full effect did not
/// happen.
///
/// The effect is the network call succeeding AND `parse_and_store` accepting
/// its body. A 2xx whose body fails to parse counts as a primary failure.
/// `fallback` is invoked at most once and never after a successful primary;
/// its outcome is final.
pub async fn refresh_with_fallback<T, P, PFut, F, FFut, S>(
    primary: P,
    fallback: F,
    mut parse_and_store: S,
) -> Result<T, SessionError>
where
    P: FnOnce() -> PFut,
    PFut: Future<Output = ApiResult<String>>,
    F: FnOnce() -> FFut,
    FFut: Future<Output = ApiResult<String>>,
    S: FnMut(&str) -> Result<T, SessionError>,
{
    match primary().await {
        Ok(body) => match parse_and_store(&body) {
            Ok(value) => return Ok(value),
            Err(err) => warn!(error = %err, "Primary response rejected, trying fallback"),
        },
        Err(err) => warn!(error = %err, kind = err.kind(), "Primary call failed, trying fallback"),
    }

    let body = fallback().await?;
    let value = parse_and_store(&body)?;
    debug!("Fallback succeeded");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use souk_core::ApiError;
    use std::cell::Cell;

    fn parse(body: &str) -> Result<u32, SessionError> {
        body.parse()
            .map_err(|_| SessionError::InvalidResponse(body.to_string()))
    }

    #[tokio::test]
    async fn test_primary_success_skips_fallback() {
        let fallback_calls = Cell::new(0);
        let result = refresh_with_fallback(
            || async { Ok("1".to_string()) },
            || {
                fallback_calls.set(fallback_calls.get() + 1);
                async { Ok("2".to_string()) }
            },
            parse,
        )
        .await;

        assert_eq!(result.unwrap(), 1);
        assert_eq!(fallback_calls.get(), 0);
    }

    #[tokio::test]
    async fn test_unparseable_primary_uses_fallback_once() {
        let fallback_calls = Cell::new(0);
        let result = refresh_with_fallback(
            || async { Ok("not a number".to_string()) },
            || {
                fallback_calls.set(fallback_calls.get() + 1);
                async { Ok("2".to_string()) }
            },
            parse,
        )
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(fallback_calls.get(), 1);
    }

    #[tokio::test]
    async fn test_failed_primary_uses_fallback() {
        let result = refresh_with_fallback(
            || async { Err(ApiError::ServiceUnavailable) },
            || async { Ok("3".to_string()) },
            parse,
        )
        .await;

        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_fallback_outcome_is_final() {
        let result = refresh_with_fallback(
            || async { Err(ApiError::Timeout) },
            || async { Err(ApiError::Unauthorized) },
            parse,
        )
        .await;
        assert!(matches!(result, Err(SessionError::Api(ApiError::Unauthorized))));

        let result = refresh_with_fallback(
            || async { Ok("x".to_string()) },
            || async { Ok("y".to_string()) },
            parse,
        )
        .await;
        assert!(matches!(result, Err(SessionError::InvalidResponse(body)) if body == "y"));
    }
}
