//! Rate-limit extraction from response headers.

use chrono::{DateTime, TimeDelta, Utc};
use reqwest::StatusCode;
use reqwest::header::HeaderMap;

use metasync_domain::{RateLimitInfo, RateLimitStatus};

const LIMIT_HEADERS: &[&str] = &["x-ratelimit-limit", "ratelimit-limit"];
const REMAINING_HEADERS: &[&str] = &["x-ratelimit-remaining", "ratelimit-remaining"];
const RESET_HEADERS: &[&str] = &["x-ratelimit-reset", "ratelimit-reset", "retry-after"];

// Reset values above this are absolute epoch seconds, below it a delta.
const EPOCH_THRESHOLD: u64 = 1_000_000_000;

/// Reads rate-limit state from a response.
///
/// Returns `None` when the response carries no rate-limit headers and was
/// not throttled.
pub(crate) fn rate_limit_from_headers(
    status: StatusCode,
    headers: &HeaderMap,
    now: DateTime<Utc>,
) -> Option<RateLimitInfo> {
    let limit = first_number(headers, LIMIT_HEADERS);
    let remaining = first_number(headers, REMAINING_HEADERS);
    let reset_at = first_number(headers, RESET_HEADERS).and_then(|reset| reset_time(reset, now));
    let throttled = status == StatusCode::TOO_MANY_REQUESTS;

    if limit.is_none() && remaining.is_none() && reset_at.is_none() && !throttled {
        return None;
    }

    Some(RateLimitInfo {
        limit,
        remaining,
        reset_at,
        status: if throttled {
            RateLimitStatus::Overlimit
        } else {
            RateLimitStatus::Ok
        },
    })
}

fn first_number(headers: &HeaderMap, names: &[&str]) -> Option<u64> {
    names.iter().find_map(|name| {
        headers
            .get(*name)?
            .to_str()
            .ok()?
            .trim()
            .parse::<u64>()
            .ok()
    })
}

fn reset_time(reset: u64, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let seconds = i64::try_from(reset).ok()?;
    if reset > EPOCH_THRESHOLD {
        DateTime::from_timestamp(seconds, 0)
    } else {
        now.checked_add_signed(TimeDelta::try_seconds(seconds)?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, TimeDelta, Utc};
    use reqwest::StatusCode;
    use reqwest::header::{HeaderMap, HeaderValue};

    use metasync_domain::RateLimitStatus;

    use super::rate_limit_from_headers;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in pairs {
            headers.insert(*name, HeaderValue::from_static(value));
        }
        headers
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()
    }

    #[test]
    fn plain_response_has_no_rate_limit() {
        assert!(rate_limit_from_headers(StatusCode::OK, &HeaderMap::new(), now()).is_none());
    }

    #[test]
    fn prefixed_headers_with_delta_reset() {
        let info = rate_limit_from_headers(
            StatusCode::OK,
            &headers(&[
                ("x-ratelimit-limit", "100"),
                ("x-ratelimit-remaining", "42"),
                ("x-ratelimit-reset", "30"),
            ]),
            now(),
        );

        let Some(info) = info else {
            panic!("rate limit expected");
        };
        assert_eq!(info.limit, Some(100));
        assert_eq!(info.remaining, Some(42));
        assert_eq!(info.reset_at, Some(now() + TimeDelta::seconds(30)));
        assert_eq!(info.status, RateLimitStatus::Ok);
    }

    #[test]
    fn throttled_response_uses_retry_after_and_epoch_resets() {
        let info = rate_limit_from_headers(
            StatusCode::TOO_MANY_REQUESTS,
            &headers(&[("ratelimit-remaining", "0"), ("retry-after", "1700000100")]),
            now(),
        );

        let Some(info) = info else {
            panic!("rate limit expected");
        };
        assert_eq!(info.status, RateLimitStatus::Overlimit);
        assert_eq!(info.remaining, Some(0));
        assert_eq!(info.reset_at, DateTime::from_timestamp(1_700_000_100, 0));
    }

    #[test]
    fn throttled_response_without_headers_is_still_reported() {
        let info = rate_limit_from_headers(StatusCode::TOO_MANY_REQUESTS, &HeaderMap::new(), now());
        assert!(matches!(info, Some(info) if info.status == RateLimitStatus::Overlimit));
    }
}
