use chrono::{DateTime, Utc};

use crate::desired::RefreshDirective;

/// Decides whether a metadata refresh is needed, honoring the cache time of the directive.
pub fn should_refresh(
    last_refresh_at: Option<DateTime<Utc>>,
    directive: &RefreshDirective,
    now: DateTime<Utc>,
) -> bool {
    if !directive.update {
        return false;
    }
    let (Some(cache_time), Some(last_refresh_at)) = (directive.cache_time_seconds, last_refresh_at)
    else {
        return true;
    };
    if cache_time <= 0 {
        return true;
    }
    (now - last_refresh_at).num_seconds() >= cache_time
}
