/// Metadata refresh and full upgrade directives for a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshDirective {
    /// Whether a metadata refresh is requested at all.
    pub update: bool,
    /// Skip the refresh when the last one happened less than this many seconds ago.
    /// Only meaningful together with `update`; zero or negative values always refresh.
    pub cache_time_seconds: Option<i64>,
    /// Whether every installed package should be upgraded.
    pub upgrade: bool,
}

impl RefreshDirective {
    pub fn new(update: bool, cache_time_seconds: Option<i64>, upgrade: bool) -> Self {
        Self {
            update,
            cache_time_seconds: cache_time_seconds.filter(|_| update),
            upgrade,
        }
    }

    /// Combines the directives of two `packages(...)` calls.
    ///
    /// The merged directive refreshes if either side asks for it, keeping the most demanding
    /// cache time: an update without cache time wins over any cache time.
    pub fn merge(self, other: RefreshDirective) -> Self {
        let cache_time_seconds = match (self.update, other.update) {
            (true, true) => match (self.cache_time_seconds, other.cache_time_seconds) {
                (Some(a), Some(b)) => Some(a.min(b)),
                _ => None,
            },
            (true, false) => self.cache_time_seconds,
            (false, true) => other.cache_time_seconds,
            (false, false) => None,
        };
        Self {
            update: self.update || other.update,
            cache_time_seconds,
            upgrade: self.upgrade || other.upgrade,
        }
    }
}
