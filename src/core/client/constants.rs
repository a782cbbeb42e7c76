//! Centralized constants for default endpoints and UA.

/// Default desktop UA to avoid trivial bot blocking.
pub(crate) const USER_AGENT: &str = concat!(
    "Mozilla/5.0 (X11; Linux x86_64) ",
    "AppleWebKit/537.36 (KHTML, like Gecko) ",
    "Chrome/122.0.0.0 Safari/537.36"
);

/// Screener endpoint; query parameters are appended per window.
pub(crate) const DEFAULT_BASE_URL: &str = "http://openinsider.com/screener";

/// Overall request timeout when the builder is not given one.
pub(crate) const DEFAULT_TIMEOUT_SECS: u64 = 30;
