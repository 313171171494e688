use chrono::{DateTime, Utc};
use http::StatusCode;

#[derive(thiserror::Error, Debug)]
pub enum GitHubError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {status} from {url}")]
    UnexpectedStatus { url: String, status: StatusCode },

    #[error("rate limit exceeded, resets at {reset_at}")]
    RateLimitExceeded { reset_at: DateTime<Utc> },

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

impl GitHubError {
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, GitHubError::RateLimitExceeded { .. })
    }
}
