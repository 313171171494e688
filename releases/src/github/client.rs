use crate::config::GitHubConfig;
use crate::github::error::GitHubError;
use crate::github::link;
use crate::github::page::{Continuation, Page, PageFetcher};
use crate::github::types::{Milestone, Repository};
use crate::metrics_defs::GITHUB_REQUESTS;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use http::StatusCode;
use http::header::{ACCEPT, ETAG, HeaderMap, HeaderValue, IF_NONE_MATCH, LINK};
use serde::de::DeserializeOwned;
use shared::counter;
use std::sync::Arc;
use std::time::Duration;

/// Items requested per page. A page holding fewer items than this is the last one.
pub const PAGE_SIZE: usize = 100;

struct ClientInner {
    http: reqwest::Client,
    api_url: String,
    credentials: Option<(String, String)>,
}

/// GitHub REST client that pages through list endpoints using conditional requests.
#[derive(Clone)]
pub struct GitHubClient {
    inner: Arc<ClientInner>,
}

impl GitHubClient {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/vnd.github+json"),
        );

        let http = reqwest::Client::builder()
            .user_agent(concat!("release-calendar/", env!("CARGO_PKG_VERSION")))
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        let credentials = match (&config.username, &config.password) {
            (Some(username), Some(password)) => Some((username.clone(), password.clone())),
            _ => None,
        };

        Ok(GitHubClient {
            inner: Arc::new(ClientInner {
                http,
                api_url: config.api_url().to_string(),
                credentials,
            }),
        })
    }

    /// First page of the organization's repositories. When an earlier chain is
    /// supplied the request is made against its URL so that its ETag applies.
    pub async fn get_repositories(
        &self,
        organization: &str,
        earlier: Option<Arc<Page<Repository>>>,
    ) -> Result<Option<Arc<Page<Repository>>>, GitHubError> {
        let url = match &earlier {
            Some(earlier) => earlier.url().to_string(),
            None => format!(
                "{}/orgs/{organization}/repos?per_page={PAGE_SIZE}",
                self.inner.api_url
            ),
        };
        self.fetch_page(Some(&url), earlier).await
    }

    /// First page of every milestone of the repository, open and closed.
    pub async fn get_milestones(
        &self,
        repository: &Repository,
        earlier: Option<Arc<Page<Milestone>>>,
    ) -> Result<Option<Arc<Page<Milestone>>>, GitHubError> {
        let url = format!(
            "{}?state=all&per_page={PAGE_SIZE}",
            repository.milestones_url
        );
        self.fetch_page(Some(&url), earlier).await
    }

    async fn fetch_page<T>(
        &self,
        url: Option<&str>,
        earlier: Option<Arc<Page<T>>>,
    ) -> Result<Option<Arc<Page<T>>>, GitHubError>
    where
        T: DeserializeOwned + Send + Sync + 'static,
    {
        let Some(url) = url.filter(|url| !url.is_empty()) else {
            return Ok(None);
        };

        let mut request = self.inner.http.get(url);
        if let Some((username, password)) = &self.inner.credentials {
            request = request.basic_auth(username, Some(password));
        }
        if let Some(earlier) = &earlier
            && let Some(etag) = conditional_etag(earlier).await?
        {
            request = request.header(IF_NONE_MATCH, etag);
        }

        let response = request.send().await.inspect_err(|_| {
            counter!(GITHUB_REQUESTS, "outcome" => "error").increment(1);
        })?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED
            && let Some(earlier) = earlier
        {
            counter!(GITHUB_REQUESTS, "outcome" => "not_modified").increment(1);
            tracing::debug!(url, "page not modified");
            let content = earlier.content().clone();
            let etag = earlier.etag().map(String::from);
            // The replaced page must not stay reachable from its replacement.
            let continuation = match earlier.next().await? {
                Some(successor) => Continuation::Resume {
                    fetcher: Arc::new(self.clone()),
                    earlier: successor,
                },
                None => Continuation::End,
            };
            return Ok(Some(Arc::new(Page::new(
                url.to_string(),
                content,
                etag,
                continuation,
            ))));
        }

        if status == StatusCode::FORBIDDEN
            && header(response.headers(), "x-ratelimit-remaining") == Some("0")
        {
            counter!(GITHUB_REQUESTS, "outcome" => "rate_limited").increment(1);
            let reset_at = header(response.headers(), "x-ratelimit-reset")
                .and_then(|reset| reset.parse::<i64>().ok())
                .and_then(|seconds| DateTime::from_timestamp(seconds, 0))
                .unwrap_or_else(Utc::now);
            return Err(GitHubError::RateLimitExceeded { reset_at });
        }

        if !status.is_success() {
            counter!(GITHUB_REQUESTS, "outcome" => "error").increment(1);
            return Err(GitHubError::UnexpectedStatus {
                url: url.to_string(),
                status,
            });
        }

        counter!(GITHUB_REQUESTS, "outcome" => "fetched").increment(1);
        let etag = header(response.headers(), ETAG.as_str()).map(String::from);
        let next_url = header(response.headers(), LINK.as_str())
            .and_then(|links| link::parse(links).remove("next"));
        let content: Vec<T> = response.json().await?;
        tracing::debug!(url, items = content.len(), "fetched page");

        let continuation = match next_url {
            Some(url) => Continuation::Fetch {
                fetcher: Arc::new(self.clone()),
                url,
            },
            None => Continuation::End,
        };

        Ok(Some(Arc::new(Page::new(
            url.to_string(),
            Arc::new(content),
            etag,
            continuation,
        ))))
    }
}

#[async_trait]
impl<T> PageFetcher<T> for GitHubClient
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    async fn fetch(
        &self,
        url: Option<&str>,
        earlier: Option<Arc<Page<T>>>,
    ) -> Result<Option<Arc<Page<T>>>, GitHubError> {
        self.fetch_page(url, earlier).await
    }
}

/// The ETag to send when re-requesting `earlier`'s URL, if the request should
/// be conditional at all. A full page without a successor is never conditional.
async fn conditional_etag<T>(earlier: &Page<T>) -> Result<Option<String>, GitHubError>
where
    T: Send + Sync + 'static,
{
    let Some(etag) = earlier.etag() else {
        return Ok(None);
    };
    if earlier.content().len() < PAGE_SIZE || earlier.next().await?.is_some() {
        Ok(Some(etag.to_string()))
    } else {
        Ok(None)
    }
}

fn header<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
