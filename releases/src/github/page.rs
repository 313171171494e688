use crate::github::error::GitHubError;
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Boxed because fetching a successor may resolve pages of the earlier chain.
pub type NextPage<'a, T> =
    Pin<Box<dyn Future<Output = Result<Option<Arc<Page<T>>>, GitHubError>> + Send + 'a>>;

/// Fetches one page of a paginated resource.
///
/// `earlier` is the page retrieved from the same URL during a previous walk,
/// if any. Implementations use it to issue a conditional request and to
/// reuse its content when the server reports that nothing changed.
#[async_trait]
pub trait PageFetcher<T>: Send + Sync {
    async fn fetch(
        &self,
        url: Option<&str>,
        earlier: Option<Arc<Page<T>>>,
    ) -> Result<Option<Arc<Page<T>>>, GitHubError>;
}

/// How to obtain the page after this one.
pub enum Continuation<T> {
    End,
    /// Follow a `rel="next"` link from freshly fetched content.
    Fetch {
        fetcher: Arc<dyn PageFetcher<T>>,
        url: String,
    },
    /// This page was not modified. `earlier` is the successor of the page it
    /// replaces, and is re-requested with itself as the earlier page. The
    /// replaced page is never referenced.
    Resume {
        fetcher: Arc<dyn PageFetcher<T>>,
        earlier: Arc<Page<T>>,
    },
}

/// One page of results in a forward-only chain.
///
/// The next page is fetched at most once, on the first call to `next()`, and
/// is kept so that walking the chain again, or using it as the earlier chain
/// of a later poll, does not hit the network.
pub struct Page<T> {
    url: String,
    content: Arc<Vec<T>>,
    etag: Option<String>,
    continuation: Continuation<T>,
    next: OnceCell<Option<Arc<Page<T>>>>,
}

impl<T: Send + Sync + 'static> Page<T> {
    pub fn new(
        url: String,
        content: Arc<Vec<T>>,
        etag: Option<String>,
        continuation: Continuation<T>,
    ) -> Self {
        Page {
            url,
            content,
            etag,
            continuation,
            next: OnceCell::new(),
        }
    }

    /// A page with no successor.
    pub fn last(url: impl Into<String>, content: Vec<T>, etag: Option<String>) -> Self {
        Page::new(url.into(), Arc::new(content), etag, Continuation::End)
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn content(&self) -> &Arc<Vec<T>> {
        &self.content
    }

    pub fn etag(&self) -> Option<&str> {
        self.etag.as_deref()
    }

    pub fn next(&self) -> NextPage<'_, T> {
        Box::pin(async move {
            let next = self
                .next
                .get_or_try_init(|| async {
                    match &self.continuation {
                        Continuation::End => Ok::<_, GitHubError>(None),
                        Continuation::Fetch { fetcher, url } => {
                            fetcher.fetch(Some(url), None).await
                        }
                        Continuation::Resume { fetcher, earlier } => {
                            fetcher.fetch(Some(&earlier.url), Some(earlier.clone())).await
                        }
                    }
                })
                .await?;
            Ok::<_, GitHubError>(next.clone())
        })
    }
}

impl<T: Clone + Send + Sync + 'static> Page<T> {
    /// Walks the chain starting at `first`, concatenating every page's content in order.
    pub async fn collect(first: Option<Arc<Page<T>>>) -> Result<Vec<T>, GitHubError> {
        let mut content = Vec::new();
        let mut page = first;
        while let Some(current) = page {
            content.extend(current.content.iter().cloned());
            page = current.next().await?;
        }
        Ok(content)
    }
}
