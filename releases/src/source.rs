use crate::github::GitHubError;
use crate::jira::JiraError;
use crate::types::ReleaseSchedule;
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum SourceError {
    #[error("GitHub error: {0}")]
    GitHub(#[from] GitHubError),
    #[error("Jira error: {0}")]
    Jira(#[from] JiraError),
}

impl SourceError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            SourceError::GitHub(err) => err.is_rate_limited(),
            SourceError::Jira(_) => false,
        }
    }
}

/// Produces the current release schedules of the projects known to one upstream system.
///
/// Sources are polled by a single updater task, so `get` takes `&mut self` and
/// may keep state between polls.
#[async_trait]
pub trait ReleaseScheduleSource: Send {
    /// Short name used in logs and metric tags.
    fn name(&self) -> &'static str;

    async fn get(&mut self) -> Result<Vec<ReleaseSchedule>, SourceError>;
}
