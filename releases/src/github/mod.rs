//! GitHub milestones as a source of release schedules.
//!
//! List endpoints are walked as lazy page chains. The chains from one poll
//! are handed to the next so that unchanged pages are revalidated with
//! `If-None-Match` instead of being downloaded again.

mod client;
mod error;
pub mod link;
mod page;
mod project;
mod source;
mod types;

pub use client::{GitHubClient, PAGE_SIZE};
pub use error::GitHubError;
pub use page::{Continuation, Page, PageFetcher};
pub use project::{COMMERCIAL_SUFFIX, Project};
pub use source::{GitHubReleaseScheduleSource, GitHubSourceError};
pub use types::{Milestone, MilestoneState, Repository, Visibility};
