//! Aggregates the release schedules of Spring projects from GitHub
//! milestones, Jira fix versions and iCalendar feeds, and serves them as a
//! calendar.

pub mod alias;
pub mod api;
pub mod config;
pub mod github;
pub mod ical;
pub mod jira;
pub mod metrics_defs;
pub mod repository;
pub mod source;
pub mod types;
pub mod updater;

#[cfg(test)]
mod testutils;

use alias::ProjectNameAliaser;
use config::{Config, ValidationError};
use github::{GitHubReleaseScheduleSource, GitHubSourceError};
use ical::IcalReleaseScheduleSource;
use jira::{JiraError, JiraReleaseScheduleSource};
use repository::ReleaseRepository;
use source::ReleaseScheduleSource;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use types::Release;
use updater::{Command, ReleaseUpdater};

#[derive(thiserror::Error, Debug)]
pub enum ReleasesError {
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    GitHub(#[from] GitHubSourceError),
    #[error("could not create Jira client: {0}")]
    Jira(#[from] JiraError),
    #[error("could not create calendar client: {0}")]
    Ical(#[from] reqwest::Error),
    #[error(transparent)]
    Serve(#[from] api::ServeError),
}

/// The configured sources, in the order their schedules are merged.
pub fn build_sources(
    config: &Config,
) -> Result<Vec<Box<dyn ReleaseScheduleSource>>, ReleasesError> {
    let mut sources: Vec<Box<dyn ReleaseScheduleSource>> = Vec::new();
    if let Some(github) = &config.github {
        sources.push(Box::new(GitHubReleaseScheduleSource::new(github)?));
    }
    if let Some(jira) = &config.jira {
        sources.push(Box::new(JiraReleaseScheduleSource::new(jira)?));
    }
    if let Some(ical) = &config.ical {
        sources.push(Box::new(IcalReleaseScheduleSource::new(ical)?));
    }
    if sources.is_empty() {
        tracing::warn!("no release schedule sources configured");
    }
    Ok(sources)
}

/// Serves the calendar until ctrl-c, refreshing releases every poll interval.
pub async fn run(config: Config) -> Result<(), ReleasesError> {
    config.validate()?;

    let repository = Arc::new(ReleaseRepository::new());
    let updater = ReleaseUpdater::new(
        build_sources(&config)?,
        repository.clone(),
        ProjectNameAliaser::new(config.project_aliases.clone()),
    );

    let (cmd_tx, cmd_rx) = mpsc::channel::<Command>(8);
    let worker = tokio::spawn(updater.run(Duration::from_secs(config.poll_interval_secs), cmd_rx));

    let app = api::router(repository, &config.allowed_origins)?;
    let result = api::serve(&config.listener, app, async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "could not listen for shutdown signal");
        }
        tracing::info!("shutting down");
    })
    .await;

    let _ = cmd_tx.send(Command::Shutdown).await;
    if let Err(err) = worker.await {
        tracing::error!(error = %err, "release updater failed");
    }
    Ok(result?)
}

/// Polls every source once and returns the merged releases.
pub async fn poll_once(config: Config) -> Result<Vec<Release>, ReleasesError> {
    config.validate()?;

    let repository = Arc::new(ReleaseRepository::new());
    let mut updater = ReleaseUpdater::new(
        build_sources(&config)?,
        repository.clone(),
        ProjectNameAliaser::new(config.project_aliases.clone()),
    );
    updater.update_releases().await;
    Ok(repository.find_all().as_ref().clone())
}
