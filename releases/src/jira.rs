//! Jira fix versions as a source of release schedules.

use crate::config::JiraConfig;
use crate::source::{ReleaseScheduleSource, SourceError};
use crate::types::{Release, ReleaseSchedule, ReleaseStatus, ReleaseType};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

#[derive(thiserror::Error, Debug)]
pub enum JiraError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct JiraProject {
    pub key: String,
    pub name: String,
    #[serde(rename = "self")]
    pub uri: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JiraVersion {
    pub id: String,
    pub name: String,
    pub release_date: Option<String>,
    #[serde(default)]
    pub released: bool,
}

pub struct JiraClient {
    http: reqwest::Client,
    base_url: String,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(JiraClient {
            http,
            base_url: config.base_url().to_string(),
        })
    }

    pub async fn get_projects(&self) -> Result<Vec<JiraProject>, JiraError> {
        let url = format!("{}/rest/api/2/project", self.base_url);
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }

    pub async fn get_versions(&self, project: &JiraProject) -> Result<Vec<JiraVersion>, JiraError> {
        let url = format!("{}/versions", project.uri.trim_end_matches('/'));
        Ok(self
            .http
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?)
    }
}

pub struct JiraReleaseScheduleSource {
    client: JiraClient,
    base_url: String,
    // Project keys to include. Everything is included when unset.
    projects: Option<HashSet<String>>,
}

impl JiraReleaseScheduleSource {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraError> {
        Ok(JiraReleaseScheduleSource {
            client: JiraClient::new(config)?,
            base_url: config.base_url().to_string(),
            projects: config
                .projects
                .as_ref()
                .map(|keys| keys.iter().cloned().collect()),
        })
    }

    fn include(&self, project: &JiraProject) -> bool {
        self.projects
            .as_ref()
            .is_none_or(|keys| keys.contains(&project.key))
    }

    fn release(&self, project: &JiraProject, version: JiraVersion) -> Result<Option<Release>, JiraError> {
        let Some(date) = version
            .release_date
            .as_deref()
            .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok())
        else {
            return Ok(None);
        };
        let url = Url::parse(&format!(
            "{}/browse/{}/fixforversion/{}",
            self.base_url, project.key, version.id
        ))?;
        Ok(Some(Release {
            project: project.name.clone(),
            name: version.name,
            date,
            status: if version.released {
                ReleaseStatus::Closed
            } else {
                ReleaseStatus::Open
            },
            url: Some(url),
            release_type: ReleaseType::Oss,
        }))
    }
}

#[async_trait]
impl ReleaseScheduleSource for JiraReleaseScheduleSource {
    fn name(&self) -> &'static str {
        "jira"
    }

    async fn get(&mut self) -> Result<Vec<ReleaseSchedule>, SourceError> {
        let projects = self.client.get_projects().await?;
        let mut schedules = Vec::new();
        for project in projects.iter().filter(|project| self.include(project)) {
            let mut releases = Vec::new();
            for version in self.client.get_versions(project).await? {
                if let Some(release) = self.release(project, version)? {
                    releases.push(release);
                }
            }
            schedules.push(ReleaseSchedule::new(project.name.clone(), releases));
        }
        Ok(schedules)
    }
}
