use crate::config::{GitHubConfig, TransformConfig, ValidationError};
use crate::github::client::GitHubClient;
use crate::github::page::Page;
use crate::github::project::Project;
use crate::github::types::{Milestone, MilestoneState, Repository};
use crate::source::{ReleaseScheduleSource, SourceError};
use crate::types::{Release, ReleaseSchedule, ReleaseStatus, ReleaseType};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::sync::Arc;

struct Organization {
    name: String,
    transforms: HashMap<String, TransformConfig>,
}

/// Release schedules built from the milestones of every published repository
/// in the configured GitHub organizations.
pub struct GitHubReleaseScheduleSource {
    client: GitHubClient,
    organizations: Vec<Organization>,
    time_zone: Tz,
    // Chains walked during the previous poll. They seed the next poll's
    // requests so that unchanged pages come back as 304s.
    earlier_repositories: HashMap<String, Arc<Page<Repository>>>,
    earlier_milestones: HashMap<String, Arc<Page<Milestone>>>,
}

#[derive(thiserror::Error, Debug)]
pub enum GitHubSourceError {
    #[error("invalid GitHub configuration: {0}")]
    Config(#[from] ValidationError),
    #[error("could not create GitHub client: {0}")]
    Client(#[from] crate::github::GitHubError),
}

impl GitHubReleaseScheduleSource {
    pub fn new(config: &GitHubConfig) -> Result<Self, GitHubSourceError> {
        Self::with_client(GitHubClient::new(config)?, config)
    }

    pub fn with_client(client: GitHubClient, config: &GitHubConfig) -> Result<Self, GitHubSourceError> {
        let organizations = config
            .organizations
            .iter()
            .map(|organization| {
                Ok(Organization {
                    name: organization.name.clone(),
                    transforms: organization.transforms_by_repository()?,
                })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(GitHubReleaseScheduleSource {
            client,
            organizations,
            time_zone: config.time_zone,
            earlier_repositories: HashMap::new(),
            earlier_milestones: HashMap::new(),
        })
    }

    async fn organization_schedules(
        &mut self,
        index: usize,
    ) -> Result<Vec<ReleaseSchedule>, SourceError> {
        let organization = &self.organizations[index];
        let earlier = self.earlier_repositories.get(&organization.name).cloned();
        let first = self
            .client
            .get_repositories(&organization.name, earlier)
            .await?;
        let repositories = Page::collect(first.clone()).await?;
        match first {
            Some(first) => {
                self.earlier_repositories
                    .insert(organization.name.clone(), first);
            }
            None => {
                self.earlier_repositories.remove(&organization.name);
            }
        }

        let organization = &self.organizations[index];
        let projects: Vec<Project> = repositories
            .into_iter()
            .map(|repository| {
                let transform = organization.transforms.get(&repository.name);
                Project::new(repository, transform)
            })
            .filter(Project::include)
            .collect();
        tracing::debug!(
            organization = %organization.name,
            projects = projects.len(),
            "resolved projects"
        );

        let mut schedules = Vec::with_capacity(projects.len());
        for project in projects {
            let releases = self.project_releases(&project).await?;
            schedules.push(ReleaseSchedule::new(project.name, releases));
        }
        Ok(schedules)
    }

    async fn project_releases(&mut self, project: &Project) -> Result<Vec<Release>, SourceError> {
        let full_name = &project.repository.full_name;
        let earlier = self.earlier_milestones.get(full_name).cloned();
        let first = self
            .client
            .get_milestones(&project.repository, earlier)
            .await?;
        let milestones = Page::collect(first.clone()).await?;
        match first {
            Some(first) => {
                self.earlier_milestones.insert(full_name.clone(), first);
            }
            None => {
                self.earlier_milestones.remove(full_name);
            }
        }

        let mut releases = Vec::new();
        for milestone in milestones {
            let Some(due_on) = milestone.due_on else {
                continue;
            };
            releases.push(Release {
                project: project.name.clone(),
                name: milestone.title.clone(),
                date: due_on.with_timezone(&self.time_zone).date_naive(),
                status: match milestone.state {
                    MilestoneState::Open => ReleaseStatus::Open,
                    MilestoneState::Closed => ReleaseStatus::Closed,
                },
                url: Some(project.release_url(&milestone)?),
                release_type: if project.is_commercial() {
                    ReleaseType::Enterprise
                } else {
                    ReleaseType::Oss
                },
            });
        }
        Ok(releases)
    }
}

#[async_trait]
impl ReleaseScheduleSource for GitHubReleaseScheduleSource {
    fn name(&self) -> &'static str {
        "github"
    }

    async fn get(&mut self) -> Result<Vec<ReleaseSchedule>, SourceError> {
        let mut schedules = Vec::new();
        for index in 0..self.organizations.len() {
            schedules.extend(self.organization_schedules(index).await?);
        }
        Ok(schedules)
    }
}
