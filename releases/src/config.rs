use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use url::Url;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Poll interval cannot be 0")]
    InvalidPollInterval,

    #[error("Duplicate organization: {0}")]
    DuplicateOrganization(String),

    #[error("Duplicate transform for repository {repository} in organization {organization}")]
    DuplicateTransform {
        organization: String,
        repository: String,
    },

    #[error("Duplicate calendar project: {0}")]
    DuplicateCalendarProject(String),
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    pub host: String,
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Per-repository naming overrides.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct TransformConfig {
    /// Repository name the override applies to, e.g. `spring-boot-commercial`
    pub repository: String,
    pub display_name: Option<String>,
    pub commercial_project_id: Option<String>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct OrganizationConfig {
    pub name: String,
    #[serde(default)]
    pub transforms: Vec<TransformConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct GitHubConfig {
    /// Defaults to the public GitHub API.
    pub api_url: Option<Url>,
    pub username: Option<String>,
    pub password: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Time zone milestone due dates are converted into.
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
    pub organizations: Vec<OrganizationConfig>,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct JiraConfig {
    /// Defaults to the Spring Jira instance.
    pub url: Option<Url>,
    /// Keys of the projects to include. Every project is included when absent.
    pub projects: Option<Vec<String>>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct CalendarProjectConfig {
    pub name: String,
    pub url: Url,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct IcalConfig {
    pub projects: Vec<CalendarProjectConfig>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Time zone UTC event start times are converted into.
    #[serde(default = "default_time_zone")]
    pub time_zone: Tz,
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub listener: Listener,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    /// Origins allowed to read the API from a browser.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Project names to publish under a different name.
    #[serde(default)]
    pub project_aliases: HashMap<String, String>,
    pub github: Option<GitHubConfig>,
    pub jira: Option<JiraConfig>,
    pub ical: Option<IcalConfig>,
}

impl Config {
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;

        if self.poll_interval_secs == 0 {
            return Err(ValidationError::InvalidPollInterval);
        }

        if let Some(github) = &self.github {
            let mut organizations = HashSet::new();
            for organization in &github.organizations {
                if !organizations.insert(&organization.name) {
                    return Err(ValidationError::DuplicateOrganization(
                        organization.name.clone(),
                    ));
                }
                organization.validate()?;
            }
        }

        if let Some(ical) = &self.ical {
            let mut names = HashSet::new();
            for project in &ical.projects {
                if !names.insert(&project.name) {
                    return Err(ValidationError::DuplicateCalendarProject(
                        project.name.clone(),
                    ));
                }
            }
        }

        Ok(())
    }
}

impl GitHubConfig {
    pub fn api_url(&self) -> &str {
        self.api_url
            .as_ref()
            .map_or("https://api.github.com", |url| url.as_str())
            .trim_end_matches('/')
    }
}

impl JiraConfig {
    pub fn base_url(&self) -> &str {
        self.url
            .as_ref()
            .map_or("https://jira.spring.io", |url| url.as_str())
            .trim_end_matches('/')
    }
}

impl OrganizationConfig {
    /// Transforms keyed by repository name.
    pub fn transforms_by_repository(
        &self,
    ) -> Result<HashMap<String, TransformConfig>, ValidationError> {
        let mut transforms = HashMap::new();
        for transform in &self.transforms {
            if transforms
                .insert(transform.repository.clone(), transform.clone())
                .is_some()
            {
                return Err(ValidationError::DuplicateTransform {
                    organization: self.name.clone(),
                    repository: transform.repository.clone(),
                });
            }
        }
        Ok(transforms)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.transforms_by_repository().map(|_| ())
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_time_zone() -> Tz {
    chrono_tz::Europe::London
}

fn default_poll_interval_secs() -> u64 {
    300
}

fn default_allowed_origins() -> Vec<String> {
    vec![
        "https://spring.io".into(),
        "https://enterprise.spring.io".into(),
    ]
}
