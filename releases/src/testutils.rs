use crate::config::GitHubConfig;
use crate::types::{Release, ReleaseStatus, ReleaseType};
use serde_json::{Value, json};
use url::Url;
use wiremock::{Match, Request};

/// Matches requests that do not carry the named header.
pub struct NoHeader(pub &'static str);

impl Match for NoHeader {
    fn matches(&self, request: &Request) -> bool {
        !request.headers.contains_key(self.0)
    }
}

pub fn github_config(api_url: &str) -> GitHubConfig {
    GitHubConfig {
        api_url: Some(Url::parse(api_url).unwrap()),
        username: None,
        password: None,
        timeout_secs: 5,
        time_zone: chrono_tz::Europe::London,
        organizations: vec![],
    }
}

/// A repository as returned by the organization repositories endpoint, with
/// its milestones served by `server_uri`.
pub fn repository_json(server_uri: &str, owner: &str, name: &str, visibility: &str) -> Value {
    json!({
        "name": name,
        "full_name": format!("{owner}/{name}"),
        "private": visibility != "public",
        "html_url": format!("https://github.com/{owner}/{name}"),
        "milestones_url": format!("{server_uri}/repos/{owner}/{name}/milestones{{/number}}"),
        "visibility": visibility,
    })
}

pub fn milestone_json(number: u64, title: &str, state: &str, due_on: Option<&str>) -> Value {
    json!({
        "number": number,
        "title": title,
        "state": state,
        "due_on": due_on,
    })
}

pub fn release(project: &str, name: &str, date: &str) -> Release {
    Release {
        project: project.into(),
        name: name.into(),
        date: date.parse().unwrap(),
        status: ReleaseStatus::Open,
        url: None,
        release_type: ReleaseType::Oss,
    }
}
