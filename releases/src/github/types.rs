use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Public,
    Private,
    Internal,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Repository {
    pub name: String,
    pub full_name: String,
    /// Milestones endpoint with the `{/number}` template suffix removed.
    #[serde(deserialize_with = "strip_uri_template")]
    pub milestones_url: String,
    pub html_url: Url,
    pub visibility: Visibility,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MilestoneState {
    Open,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Milestone {
    pub title: String,
    pub number: u64,
    pub state: MilestoneState,
    pub due_on: Option<DateTime<Utc>>,
}

fn strip_uri_template<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let url = String::deserialize(deserializer)?;
    Ok(match url.find('{') {
        Some(index) => url[..index].to_string(),
        None => url,
    })
}
