use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use url::Url;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseStatus {
    Open,
    Closed,
    Unknown,
}

/// Whether a release belongs to an open source project or to its
/// commercial counterpart.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReleaseType {
    Oss,
    Enterprise,
}

impl fmt::Display for ReleaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseType::Oss => write!(f, "OSS"),
            ReleaseType::Enterprise => write!(f, "ENTERPRISE"),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
#[error("unknown release type: {0}")]
pub struct UnknownReleaseType(String);

impl FromStr for ReleaseType {
    type Err = UnknownReleaseType;

    /// Case-insensitive. `commercial` is accepted as an alias of `enterprise`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "oss" => Ok(ReleaseType::Oss),
            "enterprise" | "commercial" => Ok(ReleaseType::Enterprise),
            _ => Err(UnknownReleaseType(s.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    pub project: String,
    pub name: String,
    pub date: NaiveDate,
    pub status: ReleaseStatus,
    pub url: Option<Url>,
    #[serde(rename = "type")]
    pub release_type: ReleaseType,
}

impl Release {
    /// A release is overdue once its date has passed without it being closed.
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != ReleaseStatus::Closed && self.date < today
    }
}

/// The releases of one project as reported by a single source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReleaseSchedule {
    pub project: String,
    pub releases: Vec<Release>,
}

impl ReleaseSchedule {
    pub fn new(project: impl Into<String>, releases: Vec<Release>) -> Self {
        ReleaseSchedule {
            project: project.into(),
            releases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(status: ReleaseStatus, date: NaiveDate) -> Release {
        Release {
            project: "Spring Boot".into(),
            name: "3.3.0".into(),
            date,
            status,
            url: None,
            release_type: ReleaseType::Oss,
        }
    }

    #[test]
    fn test_release_type_from_str() {
        assert_eq!("oss".parse(), Ok(ReleaseType::Oss));
        assert_eq!("OSS".parse(), Ok(ReleaseType::Oss));
        assert_eq!("Enterprise".parse(), Ok(ReleaseType::Enterprise));
        assert_eq!("commercial".parse(), Ok(ReleaseType::Enterprise));
        assert_eq!(
            "community".parse::<ReleaseType>(),
            Err(UnknownReleaseType("community".into()))
        );
    }

    #[test]
    fn test_is_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();

        assert!(release(ReleaseStatus::Open, yesterday).is_overdue(today));
        assert!(release(ReleaseStatus::Unknown, yesterday).is_overdue(today));
        assert!(!release(ReleaseStatus::Closed, yesterday).is_overdue(today));
        assert!(!release(ReleaseStatus::Open, today).is_overdue(today));
    }

    #[test]
    fn test_release_serialization() {
        let json = serde_json::to_value(release(
            ReleaseStatus::Open,
            NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        ))
        .unwrap();
        assert_eq!(json["date"], "2024-06-01");
        assert_eq!(json["status"], "OPEN");
        assert_eq!(json["type"], "OSS");
        assert!(json["url"].is_null());
    }
}
