use crate::config::{CalendarProjectConfig, IcalConfig};
use crate::ical::codec;
use crate::source::{ReleaseScheduleSource, SourceError};
use crate::types::{Release, ReleaseSchedule, ReleaseStatus, ReleaseType};
use async_trait::async_trait;
use chrono_tz::Tz;
use std::collections::HashMap;
use std::time::Duration;

/// Release schedules read from published iCalendar feeds, one feed per project.
pub struct IcalReleaseScheduleSource {
    http: reqwest::Client,
    projects: Vec<CalendarProjectConfig>,
    time_zone: Tz,
    // Last events successfully retrieved per project name.
    previous: HashMap<String, Vec<codec::Event>>,
}

impl IcalReleaseScheduleSource {
    pub fn new(config: &IcalConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(IcalReleaseScheduleSource {
            http,
            projects: config.projects.clone(),
            time_zone: config.time_zone,
            previous: HashMap::new(),
        })
    }

    async fn fetch(&self, project: &CalendarProjectConfig) -> Result<String, reqwest::Error> {
        self.http
            .get(project.url.clone())
            .send()
            .await?
            .error_for_status()?
            .text()
            .await
    }

    /// The project's events, or the previously retrieved ones when the feed is unavailable.
    async fn events(&mut self, project: &CalendarProjectConfig) -> Vec<codec::Event> {
        match self.fetch(project).await {
            Ok(text) => {
                let events = codec::parse(&text);
                self.previous.insert(project.name.clone(), events.clone());
                events
            }
            Err(err) => {
                tracing::warn!(
                    project = %project.name,
                    url = %project.url,
                    error = %err,
                    "failed to retrieve calendar"
                );
                self.previous.get(&project.name).cloned().unwrap_or_default()
            }
        }
    }

    fn release(&self, project: &CalendarProjectConfig, event: codec::Event) -> Option<Release> {
        let date = event.start?.date_in(self.time_zone);
        let summary = event.summary?;
        let name = match summary.strip_prefix(project.name.as_str()) {
            Some(rest) => rest.trim().to_string(),
            None => summary,
        };
        Some(Release {
            project: project.name.clone(),
            name,
            date,
            status: ReleaseStatus::Unknown,
            url: None,
            release_type: ReleaseType::Oss,
        })
    }
}

#[async_trait]
impl ReleaseScheduleSource for IcalReleaseScheduleSource {
    fn name(&self) -> &'static str {
        "ical"
    }

    async fn get(&mut self) -> Result<Vec<ReleaseSchedule>, SourceError> {
        let mut schedules = Vec::with_capacity(self.projects.len());
        for project in self.projects.clone() {
            let releases = self
                .events(&project)
                .await
                .into_iter()
                .filter_map(|event| self.release(&project, event))
                .collect();
            schedules.push(ReleaseSchedule::new(project.name, releases));
        }
        Ok(schedules)
    }
}
