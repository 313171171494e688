use releases::config::{Config as ReleasesConfig, ValidationError};
use serde::Deserialize;
use std::fs::File;

#[derive(Deserialize, Debug)]
pub struct MetricsConfig {
    pub statsd_host: String,
    pub statsd_port: u16,
}

#[derive(Deserialize, Debug)]
pub struct LoggingConfig {
    pub sentry_dsn: Option<String>,
    /// Used when RUST_LOG is not set.
    #[serde(default = "default_filter")]
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            sentry_dsn: None,
            filter: default_filter(),
        }
    }
}

fn default_filter() -> String {
    "calendar=info,releases=info".into()
}

#[derive(Deserialize, Debug, Default)]
pub struct CommonConfig {
    pub metrics: Option<MetricsConfig>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Deserialize, Debug)]
pub struct Config {
    #[serde(flatten)]
    pub common: CommonConfig,
    pub releases: ReleasesConfig,
}

impl Config {
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let file = File::open(path)?;
        let config: Config = serde_yaml::from_reader(file)?;
        config.releases.validate()?;

        Ok(config)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("could not load config from file: {0}")]
    LoadError(#[from] std::io::Error),
    #[error("could not parse config: {0}")]
    ParseError(#[from] serde_yaml::Error),
    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_tmp_file(s: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
        write!(tmp, "{}", s).expect("write yaml");

        tmp
    }

    #[test]
    fn full_config() {
        let yaml = r#"
            metrics:
                statsd_host: 127.0.0.1
                statsd_port: 8125
            logging:
                sentry_dsn: https://key@sentry.example.com/1
            releases:
                listener:
                    host: 0.0.0.0
                    port: 8080
                poll_interval_secs: 600
                project_aliases:
                    Spring Data Build: Spring Data
                github:
                    username: calendar-bot
                    password: secret
                    organizations:
                        - name: spring-projects
                          transforms:
                              - repository: spring-boot-commercial
                                commercial_project_id: spring-boot
                jira:
                    projects: [DATAJPA]
                ical:
                    projects:
                        - name: Spring Data
                          url: https://calendar.example.com/data.ics
            "#;
        let tmp = write_tmp_file(yaml);
        let config = Config::from_file(tmp.path()).expect("load config");

        let metrics = config.common.metrics.expect("metrics config");
        assert_eq!(metrics.statsd_port, 8125);
        assert_eq!(
            config.common.logging.sentry_dsn.as_deref(),
            Some("https://key@sentry.example.com/1")
        );
        assert_eq!(config.common.logging.filter, "calendar=info,releases=info");

        let releases = config.releases;
        assert_eq!(releases.listener.port, 8080);
        assert_eq!(releases.poll_interval_secs, 600);
        assert_eq!(releases.project_aliases["Spring Data Build"], "Spring Data");
        let github = releases.github.expect("github config");
        assert_eq!(github.organizations[0].name, "spring-projects");
        assert_eq!(github.organizations[0].transforms.len(), 1);
        assert_eq!(
            releases.jira.expect("jira config").projects,
            Some(vec!["DATAJPA".to_string()])
        );
        assert_eq!(releases.ical.expect("ical config").projects.len(), 1);
    }

    #[test]
    fn minimal_config() {
        let tmp = write_tmp_file("releases: {}\n");
        let config = Config::from_file(tmp.path()).expect("load config");
        assert!(config.common.metrics.is_none());
        assert!(config.common.logging.sentry_dsn.is_none());
        assert!(config.releases.github.is_none());
        assert_eq!(config.releases.poll_interval_secs, 300);
    }

    #[test]
    fn invalid_config() {
        let tmp = write_tmp_file("releases:\n  poll_interval_secs: 0\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::Validation(ValidationError::InvalidPollInterval))
        ));

        let tmp = write_tmp_file("releases: [\n");
        assert!(matches!(
            Config::from_file(tmp.path()),
            Err(ConfigError::ParseError(_))
        ));

        assert!(matches!(
            Config::from_file(std::path::Path::new("/nonexistent/calendar.yaml")),
            Err(ConfigError::LoadError(_))
        ));
    }
}
