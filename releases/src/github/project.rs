use crate::config::TransformConfig;
use crate::github::error::GitHubError;
use crate::github::types::{Milestone, MilestoneState, Repository, Visibility};
use url::Url;

/// Repositories named with this suffix hold the commercial edition of a project.
pub const COMMERCIAL_SUFFIX: &str = "-commercial";

const ENTERPRISE_PROJECTS_URL: &str = "https://enterprise.spring.io/projects";

/// A repository resolved to the project it publishes releases for.
#[derive(Clone, Debug, PartialEq)]
pub struct Project {
    pub repository: Repository,
    pub name: String,
    pub commercial_project_id: Option<String>,
}

impl Project {
    pub fn new(repository: Repository, transform: Option<&TransformConfig>) -> Self {
        let name = transform
            .and_then(|t| t.display_name.clone())
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| display_name(&repository.name));
        let commercial_project_id = transform
            .and_then(|t| t.commercial_project_id.clone())
            .or_else(|| {
                repository
                    .name
                    .strip_suffix(COMMERCIAL_SUFFIX)
                    .map(String::from)
            });

        Project {
            repository,
            name,
            commercial_project_id,
        }
    }

    pub fn is_commercial(&self) -> bool {
        self.repository.name.ends_with(COMMERCIAL_SUFFIX)
    }

    /// Public repositories are always published. Commercial repositories are
    /// published whatever their visibility.
    pub fn include(&self) -> bool {
        self.repository.visibility == Visibility::Public || self.is_commercial()
    }

    /// Where readers can find out more about the release tracked by `milestone`.
    pub fn release_url(&self, milestone: &Milestone) -> Result<Url, GitHubError> {
        if self.is_commercial()
            && let Some(id) = &self.commercial_project_id
        {
            let mut url = Url::parse(ENTERPRISE_PROJECTS_URL)?;
            if let Ok(mut segments) = url.path_segments_mut() {
                segments.push(id);
                if milestone.state == MilestoneState::Closed {
                    segments.push("changelog").push(&milestone.title);
                }
            }
            return Ok(url);
        }

        let html_url = self.repository.html_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!(
            "{html_url}/milestone/{}",
            milestone.number
        ))?)
    }
}

/// `spring-boot-commercial` becomes `Spring Boot`.
fn display_name(repository_name: &str) -> String {
    let name = repository_name
        .strip_suffix(COMMERCIAL_SUFFIX)
        .unwrap_or(repository_name);

    let mut display = String::with_capacity(name.len());
    let mut capitalize = true;
    for c in name.chars() {
        let c = if c == '-' { ' ' } else { c };
        if capitalize {
            display.extend(c.to_uppercase());
        } else {
            display.push(c);
        }
        capitalize = c == ' ';
    }
    display
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repository(name: &str, visibility: Visibility) -> Repository {
        Repository {
            name: name.into(),
            full_name: format!("spring-projects/{name}"),
            milestones_url: format!(
                "https://api.github.com/repos/spring-projects/{name}/milestones"
            ),
            html_url: Url::parse(&format!("https://github.com/spring-projects/{name}")).unwrap(),
            visibility,
        }
    }

    fn milestone(number: u64, title: &str, state: MilestoneState) -> Milestone {
        Milestone {
            title: title.into(),
            number,
            state,
            due_on: None,
        }
    }

    fn transform(display_name: Option<&str>, id: Option<&str>) -> TransformConfig {
        TransformConfig {
            repository: "spring-boot-commercial".into(),
            display_name: display_name.map(String::from),
            commercial_project_id: id.map(String::from),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("spring-boot-commercial"), "Spring Boot");
        assert_eq!(display_name("spring-cloud-commons"), "Spring Cloud Commons");
        assert_eq!(display_name("spring-boot"), "Spring Boot");
        assert_eq!(display_name("springBoot"), "SpringBoot");
        assert_eq!(display_name("spring--boot"), "Spring  Boot");
        assert_eq!(display_name(""), "");
    }

    #[test]
    fn test_name_and_commercial_id_without_transform() {
        let project = Project::new(repository("spring-boot-commercial", Visibility::Internal), None);
        assert_eq!(project.name, "Spring Boot");
        assert_eq!(project.commercial_project_id.as_deref(), Some("spring-boot"));
        assert!(project.is_commercial());

        let project = Project::new(repository("spring-boot", Visibility::Public), None);
        assert_eq!(project.commercial_project_id, None);
        assert!(!project.is_commercial());
    }

    #[test]
    fn test_transform_overrides() {
        let repo = repository("spring-boot-commercial", Visibility::Private);

        let project = Project::new(
            repo.clone(),
            Some(&transform(Some("Spring Boot Commercial"), Some("boot"))),
        );
        assert_eq!(project.name, "Spring Boot Commercial");
        assert_eq!(project.commercial_project_id.as_deref(), Some("boot"));

        // An empty display name falls back to the derived one.
        let project = Project::new(repo, Some(&transform(Some(""), None)));
        assert_eq!(project.name, "Spring Boot");
        assert_eq!(project.commercial_project_id.as_deref(), Some("spring-boot"));
    }

    #[test]
    fn test_include() {
        let include = |name, visibility| Project::new(repository(name, visibility), None).include();

        assert!(include("spring-boot", Visibility::Public));
        assert!(!include("spring-boot", Visibility::Private));
        assert!(!include("spring-boot", Visibility::Internal));
        assert!(include("spring-boot-commercial", Visibility::Private));
        assert!(include("spring-boot-commercial", Visibility::Internal));
        assert!(include("spring-boot-commercial", Visibility::Public));
    }

    #[test]
    fn test_release_url() {
        let commercial = Project::new(repository("spring-boot-commercial", Visibility::Internal), None);
        assert_eq!(
            commercial
                .release_url(&milestone(1, "2.7.21", MilestoneState::Closed))
                .unwrap()
                .as_str(),
            "https://enterprise.spring.io/projects/spring-boot/changelog/2.7.21"
        );
        assert_eq!(
            commercial
                .release_url(&milestone(2, "2.7.22", MilestoneState::Open))
                .unwrap()
                .as_str(),
            "https://enterprise.spring.io/projects/spring-boot"
        );

        let oss = Project::new(repository("spring-boot", Visibility::Public), None);
        assert_eq!(
            oss.release_url(&milestone(42, "3.3.0", MilestoneState::Closed))
                .unwrap()
                .as_str(),
            "https://github.com/spring-projects/spring-boot/milestone/42"
        );

        // A commercial id on a non-commercial repository does not change its URL.
        let renamed = Project::new(
            repository("spring-boot", Visibility::Public),
            Some(&transform(None, Some("boot"))),
        );
        assert_eq!(
            renamed
                .release_url(&milestone(7, "3.3.0", MilestoneState::Closed))
                .unwrap()
                .as_str(),
            "https://github.com/spring-projects/spring-boot/milestone/7"
        );
    }

    #[test]
    fn test_release_url_keeps_title_in_path() {
        let commercial = Project::new(repository("spring-boot-commercial", Visibility::Internal), None);
        let url = commercial
            .release_url(&milestone(1, "2.7.21?beta#1", MilestoneState::Closed))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://enterprise.spring.io/projects/spring-boot/changelog/2.7.21%3Fbeta%231"
        );
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);

        let url = commercial
            .release_url(&milestone(2, "2.7/hotfix", MilestoneState::Closed))
            .unwrap();
        assert_eq!(
            url.path_segments().unwrap().collect::<Vec<_>>(),
            vec!["projects", "spring-boot", "changelog", "2.7%2Fhotfix"]
        );
    }
}
