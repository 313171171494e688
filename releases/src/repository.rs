use crate::types::{Release, ReleaseType};
use chrono::NaiveDate;
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Holds the most recently published list of releases.
///
/// Every `set` replaces the whole list. Readers clone the `Arc` under the read
/// lock, so a reader sees either the previous list or the new one and never a
/// mixture of the two.
pub struct ReleaseRepository {
    releases: RwLock<Arc<Vec<Release>>>,
    // Used by the readiness endpoint. Set once the first list has been published.
    ready: AtomicBool,
}

impl ReleaseRepository {
    pub fn new() -> Self {
        ReleaseRepository {
            releases: RwLock::new(Arc::new(Vec::new())),
            ready: AtomicBool::new(false),
        }
    }

    pub fn set(&self, releases: Vec<Release>) {
        let releases = Arc::new(releases);
        *self.releases.write() = releases;
        self.ready.store(true, Ordering::Relaxed);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Relaxed)
    }

    pub fn find_all(&self) -> Arc<Vec<Release>> {
        self.releases.read().clone()
    }

    /// All releases of the given type, or every release when `release_type` is `None`.
    pub fn find_all_of_type(&self, release_type: Option<ReleaseType>) -> Vec<Release> {
        self.find_all()
            .iter()
            .filter(|release| matches_type(release, release_type))
            .cloned()
            .collect()
    }

    /// Like `find_all_of_type`, restricted to releases dated within `start..=end`.
    pub fn find_all_of_type_in_period(
        &self,
        release_type: Option<ReleaseType>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Vec<Release> {
        self.find_all()
            .iter()
            .filter(|release| matches_type(release, release_type))
            .filter(|release| release.date >= start && release.date <= end)
            .cloned()
            .collect()
    }
}

impl Default for ReleaseRepository {
    fn default() -> Self {
        Self::new()
    }
}

fn matches_type(release: &Release, release_type: Option<ReleaseType>) -> bool {
    release_type.is_none_or(|t| release.release_type == t)
}
