use crate::alias::ProjectNameAliaser;
use crate::metrics_defs::{POLL_DURATION, RELEASES_PUBLISHED, SOURCE_FAILURES};
use crate::repository::ReleaseRepository;
use crate::source::ReleaseScheduleSource;
use crate::types::{Release, ReleaseSchedule};
use indexmap::IndexMap;
use indexmap::map::Entry;
use shared::{counter, gauge, histogram};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;

#[derive(Debug)]
pub enum Command {
    // Poll every source now instead of waiting for the next tick.
    // The worker replies with the number of releases published.
    Refresh(oneshot::Sender<usize>),
    // Stop the worker after the current poll.
    Shutdown,
}

/// Polls every schedule source, merges their schedules by project name and
/// publishes the result to the repository.
pub struct ReleaseUpdater {
    sources: Vec<Box<dyn ReleaseScheduleSource>>,
    // Last successful result of each source, by position in `sources`.
    previous: Vec<Option<Vec<ReleaseSchedule>>>,
    repository: Arc<ReleaseRepository>,
    aliaser: ProjectNameAliaser,
}

impl ReleaseUpdater {
    pub fn new(
        sources: Vec<Box<dyn ReleaseScheduleSource>>,
        repository: Arc<ReleaseRepository>,
        aliaser: ProjectNameAliaser,
    ) -> Self {
        let previous = sources.iter().map(|_| None).collect();
        ReleaseUpdater {
            sources,
            previous,
            repository,
            aliaser,
        }
    }

    /// Runs one poll cycle and returns the number of releases published.
    ///
    /// A source that fails contributes its last successful result, so that
    /// one unavailable upstream does not remove its projects from the calendar.
    pub async fn update_releases(&mut self) -> usize {
        tracing::info!("updating releases");
        let started = Instant::now();

        let mut schedules = Vec::new();
        for (source, previous) in self.sources.iter_mut().zip(self.previous.iter_mut()) {
            match source.get().await {
                Ok(current) => {
                    tracing::debug!(
                        source = source.name(),
                        projects = current.len(),
                        "polled source"
                    );
                    *previous = Some(current.clone());
                    schedules.extend(current);
                }
                Err(err) => {
                    let kind = if err.is_rate_limited() {
                        "rate_limited"
                    } else {
                        "error"
                    };
                    counter!(SOURCE_FAILURES, "source" => source.name(), "kind" => kind)
                        .increment(1);
                    tracing::warn!(
                        source = source.name(),
                        error = %err,
                        "failed to poll source, keeping its previous schedules"
                    );
                    schedules.extend(previous.iter().flatten().cloned());
                }
            }
        }

        let releases: Vec<Release> = merge_schedules(schedules)
            .into_iter()
            .flat_map(|schedule| schedule.releases)
            .map(|mut release| {
                release.project = self.aliaser.apply(release.project);
                release
            })
            .collect();

        let count = releases.len();
        self.repository.set(releases);

        histogram!(POLL_DURATION).record(started.elapsed().as_secs_f64());
        gauge!(RELEASES_PUBLISHED).set(count as f64);
        tracing::info!(releases = count, "releases updated");
        count
    }

    /// Polls immediately, then every `interval` or on demand when the Refresh
    /// command is received. The loop runs until the Shutdown command is
    /// received or every sender is dropped.
    pub async fn run(mut self, interval: Duration, mut rx: mpsc::Receiver<Command>) {
        let mut ticker = tokio::time::interval(interval);
        // Ticks missed while a poll overruns are dropped, not replayed.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.update_releases().await;
                }
                command = rx.recv() => match command {
                    Some(Command::Refresh(reply)) => {
                        let count = self.update_releases().await;
                        let _ = reply.send(count);
                    }
                    Some(Command::Shutdown) | None => {
                        tracing::info!("release updater stopped");
                        return;
                    }
                },
            }
        }
    }
}

/// Combines schedules with the same project name. The first schedule seen
/// for a name fixes its position; releases from later ones are appended in
/// the order they are encountered. Nothing is deduplicated.
pub fn merge_schedules(
    schedules: impl IntoIterator<Item = ReleaseSchedule>,
) -> Vec<ReleaseSchedule> {
    let mut merged: IndexMap<String, ReleaseSchedule> = IndexMap::new();
    for schedule in schedules {
        match merged.entry(schedule.project.clone()) {
            Entry::Occupied(mut existing) => {
                existing.get_mut().releases.extend(schedule.releases);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(schedule);
            }
        }
    }
    merged.into_values().collect()
}
