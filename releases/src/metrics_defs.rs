//! Metrics definitions for the release calendar.

use shared::metrics_defs::{MetricDef, MetricType};

pub const GITHUB_REQUESTS: MetricDef = MetricDef {
    name: "github.requests",
    metric_type: MetricType::Counter,
    description: "GitHub API requests, tagged by outcome: fetched, not_modified, rate_limited or error",
};

pub const POLL_DURATION: MetricDef = MetricDef {
    name: "releases.poll.duration",
    metric_type: MetricType::Histogram,
    description: "Time to poll every source and publish the merged releases in seconds",
};

pub const SOURCE_FAILURES: MetricDef = MetricDef {
    name: "releases.source.failures",
    metric_type: MetricType::Counter,
    description: "Schedule source polls that failed, tagged by source and kind",
};

pub const RELEASES_PUBLISHED: MetricDef = MetricDef {
    name: "releases.published",
    metric_type: MetricType::Gauge,
    description: "Number of releases in the most recently published list",
};

pub const ALL_METRICS: &[MetricDef] = &[
    GITHUB_REQUESTS,
    POLL_DURATION,
    SOURCE_FAILURES,
    RELEASES_PUBLISHED,
];
