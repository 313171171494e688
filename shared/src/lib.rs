pub mod metrics_defs;

// Re-exported so the metric macros resolve without the caller naming `metrics`.
pub use metrics;
