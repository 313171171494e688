//! Common types for metrics definitions.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
}

impl MetricType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MetricType::Counter => "Counter",
            MetricType::Gauge => "Gauge",
            MetricType::Histogram => "Histogram",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MetricDef {
    pub name: &'static str,
    pub metric_type: MetricType,
    pub description: &'static str,
}

/// Checks that every definition has a unique name, a name-safe identifier
/// and a description. Crates call this from a test over their `ALL_METRICS`.
pub fn check_definitions(defs: &[MetricDef]) -> Result<(), String> {
    let mut seen = std::collections::HashSet::new();
    for def in defs {
        if !seen.insert(def.name) {
            return Err(format!("duplicate metric name {}", def.name));
        }
        if def.name.is_empty()
            || !def
                .name
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '_')
        {
            return Err(format!("invalid metric name {:?}", def.name));
        }
        if def.description.is_empty() {
            return Err(format!(
                "{} {} has no description",
                def.metric_type.as_str(),
                def.name
            ));
        }
    }
    Ok(())
}

#[macro_export]
macro_rules! counter {
    ($def:expr) => {
        $crate::metrics::counter!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        $crate::metrics::counter!($def.name, $($labels)+)
    };
}

#[macro_export]
macro_rules! gauge {
    ($def:expr) => {
        $crate::metrics::gauge!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        $crate::metrics::gauge!($def.name, $($labels)+)
    };
}

#[macro_export]
macro_rules! histogram {
    ($def:expr) => {
        $crate::metrics::histogram!($def.name)
    };
    ($def:expr, $($labels:tt)+) => {
        $crate::metrics::histogram!($def.name, $($labels)+)
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: MetricDef = MetricDef {
        name: "a.count",
        metric_type: MetricType::Counter,
        description: "A",
    };

    #[test]
    fn test_check_definitions() {
        assert!(check_definitions(&[A]).is_ok());
        assert!(check_definitions(&[A, A]).is_err());

        let bad = MetricDef {
            name: "Bad Name",
            ..A
        };
        assert!(check_definitions(&[bad]).is_err());

        let undocumented = MetricDef {
            description: "",
            ..A
        };
        assert!(check_definitions(&[undocumented]).is_err());
    }
}
