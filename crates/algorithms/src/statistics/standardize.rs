//! Min-max standardization with explicit null handling

use std::fmt;
use std::str::FromStr;

use geodiv_core::Error;
use tracing::warn;

use super::ZoneAggregate;

/// How zones without a raw value take part in standardization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullPolicy {
    /// Nulls become 0; the scale runs from 0 to the largest observed value
    #[default]
    ZeroFill,
    /// Nulls stay null; the scale runs from the smallest to the largest
    /// observed value
    PreserveNull,
}

impl FromStr for NullPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "zero-fill" | "zero" | "zerofill" => Ok(NullPolicy::ZeroFill),
            "preserve-null" | "null" | "preservenull" => Ok(NullPolicy::PreserveNull),
            other => Err(Error::Configuration(format!(
                "unknown null policy '{}', expected 'zero-fill' or 'preserve-null'",
                other
            ))),
        }
    }
}

impl fmt::Display for NullPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NullPolicy::ZeroFill => write!(f, "zero-fill"),
            NullPolicy::PreserveNull => write!(f, "preserve-null"),
        }
    }
}

/// Scale applied by [`standardize`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scaling {
    /// Nothing to scale by: every output is 0
    Degenerate,
    MinMax { min: f64, max: f64 },
}

/// Fill `standardized_value` of every aggregate from its `raw_value`.
///
/// The scale is decided on the observed (non-null) raw values only.
/// [`NullPolicy::PreserveNull`] maps `[min, max]` onto `[0, 1]` and is
/// degenerate when the observed values are all equal, or there are none.
/// [`NullPolicy::ZeroFill`] rewrites null raw values to 0, divides by the
/// observed maximum and is degenerate only when that maximum is not
/// positive. A degenerate scale sets every standardized value to 0 (nulls
/// stay null under [`NullPolicy::PreserveNull`]).
pub fn standardize(aggregates: &mut [ZoneAggregate], policy: NullPolicy) -> Scaling {
    let observed = aggregates
        .iter()
        .filter_map(|a| a.raw_value)
        .filter(|v| v.is_finite());

    let (min, max) = observed.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });

    let scaling = match policy {
        NullPolicy::ZeroFill if max > 0.0 => Scaling::MinMax { min: 0.0, max },
        NullPolicy::PreserveNull if max > min => Scaling::MinMax { min, max },
        _ => Scaling::Degenerate,
    };

    if scaling == Scaling::Degenerate {
        warn!(
            "No usable scale among {} observed values ({}); all standardized values set to 0",
            aggregates.iter().filter(|a| a.raw_value.is_some()).count(),
            policy
        );
    }

    for agg in aggregates.iter_mut() {
        let mut raw = agg.raw_value.filter(|v| v.is_finite());
        if policy == NullPolicy::ZeroFill {
            raw = Some(raw.unwrap_or(0.0));
            agg.raw_value = raw;
        }

        agg.standardized_value = raw.map(|v| match scaling {
            Scaling::Degenerate => 0.0,
            Scaling::MinMax { min, max } => (v - min) / (max - min),
        });
    }

    scaling
}
