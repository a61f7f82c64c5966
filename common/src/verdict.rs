use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome of a single consistency check.
///
/// A failed comparison is a first-class result, not an error: checks only
/// error out when one of the underlying fetches could not produce a value to
/// compare at all.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Verdict {
    /// Observed value stayed under the configured threshold.
    Pass,
    /// Observed value reached or exceeded the configured threshold.
    Fail {
        observed: i64,
        threshold: i64,
        message: String,
    },
}

impl Verdict {
    /// Shared comparison rule across all checks: pass iff `observed <
    /// threshold`. The threshold is exclusive, an observed value equal to it
    /// fails.
    ///
    /// The message is only built on the failure path.
    pub fn from_observed<F>(observed: i64, threshold: i64, message: F) -> Self
    where
        F: FnOnce() -> String,
    {
        if observed < threshold {
            Verdict::Pass
        } else {
            Verdict::Fail {
                observed,
                threshold,
                message: message(),
            }
        }
    }

    pub fn is_pass(&self) -> bool {
        matches!(self, Verdict::Pass)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Pass => write!(f, "PASS"),
            Verdict::Fail {
                observed,
                threshold,
                message,
            } => write!(
                f,
                "FAIL: {} (observed {}, threshold {})",
                message, observed, threshold
            ),
        }
    }
}
