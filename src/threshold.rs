use crate::ServiceState;

/// Which side of the thresholds is the bad one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    /// Higher values are worse: alert once the value reaches the thresholds from below.
    Ascending,
    /// Lower values are worse: alert once the value falls to the thresholds from above.
    Descending,
}

/// A warning and a critical bound. The direction is not configured, it follows from which of the
/// two is larger.
///
/// ```rust
/// # use check_graphite::{Direction, ServiceState, Thresholds};
/// let thresholds = Thresholds::new(10.0, 20.0);
/// assert_eq!(thresholds.direction(), Direction::Ascending);
/// assert_eq!(thresholds.evaluate(15.0), ServiceState::Warning);
///
/// let thresholds = Thresholds::new(20.0, 10.0);
/// assert_eq!(thresholds.direction(), Direction::Descending);
/// assert_eq!(thresholds.evaluate(15.0), ServiceState::Warning);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Thresholds {
    warning: f64,
    critical: f64,
}

impl Thresholds {
    pub fn new(warning: f64, critical: f64) -> Self {
        Thresholds { warning, critical }
    }

    pub fn warning(&self) -> f64 {
        self.warning
    }

    pub fn critical(&self) -> f64 {
        self.critical
    }

    /// Ascending if critical is above warning, descending otherwise (equal bounds included).
    pub fn direction(&self) -> Direction {
        if self.critical > self.warning {
            Direction::Ascending
        } else {
            Direction::Descending
        }
    }

    /// Critical wins over warning, reaching a bound exactly counts as crossing it. Never returns
    /// [ServiceState::Unknown].
    pub fn evaluate(&self, value: f64) -> ServiceState {
        let crossed = |bound: f64| match self.direction() {
            Direction::Ascending => value >= bound,
            Direction::Descending => value <= bound,
        };

        if crossed(self.critical) {
            ServiceState::Critical
        } else if crossed(self.warning) {
            ServiceState::Warning
        } else {
            ServiceState::Ok
        }
    }
}
