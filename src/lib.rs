//! The check_graphite crate queries a graphite render endpoint, averages the returned series and
//! turns the total into a nagios service state.
//!
//! The pipeline is split into small pieces which can be used on their own:
//!
//! * [url::render_url] builds the query url
//! * [fetch::Fetch] retrieves the response body
//! * [aggregate::aggregate] reduces the body to one number
//! * [threshold::Thresholds] maps that number to a [ServiceState]
//!
//! [run_check] wires them together and returns the [Resource] to print.

use std::fmt;
use std::process;

#[macro_use]
mod macros;

pub mod aggregate;
pub mod cli;
pub mod config_generator;
pub mod error;
pub mod fetch;
pub mod runner;
pub mod threshold;
pub mod url;

pub use crate::cli::CheckConfig;
pub use crate::error::{CheckError, UsageError};
pub use crate::fetch::{Fetch, HttpFetcher, ResponseBuffer};
pub use crate::runner::{Runner, RunnerResult};
pub use crate::threshold::{Direction, Thresholds};

/// A Resource represents a single service from the perspective of nagios: a name, the state it
/// is in, a short description and optionally some performance data.
///
/// ```rust
/// # use check_graphite::{Metric, Resource, ServiceState};
/// let resource = Resource::new("load", ServiceState::Warning)
///     .with_description("12.50")
///     .with_metric(Metric::new("load", 12.5).with_thresholds(10.0, 20.0));
/// assert_eq!(
///     &resource.to_nagios_string(),
///     "load WARNING: 12.50 | load=12.50;10;20"
/// );
/// ```
#[derive(Clone, Debug)]
pub struct Resource {
    name: String,
    state: ServiceState,
    description: Option<String>,
    metrics: Vec<Metric>,
}

impl Resource {
    pub fn new(name: &str, state: ServiceState) -> Resource {
        Resource {
            name: name.to_owned(),
            state,
            description: None,
            metrics: Vec::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metrics.push(metric);
        self
    }

    pub fn state(&self) -> ServiceState {
        self.state
    }

    /// Returns the single line nagios reads to determine the service state.
    pub fn to_nagios_string(&self) -> String {
        let mut s = format!("{} {}", self.name, self.state);

        if let Some(ref description) = self.description {
            s.push_str(&format!(": {}", description));
        }

        if !self.metrics.is_empty() {
            s.push_str(" |");

            for metric in self.metrics.iter() {
                s.push_str(&format!(" {}", metric.to_perf_string()));
            }
        }

        s
    }

    pub fn exit_code(&self) -> i32 {
        self.state.exit_code()
    }

    /// Prints Self::to_nagios_string to stdout and exits with the code of the state.
    pub fn print_and_exit(&self) -> ! {
        println!("{}", self.to_nagios_string());
        process::exit(self.exit_code());
    }
}

/// Represents a service state from nagios.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceState {
    Ok,
    Warning,
    Critical,
    Unknown,
}

impl ServiceState {
    /// Returns the corresponding nagios exit code to signal the service state of self.
    pub fn exit_code(&self) -> i32 {
        match self {
            ServiceState::Ok => 0,
            ServiceState::Warning => 1,
            ServiceState::Critical => 2,
            ServiceState::Unknown => 3,
        }
    }
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Ok => "OK",
            ServiceState::Warning => "WARNING",
            ServiceState::Critical => "CRITICAL",
            ServiceState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// A single performance data entry. The value is rendered with two decimals, the same way the
/// status line shows it, thresholds are rendered as configured.
#[derive(Clone, Debug, PartialEq)]
pub struct Metric {
    label: String,
    value: f64,
    warning: Option<f64>,
    critical: Option<f64>,
}

impl Metric {
    pub fn new(label: &str, value: f64) -> Self {
        Metric {
            label: label.to_owned(),
            value,
            warning: None,
            critical: None,
        }
    }

    pub fn with_thresholds(mut self, warning: f64, critical: f64) -> Self {
        self.warning = Some(warning);
        self.critical = Some(critical);
        self
    }

    pub fn to_perf_string(&self) -> String {
        // replace `=`
        let label = self.label.replace('=', "_");

        // quote `'`
        let label = label.replace('\'', "''");

        // quote if contains spaces
        let label = if label.contains(' ') {
            format!("'{}'", label)
        } else {
            label
        };

        metric_string!(
            label,
            format!("{:.2}", self.value),
            self.warning.map(|w| w.to_string()).unwrap_or_default(),
            self.critical.map(|c| c.to_string()).unwrap_or_default()
        )
    }
}

/// Runs one complete check: builds the url, fetches it through `fetcher`, aggregates the series
/// and evaluates the thresholds.
///
/// The returned [Resource] carries the verdict; every failure along the way is a [CheckError]
/// which the caller reports as UNKNOWN.
pub fn run_check<F: Fetch + ?Sized>(
    config: &CheckConfig,
    fetcher: &F,
) -> Result<Resource, CheckError> {
    let url = url::render_url(&config.query);
    tracing::debug!(%url, "querying graphite");

    let body = fetcher.fetch(&url)?;
    let total = aggregate::aggregate(body.as_bytes())?;
    let state = config.thresholds.evaluate(total);
    tracing::debug!(total, ?state, direction = ?config.thresholds.direction(), "evaluated");

    let mut resource = Resource::new(&config.name, state).with_description(format!("{:.2}", total));
    if config.perfdata {
        resource = resource.with_metric(
            Metric::new(&config.name, total)
                .with_thresholds(config.thresholds.warning(), config.thresholds.critical()),
        );
    }

    Ok(resource)
}
