use std::ffi::OsString;

use clap::{CommandFactory, Parser};

use crate::error::UsageError;
use crate::threshold::Thresholds;
use crate::url::QueryParams;

/// Checks the average of a graphite metric against warning and critical thresholds.
///
/// If the critical threshold is above the warning threshold higher values are worse, otherwise
/// lower values are worse.
#[derive(Debug, Parser)]
#[command(name = "check_graphite", args_override_self = true)]
pub struct Cli {
    /// Descriptive name
    #[arg(short, long, value_name = "NAME", default_value = "value")]
    pub name: String,
    /// Target URL
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,
    /// Metric path string
    #[arg(short, long, value_name = "NAME")]
    pub metric: Option<String>,
    /// Length in minutes of data to parse
    #[arg(
        short,
        long,
        value_name = "LENGTH",
        default_value_t = 5,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub duration: u32,
    /// Warning threshold
    #[arg(short, long, value_name = "VALUE", allow_negative_numbers = true)]
    pub warning: Option<f64>,
    /// Critical threshold
    #[arg(short, long, value_name = "VALUE", allow_negative_numbers = true)]
    pub critical: Option<f64>,
    /// Scale adjustment
    #[arg(
        short,
        long,
        value_name = "VALUE",
        default_value_t = 1.0,
        allow_negative_numbers = true
    )]
    pub scale: f64,
    /// Append performance data to the output
    #[arg(short, long)]
    pub perfdata: bool,
}

/// Validated settings for one check run. Built once from the command line and only read
/// afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct CheckConfig {
    pub name: String,
    pub query: QueryParams,
    pub thresholds: Thresholds,
    pub perfdata: bool,
}

impl TryFrom<Cli> for CheckConfig {
    type Error = UsageError;

    fn try_from(cli: Cli) -> Result<Self, Self::Error> {
        let base_url = required_string(cli.url, "--url")?;
        let target = required_string(cli.metric, "--metric")?;
        let warning = required_bound(cli.warning, "--warning")?;
        let critical = required_bound(cli.critical, "--critical")?;

        if !(cli.scale.is_finite() && cli.scale > 0.0) {
            return Err(UsageError::OutOfRange {
                flag: "--scale",
                requirement: "a positive number",
            });
        }

        Ok(CheckConfig {
            name: cli.name,
            query: QueryParams {
                base_url,
                target,
                from_minutes: cli.duration,
                scale: cli.scale,
            },
            thresholds: Thresholds::new(warning, critical),
            perfdata: cli.perfdata,
        })
    }
}

fn required_string(value: Option<String>, flag: &'static str) -> Result<String, UsageError> {
    value
        .filter(|v| !v.is_empty())
        .ok_or(UsageError::Missing(flag))
}

/// A bound of exactly 0 cannot be told apart from an unset one and is rejected.
fn required_bound(value: Option<f64>, flag: &'static str) -> Result<f64, UsageError> {
    match value {
        None => Err(UsageError::Missing(flag)),
        Some(v) if v == 0.0 => Err(UsageError::Missing(flag)),
        Some(v) if !v.is_finite() => Err(UsageError::OutOfRange {
            flag,
            requirement: "a finite number",
        }),
        Some(v) => Ok(v),
    }
}

/// Parses a full argument list, program name first.
pub fn parse_args<I, T>(args: I) -> Result<CheckConfig, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    CheckConfig::try_from(cli)
}

pub fn help_text() -> String {
    Cli::command().render_help().to_string()
}

/// Reports a usage problem and exits: the reason goes to stderr, the help text to stdout.
pub fn usage_and_exit(err: &UsageError) -> ! {
    if !matches!(err, UsageError::Help) {
        eprintln!("{}", err);
    }
    println!("{}", help_text().trim_end());
    std::process::exit(err.exit_code());
}
