use thiserror::Error;

/// Failures while running the check itself. Every one of them ends as an UNKNOWN service state.
#[derive(Debug, Error)]
pub enum CheckError {
    #[error("HTTP error - {0}")]
    Transport(String),
    #[error("JSON parse error")]
    Parse,
    #[error("not enough memory to buffer response ({requested} bytes requested)")]
    Resource { requested: usize },
}

impl From<reqwest::Error> for CheckError {
    fn from(err: reqwest::Error) -> Self {
        CheckError::Transport(error_chain(&err))
    }
}

/// Joins an error and all of its sources with `": "`, skipping causes whose text the message
/// already contains.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();

    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !msg.contains(&cause_msg) {
            msg.push_str(": ");
            msg.push_str(&cause_msg);
        }
        source = cause.source();
    }

    msg
}

impl From<std::io::Error> for CheckError {
    fn from(err: std::io::Error) -> Self {
        CheckError::Transport(err.to_string())
    }
}

/// Reasons the command line could not be turned into a check configuration.
#[derive(Debug, Error)]
pub enum UsageError {
    /// `--help` was requested; not a failure.
    #[error("help requested")]
    Help,
    #[error("{0}")]
    Invalid(String),
    #[error("You must specify {0}")]
    Missing(&'static str),
    #[error("{flag} must be {requirement}")]
    OutOfRange {
        flag: &'static str,
        requirement: &'static str,
    },
}

impl From<clap::Error> for UsageError {
    fn from(err: clap::Error) -> Self {
        use clap::error::ErrorKind;

        match err.kind() {
            ErrorKind::DisplayHelp
            | ErrorKind::DisplayVersion
            | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => UsageError::Help,
            _ => {
                let msg = err.to_string();
                let first = msg.lines().next().unwrap_or_default();
                UsageError::Invalid(first.trim_start_matches("error: ").to_owned())
            }
        }
    }
}

impl UsageError {
    /// Help exits cleanly, every real usage problem exits like a WARNING.
    pub fn exit_code(&self) -> i32 {
        match self {
            UsageError::Help => 0,
            _ => 1,
        }
    }
}
