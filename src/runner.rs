use std::fmt::Display;

use crate::{Resource, ServiceState};

/// Runs a check closure and turns its error into a service state.
///
/// By default every error is reported as [ServiceState::Unknown], [Runner::on_error] lets the
/// caller pick a different state.
pub struct Runner<E> {
    name: String,
    on_error: Option<Box<dyn FnOnce(&E) -> ServiceState>>,
}

impl<E: Display> Runner<E> {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            on_error: None,
        }
    }

    pub fn on_error(mut self, f: impl FnOnce(&E) -> ServiceState + 'static) -> Self {
        self.on_error = Some(Box::new(f));
        self
    }

    pub fn safe_run(self, f: impl FnOnce() -> Result<Resource, E>) -> RunnerResult<E> {
        match f() {
            Ok(resource) => RunnerResult::Ok(resource),
            Err(err) => {
                let state = self
                    .on_error
                    .map(|f| f(&err))
                    .unwrap_or(ServiceState::Unknown);

                RunnerResult::Err {
                    name: self.name,
                    state,
                    error: err,
                }
            }
        }
    }
}

pub enum RunnerResult<E> {
    Ok(Resource),
    Err {
        name: String,
        state: ServiceState,
        error: E,
    },
}

impl<E: Display> RunnerResult<E> {
    /// The line to print: stdout for a result, stderr for an error.
    pub fn message(&self) -> String {
        match self {
            RunnerResult::Ok(resource) => resource.to_nagios_string(),
            RunnerResult::Err { name, state, error } => format!("{} {}: {}", name, state, error),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            RunnerResult::Ok(resource) => resource.exit_code(),
            RunnerResult::Err { state, .. } => state.exit_code(),
        }
    }

    pub fn print_and_exit(self) -> ! {
        if let RunnerResult::Ok(resource) = &self {
            resource.print_and_exit();
        }

        eprintln!("{}", self.message());
        std::process::exit(self.exit_code());
    }
}
