use clap::CommandFactory;
use tracing_subscriber::EnvFilter;

use check_graphite::cli::{self, Cli};
use check_graphite::config_generator::print_icinga_command_config_if_env_and_exit;
use check_graphite::{run_check, HttpFetcher, Runner, ServiceState};

fn main() {
    // stdout belongs to the plugin line
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = print_icinga_command_config_if_env_and_exit("graphite", &Cli::command()) {
        eprintln!("UNKNOWN: {}", e);
        std::process::exit(ServiceState::Unknown.exit_code());
    }

    let config = match cli::parse_args(std::env::args_os()) {
        Ok(config) => config,
        Err(err) => cli::usage_and_exit(&err),
    };

    Runner::new(&config.name)
        .safe_run(|| {
            let fetcher = HttpFetcher::new()?;
            run_check(&config, &fetcher)
        })
        .print_and_exit()
}
