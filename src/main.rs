use clap::Parser;
use menuwatch::cli::{Cli, Mode};
use menuwatch::config::Config;
use menuwatch::logging;
use menuwatch::monitor;
use menuwatch::notify::{NoopNotifier, Notifier, TelegramNotifier};
use menuwatch::report;
use menuwatch::sync::{GithubSync, NoopSync, RemoteSync};
use menuwatch::util;
use tracing::{error, warn};

fn collaborators(config: &Config) -> (Box<dyn RemoteSync>, Box<dyn Notifier>) {
    if config.offline {
        return (Box::new(NoopSync), Box::new(NoopNotifier));
    }
    (
        Box::new(GithubSync::new(&config.github, config.utc_offset)),
        Box::new(TelegramNotifier::new(&config.telegram)),
    )
}

fn main() {
    // credentials may live in a local .env
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let config = match Config::load(&cli.run) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = logging::init(&config.log_path, config.verbose) {
        warn!(path = %config.log_path.display(), error = %e, "file logging disabled");
    }

    match cli.mode {
        Mode::Monitor => {
            let (sync, notifier) = collaborators(&config);
            let started_at = util::now_at(config.utc_offset);

            match monitor::run(&config, sync.as_ref(), notifier.as_ref(), started_at) {
                Ok(outcome) => report::print(&outcome, &config),
                Err(e) => {
                    error!(error = %e, "monitoring run failed");
                    std::process::exit(1);
                }
            }
        }
    }
}
