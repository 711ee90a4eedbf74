use clap::Parser;
use tracker_metrics::cli::commands;
use tracker_metrics::cli::{Cli, Commands};
use tracker_metrics::config::Config;
use tracker_metrics::logging::init_logging;
use tracker_metrics::MetricsError;

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.verbose, cli.quiet) {
        eprintln!("Failed to initialize logging: {e}");
        // Continue; the reports themselves don't need the subscriber.
    }

    let config = match Config::resolve(cli.data_dir.as_deref()) {
        Ok(config) => config,
        Err(e) => handle_error(&e),
    };

    let result = match cli.command {
        Commands::Fetch(args) => commands::fetch::execute(&args, &config),
        Commands::FetchFixed(args) => commands::fetch_fixed::execute(&args, &config),
        Commands::Populate(args) => commands::populate::execute(&args, &config),
        Commands::Untriaged => commands::untriaged::execute(&config),
        Commands::Fixes(args) => commands::fixes::execute(&args, &config),
        Commands::Commits(args) => commands::commits::execute(&args, &config),
        Commands::Activity(args) => commands::activity::execute(&args, &config),
        Commands::Timestamp => commands::timestamp::execute(&config),
    };

    if let Err(e) = result {
        handle_error(&e);
    }
}

/// Print the error, and a recovery hint when one exists, then exit.
fn handle_error(err: &MetricsError) -> ! {
    eprintln!("Error: {err}");
    if let Some(hint) = err.suggestion() {
        eprintln!("Hint: {hint}");
    }
    std::process::exit(err.exit_code());
}
