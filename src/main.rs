use clap::Parser;
use tracing_subscriber::EnvFilter;

use workshop_mapper::config::Cli;
use workshop_mapper::orchestrator;

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("workshop_mapper=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(err) = orchestrator::run(cli) {
        eprintln!("fatal: {err}");
        std::process::exit(1);
    }
}
