//! Ignite Gym CLI binary entry point.

use clap::Parser;
use ignite_gym::cli::Cli;

#[tokio::main]
async fn main() {
    ignite_gym::cli::init_tracing();
    let cli = Cli::parse();

    if let Err(e) = ignite_gym::cli::run(cli).await {
        eprintln!("Error: {}", e.message());
        if e.ends_session() {
            eprintln!("Please sign in again: ignite-gym auth login");
        }
        std::process::exit(1);
    }
}
