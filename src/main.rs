use clap::Parser;
use tracing_subscriber::EnvFilter;

use pisibot_teleop::config::Config;

fn main() {
    let config = Config::parse();

    // Setup logging (set RUST_LOG=debug to see every frame sent)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = pisibot_teleop::runtime::run(&config) {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
