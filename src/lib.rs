pub mod cli;
pub mod commands;
pub mod config;
pub mod notifications;
pub mod poller;
pub mod state;
pub mod views;
pub mod wallet;

use clap::Parser;

pub use donations_sdk::Network;
pub use state::{AppState, AppStateManager};

/// Install the logger. `RUST_LOG` overrides the defaults.
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(
        env_logger::Env::default()
            .default_filter_or("warn,responsive_donations_lib=info,donations_sdk=info"),
    )
    .format_timestamp_millis()
    .try_init();
}

// ============================================================================
// App Entry Point
// ============================================================================

pub fn run() {
    init_logging();
    let cli = cli::Cli::parse();

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("failed to start async runtime: {e}");
            std::process::exit(1);
        }
    };

    if let Err(message) = runtime.block_on(cli::execute(cli)) {
        eprintln!("{message}");
        std::process::exit(1);
    }
}
