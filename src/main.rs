#![warn(clippy::all)]
#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

use sql_query_runner::{Arguments, QueryRunnerApp};
use tracing::error;

/*
cargo fmt
cargo test -- --nocapture
cargo test -- --show-output tests_runner
cargo run -- --help
cargo run -- --table orders --delay-ms 0
cargo doc --open
cargo b -r && cargo install --path=.
*/

#[cfg(not(target_arch = "wasm32"))]
fn main() -> eframe::Result<()> {
    // Initialize the tracing subscriber for logging.
    // Use RUST_LOG environment variable to set logging level.  eg `export RUST_LOG=info`
    tracing_subscriber::fmt::init();

    // Parse command-line arguments.
    let args = Arguments::build();

    // Configure the native options for the eframe application.
    let native_options = eframe::NativeOptions {
        centered: true,
        persist_window: true,
        vsync: true,
        viewport: egui::ViewportBuilder::default(),
        ..Default::default()
    };

    // Run the eframe application.
    eframe::run_native(
        "SQL Query Runner",
        native_options,
        Box::new(move |creation_context| {
            // RUST_LOG=debug cargo run
            tracing::debug!("main()\nArguments: {args:#?}");

            match QueryRunnerApp::new(creation_context, args) {
                Ok(app) => Ok(Box::new(app)),
                Err(err) => {
                    error!("Failed to initialize QueryRunnerApp: {}", err); //Log
                    panic!("Failed to initialize QueryRunnerApp: {err}"); //Panic
                }
            }
        }),
    )
}
