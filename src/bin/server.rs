//! Travigo assistant webhook server.
//! Run with: cargo run --bin travigo-assistant

use std::process::ExitCode;

use travigo_assistant::start_assistant;

fn main() -> ExitCode {
    start_assistant::run()
}
