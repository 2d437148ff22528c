mod cli;
mod config;
mod console;
mod error;
mod logbook;
mod model;
mod naming;
mod pipeline;
mod runlog;
mod runner;
mod suppress;
mod tracker;

use clap::Parser;

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();
    if let Err(e) = cli::run(args).await {
        console::print_error(&format!("Simulation failed: {e:#}"));
        std::process::exit(1);
    }
}
