use clap::Parser;

use crate::{
    cli_interface::{Commands, CLI},
    commands::{explain::handle_explain_command, run::handle_run_command},
};

mod cli_interface;
mod commands;
mod console;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = CLI::parse();

    match cli.command {
        Commands::Run(args) => {
            if args.verbose {
                bulk_update::setup_logger(bulk_update::LevelFilter::DEBUG);
            } else {
                bulk_update::setup_info_logger();
            }
            handle_run_command(args).await
        }
        Commands::Explain(args) => handle_explain_command(args),
    }
}
