//! reflectgen CLI entry point.

use clap::error::ErrorKind;
use clap::Parser;
use reflectgen::cli::{self, Cli, Commands, EXIT_FAILURE, EXIT_USAGE};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
                _ => EXIT_USAGE,
            };
            let _ = e.print();
            std::process::exit(code);
        }
    };

    let exit_code = match cli.command {
        Commands::Generate(args) => match cli::run_generate(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_FAILURE
            }
        },
        Commands::Dump(args) => match cli::run_dump(&args) {
            Ok(code) => code,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                EXIT_FAILURE
            }
        },
    };

    std::process::exit(exit_code);
}
