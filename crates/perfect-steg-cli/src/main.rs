use clap::Parser;
use perfect_steg_core::StegError;

mod cli;
mod commands;

use cli::{CliArgs, Commands};

pub type CliResult<T> = Result<T, StegError>;

fn main() -> CliResult<()> {
    env_logger::init();

    let args = CliArgs::parse();
    let options = args.extract_options();

    match args.command {
        Commands::Hide(hide) => hide.run(),
        Commands::Extract(extract) => extract.run(options),
        Commands::Check(check) => check.run(options),
        Commands::Test(test) => test.run(),
    }
}
