use std::path::PathBuf;

use clap::Args;
use perfect_steg_core::ExtractOptions;

use crate::CliResult;

/// Tells whether a carrier holds hidden data, without extracting it
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Carrier image to inspect
    #[arg(short = 'i', long = "in", value_name = "carrier file", required = true)]
    pub carrier: PathBuf,
}

impl CheckArgs {
    pub fn run(self, options: ExtractOptions) -> CliResult<()> {
        match perfect_steg_core::commands::check(&self.carrier, &options)? {
            Some(report) => println!(
                "found {} ({}, {} bytes) by {}{}",
                report.name,
                report.mime_type,
                report.size,
                report.strategy,
                if report.verified { ", checksum verified" } else { "" }
            ),
            None => println!("no hidden data found"),
        }

        Ok(())
    }
}
