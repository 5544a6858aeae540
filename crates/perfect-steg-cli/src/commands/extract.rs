use std::path::PathBuf;

use clap::Args;
use perfect_steg_core::ExtractOptions;

use crate::CliResult;

/// Extracts a hidden file and restores it into a folder
#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Carrier image that contains hidden data
    #[arg(
        short = 'i',
        long = "in",
        value_name = "carrier file",
        required = true
    )]
    pub carrier: PathBuf,

    /// Final data will be stored in that folder
    #[arg(
        short = 'o',
        long = "out",
        value_name = "output folder",
        required = true
    )]
    pub output_folder: PathBuf,
}

impl ExtractArgs {
    pub fn run(self, options: ExtractOptions) -> CliResult<()> {
        let restored =
            perfect_steg_core::commands::extract(&self.carrier, &self.output_folder, options)?;

        println!(
            "{} ({}, {} bytes)",
            self.output_folder.join(&restored.filename).display(),
            restored.mime_type,
            restored.buffer.len()
        );
        if restored.advisory.is_some() {
            println!("warning: the file changed since it was hidden");
        }

        Ok(())
    }
}
