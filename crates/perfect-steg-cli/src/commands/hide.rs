use std::path::PathBuf;

use clap::Args;

use crate::CliResult;

/// Hides a file behind a carrier image
#[derive(Args, Debug)]
pub struct HideArgs {
    /// Carrier image such as a PNG or JPEG, used readonly.
    #[arg(short = 'i', long = "in", value_name = "carrier file", required = true)]
    pub carrier: PathBuf,

    /// File to hide behind the carrier
    #[arg(short = 'd', long = "data", value_name = "data file", required = true)]
    pub payload: PathBuf,

    /// Final image will be stored as file
    #[arg(
        short = 'o',
        long = "out",
        value_name = "output image file",
        required = true
    )]
    pub write_to_file: PathBuf,

    /// Payload type stored in the packet, derived from the data file if omitted
    #[arg(short = 't', long = "type", value_name = "type")]
    pub payload_type: Option<String>,
}

impl HideArgs {
    pub fn run(self) -> CliResult<()> {
        perfect_steg_core::commands::hide(
            &self.carrier,
            &self.payload,
            &self.write_to_file,
            self.payload_type,
        )
    }
}
