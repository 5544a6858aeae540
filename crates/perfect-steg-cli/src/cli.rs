use clap::{Parser, Subcommand};
use perfect_steg_core::ExtractOptions;

use crate::commands::*;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct CliArgs {
    /// Bytes taken from the end of the carrier when nothing else matched
    #[arg(long = "tail-window", value_name = "bytes", global = true)]
    pub tail_window: Option<usize>,

    /// Never guess, only accept data that was found by a structure
    #[arg(long = "no-brute-force", global = true)]
    pub no_brute_force: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl CliArgs {
    pub fn extract_options(&self) -> ExtractOptions {
        let defaults = ExtractOptions::default();
        ExtractOptions {
            tail_window: self.tail_window.unwrap_or(defaults.tail_window),
            brute_force: !self.no_brute_force,
            ..defaults
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Hide(hide::HideArgs),
    Extract(extract::ExtractArgs),
    Check(check::CheckArgs),
    Test(self_test::SelfTestArgs),
}
