use std::ffi::OsString;

use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{Args, Parser, Subcommand};

pub const USAGE: &str = "Usage: croxz-bridge <command> <url>";

#[derive(Debug, Parser)]
#[command(name = "croxz-bridge", author, version, about, disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Inspect the URL only: direct-download classification and tool availability.
    Analyze(UrlArgs),
    /// Extract a single item (direct file or media page).
    Extract(UrlArgs),
    /// Extract in playlist mode, listing entries without resolving them.
    Playlist(UrlArgs),
    /// Report whether the URL can be handled at all.
    Check(UrlArgs),
}

#[derive(Debug, Clone, PartialEq, Eq, Args)]
pub struct UrlArgs {
    /// Direct file URL or media page URL.
    pub url: String,
}

/// Why the command line could not be turned into a `Cli`
#[derive(Debug)]
pub enum ArgsError {
    /// `--help` / `--version`: clap prints these itself, exit 0
    Display(clap::Error),
    /// Anything else: reported as an error JSON object, exit 1
    Invalid(String),
}

impl Cli {
    pub fn parse_args<I, T>(args: I) -> Result<Self, ArgsError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::try_parse_from(args).map_err(ArgsError::from)
    }
}

impl From<clap::Error> for ArgsError {
    fn from(err: clap::Error) -> Self {
        match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ArgsError::Display(err),
            ErrorKind::InvalidSubcommand => match err.get(ContextKind::InvalidSubcommand) {
                Some(ContextValue::String(name)) => {
                    ArgsError::Invalid(format!("Unknown command: {}", name))
                }
                _ => ArgsError::Invalid(USAGE.to_string()),
            },
            _ => ArgsError::Invalid(USAGE.to_string()),
        }
    }
}
