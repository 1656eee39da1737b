//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use economist_audio_core::{EditionDate, Section};

/// Download the Economist audio edition.
///
/// Logs in with your economist.com account, then lists editions and
/// sections or downloads them as zip archives. Without a command, the
/// latest full edition is written to stdout.
#[derive(Parser, Debug)]
#[command(name = "economist-audio")]
#[command(author, version, about)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Account e-mail address
    #[arg(short, long, global = true)]
    pub username: Option<String>,

    /// Account password
    #[arg(short, long, global = true)]
    pub password: Option<String>,

    /// JSON config file
    #[arg(short = 'f', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Outbound proxy (http://, https://, socks5://)
    #[arg(short = 'x', long, global = true, value_name = "URL")]
    pub proxy_url: Option<String>,

    /// User-Agent header to send instead of the default browser one
    #[arg(long, global = true)]
    pub user_agent: Option<String>,

    /// Connect and read timeout in seconds (1-3600); downloads that keep
    /// receiving data are not cut off
    #[arg(long, global = true, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..=3600))]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// The command to run; `download` of the latest edition when none was given.
    #[must_use]
    pub fn effective_command(&self) -> Command {
        self.command
            .clone()
            .unwrap_or_else(|| Command::Download(DownloadArgs::default()))
    }
}

/// Top-level commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download an edition, or one of its sections, as a zip archive
    Download(DownloadArgs),

    /// List the editions published in a year
    ListIssues {
        /// Four-digit year
        year: i32,
    },

    /// List the sections of an edition
    ListIssueSections {
        /// Edition date (YYYY-MM-DD) or `latest`
        issue: EditionDate,
    },
}

/// Arguments for `download`.
#[derive(Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Edition date (YYYY-MM-DD) or `latest`
    #[arg(default_value = "latest")]
    pub issue: EditionDate,

    /// Section number or name; the whole edition when omitted or 0
    #[arg(short, long)]
    pub section: Option<Section>,

    /// Write the zip archive to this file
    #[arg(short, long, value_name = "FILE", conflicts_with = "extract")]
    pub output: Option<PathBuf>,

    /// Extract the zip archive into this directory
    #[arg(short, long, value_name = "DIR")]
    pub extract: Option<PathBuf>,

    /// Extract into a YYYY-MM-DD subdirectory named after the edition
    #[arg(short = 'b', long, requires = "extract")]
    pub subdir: bool,
}

impl DownloadArgs {
    /// Section to download, if any. Section `0` selects the whole edition.
    #[must_use]
    pub fn section(&self) -> Option<&Section> {
        self.section
            .as_ref()
            .filter(|section| **section != Section::Number(0))
    }

    /// Whether the archive goes to stdout.
    #[must_use]
    pub fn writes_to_stdout(&self) -> bool {
        self.output.is_none() && self.extract.is_none()
    }
}

/// Supported log levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    #[value(alias = "verbose")]
    Debug,
    #[value(alias = "silly")]
    Trace,
}

impl LogLevel {
    /// Directive understood by `tracing_subscriber::EnvFilter`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
            Self::Info => "info",
            Self::Debug => "debug",
            Self::Trace => "trace",
        }
    }
}
