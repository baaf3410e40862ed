//! CLI argument definitions for the cartridge converter.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;

#[derive(Parser)]
#[command(
    name = "cc-converter",
    version,
    about = "Convert Common Cartridge course packages into Word documents",
    long_about = "Convert IMS Common Cartridge packages into a folder tree that mirrors the\n\
                  course organization.\n\n\
                  QTI assessments become a student document and an answer key; every other\n\
                  resource file is copied alongside. A hierarchy.json index is written at\n\
                  the output root."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Convert a cartridge, a directory of cartridges, or a QTI file.
    Convert(ConvertArgs),

    /// List the assessments found in a cartridge.
    Assessments(AssessmentsArgs),
}

#[derive(Parser)]
pub struct ConvertArgs {
    /// A `.imscc` cartridge, a directory of cartridges, or a QTI `.xml` file.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Output directory (default: <INPUT>/output for a directory,
    /// otherwise a folder named after the input next to it).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// JSON object mapping source font families to replacements.
    #[arg(long = "font-map", value_name = "PATH")]
    pub font_map: Option<PathBuf>,

    /// Convert at most this many assessments per cartridge.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,

    /// Do not draw a progress bar.
    #[arg(long = "no-progress")]
    pub no_progress: bool,
}

#[derive(Parser)]
pub struct AssessmentsArgs {
    /// Path to the `.imscc` cartridge.
    #[arg(value_name = "CARTRIDGE")]
    pub cartridge: PathBuf,

    /// List at most this many assessments.
    #[arg(long = "limit", value_name = "N")]
    pub limit: Option<usize>,
}

/// CLI log level choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_convert_with_options() {
        let cli = Cli::try_parse_from([
            "cc-converter",
            "convert",
            "course.imscc",
            "--output-dir",
            "out",
            "--font-map",
            "fonts.json",
            "--limit",
            "3",
            "--log-format",
            "json",
        ])
        .expect("parse");
        assert_eq!(cli.log_format, LogFormatArg::Json);
        let Command::Convert(args) = cli.command else {
            panic!("expected convert");
        };
        assert_eq!(args.input, PathBuf::from("course.imscc"));
        assert_eq!(args.output_dir, Some(PathBuf::from("out")));
        assert_eq!(args.font_map, Some(PathBuf::from("fonts.json")));
        assert_eq!(args.limit, Some(3));
        assert!(!args.no_progress);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "cc-converter",
            "assessments",
            "course.imscc",
            "--log-level",
            "debug",
        ])
        .expect("parse");
        assert_eq!(cli.log_level, Some(LogLevelArg::Debug));
        assert!(matches!(cli.command, Command::Assessments(_)));
    }

    #[test]
    fn rejects_bad_limit() {
        assert!(Cli::try_parse_from(["cc-converter", "convert", "x.imscc", "--limit", "many"]).is_err());
    }
}
