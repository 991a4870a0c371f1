//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use mediarip_core::ColorMode;

/// Fetch, deduplicate and sort scraped media.
///
/// Mediarip downloads media URLs into a target folder with gapless
/// `image_<N>` names, skips anything already present, and can sort the
/// result into color, greyscale, video and GIF folders.
#[derive(Parser, Debug)]
#[command(name = "mediarip")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Read settings from this TOML file instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Download media URLs (arguments or stdin) into a folder
    Fetch(FetchArgs),
    /// Run filter steps over an existing folder
    Filter(FilterArgs),
    /// Pack a folder's media into <DIR>.zip
    Archive(ArchiveArgs),
    /// Print the effective configuration
    Config,
}

/// Arguments for `mediarip fetch`.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Target folder (created if missing)
    pub dir: PathBuf,

    /// Media URLs; read from stdin when omitted. A trailing `image/...` or
    /// `video/...` token on a line is used as a type hint.
    pub urls: Vec<String>,

    /// Concurrent fetch workers (1-64)
    #[arg(short = 'w', long, value_parser = clap::value_parser!(u8).range(1..=64))]
    pub workers: Option<u8>,

    /// Discard bodies smaller than this many bytes
    #[arg(long, value_name = "BYTES")]
    pub min_bytes: Option<usize>,

    /// Filter selection to run afterwards, e.g. "1,3" or "all"
    #[arg(short = 'f', long, value_name = "SEL")]
    pub filter: Option<String>,

    /// Color routing: both, keep-color-in-place, keep-grey-in-place (or b/c/g)
    #[arg(long, value_name = "MODE")]
    pub color_mode: Option<ColorMode>,

    /// Write <DIR>.zip when done
    #[arg(long)]
    pub zip: bool,

    /// Print a JSON summary on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `mediarip filter`.
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Folder to filter
    pub dir: PathBuf,

    /// Steps: 1 size, 2 duplicates, 3 color, 4 text/QR, 6 media split, 5/all everything
    #[arg(short = 's', long, value_name = "SEL")]
    pub steps: String,

    /// Color routing: both, keep-color-in-place, keep-grey-in-place (or b/c/g)
    #[arg(long, value_name = "MODE")]
    pub color_mode: Option<ColorMode>,

    /// Print a JSON summary on stdout
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `mediarip archive`.
#[derive(Args, Debug, Clone)]
pub struct ArchiveArgs {
    /// Folder to pack
    pub dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_fetch_defaults() {
        let cli = Cli::try_parse_from(["mediarip", "fetch", "pins"]).unwrap();
        assert_eq!(cli.verbose, 0);
        assert!(!cli.quiet);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.dir, PathBuf::from("pins"));
        assert!(args.urls.is_empty());
        assert_eq!(args.workers, None);
        assert!(!args.zip);
    }

    #[test]
    fn test_cli_fetch_all_flags() {
        let cli = Cli::try_parse_from([
            "mediarip",
            "-vv",
            "fetch",
            "pins",
            "https://i.example.com/a.jpg",
            "https://i.example.com/b.jpg",
            "-w",
            "12",
            "--min-bytes",
            "2048",
            "--filter",
            "1,3",
            "--color-mode",
            "g",
            "--zip",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch");
        };
        assert_eq!(args.urls.len(), 2);
        assert_eq!(args.workers, Some(12));
        assert_eq!(args.min_bytes, Some(2048));
        assert_eq!(args.filter.as_deref(), Some("1,3"));
        assert_eq!(args.color_mode, Some(ColorMode::KeepGreyInPlace));
        assert!(args.zip && args.json);
    }

    #[test]
    fn test_cli_workers_out_of_range_rejected() {
        for bad in ["0", "65"] {
            let err = Cli::try_parse_from(["mediarip", "fetch", "pins", "-w", bad]).unwrap_err();
            assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
        }
    }

    #[test]
    fn test_cli_filter_requires_steps() {
        let err = Cli::try_parse_from(["mediarip", "filter", "pins"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::MissingRequiredArgument);

        let cli = Cli::try_parse_from(["mediarip", "filter", "pins", "--steps", "all"]).unwrap();
        assert!(matches!(cli.command, Command::Filter(ref a) if a.steps == "all"));
    }

    #[test]
    fn test_cli_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["mediarip", "archive", "pins", "-q", "--config", "c.toml"]).unwrap();
        assert!(cli.quiet);
        assert_eq!(cli.config, Some(PathBuf::from("c.toml")));
    }

    #[test]
    fn test_cli_subcommand_required() {
        let err = Cli::try_parse_from(["mediarip"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
        );
    }

    #[test]
    fn test_cli_unknown_color_mode_falls_back_to_both() {
        let cli =
            Cli::try_parse_from(["mediarip", "filter", "d", "-s", "3", "--color-mode", "zz"]).unwrap();
        let Command::Filter(args) = cli.command else {
            panic!("expected filter");
        };
        assert_eq!(args.color_mode, Some(ColorMode::Both));
    }
}
