//! dirdat - catalog a directory tree into a checksummed DAT file.
//!
//! Usage:
//!   dirdat SOURCE OUTPUT [NAME]         Catalog SOURCE into OUTPUT
//!   dirdat SOURCE OUTPUT --game-depth 2 Use second-level folders as games
//!   dirdat SOURCE OUTPUT -i             Prompt for header fields
//!   dirdat --help                       Show help

mod progress;
mod prompt;

use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{ArgAction, Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::info;
use tracing_subscriber::EnvFilter;

use dirdat_core::{DatHeader, ForcePacking, LooseFilePolicy, RunConfig, ScanError};
use dirdat_scan::{
    CancellationToken, Cataloger, Inventory, InventoryScanner, NoProgress, ProgressObserver,
};
use dirdat_xml::DatDocument;

use progress::{PlainReporter, TerminalReporter, format_size, scan_spinner};

/// Exit status after a user interrupt.
const EXIT_INTERRUPTED: u8 = 130;

#[derive(Parser)]
#[command(
    name = "dirdat",
    about = "Catalog a directory tree into a checksummed DAT file",
    long_about = "dirdat walks SOURCE, computes CRC-32, MD5 and SHA-1 for every file \
                  and writes a Logiqx-style DAT to OUTPUT.\n\n\
                  Folders at --game-depth become games; folders above it become dirs. \
                  The DAT is written even when the run is interrupted.",
    disable_version_flag = true
)]
struct Cli {
    /// Directory to catalog
    source: PathBuf,

    /// DAT file to write
    output: PathBuf,

    /// DAT name (same as --name)
    #[arg(value_name = "NAME")]
    dat_name: Option<String>,

    /// DAT name
    #[arg(long)]
    name: Option<String>,

    /// DAT description
    #[arg(long)]
    description: Option<String>,

    /// DAT category
    #[arg(long)]
    category: Option<String>,

    /// DAT version
    #[arg(long)]
    version: Option<String>,

    /// DAT date, YYYY-MM-DD (defaults to today)
    #[arg(long)]
    date: Option<String>,

    /// DAT author
    #[arg(long)]
    author: Option<String>,

    /// DAT comment
    #[arg(long)]
    comment: Option<String>,

    /// DAT homepage
    #[arg(long)]
    url: Option<String>,

    /// Add a RomVault forcepacking marker to the header
    #[arg(long, value_enum)]
    forcepacking: Option<PackingArg>,

    /// Folder level that becomes a game (0 = one game for everything)
    #[arg(long = "game-depth", value_name = "N", default_value_t = 1)]
    game_depth: usize,

    /// How to group files that sit directly at the game level
    #[arg(long = "loose-files", value_enum, default_value_t = LooseArg::Strip)]
    loose_files: LooseArg,

    /// Strip the extension from loose files' game names (default)
    #[arg(long = "strip-ext", conflicts_with = "no_strip_ext")]
    strip_ext: bool,

    /// Keep the extension in loose files' game names
    #[arg(long = "no-strip-ext")]
    no_strip_ext: bool,

    /// Prompt for header fields that were not given
    #[arg(short, long)]
    interactive: bool,

    /// Don't show progress
    #[arg(short, long)]
    quiet: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PackingArg {
    #[value(name = "fileonly")]
    FileOnly,
    Archive,
    Split,
}

impl From<PackingArg> for ForcePacking {
    fn from(arg: PackingArg) -> Self {
        match arg {
            PackingArg::FileOnly => Self::FileOnly,
            PackingArg::Archive => Self::Archive,
            PackingArg::Split => Self::Split,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LooseArg {
    Strip,
    Parent,
}

impl From<LooseArg> for LooseFilePolicy {
    fn from(arg: LooseArg) -> Self {
        match arg {
            LooseArg::Strip => Self::Strip,
            LooseArg::Parent => Self::Parent,
        }
    }
}

impl Cli {
    /// Header fields given on the command line.
    fn header(&self) -> DatHeader {
        DatHeader {
            name: self.name.clone().or_else(|| self.dat_name.clone()),
            description: self.description.clone(),
            category: self.category.clone(),
            version: self.version.clone(),
            date: self.date.clone(),
            author: self.author.clone(),
            comment: self.comment.clone(),
            url: self.url.clone(),
        }
        .normalized()
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut header = cli.header();
    let mut force_packing = cli.forcepacking.map(ForcePacking::from);
    if cli.interactive {
        prompt::fill_header(&mut header, &mut force_packing)?;
    }

    let config = RunConfig::builder()
        .source(cli.source.clone())
        .output(cli.output.clone())
        .header(header.normalized())
        .force_packing(force_packing)
        .fold_depth(cli.game_depth)
        .loose_files(LooseFilePolicy::from(cli.loose_files))
        .strip_extension(cli.strip_ext || !cli.no_strip_ext)
        .build()
        .wrap_err("Invalid configuration")?;

    let inventory = scan(&config.source, cli.quiet).await?;
    eprintln!(
        "Found {} files ({}) – hashing …",
        inventory.len(),
        format_size(inventory.total_bytes)
    );

    catalog(config, inventory, cli.quiet).await
}

/// Install the stderr log subscriber.
///
/// `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Enumerate the source tree, with a spinner on interactive terminals.
async fn scan(source: &Path, quiet: bool) -> Result<Inventory> {
    let scanner = InventoryScanner::new();
    let mut rx = scanner.subscribe();

    let spinner = (!quiet && std::io::stderr().is_terminal()).then(scan_spinner);
    let watcher = spinner.clone().map(|pb| {
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(progress) => pb.set_message(format!(
                        "Scanning… {} files, {}",
                        progress.files_found,
                        format_size(progress.bytes_found)
                    )),
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
        })
    });

    let root = source.to_path_buf();
    let result = tokio::task::spawn_blocking(move || scanner.scan(&root))
        .await
        .wrap_err("Scan task failed")?;

    if let Some(watcher) = watcher {
        let _ = watcher.await;
    }
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }

    result.wrap_err_with(|| format!("Cannot scan {}", source.display()))
}

/// Hash every file, write the DAT and pick the exit status.
async fn catalog(config: RunConfig, inventory: Inventory, quiet: bool) -> Result<ExitCode> {
    let cancel = CancellationToken::new();
    let interrupt = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let mut observer: Box<dyn ProgressObserver + Send> = if quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(TerminalReporter::new(inventory.total_bytes))
    } else {
        Box::new(PlainReporter::new(std::io::stderr()))
    };

    let cataloger = Cataloger::new(config.clone()).with_cancel(cancel);
    let outcome =
        tokio::task::spawn_blocking(move || cataloger.build(&inventory, observer.as_mut()))
            .await
            .wrap_err("Hashing task failed")?;
    interrupt.abort();

    DatDocument::from_config(&config, &outcome.tree)
        .save(&config.output)
        .wrap_err("Failed to write DAT")?;

    info!(
        files = outcome.progress.files_done,
        bytes = outcome.progress.bytes_done,
        secs = outcome.duration.as_secs_f64(),
        "run finished"
    );

    let output = config.output.display();
    match outcome.error {
        None => {
            println!("DAT written to {output}");
            Ok(ExitCode::SUCCESS)
        }
        Some(ScanError::Interrupted) => {
            eprintln!("\nInterrupted by user.");
            eprintln!("Partial DAT written to {output}");
            Ok(ExitCode::from(EXIT_INTERRUPTED))
        }
        Some(err) => {
            eprintln!(
                "Partial DAT written to {output} ({} of {} files)",
                outcome.progress.files_done, outcome.progress.files_total
            );
            Err(err).wrap_err("Cataloging stopped early")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("dirdat").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_positional_name_is_shorthand() {
        let cli = parse(&["src", "out.dat", "My Set"]);
        assert_eq!(cli.header().name.as_deref(), Some("My Set"));
    }

    #[test]
    fn test_name_flag_wins_over_positional() {
        let cli = parse(&["src", "out.dat", "Positional", "--name", "Flag"]);
        assert_eq!(cli.header().name.as_deref(), Some("Flag"));
    }

    #[test]
    fn test_blank_header_fields_are_unset() {
        let cli = parse(&["src", "out.dat", "--author", "  ", "--version", "1.0"]);
        let header = cli.header();
        assert_eq!(header.author, None);
        assert_eq!(header.version.as_deref(), Some("1.0"));
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&["src", "out.dat"]);
        assert_eq!(cli.game_depth, 1);
        assert!(matches!(cli.loose_files, LooseArg::Strip));
        assert!(!cli.no_strip_ext);
        assert!(cli.forcepacking.is_none());
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_enum_values() {
        let cli = parse(&[
            "src",
            "out.dat",
            "--forcepacking",
            "fileonly",
            "--loose-files",
            "parent",
            "--game-depth",
            "3",
        ]);
        assert!(matches!(
            cli.forcepacking.map(ForcePacking::from),
            Some(ForcePacking::FileOnly)
        ));
        assert!(matches!(
            LooseFilePolicy::from(cli.loose_files),
            LooseFilePolicy::Parent
        ));
        assert_eq!(cli.game_depth, 3);
    }

    #[test]
    fn test_strip_flags_conflict() {
        let result =
            Cli::try_parse_from(["dirdat", "src", "out", "--strip-ext", "--no-strip-ext"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_verbose_counts() {
        let cli = parse(&["-vv", "src", "out.dat"]);
        assert_eq!(cli.verbose, 2);
    }
}
