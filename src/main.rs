//! xapk CLI - read files out of Android APK expansion files.
//!
//! This is the main entry point for the xapk command-line application.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use xapk::prelude::*;

/// xapk - APK expansion file reader
#[derive(Parser)]
#[command(name = "xapk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    source: SourceArgs,

    /// Log debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Where the expansion files are and which versions to open.
#[derive(Args)]
struct SourceArgs {
    /// JSON configuration file
    #[arg(short, long, global = true, env = "XAPK_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the expansion files
    #[arg(short, long, global = true, env = "XAPK_DIR")]
    dir: Option<PathBuf>,

    /// Application package id
    #[arg(short, long, global = true, env = "XAPK_PACKAGE")]
    package: Option<String>,

    /// Main expansion file version code
    #[arg(long, global = true, env = "XAPK_VERSION")]
    version_code: Option<u32>,

    /// Patch expansion file version code (defaults to the main version code)
    #[arg(long, global = true)]
    patch_version: Option<u32>,

    /// Namespace lookups under the patch file instead of the main file
    #[arg(long, global = true)]
    patch: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one file
    Get {
        /// Logical file name
        file: String,

        /// Output representation: text, raw, binary or data-uri
        #[arg(short, long, default_value = "raw")]
        mode: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List entries in the merged namespace
    List {
        /// Only list entries containing this text (`*` wildcards allowed)
        #[arg(short, long)]
        filter: Option<String>,

        /// Show detailed information
        #[arg(short = 'l', long)]
        detailed: bool,
    },

    /// Show which expansion files were found
    Info,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = load_config(&cli.source)?;

    match cli.command {
        Commands::Get { file, mode, output } => {
            cmd_get(config, &file, &mode, output.as_deref())?;
        }
        Commands::List { filter, detailed } => {
            cmd_list(&config, filter.as_deref(), detailed)?;
        }
        Commands::Info => {
            cmd_info(&config)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "xapk=debug" } else { "xapk=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Config file first, then command-line overrides.
fn load_config(args: &SourceArgs) -> Result<ReaderConfig> {
    let mut config = match &args.config {
        Some(path) => ReaderConfig::from_json_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ReaderConfig::default(),
    };

    if let Some(dir) = &args.dir {
        config.expansion_dir = dir.clone();
    }
    if let Some(package) = &args.package {
        config.package_id = package.clone();
    }
    if let Some(version) = args.version_code {
        config.version_code = version;
    }
    if args.patch_version.is_some() {
        config.patch_version_code = args.patch_version;
    }
    if args.patch {
        config.main_file = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn cmd_get(config: ReaderConfig, file: &str, mode: &str, output: Option<&Path>) -> Result<()> {
    let mode: RepresentationMode = mode.parse().unwrap_or_default();
    let reader = XapkReader::new(config).context("Failed to start reader")?;

    let start = Instant::now();
    let representation = reader
        .get_as(file, mode)
        .wait()
        .with_context(|| format!("Failed to read {}", file))?;
    tracing::info!(
        file,
        %mode,
        bytes = representation.len(),
        elapsed = ?start.elapsed(),
        "read complete"
    );

    match output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, representation.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(representation.as_bytes())?;
            stdout.flush()?;
        }
    }

    Ok(())
}

fn cmd_list(config: &ReaderConfig, filter: Option<&str>, detailed: bool) -> Result<()> {
    let set = open_set(config)?;

    let mut count = 0;
    for (archive, entry) in set.entries() {
        if let Some(pattern) = filter {
            if !glob_match(pattern, entry.name()) {
                continue;
            }
        }

        if detailed {
            let method = match entry.compression_method() {
                Some(method) => format!("{:?}", method),
                None => format!("method {}", entry.method_code()),
            };
            let lock = if entry.is_encrypted() { " (encrypted)" } else { "" };
            println!(
                "{:>12} {:>12} {:08x} {:<9} {}{} [{}]",
                entry.compressed_size(),
                entry.uncompressed_size(),
                entry.crc32(),
                method,
                entry.name(),
                lock,
                archive.name()
            );
        } else {
            println!("{}", entry.name());
        }
        count += 1;
    }

    println!("\nTotal: {} entries", count);

    Ok(())
}

fn cmd_info(config: &ReaderConfig) -> Result<()> {
    let set = open_set(config)?;
    let version = config.version();

    println!("Package:   {}", config.package_id);
    println!("Directory: {}", config.expansion_dir.display());
    println!("Versions:  main {}, patch {}", version.main, version.patch);

    for (kind, archive) in set.archives() {
        println!(
            "{:<6} {} ({} entries, {} bytes)",
            kind,
            archive.path().display(),
            archive.entry_count(),
            archive.file_size()
        );
    }

    let base = config.kind().file_name(version.of(config.kind()), &config.package_id);
    println!("Lookup directory: {}/", xapk::resolve::subdirectory(&base));
    println!("Merged namespace: {} entries", set.entry_count());

    Ok(())
}

fn open_set(config: &ReaderConfig) -> Result<ExpansionSet> {
    let dir = ExpansionDir::new(config.expansion_dir.clone(), config.package_id.clone());
    let version = config.version();

    let start = Instant::now();
    let set = ExpansionSet::open(&dir, version.main, version.patch)
        .context("Failed to open expansion files")?;
    tracing::debug!(entries = set.entry_count(), elapsed = ?start.elapsed(), "expansion files opened");

    Ok(set)
}

/// Simple glob matching for filtering.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern_lower = pattern.to_lowercase();
    let name_lower = name.to_lowercase();

    if !pattern_lower.contains('*') {
        return name_lower.contains(&pattern_lower);
    }

    let parts: Vec<&str> = pattern_lower.split('*').collect();
    let mut pos = 0;

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }

        match name_lower[pos..].find(part) {
            // First part must match at start if there is no leading *
            Some(found) if i == 0 && found != 0 => return false,
            Some(found) => pos += found + part.len(),
            None => return false,
        }
    }

    parts.last().map_or(true, |p| p.is_empty()) || pos == name_lower.len()
}
