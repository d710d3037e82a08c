//! CLI for assembling a service deck (and the hymn report) from an archival
//! corpus of presentation files.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hymn_compose::{Composer, ComposerConfig};
use hymn_core::heuristic::TitleOptions;
use hymn_core::ServiceRequest;
use hymn_corpus::{CorpusIndex, IndexOptions};
use hymn_report::{build_report, CuratedTitles};
use std::fs;
use std::path::PathBuf;

/// Assemble church service decks from archival presentation files.
#[derive(Parser, Debug)]
#[command(name = "hymn-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a service deck from a request file.
    Generate {
        /// Request file (identifier|SectionLabel|optionalTitle per line)
        #[arg(short, long)]
        batch: PathBuf,

        /// Corpus root directories, highest priority first
        #[arg(short, long = "root", required = true)]
        roots: Vec<PathBuf>,

        /// Output .pptx path
        #[arg(short, long)]
        output: PathBuf,

        /// Fixed Communion image inserted on the first Communion entry
        #[arg(long)]
        communion_image: Option<PathBuf>,

        /// QR code image inserted on every Offertory entry
        #[arg(long)]
        qr_image: Option<PathBuf>,

        /// Caption printed under the QR code
        #[arg(long)]
        qr_caption: Option<String>,

        /// Service date; overrides the request file's `# Date:` line
        #[arg(long)]
        date: Option<String>,

        /// Minimum combined length of a two-word derived title
        #[arg(long, default_value = "6")]
        title_min_len: usize,
    },

    /// Extract every hymn in the corpus into an XLSX report.
    Report {
        /// Corpus root directories, highest priority first
        #[arg(short, long = "root", required = true)]
        roots: Vec<PathBuf>,

        /// Output .xlsx path
        #[arg(short, long)]
        output: PathBuf,

        /// Curated hymn-number to title JSON mapping for the third view
        #[arg(long)]
        mapping: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.command {
        Command::Generate {
            batch,
            roots,
            output,
            communion_image,
            qr_image,
            qr_caption,
            date,
            title_min_len,
        } => generate(
            batch,
            roots,
            output,
            communion_image,
            qr_image,
            qr_caption,
            date,
            title_min_len,
        ),
        Command::Report {
            roots,
            output,
            mapping,
        } => report(roots, output, mapping),
    }
}

#[allow(clippy::too_many_arguments)]
fn generate(
    batch: PathBuf,
    roots: Vec<PathBuf>,
    output: PathBuf,
    communion_image: Option<PathBuf>,
    qr_image: Option<PathBuf>,
    qr_caption: Option<String>,
    date: Option<String>,
    title_min_len: usize,
) -> Result<()> {
    log::debug!("Reading request file {}", batch.display());
    let text = fs::read_to_string(&batch)
        .with_context(|| format!("Failed to read request file {}", batch.display()))?;
    let mut request = ServiceRequest::parse(&text)
        .with_context(|| format!("Invalid request file {}", batch.display()))?;
    if date.is_some() {
        request.service_date = date;
    }

    eprintln!("Indexing corpus ({} root(s))...", roots.len());
    let title_options = TitleOptions::default().with_min_len(title_min_len);
    let index_options = IndexOptions {
        title: title_options.clone(),
        ..IndexOptions::default()
    };
    let index = CorpusIndex::build(&roots, &index_options).context("Corpus indexing failed")?;
    eprintln!(
        "Indexed {} hymn occurrence(s) from {} file(s)",
        index.len(),
        index.files_scanned()
    );

    let config = ComposerConfig {
        communion_image,
        qr_image,
        qr_caption,
        title: title_options,
        ..ComposerConfig::default()
    };
    let composer = Composer::new(&index, config);
    let composition = composer
        .compose_request(&request)
        .context("Deck composition failed")?;

    for line in composition.log.lines() {
        eprintln!("  {line}");
    }

    fs::write(&output, &composition.deck)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!(
        "Deck written to {} ({} entries)",
        output.display(),
        composition.summary.len()
    );

    let missing = composition.summary.iter().filter(|s| !s.found).count();
    if missing > 0 {
        eprintln!("Warning: {missing} entr{} had no corpus match", if missing == 1 { "y" } else { "ies" });
    }

    Ok(())
}

fn report(roots: Vec<PathBuf>, output: PathBuf, mapping: Option<PathBuf>) -> Result<()> {
    eprintln!("Indexing corpus ({} root(s))...", roots.len());
    let index = CorpusIndex::build(&roots, &IndexOptions::default())
        .context("Corpus indexing failed")?;
    eprintln!(
        "Indexed {} hymn occurrence(s) from {} file(s)",
        index.len(),
        index.files_scanned()
    );

    let curated = match mapping {
        Some(path) => Some(
            CuratedTitles::load(&path)
                .with_context(|| format!("Failed to load mapping {}", path.display()))?,
        ),
        None => None,
    };

    let bytes = build_report(&index, curated.as_ref()).context("Report build failed")?;
    fs::write(&output, bytes)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    eprintln!("Report written to {}", output.display());

    Ok(())
}
