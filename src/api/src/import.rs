//! Import of saved pages into the race database

use anyhow::{Context, Result};
use scraper::Html;
use std::path::Path;
use tracing::{info, warn};

use crate::scraper::pages::list_html_files;
use crate::scraper::parsers::{PayoffParser, PedigreeParser, RaceInfoParser, RaceResultParser};
use crate::scraper::PageKind;
use crate::storage::RaceRepository;

/// Outcome of a directory import
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
}

fn file_stem(path: &Path) -> Result<&str> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("No file name in {}", path.display()))
}

fn read_document(path: &Path) -> Result<Html> {
    let html = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Html::parse_document(&html))
}

/// Import one race page (`<race_id>.html`)
pub fn import_race_file(repo: &mut RaceRepository, path: &Path) -> Result<()> {
    let race_id: i64 = file_stem(path)?
        .parse()
        .with_context(|| format!("Race id is not numeric: {}", path.display()))?;

    let document = read_document(path)?;
    let race = RaceInfoParser::build(&document, race_id)?;
    let payoffs = PayoffParser::build(&document, race_id)?;
    let results = RaceResultParser::build(&document, race_id)?;

    repo.import_race(&race, &payoffs, &results)
}

/// Import one pedigree page (`<horse_id>.html`)
pub fn import_horse_file(repo: &mut RaceRepository, path: &Path) -> Result<()> {
    let horse_id = file_stem(path)?;

    let document = read_document(path)?;
    let horses = PedigreeParser::build(&document, horse_id)?;

    repo.upsert_horses(&horses)
}

/// Import every page in a directory. Failing pages are logged and skipped.
pub fn import_dir(repo: &mut RaceRepository, dir: &Path, kind: PageKind) -> Result<ImportSummary> {
    let files = list_html_files(dir)?;
    info!("Importing {} {} pages from {}", files.len(), kind.dir_name(), dir.display());

    let mut summary = ImportSummary::default();
    for path in &files {
        let outcome = match kind {
            PageKind::Race => import_race_file(repo, path),
            PageKind::Horse => import_horse_file(repo, path),
        };

        match outcome {
            Ok(()) => summary.imported += 1,
            Err(e) => {
                warn!("Skipping {}: {:#}", path.display(), e);
                summary.failed += 1;
            }
        }
    }

    info!(
        "Imported {} pages ({} failed)",
        summary.imported, summary.failed
    );
    Ok(summary)
}
