//! Source discovery and parallel ingestion.
//!
//! First stage of the build. Expands the content glob, ingests every document
//! on the rayon pool and returns the corpus sorted newest first.
//!
//! ## Layout
//!
//! ```text
//! site/
//! ├── config.toml
//! ├── posts/                 # build.content = "posts/*.md"
//! │   ├── hello-world.md
//! │   └── playgrounds.md
//! └── assets/                # build.assets, copied once the site assembles
//!     ├── styles.css
//!     └── images/
//!         └── chart-300.png  # referenced as ./images/chart-300.png
//! ```
//!
//! ## Failure policy
//!
//! Any document that fails to ingest (unreadable, bad frontmatter, missing
//! summary quote) aborts the scan. Nothing has been written to the output at
//! that point.

use crate::entry::{Entry, IngestError, Ingestor};
use crate::site;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid content pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("Unreadable content path: {0}")]
    Glob(#[from] glob::GlobError),
    #[error("Asset copy failed: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("{}: {source}", .path.display())]
    Document {
        path: PathBuf,
        #[source]
        source: IngestError,
    },
}

/// Ingested entries plus the files they came from.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    /// Source file of each entry, index-aligned with `entries`.
    pub sources: Vec<PathBuf>,
    /// Entries sorted newest first.
    pub entries: Vec<Entry>,
}

/// Source files matching `pattern`, sorted by path.
pub fn discover(pattern: &str) -> Result<Vec<PathBuf>, ScanError> {
    let mut files = glob::glob(pattern)?.collect::<Result<Vec<_>, _>>()?;
    files.retain(|path| path.is_file());
    files.sort();
    Ok(files)
}

/// Ingest every file matching `pattern`. Runs on the current rayon pool.
pub fn scan(pattern: &str, ingestor: &Ingestor<'_>) -> Result<Corpus, ScanError> {
    let files = discover(pattern)?;
    info!(count = files.len(), pattern, "discovered sources");

    let mut ingested = files
        .into_par_iter()
        .map(|path| match ingestor.ingest_file(&path) {
            Ok(entry) => Ok((path, entry)),
            Err(source) => Err(ScanError::Document { path, source }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    ingested.sort_by(|(_, a), (_, b)| site::newest_first(a, b));

    let (sources, entries) = ingested.into_iter().unzip();
    Ok(Corpus { sources, entries })
}

/// Copy a static asset tree into `dst`, preserving layout. Returns the number
/// of files copied.
pub fn copy_assets(src: &Path, dst: &Path) -> Result<usize, ScanError> {
    let mut copied = 0;
    for item in WalkDir::new(src).sort_by_file_name() {
        let item = item?;
        let Ok(rel) = item.path().strip_prefix(src) else {
            continue;
        };
        let target = dst.join(rel);
        if item.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            fs::copy(item.path(), &target)?;
            debug!(path = %target.display(), "copied asset");
            copied += 1;
        }
    }
    info!(count = copied, src = %src.display(), "assets copied");
    Ok(copied)
}
