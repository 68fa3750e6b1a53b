//! Full build orchestration: ingest → assemble → assets → generate.
//!
//! Nothing touches the output directory until every document has been
//! ingested and the site has assembled without error.
//!
//! The CLI and the integration tests both drive builds through here. Paths in
//! the config are used as given, so callers that load a config file should
//! [`rebase`](crate::config::BuildConfig::rebase) it on the file's directory
//! first.

use crate::config::{ConfigError, Settings, SiteConfig};
use crate::entry::Ingestor;
use crate::generate::{self, GenerateError, GenerateReport};
use crate::imaging::{ImageInspector, RustInspector};
use crate::scan::{self, Corpus, ScanError};
use crate::site::{Site, SiteError};
use crate::templates::MaudTheme;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Site(#[from] SiteError),
    #[error(transparent)]
    Generate(#[from] GenerateError),
}

/// Everything a finished build produced.
#[derive(Debug)]
pub struct BuildOutcome {
    pub corpus: Corpus,
    pub report: GenerateReport,
    /// Static asset files copied into the output.
    pub assets_copied: usize,
}

/// Build the site described by `config`, measuring feed images from disk.
pub fn run(config: &SiteConfig) -> Result<BuildOutcome, PipelineError> {
    run_with_inspector(config, &RustInspector::new())
}

/// Build the site with a caller-supplied image inspector.
pub fn run_with_inspector(
    config: &SiteConfig,
    inspector: &dyn ImageInspector,
) -> Result<BuildOutcome, PipelineError> {
    let settings = Settings::from_config(config)?;
    let per_page = config.build.page_size()?;
    let output_dir = config.build.output_dir();

    let image_dir = config.build.image_dir();
    let mut ingestor = Ingestor::new(&settings.domain);
    if !settings.skip_images {
        ingestor = ingestor.with_images(&image_dir, inspector);
    }
    let corpus = scan::scan(&config.build.content, &ingestor)?;

    let (assets_copied, report) = {
        let site = Site::assemble(&corpus.entries, per_page)?;
        let copied = match config.build.assets_dir() {
            Some(src) => scan::copy_assets(&src, &output_dir)?,
            None => 0,
        };
        let report = generate::generate(&site, &settings, &MaudTheme, &output_dir)?;
        (copied, report)
    };
    info!(
        entries = corpus.entries.len(),
        files = report.outputs.len(),
        "build complete"
    );

    Ok(BuildOutcome {
        corpus,
        report,
        assets_copied,
    })
}

/// Ingest and assemble without writing anything.
///
/// Catches the same content errors a build would: bad frontmatter, missing
/// summary quotes, duplicate slugs and unusable tag names. Feed images are
/// not measured.
pub fn check(config: &SiteConfig) -> Result<Corpus, PipelineError> {
    let per_page = config.build.page_size()?;
    let ingestor = Ingestor::new(config.site.domain.trim());
    let corpus = scan::scan(&config.build.content, &ingestor)?;
    Site::assemble(&corpus.entries, per_page)?;
    Ok(corpus)
}
