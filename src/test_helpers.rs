//! Shared test utilities for the simple-press test suite.
//!
//! Provides source-document and entry builders plus a fixture copier, so
//! unit tests can exercise ingestion, assembly and rendering without
//! repeating boilerplate.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let raw = document("Hello", "2024-01-02", "rust, web", "> Summary.\n");
//! let entry = Ingestor::new("example.com").ingest(&raw).unwrap();
//!
//! let site_entries = vec![entry("a", "2024-03-01", &["rust"])];
//! let tmp = setup_fixtures();
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::config::Settings;
use crate::entry::{Entry, parse_timestamp};

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/` to a temp directory and return it.
///
/// Tests get an isolated copy they can mutate without affecting other tests
/// or the source fixtures.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Builders
// =========================================================================

/// A source document with every required frontmatter field.
///
/// `published` and `updated` are both set to `date`; the meta description is
/// derived from the title.
pub fn document(title: &str, date: &str, tags: &str, body: &str) -> String {
    format!(
        "---\ntitle: {title}\ndescription: Short description of {title}\n\
         published: {date}\nupdated: {date}\ntags: {tags}\n---\n\n{body}"
    )
}

/// An already-ingested entry. `slug` doubles as the title.
pub fn entry(slug: &str, date: &str, tags: &[&str]) -> Entry {
    let published = parse_timestamp("published", date)
        .unwrap_or_else(|e| panic!("bad test date '{date}': {e}"));
    Entry {
        slug: slug.to_string(),
        title: slug.to_string(),
        cover_title: slug.to_string(),
        description: format!("Summary of {slug}"),
        short_description: String::new(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        published,
        updated: published,
        body: format!("<p>{slug}</p>"),
        body_feed: format!("<p>{slug}</p>"),
        images: Vec::new(),
        metadata: Vec::new(),
        has_playground: false,
        has_code: false,
        playground_runtime: String::new(),
        link: format!("https://example.com/{slug}.html"),
    }
}

/// Rendering settings for `example.com` with every feature enabled.
pub fn settings() -> Settings {
    Settings {
        site_name: "Example".into(),
        title: "Example".into(),
        description: String::new(),
        domain: "example.com".into(),
        author: String::new(),
        author_name: String::new(),
        email: String::new(),
        ga_id: String::new(),
        cover_images: false,
        comments: false,
        styles_id: String::new(),
        locale: "en_US".into(),
        debug: false,
        skip_feeds: false,
        skip_json: false,
        skip_images: false,
    }
}
