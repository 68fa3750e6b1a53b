//! Site emission.
//!
//! Final stage of the build. Takes the assembled [`Site`] and writes every
//! output file through a [`Theme`].
//!
//! ## Output Structure
//!
//! ```text
//! public/
//! ├── {slug}.html / {slug}.json     # One per entry (JSON carries the feed body)
//! ├── 1.html … N.html / .json       # Listing pages
//! ├── index.html / index.json       # Same entries as page 1
//! ├── {tag}.html / {tag}.json       # One per tag
//! ├── feed.xml                      # Atom feed of page 1
//! ├── {tag}.xml                     # Atom feed per tag
//! ├── sitemap.xml
//! ├── opensearch.xml
//! ├── manifest.webmanifest
//! └── robots.txt
//! ```
//!
//! JSON siblings are skipped with `features.skip_json`, feeds with
//! `features.skip_feeds`. Emission is sequential and in corpus order, so a
//! later write of the same file name wins.

use crate::config::Settings;
use crate::entry::{Entry, EntryJson};
use crate::site::{self, Page, Site};
use crate::templates::{RenderError, Theme, View};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Render error: {0}")]
    Render(#[from] RenderError),
}

const ROBOTS_TXT: &str = "User-agent: *\nAllow: /\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputKind {
    Entry,
    Listing,
    Index,
    Tag,
    Feed,
    Json,
    Sitemap,
    OpenSearch,
    Manifest,
    Robots,
}

impl OutputKind {
    pub fn label(&self) -> &'static str {
        match self {
            OutputKind::Entry => "entry",
            OutputKind::Listing => "page",
            OutputKind::Index => "index",
            OutputKind::Tag => "tag",
            OutputKind::Feed => "feed",
            OutputKind::Json => "json",
            OutputKind::Sitemap => "sitemap",
            OutputKind::OpenSearch => "opensearch",
            OutputKind::Manifest => "manifest",
            OutputKind::Robots => "robots",
        }
    }
}

/// A file written by [`generate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    pub kind: OutputKind,
    pub path: PathBuf,
}

/// Every file written, in write order.
#[derive(Debug, Clone, Default)]
pub struct GenerateReport {
    pub outputs: Vec<Output>,
}

impl GenerateReport {
    pub fn count(&self, kind: OutputKind) -> usize {
        self.outputs.iter().filter(|o| o.kind == kind).count()
    }
}

#[derive(Serialize)]
struct EntriesJson<'a> {
    entries: Vec<EntryJson<'a>>,
}

struct Emitter<'a, T: Theme + ?Sized> {
    settings: &'a Settings,
    theme: &'a T,
    output_dir: &'a Path,
    report: GenerateReport,
}

impl<T: Theme + ?Sized> Emitter<'_, T> {
    fn write(&mut self, kind: OutputKind, name: &str, bytes: &[u8]) -> Result<(), GenerateError> {
        let path = self.output_dir.join(name);
        fs::write(&path, bytes)?;
        debug!(path = %path.display(), kind = kind.label(), "wrote");
        self.report.outputs.push(Output { kind, path });
        Ok(())
    }

    fn render(&mut self, kind: OutputKind, name: &str, view: &View<'_>) -> Result<(), GenerateError> {
        let bytes = self.theme.render(view, self.settings)?;
        self.write(kind, name, &bytes)
    }

    /// `{stem}.json` holding the given entries, unless JSON is disabled.
    fn json<'e>(
        &mut self,
        stem: &str,
        entries: impl IntoIterator<Item = &'e Entry>,
        include_body: bool,
    ) -> Result<(), GenerateError> {
        if self.settings.skip_json {
            return Ok(());
        }
        let doc = EntriesJson {
            entries: entries
                .into_iter()
                .map(|entry| entry.to_json(include_body))
                .collect(),
        };
        let bytes = serde_json::to_vec(&doc)?;
        self.write(OutputKind::Json, &format!("{stem}.json"), &bytes)
    }

    fn listing(&mut self, kind: OutputKind, stem: &str, page: &Page<'_>, keywords: &[&str]) -> Result<(), GenerateError> {
        let entries: Vec<&Entry> = page.entries.iter().collect();
        let view = View::Listing {
            entries: &entries,
            page: page.number,
            more: page.more,
            keywords,
        };
        self.render(kind, &format!("{stem}.html"), &view)?;
        self.json(stem, page.entries, false)
    }
}

/// Write the whole site into `output_dir`.
pub fn generate<T: Theme + ?Sized>(
    site: &Site<'_>,
    settings: &Settings,
    theme: &T,
    output_dir: &Path,
) -> Result<GenerateReport, GenerateError> {
    fs::create_dir_all(output_dir)?;
    let mut out = Emitter {
        settings,
        theme,
        output_dir,
        report: GenerateReport::default(),
    };

    for entry in site.entries {
        let widgets = entry.widget_ids();
        out.render(
            OutputKind::Entry,
            &format!("{}.html", entry.slug),
            &View::Entry {
                entry,
                widgets: &widgets,
            },
        )?;
        out.json(&entry.slug, [entry], true)?;
    }
    info!(count = site.entries.len(), "entries written");

    for page in &site.pages {
        out.listing(OutputKind::Listing, &page.number.to_string(), page, &site.keywords)?;
    }
    out.listing(OutputKind::Index, "index", &site.index(), &site.keywords)?;
    info!(count = site.pages.len(), "listing pages written");

    for group in site.tags.iter() {
        let keywords = site::tag_keywords(group.name, &site.keywords);
        out.render(
            OutputKind::Tag,
            &format!("{}.html", group.name),
            &View::Tag {
                tag: group.name,
                entries: &group.entries,
                keywords: &keywords,
            },
        )?;
        out.json(group.name, group.entries.iter().copied(), false)?;
    }
    info!(count = site.tags.len(), "tag pages written");

    if !settings.skip_feeds {
        let index: Vec<&Entry> = site.index().entries.iter().collect();
        out.render(
            OutputKind::Feed,
            "feed.xml",
            &View::Feed {
                tag: None,
                entries: &index,
            },
        )?;
        for group in site.tags.iter() {
            out.render(
                OutputKind::Feed,
                &format!("{}.xml", group.name),
                &View::Feed {
                    tag: Some(group.name),
                    entries: &group.entries,
                },
            )?;
        }
    }

    out.render(OutputKind::OpenSearch, "opensearch.xml", &View::OpenSearch)?;
    out.render(
        OutputKind::Sitemap,
        "sitemap.xml",
        &View::Sitemap {
            paths: &site.sitemap,
        },
    )?;
    out.render(OutputKind::Manifest, "manifest.webmanifest", &View::Manifest)?;
    out.write(OutputKind::Robots, "robots.txt", ROBOTS_TXT.as_bytes())?;

    info!(files = out.report.outputs.len(), dir = %output_dir.display(), "site generated");
    Ok(out.report)
}
