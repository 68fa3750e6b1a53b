//! Entry ingestion and assembly.
//!
//! One markdown source document becomes one [`Entry`]:
//!
//! ```text
//! source.md ──► markdown::render (page options) ──► Fragment ──► page passes ──┐
//!           └─► markdown::render (feed options) ──► Fragment ──► feed passes ──┤
//!               frontmatter ──► Frontmatter::from_map ─────────────────────────┴─► Entry
//! ```
//!
//! The first top-level quote block of the page rendering is the entry's
//! summary. A document without one is rejected with
//! [`IngestError::MissingSummary`]; that error aborts the whole build.

use crate::html::Fragment;
use crate::imaging::ImageInspector;
use crate::markdown::{self, MarkdownOptions};
use crate::rewrite::{self, DocumentContext, FeedImage, FeedImageSource, FeedOutput, PageOutput, WidgetMeta};
use crate::slug;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("missing required frontmatter field `{0}`")]
    MissingField(&'static str),
    #[error("invalid {field} timestamp `{value}`: expected an ISO-8601 date or date-time")]
    DateFormat { field: &'static str, value: String },
    #[error("missing summary: the document must contain a top-level quote block")]
    MissingSummary,
    #[error("title `{0}` has no characters usable in a page name")]
    EmptySlug(String),
}

/// Validated frontmatter.
#[derive(Debug, Clone, PartialEq)]
pub struct Frontmatter {
    pub title: String,
    pub cover_title: Option<String>,
    pub description: String,
    pub published: DateTime<FixedOffset>,
    pub updated: DateTime<FixedOffset>,
    pub tags: Vec<String>,
}

impl Frontmatter {
    pub fn from_map(map: &BTreeMap<String, String>) -> Result<Self, IngestError> {
        let required = |key: &'static str| {
            map.get(key)
                .map(String::as_str)
                .ok_or(IngestError::MissingField(key))
        };

        let title = required("title")?;
        if slug::slugify(title).is_empty() {
            return Err(IngestError::EmptySlug(title.to_string()));
        }

        Ok(Self {
            title: title.to_string(),
            cover_title: map.get("cover_title").filter(|c| !c.is_empty()).cloned(),
            description: required("description")?.to_string(),
            published: parse_timestamp("published", required("published")?)?,
            updated: parse_timestamp("updated", required("updated")?)?,
            tags: parse_tags(required("tags")?),
        })
    }
}

/// Comma separated tag list; names are trimmed and empty names dropped.
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 timestamp. Values without an offset are taken as UTC.
pub fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> Result<DateTime<FixedOffset>, IngestError> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt);
    }
    if let Ok(dt) = DateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Ok(dt);
    }
    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc().fixed_offset());
    }
    Err(IngestError::DateFormat {
        field,
        value: value.to_string(),
    })
}

/// A fully processed source document.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub slug: String,
    pub title: String,
    /// Title used on listing cards; defaults to `title`.
    pub cover_title: String,
    /// Text of the summary quote.
    pub description: String,
    /// Frontmatter `description`, used for meta tags.
    pub short_description: String,
    pub tags: Vec<String>,
    pub published: DateTime<FixedOffset>,
    pub updated: DateTime<FixedOffset>,
    /// Page variant body.
    pub body: String,
    /// Feed variant body.
    pub body_feed: String,
    pub images: Vec<FeedImage>,
    pub metadata: Vec<WidgetMeta>,
    pub has_playground: bool,
    pub has_code: bool,
    pub playground_runtime: String,
    pub link: String,
}

/// Widget ids grouped by behavior, as the entry template consumes them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WidgetIds {
    pub resizable: Vec<String>,
    /// Ids of the routed frames themselves (`{id}-iframe`).
    pub router: Vec<String>,
    pub fullsize: Vec<String>,
}

/// The JSON sibling record of an entry.
#[derive(Debug, Serialize)]
pub struct EntryJson<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub description: &'a str,
    pub images: &'a [FeedImage],
    pub published: String,
    pub updated: String,
    pub tags: &'a [String],
    pub link: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<&'a str>,
}

impl Entry {
    /// Combine validated metadata with both rewritten bodies.
    pub fn assemble(
        domain: &str,
        meta: Frontmatter,
        description: String,
        page: PageOutput,
        feed: FeedOutput,
    ) -> Self {
        let slug = slug::slugify(&meta.title);
        let link = format!("https://{domain}/{slug}.html");
        Self {
            cover_title: meta.cover_title.unwrap_or_else(|| meta.title.clone()),
            slug,
            title: meta.title,
            description,
            short_description: meta.description,
            tags: meta.tags,
            published: meta.published,
            updated: meta.updated,
            body: page.html,
            body_feed: feed.html,
            images: feed.images,
            metadata: page.metadata,
            has_playground: page.has_playground,
            has_code: page.has_code,
            playground_runtime: page.playground_runtime,
            link,
        }
    }

    pub fn to_json(&self, include_body: bool) -> EntryJson<'_> {
        EntryJson {
            slug: &self.slug,
            title: &self.title,
            description: &self.description,
            images: &self.images,
            published: self.published.to_rfc3339(),
            updated: self.updated.to_rfc3339(),
            tags: &self.tags,
            link: &self.link,
            body: include_body.then_some(self.body_feed.as_str()),
        }
    }

    pub fn widget_ids(&self) -> WidgetIds {
        let mut ids = WidgetIds::default();
        for widget in &self.metadata {
            if widget.resize {
                ids.resizable.push(widget.id.clone());
            }
            if widget.route {
                ids.router.push(format!("{}-iframe", widget.id));
            }
            if widget.full_size {
                ids.fullsize.push(widget.id.clone());
            }
        }
        ids
    }
}

/// Turns source documents into entries. Shared read-only across the
/// ingestion thread pool.
pub struct Ingestor<'a> {
    domain: &'a str,
    images: Option<FeedImageSource<'a>>,
}

impl<'a> Ingestor<'a> {
    pub fn new(domain: &'a str) -> Self {
        Self {
            domain,
            images: None,
        }
    }

    /// Measure feed images found in `dir`. Without this the feed media
    /// manifest stays empty.
    pub fn with_images(mut self, dir: &'a Path, inspector: &'a dyn ImageInspector) -> Self {
        self.images = Some(FeedImageSource { dir, inspector });
        self
    }

    pub fn ingest_file(&self, path: &Path) -> Result<Entry, IngestError> {
        debug!(path = %path.display(), "ingesting");
        let raw = fs::read_to_string(path)?;
        self.ingest(&raw)
    }

    pub fn ingest(&self, raw: &str) -> Result<Entry, IngestError> {
        let page = markdown::render(raw, &MarkdownOptions::PAGE);
        let meta = Frontmatter::from_map(&page.frontmatter)?;

        let page_tree = Fragment::parse(&page.html);
        let description = page_tree
            .top_level()
            .find(|el| el.is("blockquote"))
            .map(|quote| quote.text().trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or(IngestError::MissingSummary)?;

        let mut ctx = DocumentContext::new(self.domain);
        let page_out = rewrite::transform_page(page_tree, &mut ctx);

        let feed = markdown::render(raw, &MarkdownOptions::FEED);
        let feed_out = rewrite::transform_feed(
            Fragment::parse(&feed.html),
            self.domain,
            self.images.as_ref(),
        );

        Ok(Entry::assemble(self.domain, meta, description, page_out, feed_out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::MockInspector;
    use crate::test_helpers::document;
    use tempfile::TempDir;

    const DOMAIN: &str = "example.com";

    #[test]
    fn ingests_minimal_document() {
        let raw = document("Hello World", "2024-01-02T03:04:05", "rust, web", "> The summary.\n\nBody text.\n");
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();

        assert_eq!(entry.slug, "hello-world");
        assert_eq!(entry.link, "https://example.com/hello-world.html");
        assert_eq!(entry.title, "Hello World");
        assert_eq!(entry.cover_title, "Hello World");
        assert_eq!(entry.description, "The summary.");
        assert_eq!(entry.short_description, "Short description of Hello World");
        assert_eq!(entry.tags, vec!["rust", "web"]);
        assert_eq!(entry.published.to_rfc3339(), "2024-01-02T03:04:05+00:00");
        assert!(entry.body.contains("<p>Body text.</p>"));
        assert!(entry.body_feed.contains("<p>Body text.</p>"));
        assert!(!entry.has_playground);
        assert!(!entry.has_code);
    }

    #[test]
    fn missing_summary_is_fatal() {
        let raw = document("No Summary", "2024-01-02", "x", "Just a paragraph.\n");
        let err = Ingestor::new(DOMAIN).ingest(&raw).unwrap_err();
        assert!(matches!(err, IngestError::MissingSummary));
    }

    #[test]
    fn punctuation_only_title_is_rejected() {
        let raw = document("?!", "2024-01-02", "x", "> s\n");
        let err = Ingestor::new(DOMAIN).ingest(&raw).unwrap_err();
        assert!(matches!(err, IngestError::EmptySlug(ref t) if t == "?!"));
    }

    #[test]
    fn missing_field_is_reported() {
        let raw = "---\ntitle: T\n---\n\n> s\n";
        let err = Ingestor::new(DOMAIN).ingest(raw).unwrap_err();
        assert!(matches!(err, IngestError::MissingField("description")));
    }

    #[test]
    fn bad_timestamp_is_reported() {
        let raw = document("T", "yesterday", "x", "> s\n");
        let err = Ingestor::new(DOMAIN).ingest(&raw).unwrap_err();
        assert!(
            matches!(err, IngestError::DateFormat { field: "published", ref value } if value == "yesterday")
        );
    }

    #[test]
    fn timestamp_forms() {
        let utc = |v| parse_timestamp("published", v).unwrap().to_rfc3339();
        assert_eq!(utc("2024-01-02"), "2024-01-02T00:00:00+00:00");
        assert_eq!(utc("2024-01-02 10:20:30"), "2024-01-02T10:20:30+00:00");
        assert_eq!(utc("2024-01-02T10:20:30.5"), "2024-01-02T10:20:30.500+00:00");
        assert_eq!(utc("2024-01-02T10:20:30+02:00"), "2024-01-02T10:20:30+02:00");
        assert_eq!(utc("2024-01-02T10:20"), "2024-01-02T10:20:00+00:00");
    }

    #[test]
    fn tags_are_trimmed_and_empty_names_dropped() {
        assert_eq!(parse_tags(" rust ,, web ,"), vec!["rust", "web"]);
        assert!(parse_tags("").is_empty());
    }

    #[test]
    fn cover_title_overrides() {
        let raw = document("Long Title", "2024-01-02", "x", "> s\n")
            .replacen("---\n", "---\ncover_title: Short\n", 1);
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();
        assert_eq!(entry.cover_title, "Short");
    }

    #[test]
    fn playground_document() {
        let body = "> Summary.\n\n> Playground: runtime=go; title=Demo\n\n```go\nfmt.Println(1)\n```\n\n```sh\nls\n```\n";
        let raw = document("Play", "2024-01-02", "go", body);
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();

        assert!(entry.has_playground);
        assert_eq!(entry.playground_runtime, "go");
        assert!(entry.has_code, "the second code block is untouched");
        assert!(entry.body.contains("Playground-Details"));
        assert!(entry.body.contains(">fmt.Println(1)\n</textarea>"));
        assert!(entry.body_feed.contains("<p>Demo</p>"));
        assert!(entry.body_feed.contains(r#"<code class="language-go">fmt.Println(1)"#));
    }

    #[test]
    fn summary_quote_stays_in_body() {
        let raw = document("T", "2024-01-02", "x", "> Summary here.\n\nText.\n");
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();
        assert!(entry.body.contains("<blockquote>"));
        assert_eq!(entry.description, "Summary here.");
    }

    #[test]
    fn headings_become_unique_bookmarks() {
        let raw = document("T", "2024-01-02", "x", "> s\n\n## Setup\n\n## Setup\n");
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();
        assert!(entry.body.contains(r#"id="/setup""#));
        assert!(entry.body.contains(r#"id="/setup-1""#));
        assert!(!entry.body_feed.contains("id="));
    }

    #[test]
    fn frame_widgets_are_recorded() {
        let raw = document(
            "T",
            "2024-01-02",
            "x",
            "> s\n\n[![Counter](./counter.png)](/wr/counter.html)\n\n[![Full](./full.png)](/f/full.html)\n",
        );
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();
        let ids = entry.widget_ids();
        assert_eq!(ids.resizable, vec!["counter"]);
        assert_eq!(ids.router, vec!["counter-iframe"]);
        assert_eq!(ids.fullsize, vec!["full"]);
        assert!(entry.body.contains("js-ResizableContent__handle"));
    }

    #[test]
    fn feed_images_are_collected_with_inspector() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("plot-120.png"), b"png").unwrap();
        let inspector = MockInspector::new().with_image("plot-120.png", 120, 80);
        let ingestor = Ingestor::new(DOMAIN).with_images(tmp.path(), &inspector);

        let raw = document("T", "2024-01-02", "x", "> s\n\n![Plot](./images/plot-120.png)\n");
        let entry = ingestor.ingest(&raw).unwrap();
        assert_eq!(entry.images.len(), 1);
        assert_eq!(entry.images[0].title, "Plot");
        assert!(entry.body.contains(r#"src="/images/plot-120.png""#));
        assert!(entry.body_feed.contains(r#"src="https://example.com/images/plot-120.png""#));
    }

    #[test]
    fn json_record_includes_body_on_request() {
        let raw = document("Json", "2024-01-02", "a, b", "> s\n\nText.\n");
        let entry = Ingestor::new(DOMAIN).ingest(&raw).unwrap();

        let with_body = serde_json::to_value(entry.to_json(true)).unwrap();
        assert_eq!(with_body["slug"], "json");
        assert_eq!(with_body["published"], "2024-01-02T00:00:00+00:00");
        assert_eq!(with_body["tags"], serde_json::json!(["a", "b"]));
        assert_eq!(with_body["body"], entry.body_feed.as_str());

        let without = serde_json::to_value(entry.to_json(false)).unwrap();
        assert!(without.get("body").is_none());
    }

    #[test]
    fn ingest_file_reads_from_disk() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("post.md");
        std::fs::write(&path, document("From Disk", "2024-01-02", "x", "> s\n")).unwrap();
        let entry = Ingestor::new(DOMAIN).ingest_file(&path).unwrap();
        assert_eq!(entry.slug, "from-disk");

        let err = Ingestor::new(DOMAIN)
            .ingest_file(&tmp.path().join("missing.md"))
            .unwrap_err();
        assert!(matches!(err, IngestError::Io(_)));
    }
}
