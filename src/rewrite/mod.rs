//! HTML post-processing passes.
//!
//! Every document is rendered twice by the markdown adapter and each rendering
//! goes through an ordered list of passes:
//!
//! | # | Pass | Page | Feed |
//! |---|---|---|---|
//! | 1 | [`playground`] | marker + code → interactive widget | marker → title paragraph |
//! | 2 | [`quotes`] | unwrap nested quotes, mark inner as notes | same |
//! | 3 | [`images`] | local paths, width classes, inline frames | absolute URLs + media manifest |
//! | 4 | [`anchors`] | `rel=noopener`, unique heading bookmarks | absolute `.html` links |
//! | 5 | [`widgets`] | collect widget metadata, add resize handles | – |
//!
//! Order matters: quotes are normalized after the playground pass so only
//! top-level markers are recognized, and widget metadata is read after the
//! image pass has created the inline frame containers.
//!
//! Passes only report anomalies through `tracing::warn!` and keep going. The
//! one fatal condition, a missing summary quote, is checked by the caller
//! before any pass runs.

pub mod anchors;
pub mod images;
pub mod playground;
pub mod quotes;
pub mod widgets;

use crate::html::Fragment;
use std::collections::HashSet;

pub use images::{FeedImage, FeedImageSource};
pub use widgets::WidgetMeta;

/// Container class for frames that sync their route with the page.
pub const ROUTABLE_CLASS: &str = "js-RoutableContent";
/// Container class for frames the reader can resize.
pub const RESIZABLE_CLASS: &str = "js-ResizableContent";
/// Attribute marking frames that take the full content width.
pub const FULLSIZE_ATTR: &str = "data-fullsize";

/// Which rendering of a document a pass is working on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Variant {
    Page,
    Feed,
}

/// Per-document state for the page passes.
///
/// Created fresh for each document and dropped with it, so heading ids only
/// need to be unique within one page.
#[derive(Debug)]
pub struct DocumentContext<'a> {
    pub domain: &'a str,
    heading_ids: HashSet<String>,
}

impl<'a> DocumentContext<'a> {
    pub fn new(domain: &'a str) -> Self {
        Self {
            domain,
            heading_ids: HashSet::new(),
        }
    }

    /// Reserve the bookmark id for a heading: `/{id}`, or `/{id}-1`,
    /// `/{id}-2`, … when an earlier heading already took it.
    pub fn claim_heading_id(&mut self, id: &str) -> String {
        let base = format!("/{id}");
        let mut candidate = base.clone();
        let mut counter = 1;
        while self.heading_ids.contains(&candidate) {
            candidate = format!("{base}-{counter}");
            counter += 1;
        }
        self.heading_ids.insert(candidate.clone());
        candidate
    }
}

/// Facts collected while rewriting the page variant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageOutput {
    pub html: String,
    pub has_playground: bool,
    pub playground_runtime: String,
    pub has_code: bool,
    pub metadata: Vec<WidgetMeta>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedOutput {
    pub html: String,
    pub images: Vec<FeedImage>,
}

pub fn transform_page(mut fragment: Fragment, ctx: &mut DocumentContext<'_>) -> PageOutput {
    let playground = playground::convert(&mut fragment, Variant::Page);
    quotes::normalize_nested(&mut fragment);
    images::rewrite_page(&mut fragment, ctx.domain);
    anchors::rewrite_page(&mut fragment, ctx);
    let metadata = widgets::extract(&mut fragment);
    let has_code = fragment
        .find_all("pre")
        .into_iter()
        .any(|pre| pre.contains("code"));

    PageOutput {
        html: fragment.to_html(),
        has_playground: playground.converted > 0,
        playground_runtime: playground.runtime.unwrap_or_default(),
        has_code,
        metadata,
    }
}

/// Rewrite the feed variant. `images` is `None` when media inspection is
/// disabled, in which case the manifest stays empty.
pub fn transform_feed(
    mut fragment: Fragment,
    domain: &str,
    images: Option<&FeedImageSource<'_>>,
) -> FeedOutput {
    playground::convert(&mut fragment, Variant::Feed);
    quotes::normalize_nested(&mut fragment);
    let manifest = images::rewrite_feed(&mut fragment, domain, images);
    anchors::rewrite_feed(&mut fragment, domain);

    FeedOutput {
        html: fragment.to_html(),
        images: manifest,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heading_ids_are_claimed_in_order() {
        let mut ctx = DocumentContext::new("example.com");
        assert_eq!(ctx.claim_heading_id("setup"), "/setup");
        assert_eq!(ctx.claim_heading_id("setup"), "/setup-1");
        assert_eq!(ctx.claim_heading_id("setup"), "/setup-2");
        assert_eq!(ctx.claim_heading_id("usage"), "/usage");
    }

    #[test]
    fn suffixed_id_already_taken_is_skipped() {
        let mut ctx = DocumentContext::new("example.com");
        assert_eq!(ctx.claim_heading_id("a-1"), "/a-1");
        assert_eq!(ctx.claim_heading_id("a"), "/a");
        assert_eq!(ctx.claim_heading_id("a"), "/a-2");
    }

    #[test]
    fn page_without_code_or_widgets() {
        let mut ctx = DocumentContext::new("example.com");
        let out = transform_page(Fragment::parse("<p>plain</p>"), &mut ctx);
        assert!(!out.has_code);
        assert!(!out.has_playground);
        assert!(out.metadata.is_empty());
        assert_eq!(out.html, "<p>plain</p>");
    }

    #[test]
    fn page_with_code_block_has_code() {
        let mut ctx = DocumentContext::new("example.com");
        let out = transform_page(
            Fragment::parse("<pre><code>let x = 1;\n</code></pre>"),
            &mut ctx,
        );
        assert!(out.has_code);
    }

    #[test]
    fn playground_code_does_not_count_as_code() {
        let html = "<blockquote><p>playground: runtime=go</p></blockquote>\n<pre><code>x\n</code></pre>";
        let mut ctx = DocumentContext::new("example.com");
        let out = transform_page(Fragment::parse(html), &mut ctx);
        assert!(out.has_playground);
        assert_eq!(out.playground_runtime, "go");
        assert!(!out.has_code);
    }

    #[test]
    fn feed_keeps_code_block_after_playground() {
        let html = "<blockquote><p>Playground: title=Try it</p></blockquote>\n<pre><code>x\n</code></pre>";
        let out = transform_feed(Fragment::parse(html), "example.com", None);
        assert!(out.html.contains("<p>Try it</p>"));
        assert!(out.html.contains("<pre><code>x\n</code></pre>"));
        assert!(out.images.is_empty());
    }
}
