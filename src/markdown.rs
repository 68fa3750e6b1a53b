//! Markdown adapter.
//!
//! Wraps `pulldown-cmark` behind a single [`render`] call that returns both the
//! HTML body and the frontmatter map. Every document is rendered twice with
//! different [`MarkdownOptions`]: once for the site page and once for feeds.
//!
//! Frontmatter is a `---` fenced block of `key: value` lines at the very top of
//! the document. Values stay raw strings; typing happens in
//! [`crate::entry::Frontmatter`].

use crate::slug;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use std::collections::BTreeMap;

/// How fenced code blocks are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeStyle {
    /// Plain `<pre><code>`, language hints dropped. Used for pages, where the
    /// playground pass reads the code text and client-side highlighting runs.
    Preserve,
    /// `<pre><code class="language-x">` so feed readers can highlight.
    Highlight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkdownOptions {
    pub heading_ids: bool,
    pub code_style: CodeStyle,
}

impl MarkdownOptions {
    pub const PAGE: Self = Self {
        heading_ids: true,
        code_style: CodeStyle::Preserve,
    };

    pub const FEED: Self = Self {
        heading_ids: false,
        code_style: CodeStyle::Highlight,
    };
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Rendered {
    pub html: String,
    pub frontmatter: BTreeMap<String, String>,
}

fn parser_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_YAML_STYLE_METADATA_BLOCKS
}

pub fn render(raw: &str, options: &MarkdownOptions) -> Rendered {
    let mut metadata = String::new();
    let mut in_metadata = false;
    let mut events = Vec::new();

    for event in Parser::new_ext(raw, parser_options()) {
        match event {
            Event::Start(Tag::MetadataBlock(_)) => in_metadata = true,
            Event::End(TagEnd::MetadataBlock(_)) => in_metadata = false,
            Event::Text(text) if in_metadata => metadata.push_str(&text),
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_)))
                if options.code_style == CodeStyle::Preserve =>
            {
                events.push(Event::Start(Tag::CodeBlock(CodeBlockKind::Indented)));
            }
            other => events.push(other),
        }
    }

    if options.heading_ids {
        assign_heading_ids(&mut events);
    }

    let mut out = String::with_capacity(raw.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    Rendered {
        html: out,
        frontmatter: parse_frontmatter(&metadata),
    }
}

/// Split a frontmatter block into `key: value` pairs.
///
/// Only the first `:` separates, so timestamps keep their own colons. Blank
/// lines, `#` comments and lines without a colon are ignored.
pub fn parse_frontmatter(block: &str) -> BTreeMap<String, String> {
    block
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .filter_map(|line| {
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), value.trim().to_string()))
        })
        .collect()
}

/// Give every heading without an explicit `{#id}` an id derived from its text.
fn assign_heading_ids(events: &mut [Event<'_>]) {
    for i in 0..events.len() {
        if !matches!(events[i], Event::Start(Tag::Heading { id: None, .. })) {
            continue;
        }
        let id = slug::heading_id(&heading_text(&events[i + 1..]));
        if id.is_empty() {
            continue;
        }
        if let Event::Start(Tag::Heading { id: slot, .. }) = &mut events[i] {
            *slot = Some(CowStr::from(id));
        }
    }
}

fn heading_text(events: &[Event<'_>]) -> String {
    events
        .iter()
        .take_while(|event| !matches!(event, Event::End(TagEnd::Heading(_))))
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text.as_ref()),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "---
title: Hello
published: 2024-01-02T03:04:05
tags: rust, web
---

> The summary.

## Getting Started

```go
fmt.Println(\"hi\")
```
";

    #[test]
    fn frontmatter_is_extracted() {
        let rendered = render(DOC, &MarkdownOptions::PAGE);
        assert_eq!(rendered.frontmatter["title"], "Hello");
        assert_eq!(rendered.frontmatter["published"], "2024-01-02T03:04:05");
        assert_eq!(rendered.frontmatter["tags"], "rust, web");
    }

    #[test]
    fn frontmatter_is_not_rendered() {
        let rendered = render(DOC, &MarkdownOptions::PAGE);
        assert!(!rendered.html.contains("title: Hello"));
        assert!(!rendered.html.contains("<hr"));
    }

    #[test]
    fn page_options_assign_heading_ids() {
        let rendered = render(DOC, &MarkdownOptions::PAGE);
        assert!(rendered.html.contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
    }

    #[test]
    fn feed_options_skip_heading_ids() {
        let rendered = render(DOC, &MarkdownOptions::FEED);
        assert!(rendered.html.contains("<h2>Getting Started</h2>"));
    }

    #[test]
    fn page_options_emit_plain_code_blocks() {
        let rendered = render(DOC, &MarkdownOptions::PAGE);
        assert!(rendered.html.contains("<pre><code>fmt.Println"));
        assert!(!rendered.html.contains("language-go"));
    }

    #[test]
    fn feed_options_keep_language_hint() {
        let rendered = render(DOC, &MarkdownOptions::FEED);
        assert!(rendered.html.contains(r#"<code class="language-go">"#));
    }

    #[test]
    fn explicit_heading_id_is_kept() {
        let rendered = render("# Title {#custom}\n", &MarkdownOptions::PAGE);
        assert!(rendered.html.contains(r#"<h1 id="custom">Title</h1>"#));
    }

    #[test]
    fn duplicate_headings_are_not_deduplicated_here() {
        let rendered = render("## Setup\n\n## Setup\n", &MarkdownOptions::PAGE);
        assert_eq!(rendered.html.matches(r#"id="setup""#).count(), 2);
    }

    #[test]
    fn document_without_frontmatter_has_empty_map() {
        let rendered = render("Just text.\n", &MarkdownOptions::PAGE);
        assert!(rendered.frontmatter.is_empty());
        assert_eq!(rendered.html, "<p>Just text.</p>\n");
    }

    #[test]
    fn parse_frontmatter_splits_on_first_colon() {
        let map = parse_frontmatter("updated: 2024-01-02 10:00:00\n# note: skipped\nnocolon\n");
        assert_eq!(map.len(), 1);
        assert_eq!(map["updated"], "2024-01-02 10:00:00");
    }
}
