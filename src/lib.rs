//! # Simple Press
//!
//! A static site generator for markdown blogs. A directory of markdown posts
//! with a small frontmatter block becomes a complete, deployable site: entry
//! pages, paginated listings, tag pages, Atom feeds, JSON mirrors, a sitemap,
//! an OpenSearch descriptor, a web app manifest and `robots.txt`.
//!
//! # Architecture: Ingest, Assemble, Generate
//!
//! ```text
//! 1. Ingest    posts/*.md  →  Vec<Entry>   (markdown → two rewritten HTML bodies)
//! 2. Assemble  entries     →  Site         (pages, tags, keywords, sitemap)
//! 3. Generate  Site        →  public/      (templates, feeds, JSON, descriptors)
//! ```
//!
//! Every document is rendered twice. The **page** variant keeps heading
//! anchors, interactive playgrounds and embedded widget frames. The **feed**
//! variant is flattened for feed readers: absolute links, plain code blocks
//! for client highlighting, and a manifest of enclosed images. Both variants
//! go through the same rewrite passes in [`rewrite`], which operate on an
//! owned HTML tree ([`html`]) rather than on strings.
//!
//! Ingestion runs on the rayon pool, one document per task. Assembly and
//! generation are single-threaded and deterministic: the same posts always
//! produce byte-identical output.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `config.toml` loading, validation, merging, and the template-facing `Settings` |
//! | [`markdown`] | pulldown-cmark rendering with frontmatter capture and heading ids |
//! | [`html`] | Owned HTML fragment tree: parse, query, mutate, serialize |
//! | [`slug`] | URL slugs for titles and heading anchors |
//! | [`rewrite`] | Content passes: playgrounds, nested quotes, images, anchors, widgets |
//! | [`imaging`] | Image inspection for feed enclosures (dimensions, MIME type, size) |
//! | [`entry`] | Frontmatter validation and per-document ingestion into an `Entry` |
//! | [`scan`] | Source discovery, parallel ingestion, static asset copy |
//! | [`site`] | Sorting, pagination, tag groups, keyword ranking, sitemap paths |
//! | [`templates`] | Maud templates for pages, feeds and descriptors behind the `Theme` trait |
//! | [`generate`] | Writes every output file and reports what was written |
//! | [`pipeline`] | End-to-end build and check orchestration |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Summary Quotes
//!
//! Every post must open its body with a blockquote. Its text becomes the
//! entry's description on listing cards and in feeds. A post without one
//! stops the build before any page is written, so a half-updated site is
//! never deployed.
//!
//! ## Maud Over Template Engines
//!
//! Templates are compiled in with [Maud](https://maud.lambda.xyz/). Interpolation
//! is escaped by default and rewritten bodies are the only pre-escaped content.
//! Alternative layouts plug in through [`templates::Theme`].
//!
//! ## Flat Output
//!
//! Everything lands in a single directory: `{slug}.html`, `{n}.html`,
//! `{tag}.html` and their `.json` and `.xml` siblings. Name collisions between
//! tags, page numbers and slugs are reported as warnings; duplicate slugs are
//! an error.

pub mod config;
pub mod entry;
pub mod generate;
pub mod html;
pub mod imaging;
pub mod markdown;
pub mod output;
pub mod pipeline;
pub mod rewrite;
pub mod scan;
pub mod site;
pub mod slug;
pub mod templates;

#[cfg(test)]
pub(crate) mod test_helpers;
