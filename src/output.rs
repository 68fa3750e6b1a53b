//! CLI output formatting for builds and checks.
//!
//! Output is **information-centric, not file-centric**. Each entry is shown by
//! its position and title, with the source file and the page it becomes as
//! indented context lines.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! Entries
//! 001 Images and Frames (2024-03-01)
//!     Source: posts/images.md
//!     Page: images-and-frames.html
//!     Tags: images
//!     Summary: How pictures and embedded widgets are laid out.
//! 002 Playgrounds (2024-02-10)
//!     Source: posts/playgrounds.md
//!     Page: playgrounds.html
//!     Tags: go, writing
//!     Playground: go
//!
//! 2 entries, 3 tags
//! ```
//!
//! ## Generate
//!
//! ```text
//! Written
//!     entry: 2
//!     page: 1
//!     index: 1
//!     ...
//! Generated 14 files
//! ```
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure.

use crate::generate::{GenerateReport, OutputKind};
use crate::scan::Corpus;
use std::collections::BTreeSet;
use std::path::Path;

const SUMMARY_WIDTH: usize = 72;

const KIND_ORDER: [OutputKind; 10] = [
    OutputKind::Entry,
    OutputKind::Listing,
    OutputKind::Index,
    OutputKind::Tag,
    OutputKind::Feed,
    OutputKind::Json,
    OutputKind::Sitemap,
    OutputKind::OpenSearch,
    OutputKind::Manifest,
    OutputKind::Robots,
];

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Truncate text to `max` characters, appending `...` if truncated.
fn truncate_desc(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

fn counted(n: usize, one: &str, many: &str) -> String {
    format!("{n} {}", if n == 1 { one } else { many })
}

/// Path shown relative to `root` when it lies inside it.
fn display_path(path: &Path, root: Option<&Path>) -> String {
    root.and_then(|root| path.strip_prefix(root).ok())
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Scan
// ============================================================================

/// Inventory of an ingested corpus, newest first.
pub fn format_scan_output(corpus: &Corpus, root: Option<&Path>) -> Vec<String> {
    let mut lines = Vec::new();
    let tags: BTreeSet<&str> = corpus
        .entries
        .iter()
        .flat_map(|e| e.tags.iter().map(String::as_str))
        .collect();

    if !corpus.entries.is_empty() {
        lines.push("Entries".to_string());
    }
    for (i, entry) in corpus.entries.iter().enumerate() {
        lines.push(format!(
            "{} {} ({})",
            format_index(i + 1),
            entry.title,
            entry.published.format("%Y-%m-%d")
        ));
        let context = indent(1);
        if let Some(source) = corpus.sources.get(i) {
            lines.push(format!("{context}Source: {}", display_path(source, root)));
        }
        lines.push(format!("{context}Page: {}.html", entry.slug));
        if !entry.tags.is_empty() {
            lines.push(format!("{context}Tags: {}", entry.tags.join(", ")));
        }
        lines.push(format!(
            "{context}Summary: {}",
            truncate_desc(&entry.description, SUMMARY_WIDTH)
        ));
        if entry.has_playground {
            let runtime = if entry.playground_runtime.is_empty() {
                "default"
            } else {
                entry.playground_runtime.as_str()
            };
            lines.push(format!("{context}Playground: {runtime}"));
        }
        if !entry.metadata.is_empty() {
            let ids: Vec<&str> = entry.metadata.iter().map(|m| m.id.as_str()).collect();
            lines.push(format!("{context}Widgets: {}", ids.join(", ")));
        }
    }

    if !lines.is_empty() {
        lines.push(String::new());
    }
    lines.push(format!(
        "{}, {}",
        counted(corpus.entries.len(), "entry", "entries"),
        counted(tags.len(), "tag", "tags")
    ));
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(corpus: &Corpus, root: Option<&Path>) {
    for line in format_scan_output(corpus, root) {
        println!("{}", line);
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Per-kind file counts for a finished generate run.
pub fn format_generate_output(report: &GenerateReport) -> Vec<String> {
    let mut lines = vec!["Written".to_string()];
    for kind in KIND_ORDER {
        let count = report.count(kind);
        if count > 0 {
            lines.push(format!("{}{}: {}", indent(1), kind.label(), count));
        }
    }
    lines.push(format!("Generated {}", counted(report.outputs.len(), "file", "files")));
    lines
}

/// Print generate output to stdout.
pub fn print_generate_output(report: &GenerateReport) {
    for line in format_generate_output(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Tests
// ============================================================================
