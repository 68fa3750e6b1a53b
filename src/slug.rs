//! Identifier derivation for entries and headings.
//!
//! Two different normalizations live here:
//!
//! - [`slugify`] turns an entry title into the file stem of its page. It keeps
//!   any Unicode letter or digit after compatibility decomposition, so
//!   non-Latin titles still produce readable slugs.
//! - [`heading_id`] produces the anchor id the markdown adapter assigns to a
//!   heading. It is ASCII-only, the shape most header-id extensions emit.

use unicode_normalization::UnicodeNormalization;

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Derive the URL slug for a title.
///
/// The title is NFKD-decomposed, every run of non-word characters becomes a
/// single `-`, leading and trailing hyphens are dropped and the result is
/// lowercased. Combining marks split off by the decomposition count as
/// non-word characters, so `"Café"` yields `"cafe"` but `"Résumé tips"`
/// yields `"re-sume-tips"`.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut in_gap = false;
    for c in title.nfkd() {
        if is_word(c) {
            if in_gap {
                slug.push('-');
                in_gap = false;
            }
            slug.push(c);
        } else {
            in_gap = true;
        }
    }
    // A leading gap never emitted a hyphen, a trailing one is never flushed.
    slug.trim_matches('-').to_lowercase()
}

/// Derive a heading anchor id from the heading's text.
///
/// Returns an empty string when nothing survives, in which case the heading
/// gets no id at all.
pub fn heading_id(text: &str) -> String {
    let kept: String = text
        .nfkd()
        .filter(|c| c.is_ascii())
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_ascii_whitespace())
        .collect();

    let mut id = String::with_capacity(kept.len());
    let mut separator = false;
    for c in kept.trim().chars() {
        if c == '-' || c.is_ascii_whitespace() {
            if !separator {
                id.push('-');
            }
            separator = true;
        } else {
            separator = false;
            id.push(c.to_ascii_lowercase());
        }
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_basic_title() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
    }

    #[test]
    fn slugify_collapses_runs_and_trims() {
        assert_eq!(slugify("  --Rust & Go: a tale--  "), "rust-go-a-tale");
    }

    #[test]
    fn slugify_keeps_underscore_and_digits() {
        assert_eq!(slugify("snake_case in 2024"), "snake_case-in-2024");
    }

    #[test]
    fn slugify_decomposes_accents() {
        assert_eq!(slugify("Café au lait"), "cafe-au-lait");
        assert_eq!(slugify("Résumé tips"), "re-sume-tips");
    }

    #[test]
    fn slugify_keeps_non_latin_letters() {
        assert_eq!(slugify("Привет мир"), "привет-мир");
    }

    #[test]
    fn slugify_of_punctuation_only_is_empty() {
        assert_eq!(slugify("?!"), "");
    }

    #[test]
    fn heading_id_basic() {
        assert_eq!(heading_id("Getting Started!"), "getting-started");
    }

    #[test]
    fn heading_id_drops_non_ascii() {
        assert_eq!(heading_id("Ünïcode Heading"), "unicode-heading");
        assert_eq!(heading_id("日本語"), "");
    }

    #[test]
    fn heading_id_collapses_hyphens_and_spaces() {
        assert_eq!(heading_id("  A -- B   c "), "a-b-c");
    }

    #[test]
    fn heading_id_keeps_interior_underscore() {
        assert_eq!(heading_id("max_processes option"), "max_processes-option");
    }
}
