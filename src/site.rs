//! Site aggregation: the sorted corpus → pages, tag groups, keywords and
//! sitemap paths.
//!
//! Everything here is pure and borrows from the entry slice, so the same
//! corpus always yields the same site. [`Site::assemble`] expects the
//! entries already sorted with [`sort_entries`].

use crate::entry::Entry;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::num::NonZeroUsize;
use thiserror::Error;
use tracing::warn;

/// Maximum number of tags offered as listing keywords.
pub const KEYWORD_LIMIT: usize = 20;

#[derive(Error, Debug)]
pub enum SiteError {
    #[error("duplicate slug `{0}`: two entries would write the same page")]
    DuplicateSlug(String),
    #[error("tag `{0}` cannot be used as a file name")]
    InvalidTag(String),
}

/// Canonical corpus order: newest first. Stable, so entries published at the
/// same instant keep their discovery order.
pub fn sort_entries(entries: &mut [Entry]) {
    entries.sort_by(newest_first);
}

/// Ordering behind [`sort_entries`].
pub fn newest_first(a: &Entry, b: &Entry) -> Ordering {
    b.published.cmp(&a.published)
}

/// One listing page.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// 1-based.
    pub number: usize,
    pub entries: &'a [Entry],
    /// A later page exists.
    pub more: bool,
}

/// Split the corpus into fixed-size pages.
pub fn paginate(entries: &[Entry], per_page: NonZeroUsize) -> Vec<Page<'_>> {
    let chunks: Vec<&[Entry]> = entries.chunks(per_page.get()).collect();
    let total = chunks.len();
    chunks
        .into_iter()
        .enumerate()
        .map(|(i, entries)| Page {
            number: i + 1,
            entries,
            more: i + 1 < total,
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct TagGroup<'a> {
    pub name: &'a str,
    /// Members in corpus order.
    pub entries: Vec<&'a Entry>,
}

/// Tag name → member entries. Iteration follows first appearance in the
/// corpus.
#[derive(Debug, Clone, Default)]
pub struct TagIndex<'a> {
    groups: Vec<TagGroup<'a>>,
    positions: HashMap<&'a str, usize>,
}

impl<'a> TagIndex<'a> {
    pub fn build(entries: &'a [Entry]) -> Self {
        let mut index = Self::default();
        for entry in entries {
            for tag in &entry.tags {
                let pos = *index.positions.entry(tag.as_str()).or_insert_with(|| {
                    index.groups.push(TagGroup {
                        name: tag.as_str(),
                        entries: Vec::new(),
                    });
                    index.groups.len() - 1
                });
                let members = &mut index.groups[pos].entries;
                // A tag listed twice on one entry counts once.
                if members.last().is_some_and(|last| std::ptr::eq(*last, entry)) {
                    continue;
                }
                members.push(entry);
            }
        }
        index
    }

    pub fn get(&self, tag: &str) -> Option<&[&'a Entry]> {
        self.positions
            .get(tag)
            .map(|&pos| self.groups[pos].entries.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &TagGroup<'a>> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// The least used tags first, capped at [`KEYWORD_LIMIT`]. Ties keep tag
/// order.
pub fn keyword_ranking<'a>(tags: &TagIndex<'a>) -> Vec<&'a str> {
    let mut groups: Vec<&TagGroup<'a>> = tags.iter().collect();
    groups.sort_by_key(|group| group.entries.len());
    groups
        .into_iter()
        .take(KEYWORD_LIMIT)
        .map(|group| group.name)
        .collect()
}

/// Keywords for a tag page: the tag itself, then the site keywords.
pub fn tag_keywords<'a>(tag: &'a str, keywords: &[&'a str]) -> Vec<&'a str> {
    std::iter::once(tag)
        .chain(keywords.iter().copied().filter(|k| *k != tag))
        .collect()
}

/// Paths (without extension) listed in the sitemap: listing pages after the
/// first, tag pages, then entries.
pub fn sitemap_paths(pages: &[Page<'_>], tags: &TagIndex<'_>, entries: &[Entry]) -> Vec<String> {
    pages
        .iter()
        .skip(1)
        .map(|page| page.number.to_string())
        .chain(tags.iter().map(|group| group.name.to_string()))
        .chain(entries.iter().map(|entry| entry.slug.clone()))
        .collect()
}

fn check_unique_slugs(entries: &[Entry]) -> Result<(), SiteError> {
    let mut seen = HashSet::new();
    for entry in entries {
        if !seen.insert(entry.slug.as_str()) {
            return Err(SiteError::DuplicateSlug(entry.slug.clone()));
        }
    }
    Ok(())
}

/// Tags name files in the output directory, so they must stay a single,
/// visible path component.
fn check_tag_names(tags: &TagIndex<'_>) -> Result<(), SiteError> {
    match tags
        .iter()
        .find(|group| group.name.contains(['/', '\\']) || group.name.starts_with('.'))
    {
        Some(group) => Err(SiteError::InvalidTag(group.name.to_string())),
        None => Ok(()),
    }
}

/// Tag pages share the output directory with entries and listing pages.
fn warn_on_name_collisions(tags: &TagIndex<'_>, entries: &[Entry], pages: &[Page<'_>]) {
    let slugs: HashSet<&str> = entries.iter().map(|e| e.slug.as_str()).collect();
    for group in tags.iter() {
        let is_page_number = group
            .name
            .parse::<usize>()
            .is_ok_and(|n| n >= 1 && n <= pages.len());
        if slugs.contains(group.name) || is_page_number || group.name == "index" {
            warn!(tag = group.name, "tag page name collides with another page; the later write wins");
        }
    }
}

/// Everything the emission stage needs, derived from the sorted corpus.
#[derive(Debug, Clone)]
pub struct Site<'a> {
    pub entries: &'a [Entry],
    pub pages: Vec<Page<'a>>,
    pub tags: TagIndex<'a>,
    pub keywords: Vec<&'a str>,
    pub sitemap: Vec<String>,
}

impl<'a> Site<'a> {
    pub fn assemble(entries: &'a [Entry], per_page: NonZeroUsize) -> Result<Self, SiteError> {
        check_unique_slugs(entries)?;

        let pages = paginate(entries, per_page);
        let tags = TagIndex::build(entries);
        check_tag_names(&tags)?;
        warn_on_name_collisions(&tags, entries, &pages);
        let keywords = keyword_ranking(&tags);
        let sitemap = sitemap_paths(&pages, &tags, entries);

        Ok(Self {
            entries,
            pages,
            tags,
            keywords,
            sitemap,
        })
    }

    /// The index page: page 1, with `more` when there is a page 2.
    pub fn index(&self) -> Page<'a> {
        self.pages.first().copied().unwrap_or(Page {
            number: 1,
            entries: &[],
            more: false,
        })
    }
}
