//! Link and heading anchor rewriting.

use super::DocumentContext;
use crate::html::{Element, Fragment};

pub const BOOKMARK_CLASS: &str = "js-Bookmark";

/// Feed readers resolve links against the feed URL, so site-relative page
/// links are made absolute.
pub fn rewrite_feed(fragment: &mut Fragment, domain: &str) {
    fragment.for_each_element_mut(&mut |el| {
        if !el.is("a") {
            return;
        }
        let absolute = el
            .attr("href")
            .filter(|href| href.starts_with('/') && href.ends_with(".html"))
            .map(|href| format!("https://{domain}{href}"));
        if let Some(href) = absolute {
            el.set_attr("href", &href);
        }
    });
}

/// Page links and heading bookmarks.
///
/// Links leaving the page get `rel="noopener"`. `h1`–`h3` with an id become
/// bookmarks: the id is rewritten to a unique `/{id}` and an empty self-link
/// is appended so the stylesheet can show a permalink marker. `h4` and `h5`
/// lose their ids.
pub fn rewrite_page(fragment: &mut Fragment, ctx: &mut DocumentContext<'_>) {
    fragment.for_each_element_mut(&mut |el| {
        if !el.is("a") {
            return;
        }
        let leaves_page = el
            .attr("href")
            .is_some_and(|href| !(href.starts_with('#') || href.ends_with(".html")));
        if leaves_page {
            el.set_attr("rel", "noopener");
        }
    });

    fragment.for_each_element_mut(&mut |el| match el.name.as_str() {
        "h1" | "h2" | "h3" => {
            let Some(id) = el.attr("id").filter(|id| !id.is_empty()).map(str::to_string) else {
                return;
            };
            let bookmark = ctx.claim_heading_id(&id);
            el.set_attr("id", &bookmark);
            el.children.push(
                Element::new("a")
                    .with_attr("href", &format!("#{bookmark}"))
                    .into(),
            );
            el.add_class(BOOKMARK_CLASS);
        }
        "h4" | "h5" => {
            el.remove_attr("id");
        }
        _ => {}
    });
}
