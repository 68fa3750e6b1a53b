//! Nested quote normalization.
//!
//! Authors write side notes as a quote inside a quote (`> > note`). The outer
//! quote is dropped one level and each inner quote is tagged `class="note"`
//! so the stylesheet can render it as an aside.

use crate::html::{Fragment, Node};

pub const NOTE_CLASS: &str = "note";

pub fn normalize_nested(fragment: &mut Fragment) {
    unwrap_in(&mut fragment.nodes);
}

fn has_nested_quote(node: &Node) -> bool {
    node.as_element()
        .is_some_and(|el| el.is("blockquote") && el.elements().any(|c| c.is("blockquote")))
}

fn unwrap_in(nodes: &mut Vec<Node>) {
    let mut i = 0;
    while i < nodes.len() {
        if has_nested_quote(&nodes[i]) {
            let mut children = match &mut nodes[i] {
                Node::Element(el) => std::mem::take(&mut el.children),
                _ => Vec::new(),
            };
            for inner in children.iter_mut().filter_map(Node::as_element_mut) {
                if inner.is("blockquote") {
                    inner.set_attr("class", NOTE_CLASS);
                }
            }
            nodes.splice(i..=i, children);
            // Re-examine the spliced children: a note may itself hold a quote.
            continue;
        }
        if let Node::Element(el) = &mut nodes[i] {
            unwrap_in(&mut el.children);
        }
        i += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_quote_is_unwrapped_and_marked() {
        let mut fragment = Fragment::parse(
            "<blockquote>\n<blockquote>\n<p>side note</p>\n</blockquote>\n</blockquote>",
        );
        normalize_nested(&mut fragment);
        let quotes = fragment.find_all("blockquote");
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].attr("class"), Some("note"));
        assert_eq!(quotes[0].text().trim(), "side note");
        assert!(fragment.top_level().any(|el| el.has_class("note")));
    }

    #[test]
    fn outer_content_is_kept_in_place() {
        let mut fragment = Fragment::parse(
            "<p>before</p><blockquote><p>lead</p><blockquote><p>note</p></blockquote></blockquote><p>after</p>",
        );
        normalize_nested(&mut fragment);
        assert_eq!(
            fragment.to_html(),
            r#"<p>before</p><p>lead</p><blockquote class="note"><p>note</p></blockquote><p>after</p>"#
        );
    }

    #[test]
    fn single_quote_is_untouched() {
        let mut fragment = Fragment::parse("<blockquote><p>summary</p></blockquote>");
        let before = fragment.clone();
        normalize_nested(&mut fragment);
        assert_eq!(fragment, before);
    }

    #[test]
    fn triple_nesting_keeps_innermost_note() {
        let mut fragment = Fragment::parse(
            "<blockquote><blockquote><blockquote><p>deep</p></blockquote></blockquote></blockquote>",
        );
        normalize_nested(&mut fragment);
        let quotes = fragment.find_all("blockquote");
        assert_eq!(quotes.len(), 1);
        assert!(quotes[0].has_class("note"));
    }

    #[test]
    fn nested_quote_inside_list_is_normalized() {
        let mut fragment = Fragment::parse(
            "<ul><li><blockquote><blockquote><p>x</p></blockquote></blockquote></li></ul>",
        );
        normalize_nested(&mut fragment);
        assert_eq!(
            fragment.to_html(),
            r#"<ul><li><blockquote class="note"><p>x</p></blockquote></li></ul>"#
        );
    }
}
