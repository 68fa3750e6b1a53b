//! Inline widget metadata.
//!
//! Every top-level `div` with an id is a widget container (inline frames and
//! playgrounds built by earlier passes, or raw HTML from the author). The
//! entry template needs their ids and behaviors to wire up client scripts.

use super::{FULLSIZE_ATTR, RESIZABLE_CLASS, ROUTABLE_CLASS};
use crate::html::{Element, Fragment};
use serde::Serialize;

pub const HANDLE_CLASS: &str = "js-ResizableContent__handle";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WidgetMeta {
    pub id: String,
    pub resize: bool,
    pub route: bool,
    pub full_size: bool,
}

impl WidgetMeta {
    fn from_container(div: &Element) -> Option<Self> {
        let id = div.attr("id").filter(|id| !id.is_empty())?;
        Some(Self {
            id: id.to_string(),
            resize: div.has_class(RESIZABLE_CLASS),
            route: div.has_class(ROUTABLE_CLASS),
            full_size: div.has_attr(FULLSIZE_ATTR),
        })
    }
}

/// Collect widget metadata in document order, inserting a resize handle after
/// every resizable container.
pub fn extract(fragment: &mut Fragment) -> Vec<WidgetMeta> {
    let mut metadata = Vec::new();
    let mut i = 0;
    while i < fragment.nodes.len() {
        let meta = fragment.nodes[i]
            .as_element()
            .filter(|el| el.is("div"))
            .and_then(WidgetMeta::from_container);
        i += 1;
        let Some(meta) = meta else { continue };
        if meta.resize {
            let handle = Element::new("div").with_attr("class", HANDLE_CLASS);
            fragment.nodes.insert(i, handle.into());
            i += 1;
        }
        metadata.push(meta);
    }
    metadata
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_flags_in_order() {
        let mut fragment = Fragment::parse(
            r#"<div id="a" class="js-RoutableContent"></div><p>x</p><div id="b" class="js-ResizableContent" data-fullsize=""></div>"#,
        );
        let metadata = extract(&mut fragment);
        assert_eq!(
            metadata,
            vec![
                WidgetMeta {
                    id: "a".into(),
                    resize: false,
                    route: true,
                    full_size: false,
                },
                WidgetMeta {
                    id: "b".into(),
                    resize: true,
                    route: false,
                    full_size: true,
                },
            ]
        );
    }

    #[test]
    fn resizable_container_gets_handle_sibling() {
        let mut fragment =
            Fragment::parse(r#"<div id="b" class="js-ResizableContent"></div><p>after</p>"#);
        extract(&mut fragment);
        assert_eq!(
            fragment.to_html(),
            r#"<div class="js-ResizableContent" id="b"></div><div class="js-ResizableContent__handle"></div><p>after</p>"#
        );
    }

    #[test]
    fn divs_without_id_and_nested_divs_are_ignored() {
        let mut fragment = Fragment::parse(r#"<div><div id="inner"></div></div><div id=""></div>"#);
        assert!(extract(&mut fragment).is_empty());
    }
}
