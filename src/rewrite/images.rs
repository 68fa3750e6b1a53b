//! Image classification and path rewriting.
//!
//! Markdown sources reference images relative to the document:
//!
//! | Source form | Page result |
//! |---|---|
//! | `![](./images/chart-300.png)` linked locally | `img.w-300`, centered paragraph |
//! | `[![Demo](./demo.png)](/wr/demo.html)` | paragraph replaced by an inline frame container |
//! | any other `img` | `src="/images/{file}"` |
//!
//! The feed variant turns every image into an absolute URL and collects a media
//! manifest used for feed enclosures.

use super::{FULLSIZE_ATTR, RESIZABLE_CLASS, ROUTABLE_CLASS};
use crate::html::{Element, Fragment, Node};
use crate::imaging::ImageInspector;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::LazyLock;
use tracing::warn;
use url::Url;

pub const CENTER_CLASS: &str = "text-center";

const FULL_WIDTH_STYLE: &str = "width: 100%";

/// Numeric suffix on an image stem that selects a width class.
static WIDTH_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d{1,3})$").expect("width suffix pattern is valid"));

/// One media manifest entry of the feed variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeedImage {
    pub filename: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub mimetype: String,
    pub filesize: u64,
}

/// Where feed images are looked up and how they are measured.
pub struct FeedImageSource<'a> {
    pub dir: &'a Path,
    pub inspector: &'a dyn ImageInspector,
}

impl FeedImageSource<'_> {
    fn describe(&self, filename: &str, title: &str) -> Option<FeedImage> {
        let path = self.dir.join(filename);
        if !path.is_file() {
            warn!(path = %path.display(), "feed image not found; leaving it out of the manifest");
            return None;
        }
        match self.inspector.inspect(&path) {
            Ok(info) => Some(FeedImage {
                filename: filename.to_string(),
                title: title.to_string(),
                width: info.width,
                height: info.height,
                mimetype: info.mimetype,
                filesize: info.filesize,
            }),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable feed image; leaving it out of the manifest");
                None
            }
        }
    }
}

/// Split a `src` into directory and file name, like a path split.
fn split_src(src: &str) -> (&str, &str) {
    src.rsplit_once('/').unwrap_or(("", src))
}

/// `src` without the extension of its file name.
fn src_stem(src: &str) -> &str {
    let (_, name) = split_src(src);
    match name.rfind('.') {
        Some(dot) if dot > 0 => &src[..src.len() - (name.len() - dot)],
        _ => src,
    }
}

fn width_suffix(src: &str) -> Option<&str> {
    WIDTH_SUFFIX
        .captures(src_stem(src))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

struct LinkTarget {
    host: Option<String>,
    path: String,
}

fn parse_link(href: &str) -> LinkTarget {
    match Url::parse(href) {
        Ok(url) => LinkTarget {
            host: url.host_str().map(str::to_string),
            path: url.path().to_string(),
        },
        Err(_) => LinkTarget {
            host: None,
            path: href.split(['?', '#']).next().unwrap_or(href).to_string(),
        },
    }
}

fn local_image_path(src: &str) -> String {
    format!("/images/{}", split_src(src).1)
}

// ============================================================================
// Page variant
// ============================================================================

pub fn rewrite_page(fragment: &mut Fragment, domain: &str) {
    rewrite_page_nodes(&mut fragment.nodes, domain);
    rewrite_direct_images(&mut fragment.nodes);
}

fn rewrite_page_nodes(nodes: &mut [Node], domain: &str) {
    for node in nodes.iter_mut() {
        let frame = node
            .as_element()
            .filter(|el| el.is("p"))
            .and_then(|p| embedded_frame(p, domain));
        if let Some(frame) = frame {
            *node = frame.into();
            continue;
        }

        let Node::Element(el) = node else { continue };
        if el.is("p") {
            classify_linked_images(el);
        }
        if let Some(src) = rewrite_direct_images(&mut el.children) {
            if el.is("p") {
                el.set_attr("class", CENTER_CLASS);
            } else if el.is("a") {
                el.set_attr("href", &src);
            }
        }
        rewrite_page_nodes(&mut el.children, domain);
    }
}

/// Point every `img` in `nodes` at `/images/{file}`; returns the last new src.
fn rewrite_direct_images(nodes: &mut [Node]) -> Option<String> {
    let mut last = None;
    for img in nodes.iter_mut().filter_map(Node::as_element_mut) {
        if !img.is("img") {
            continue;
        }
        let src = local_image_path(img.attr("src").unwrap_or_default());
        img.set_attr("src", &src);
        last = Some(src);
    }
    last
}

/// Width classes for `p > a > img` where both link and image are local.
fn classify_linked_images(p: &mut Element) {
    let mut center = false;
    for link in p.elements_mut().filter(|el| el.is("a")) {
        let local_link = parse_link(link.attr("href").unwrap_or_default()).host.is_none();
        for img in link.elements_mut().filter(|el| el.is("img")) {
            let src = img.attr("src").unwrap_or_default();
            if split_src(src).0 != "./images" || !local_link {
                continue;
            }
            if let Some(width) = width_suffix(src).map(|w| format!("w-{w}")) {
                img.set_attr("class", &width);
            }
            center = true;
        }
    }
    if center {
        p.set_attr("class", CENTER_CLASS);
    }
}

/// Inline frame container for the first `p > a > img` that links to a
/// same-site `{flags}/{name}.html` page with an image in the document's own
/// directory.
fn embedded_frame(p: &Element, domain: &str) -> Option<Element> {
    p.elements().filter(|el| el.is("a")).find_map(|link| {
        let img = link.elements().find(|el| el.is("img"))?;
        if split_src(img.attr("src").unwrap_or_default()).0 != "." {
            return None;
        }
        let target = parse_link(link.attr("href").unwrap_or_default());
        if target.host.as_deref().is_some_and(|host| host != domain) {
            return None;
        }
        frame_container(&target.path, img.attr("alt").unwrap_or_default())
    })
}

fn frame_container(path: &str, title: &str) -> Option<Element> {
    let (flags, file) = path.trim_matches('/').split_once('/')?;
    if file.contains('/') {
        return None;
    }
    let name = file.strip_suffix(".html").filter(|n| !n.is_empty())?;

    let mut frame = Element::new("iframe")
        .with_attr("id", &format!("{name}-iframe"))
        .with_attr("name", name)
        .with_attr("frameborder", "0")
        .with_attr("title", title)
        .with_attr("src", path);
    let mut container = Element::new("div").with_attr("id", name);
    if flags.contains('w') {
        container.add_class(ROUTABLE_CLASS);
    }
    if flags.contains('r') {
        container.add_class(RESIZABLE_CLASS);
    }
    if flags.contains('f') {
        container.set_attr(FULLSIZE_ATTR, "");
        container.set_attr("style", FULL_WIDTH_STYLE);
        frame.set_attr("style", FULL_WIDTH_STYLE);
    }
    Some(container.with_child(frame))
}

// ============================================================================
// Feed variant
// ============================================================================

/// Make every image absolute and build the media manifest.
pub fn rewrite_feed(
    fragment: &mut Fragment,
    domain: &str,
    source: Option<&FeedImageSource<'_>>,
) -> Vec<FeedImage> {
    let mut manifest = Vec::new();
    fragment.for_each_element_mut(&mut |el| {
        if !el.is("img") {
            return;
        }
        let src = el.attr("src").unwrap_or_default().to_string();
        let (dir, filename) = split_src(&src);
        el.set_attr("src", &format!("https://{domain}/images/{filename}"));

        // Images next to the document are frame placeholders.
        if dir == "." {
            return;
        }
        let Some(source) = source else { return };
        let title = el.attr("title").or(el.attr("alt")).unwrap_or_default();
        if let Some(image) = source.describe(filename, title) {
            manifest.push(image);
        }
    });
    manifest
}
