//! Interactive code example extraction.
//!
//! A top-level quote block whose text starts with `playground:` marks the code
//! block that follows it as runnable:
//!
//! ````markdown
//! > Playground: runtime=go; title=Try it; button=Execute; autorun=true
//!
//! ```go
//! package main
//! ```
//! ````
//!
//! On pages the marker and the code block become one `details` widget with a
//! run button, an editable textarea and an output area. Feeds cannot run code,
//! so there the marker just becomes a paragraph holding the title and the code
//! block stays as it is.

use super::Variant;
use crate::html::{Element, Fragment, Node};
use std::collections::HashMap;
use tracing::warn;

const MARKER: &str = "playground:";

/// Options parsed from the marker text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundParams {
    pub runtime: Option<String>,
    pub title: String,
    pub button: String,
    /// Tooltip of the run button.
    pub title_attr: String,
    pub autorun: bool,
    pub open: bool,
}

impl PlaygroundParams {
    /// Parse `key=value; key=value` pairs. Unknown keys are ignored, pairs
    /// without `=` are skipped with a warning.
    pub fn parse(params: &str) -> Self {
        let mut pairs: HashMap<&str, &str> = HashMap::new();
        for part in params.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('=') {
                Some((key, value)) => {
                    pairs.insert(key.trim(), value.trim());
                }
                None => warn!(pair = part, "ignoring playground parameter without '='"),
            }
        }

        let button = pairs.get("button").copied().unwrap_or("Run").to_string();
        Self {
            runtime: pairs.get("runtime").map(|r| r.to_string()),
            title: pairs.get("title").copied().unwrap_or("Playground").to_string(),
            title_attr: pairs
                .get("title_attr")
                .map(|t| t.to_string())
                .unwrap_or_else(|| button.clone()),
            button,
            autorun: pairs.get("autorun").is_some_and(|v| is_truthy(v)),
            open: pairs.get("open").is_none_or(|v| is_truthy(v)),
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_ascii_lowercase().as_str(), "true" | "1" | "yes")
}

/// Outcome of one pass over a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaygroundSummary {
    pub converted: usize,
    /// Runtime of the last converted block that named one.
    pub runtime: Option<String>,
}

/// Marker parameters if `node` is a playground quote block.
fn marker_params(node: &Node) -> Option<PlaygroundParams> {
    let quote = node.as_element().filter(|el| el.is("blockquote"))?;
    let text = quote.text();
    let text = text.trim();
    let prefix = text.get(..MARKER.len())?;
    if !prefix.eq_ignore_ascii_case(MARKER) {
        return None;
    }
    Some(PlaygroundParams::parse(&text[MARKER.len()..]))
}

fn next_element_index(nodes: &[Node], from: usize) -> Option<usize> {
    (from..nodes.len()).find(|&i| matches!(nodes[i], Node::Element(_)))
}

pub fn convert(fragment: &mut Fragment, variant: Variant) -> PlaygroundSummary {
    let mut summary = PlaygroundSummary::default();
    let nodes = &mut fragment.nodes;

    let mut i = 0;
    while i < nodes.len() {
        let Some(params) = marker_params(&nodes[i]) else {
            i += 1;
            continue;
        };

        let code = next_element_index(nodes, i + 1).and_then(|idx| {
            let pre = nodes[idx].as_element().filter(|el| el.is("pre"))?;
            pre.find("code").map(|code| (idx, code.text()))
        });
        let Some((code_index, code)) = code else {
            warn!(title = %params.title, "playground marker is not followed by a code block; skipping");
            i += 1;
            continue;
        };

        match variant {
            Variant::Page => {
                nodes[i] = Element::new("div").with_child(widget(&params, &code)).into();
                nodes.remove(code_index);
            }
            Variant::Feed => {
                nodes[i] = Element::new("p").with_text(&params.title).into();
            }
        }

        summary.converted += 1;
        if params.runtime.is_some() {
            summary.runtime = params.runtime;
        }
        i += 1;
    }
    summary
}

fn widget(params: &PlaygroundParams, code: &str) -> Element {
    let mut details =
        Element::new("details").with_attr("class", "Playground-Details js-exampleContainer");
    if params.open {
        details.set_attr("open", "");
    }
    if params.autorun {
        details.set_attr("data-autorun", "");
    }

    let run_button = Element::new("button")
        .with_attr("class", "Playground-RunButton")
        .with_attr("aria-label", &params.button)
        .with_attr("title", &params.title_attr)
        .with_text(&params.button);
    let error = Element::new("p")
        .with_attr("class", "Playground-Error")
        .with_attr("role", "alert")
        .with_attr("aria-atomic", "true");
    let header = Element::new("summary")
        .with_attr("class", "Playground-DetailsHeader")
        .with_child(Element::new("span").with_text(&params.title))
        .with_child(
            Element::new("div")
                .with_attr("class", "Playground-DetailsToolbar")
                .with_child(
                    Element::new("div")
                        .with_attr("class", "Playground-ButtonsContainer")
                        .with_child(error)
                        .with_child(run_button),
                ),
        );

    let output = Element::new("pre")
        .with_child(
            Element::new("span")
                .with_attr("class", "Playground-OutputLabel")
                .with_text("Output:"),
        )
        .with_child(Element::new("span").with_attr("class", "Playground-Output"));
    let body = Element::new("div")
        .with_attr("class", "Playground-DetailsBody")
        .with_child(
            Element::new("textarea")
                .with_attr("class", "Playground-Code code")
                .with_attr("spellcheck", "false")
                .with_text(code),
        )
        .with_child(output);

    details.with_child(header).with_child(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "package main\n\nfunc main() {\n\tprintln(\"a < b\")\n}\n";

    fn marked(marker: &str) -> Fragment {
        Fragment::parse(&format!(
            "<blockquote>\n<p>{marker}</p>\n</blockquote>\n<pre><code>{}</code></pre>\n",
            CODE.replace('<', "&lt;")
        ))
    }

    #[test]
    fn params_defaults() {
        let params = PlaygroundParams::parse("");
        assert_eq!(params.runtime, None);
        assert_eq!(params.title, "Playground");
        assert_eq!(params.button, "Run");
        assert_eq!(params.title_attr, "Run");
        assert!(!params.autorun);
        assert!(params.open);
    }

    #[test]
    fn params_parse_trims_and_reads_flags() {
        let params = PlaygroundParams::parse(
            " runtime = go ; title=Try it; button=Execute; autorun=YES; open=false ",
        );
        assert_eq!(params.runtime.as_deref(), Some("go"));
        assert_eq!(params.title, "Try it");
        assert_eq!(params.button, "Execute");
        assert_eq!(params.title_attr, "Execute");
        assert!(params.autorun);
        assert!(!params.open);
    }

    #[test]
    fn params_skip_pair_without_equals() {
        let params = PlaygroundParams::parse("runtime=js; nonsense; title=X");
        assert_eq!(params.runtime.as_deref(), Some("js"));
        assert_eq!(params.title, "X");
    }

    #[test]
    fn page_variant_builds_widget_and_removes_code() {
        let mut fragment = marked("Playground: runtime=go; title=Demo; autorun=1");
        let summary = convert(&mut fragment, Variant::Page);

        assert_eq!(summary.converted, 1);
        assert_eq!(summary.runtime.as_deref(), Some("go"));
        assert!(fragment.find_all("blockquote").is_empty());
        assert!(fragment.find_all("code").is_empty());

        let details = fragment.find_all("details")[0];
        assert!(details.has_class("Playground-Details"));
        assert!(details.has_class("js-exampleContainer"));
        assert!(details.has_attr("open"));
        assert!(details.has_attr("data-autorun"));

        let title = details.find("summary").and_then(|s| s.find("span")).unwrap();
        assert_eq!(title.text(), "Demo");
        let textarea = fragment.find_all("textarea")[0];
        assert_eq!(textarea.text(), CODE);
        assert_eq!(fragment.find_all("button")[0].attr("title"), Some("Run"));
    }

    #[test]
    fn page_variant_serializes_expected_structure() {
        let mut fragment = marked("playground:");
        convert(&mut fragment, Variant::Page);
        let html = fragment.to_html();
        assert!(html.starts_with(
            r#"<div><details class="Playground-Details js-exampleContainer" open=""><summary class="Playground-DetailsHeader"><span>Playground</span>"#
        ));
        assert!(html.contains(r#"<p class="Playground-Error" role="alert" aria-atomic="true"></p>"#));
        assert!(html.contains(r#"<span class="Playground-OutputLabel">Output:</span>"#));
    }

    #[test]
    fn open_false_omits_open_attribute() {
        let mut fragment = marked("playground: open=false");
        convert(&mut fragment, Variant::Page);
        assert!(!fragment.find_all("details")[0].has_attr("open"));
    }

    #[test]
    fn feed_variant_keeps_code_block() {
        let mut fragment = marked("Playground: title=Demo");
        let summary = convert(&mut fragment, Variant::Feed);
        assert_eq!(summary.converted, 1);
        let first = fragment.top_level().next().unwrap();
        assert!(first.is("p"));
        assert_eq!(first.text(), "Demo");
        assert_eq!(fragment.find_all("code")[0].text(), CODE);
    }

    #[test]
    fn marker_without_code_block_is_left_alone() {
        let mut fragment =
            Fragment::parse("<blockquote><p>playground: runtime=go</p></blockquote>\n<p>no code</p>");
        let before = fragment.clone();
        let summary = convert(&mut fragment, Variant::Page);
        assert_eq!(summary, PlaygroundSummary::default());
        assert_eq!(fragment, before);
    }

    #[test]
    fn ordinary_quote_is_not_a_marker() {
        let mut fragment = Fragment::parse(
            "<blockquote><p>Not a playground: really</p></blockquote><pre><code>x</code></pre>",
        );
        let summary = convert(&mut fragment, Variant::Page);
        assert_eq!(summary.converted, 0);
        assert_eq!(fragment.find_all("blockquote").len(), 1);
    }

    #[test]
    fn runtime_comes_from_last_block_that_names_one() {
        let mut fragment = Fragment::parse(
            "<blockquote><p>playground: runtime=go</p></blockquote><pre><code>a</code></pre>\
             <blockquote><p>playground: runtime=js</p></blockquote><pre><code>b</code></pre>\
             <blockquote><p>playground: title=none</p></blockquote><pre><code>c</code></pre>",
        );
        let summary = convert(&mut fragment, Variant::Page);
        assert_eq!(summary.converted, 3);
        assert_eq!(summary.runtime.as_deref(), Some("js"));
        assert_eq!(fragment.find_all("textarea").len(), 3);
    }
}
