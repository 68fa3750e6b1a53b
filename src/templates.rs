//! Output templates.
//!
//! The emission driver never formats markup itself: it builds a typed
//! [`View`] and hands it to a [`Theme`]. The stock theme, [`MaudTheme`],
//! compiles every template into the binary with
//! [maud](https://maud.lambda.xyz/), so values are escaped by construction.
//!
//! | View | Output |
//! |---|---|
//! | `Entry` | `{slug}.html` |
//! | `Listing` | `{k}.html`, `index.html` |
//! | `Tag` | `{tag}.html` |
//! | `Feed` | `feed.xml`, `{tag}.xml` (Atom 1.0) |
//! | `Sitemap` | `sitemap.xml` |
//! | `OpenSearch` | `opensearch.xml` |
//! | `Manifest` | `manifest.webmanifest` (JSON) |
//!
//! Entry and feed bodies are already-serialized HTML from the rewrite passes
//! and are inserted with `PreEscaped` on pages, escaped as text in feeds.

use crate::config::Settings;
use crate::entry::{Entry, WidgetIds};
use chrono::{DateTime, FixedOffset};
use maud::{DOCTYPE, Markup, PreEscaped, html};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything one output file needs besides the site settings.
#[derive(Debug, Clone, Copy)]
pub enum View<'a> {
    Entry {
        entry: &'a Entry,
        widgets: &'a WidgetIds,
    },
    Listing {
        entries: &'a [&'a Entry],
        /// 1-based page number.
        page: usize,
        more: bool,
        keywords: &'a [&'a str],
    },
    Tag {
        tag: &'a str,
        entries: &'a [&'a Entry],
        keywords: &'a [&'a str],
    },
    Feed {
        /// `None` for the site feed.
        tag: Option<&'a str>,
        entries: &'a [&'a Entry],
    },
    Sitemap {
        paths: &'a [String],
    },
    OpenSearch,
    Manifest,
}

impl View<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            View::Entry { .. } => "entry",
            View::Listing { .. } => "listing",
            View::Tag { .. } => "tag",
            View::Feed { .. } => "feed",
            View::Sitemap { .. } => "sitemap",
            View::OpenSearch => "opensearch",
            View::Manifest => "manifest",
        }
    }
}

pub trait Theme {
    fn render(&self, view: &View<'_>, settings: &Settings) -> Result<Vec<u8>, RenderError>;
}

/// Compiled-in maud templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaudTheme;

impl Theme for MaudTheme {
    fn render(&self, view: &View<'_>, settings: &Settings) -> Result<Vec<u8>, RenderError> {
        let markup = match *view {
            View::Entry { entry, widgets } => render_entry(entry, widgets, settings),
            View::Listing {
                entries,
                page,
                more,
                keywords,
            } => render_listing(entries, page, more, keywords, settings),
            View::Tag {
                tag,
                entries,
                keywords,
            } => render_tag(tag, entries, keywords, settings),
            View::Feed { tag, entries } => render_feed(tag, entries, settings),
            View::Sitemap { paths } => render_sitemap(paths, settings),
            View::OpenSearch => render_opensearch(settings),
            View::Manifest => return render_manifest(settings),
        };
        Ok(markup.into_string().into_bytes())
    }
}

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";

fn page_href(number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        format!("/{number}.html")
    }
}

fn display_date(date: &DateTime<FixedOffset>) -> String {
    date.format("%B %-d, %Y").to_string()
}

fn stylesheet_href(settings: &Settings) -> String {
    if settings.styles_id.is_empty() {
        "/styles.css".to_string()
    } else {
        format!("/styles.css?v={}", settings.styles_id)
    }
}

// ============================================================================
// HTML Components
// ============================================================================

/// Head metadata that varies per page.
struct PageMeta<'a> {
    title: &'a str,
    description: &'a str,
    canonical: String,
    keywords: &'a [&'a str],
    /// Atom feed advertised by this page.
    feed: Option<String>,
    /// Social card image.
    image: Option<String>,
}

/// Renders the base HTML document structure
fn base_document(settings: &Settings, meta: &PageMeta<'_>, body_data: Markup, content: Markup) -> Markup {
    let analytics = !settings.debug && !settings.ga_id.is_empty();
    html! {
        (DOCTYPE)
        html lang=(settings.lang()) {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (meta.title) }
                meta name="description" content=(meta.description);
                @if !meta.keywords.is_empty() {
                    meta name="keywords" content=(meta.keywords.join(", "));
                }
                @if !settings.author.is_empty() {
                    meta name="twitter:site" content=(settings.author);
                }
                meta property="og:title" content=(meta.title);
                meta property="og:description" content=(meta.description);
                meta property="og:url" content=(meta.canonical);
                @if let Some(image) = &meta.image {
                    meta property="og:image" content=(image);
                    meta name="twitter:card" content="summary_large_image";
                }
                link rel="canonical" href=(meta.canonical);
                link rel="stylesheet" href=(stylesheet_href(settings));
                link rel="manifest" href="/manifest.webmanifest";
                link rel="search" type="application/opensearchdescription+xml"
                    title=(settings.site_name) href="/opensearch.xml";
                @if let Some(feed) = &meta.feed {
                    link rel="alternate" type="application/atom+xml" title=(settings.title) href=(feed);
                }
                @if analytics {
                    script async src={ "https://www.googletagmanager.com/gtag/js?id=" (settings.ga_id) } {}
                    script {
                        (PreEscaped(format!(
                            "window.dataLayer=window.dataLayer||[];function gtag(){{dataLayer.push(arguments);}}gtag('js',new Date());gtag('config','{}');",
                            settings.ga_id
                        )))
                    }
                }
            }
            body {
                (body_data)
                (site_header(settings))
                (content)
            }
        }
    }
}

fn site_header(settings: &Settings) -> Markup {
    html! {
        header.Site-Header {
            a.Site-Title href="/" { (settings.title) }
            @if !settings.description.is_empty() {
                p.Site-Description { (settings.description) }
            }
        }
    }
}

fn tag_list(tags: &[String]) -> Markup {
    html! {
        @if !tags.is_empty() {
            ul.Tags {
                @for tag in tags {
                    li { a href={ "/" (tag) ".html" } { (tag) } }
                }
            }
        }
    }
}

fn entry_card(entry: &Entry) -> Markup {
    html! {
        article.Card {
            h2.Card-Title {
                a href={ "/" (entry.slug) ".html" } { (entry.cover_title) }
            }
            time datetime=(entry.published.to_rfc3339()) { (display_date(&entry.published)) }
            p.Card-Description { (entry.description) }
            (tag_list(&entry.tags))
        }
    }
}

fn entry_list(entries: &[&Entry]) -> Markup {
    html! {
        @for entry in entries {
            (entry_card(entry))
        }
    }
}

fn keyword_list(keywords: &[&str]) -> Markup {
    html! {
        @if !keywords.is_empty() {
            aside.Keywords {
                @for keyword in keywords {
                    a href={ "/" (keyword) ".html" } { (keyword) }
                    " "
                }
            }
        }
    }
}

// ============================================================================
// Page Renderers
// ============================================================================

fn render_entry(entry: &Entry, widgets: &WidgetIds, settings: &Settings) -> Markup {
    let meta = PageMeta {
        title: &entry.title,
        description: &entry.short_description,
        canonical: entry.link.clone(),
        keywords: &[],
        feed: (!settings.skip_feeds).then(|| settings.url("feed.xml")),
        image: settings
            .cover_images
            .then(|| settings.url(&format!("covers/{}.png", entry.slug))),
    };
    let join = |ids: &[String]| (!ids.is_empty()).then(|| ids.join(" "));
    let body_data = html! {
        div #widgets hidden
            data-resizable=[join(&widgets.resizable)]
            data-router=[join(&widgets.router)]
            data-fullsize=[join(&widgets.fullsize)] {}
    };
    let content = html! {
        main {
            article.Entry {
                header.Entry-Header {
                    h1.Entry-Title { (entry.title) }
                    p.Entry-Dates {
                        time datetime=(entry.published.to_rfc3339()) { (display_date(&entry.published)) }
                        @if entry.updated > entry.published {
                            " · updated "
                            time datetime=(entry.updated.to_rfc3339()) { (display_date(&entry.updated)) }
                        }
                    }
                    (tag_list(&entry.tags))
                }
                div.Entry-Body {
                    (PreEscaped(&entry.body))
                }
            }
            @if settings.comments {
                section #comments.Comments data-slug=(entry.slug) {}
            }
        }
        @if entry.has_playground {
            script src="/playground.js" data-runtime=(entry.playground_runtime) defer {}
        }
        @if entry.has_code {
            script src="/highlight.js" defer {}
        }
        @if !entry.metadata.is_empty() {
            script src="/widgets.js" defer {}
        }
    };
    base_document(settings, &meta, body_data, content)
}

fn render_listing(
    entries: &[&Entry],
    page: usize,
    more: bool,
    keywords: &[&str],
    settings: &Settings,
) -> Markup {
    let canonical = if page <= 1 {
        settings.url("")
    } else {
        settings.url(&format!("{page}.html"))
    };
    let meta = PageMeta {
        title: &settings.title,
        description: &settings.description,
        canonical,
        keywords,
        feed: (!settings.skip_feeds).then(|| settings.url("feed.xml")),
        image: None,
    };
    let content = html! {
        main.Listing {
            (entry_list(entries))
            nav.Pagination {
                @if page > 1 {
                    a rel="prev" href=(page_href(page - 1)) { "Newer" }
                }
                @if more {
                    a rel="next" href=(page_href(page + 1)) { "Older" }
                }
            }
        }
        (keyword_list(keywords))
    };
    base_document(settings, &meta, html! {}, content)
}

fn render_tag(tag: &str, entries: &[&Entry], keywords: &[&str], settings: &Settings) -> Markup {
    let title = format!("{} · {}", tag, settings.title);
    let meta = PageMeta {
        title: &title,
        description: &settings.description,
        canonical: settings.url(&format!("{tag}.html")),
        keywords,
        feed: (!settings.skip_feeds).then(|| settings.url(&format!("{tag}.xml"))),
        image: None,
    };
    let content = html! {
        main.Listing {
            h1.Tag-Title { "#" (tag) }
            (entry_list(entries))
        }
        (keyword_list(keywords))
    };
    base_document(settings, &meta, html! {}, content)
}

// ============================================================================
// Syndication and descriptors
// ============================================================================

fn render_feed(tag: Option<&str>, entries: &[&Entry], settings: &Settings) -> Markup {
    let self_path = match tag {
        Some(tag) => format!("{tag}.xml"),
        None => "feed.xml".to_string(),
    };
    let alternate = match tag {
        Some(tag) => settings.url(&format!("{tag}.html")),
        None => settings.url(""),
    };
    let title = match tag {
        Some(tag) => format!("{} · {}", settings.title, tag),
        None => settings.title.clone(),
    };
    // An empty feed still needs a valid <updated>.
    let updated = entries
        .iter()
        .map(|entry| entry.updated)
        .max()
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_else(|| "1970-01-01T00:00:00+00:00".to_string());

    html! {
        (PreEscaped(XML_DECLARATION))
        feed xmlns=(ATOM_NS) {
            title { (title) }
            @if !settings.description.is_empty() {
                subtitle { (settings.description) }
            }
            id { (settings.url(&self_path)) }
            link rel="self" href=(settings.url(&self_path)) {}
            link rel="alternate" href=(alternate) {}
            updated { (updated) }
            @if !settings.author_name.is_empty() {
                author {
                    name { (settings.author_name) }
                    @if !settings.email.is_empty() {
                        email { (settings.email) }
                    }
                }
            }
            @for entry in entries {
                entry {
                    title { (entry.title) }
                    id { (entry.link) }
                    link rel="alternate" href=(entry.link) {}
                    @for image in &entry.images {
                        link rel="enclosure"
                            href=(settings.url(&format!("images/{}", image.filename)))
                            type=(image.mimetype)
                            length=(image.filesize)
                            title=(image.title) {}
                    }
                    published { (entry.published.to_rfc3339()) }
                    updated { (entry.updated.to_rfc3339()) }
                    @for tag in &entry.tags {
                        category term=(tag) {}
                    }
                    summary { (entry.description) }
                    content type="html" { (entry.body_feed) }
                }
            }
        }
    }
}

fn render_sitemap(paths: &[String], settings: &Settings) -> Markup {
    html! {
        (PreEscaped(XML_DECLARATION))
        urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9" {
            url { loc { (settings.url("")) } }
            @for path in paths {
                url { loc { (settings.url(&format!("{path}.html"))) } }
            }
        }
    }
}

fn render_opensearch(settings: &Settings) -> Markup {
    let search = format!(
        "https://duckduckgo.com/?q=site%3A{}+{{searchTerms}}",
        settings.domain
    );
    html! {
        (PreEscaped(XML_DECLARATION))
        OpenSearchDescription xmlns="http://a9.com/-/spec/opensearch/1.1/" {
            ShortName { (settings.site_name) }
            Description { (settings.description) }
            InputEncoding { "UTF-8" }
            Url type="text/html" method="get" template=(search) {}
        }
    }
}

#[derive(Serialize)]
struct WebManifest<'a> {
    name: &'a str,
    short_name: &'a str,
    description: &'a str,
    lang: String,
    start_url: &'a str,
    display: &'a str,
}

fn render_manifest(settings: &Settings) -> Result<Vec<u8>, RenderError> {
    let manifest = WebManifest {
        name: &settings.title,
        short_name: &settings.site_name,
        description: &settings.description,
        lang: settings.lang(),
        start_url: "/",
        display: "minimal-ui",
    };
    Ok(serde_json::to_vec_pretty(&manifest)?)
}
