// src/page/extract.rs
// =============================================================================
// This module finds the sub-resources a page references.
//
// We use the `scraper` crate which:
// - Parses HTML into a DOM (Document Object Model)
// - Supports CSS selectors for finding elements
// - Is built on html5ever, which recovers from broken markup the same way a
//   browser does, so a malformed page never aborts extraction
//
// Only five tag/attribute pairs are looked at:
//   link[href], script[src], img[src], iframe[src], video[src]
// and the output keeps that grouping: every link first, then every script,
// then images, iframes and videos, each in document order.
//
// Nothing here touches the network; resolving references to absolute URLs is
// pure string work (see make_absolute_url).
// =============================================================================

use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

/// The tag/attribute pair a resource reference was found in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTag {
    Link,
    Script,
    Img,
    Iframe,
    Video,
}

impl SourceTag {
    /// Extraction order
    pub const ALL: [SourceTag; 5] = [
        SourceTag::Link,
        SourceTag::Script,
        SourceTag::Img,
        SourceTag::Iframe,
        SourceTag::Video,
    ];

    pub fn tag(self) -> &'static str {
        match self {
            SourceTag::Link => "link",
            SourceTag::Script => "script",
            SourceTag::Img => "img",
            SourceTag::Iframe => "iframe",
            SourceTag::Video => "video",
        }
    }

    pub fn attribute(self) -> &'static str {
        match self {
            SourceTag::Link => "href",
            _ => "src",
        }
    }
}

/// An absolute resource URL and where it came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    pub url: String,
    pub source: SourceTag,
}

// Extracts every resource reference from HTML content
//
// Parameters:
//   markup: the HTML content to parse
//   base_url: scheme + host of the page (see base_url())
//
// Example:
//   markup = "<link href='/a.css'><script src='b.js'></script>"
//   base_url = "https://site.com"
//   result = ["https://site.com/a.css", "https://site.com/b.js"]
pub fn extract_resources(markup: &str, base_url: &str) -> Vec<ResourceRef> {
    let document = Html::parse_document(markup);
    extract_from_document(&document, base_url)
}

// Same as extract_resources, for callers that already parsed the page
pub fn extract_from_document(document: &Html, base_url: &str) -> Vec<ResourceRef> {
    let mut resources = Vec::new();

    for source in SourceTag::ALL {
        // e.g. "img[src]"
        let selector = match Selector::parse(&format!("{}[{}]", source.tag(), source.attribute())) {
            Ok(selector) => selector,
            Err(e) => {
                warn!(tag = source.tag(), "skipping unparseable selector: {:?}", e);
                continue;
            }
        };

        for element in document.select(&selector) {
            let Some(value) = element.value().attr(source.attribute()) else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }

            resources.push(ResourceRef {
                url: make_absolute_url(value, base_url),
                source,
            });
        }
    }

    resources
}

// Turns a reference into an absolute URL
//
// Rules, first match wins:
//   "blob:..."        -> unchanged
//   "//cdn/x.js"      -> "https://cdn/x.js"
//   "https://a/b.css" -> unchanged (anything with a scheme)
//   "/a.css"          -> base + "/a.css"
//   "a.css"           -> base + "/" + "a.css"
//
// Relative references are always joined to scheme + host. The page's own
// path and any <base> tag are ignored.
pub fn make_absolute_url(reference: &str, base_url: &str) -> String {
    if reference.starts_with("blob:") {
        return reference.to_string();
    }

    let reference = match reference.strip_prefix("//") {
        Some(rest) => format!("https://{}", rest),
        None => reference.to_string(),
    };

    if has_scheme(&reference) {
        return reference;
    }

    let base = base_url.trim_end_matches('/');
    if reference.starts_with('/') {
        format!("{}{}", base, reference)
    } else {
        format!("{}/{}", base, reference.trim_start_matches('/'))
    }
}

// Checks for a leading "scheme:" (RFC 3986: ALPHA *( ALPHA / DIGIT / "+" / "-" / "." ))
//
// This is a syntax check only; "mailto:x" and "data:..." count as absolute.
fn has_scheme(reference: &str) -> bool {
    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };

    let mut chars = scheme.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        }
        _ => false,
    }
}

// Reduces a page URL to "scheme://host[:port]"
//
// Default ports are dropped by the url crate; an explicit non-default port is
// kept so that pages served on e.g. :8080 resolve their own resources.
//
// Returns None for URLs without a usable origin (data:, file:, ...)
pub fn base_url(page_url: &str) -> Option<String> {
    let url = Url::parse(page_url).ok()?;
    let origin = url.origin();
    if !origin.is_tuple() {
        return None;
    }
    Some(origin.ascii_serialization())
}
