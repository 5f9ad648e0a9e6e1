// src/score/category.rs
// =============================================================================
// Puts each resource into exactly one weight bucket and sums the buckets.
//
// The rules are an ordered list evaluated top to bottom, first match wins:
//   1. CSS    path ends with .css
//   2. JS     path ends with .js
//   3. Image  path ends with .jpg .jpeg .png .gif .webp .svg .tif .tiff
//   4. Frame  the whole URL contains "iframe"
//   5. Video  path ends with .mp4 .webm .ogg .avi .wmv .mov .mpeg
//   otherwise Uncategorized
//
// Rule 4 is a substring test on the full URL, not an extension test, so
// "/iframe/player.mp4" is a Frame while "/player.mp4?x=iframe" is too.
// Suffix tests are case-sensitive and ignore the query string.
// =============================================================================

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    Css,
    Js,
    Image,
    Frame,
    Video,
    Uncategorized,
}

enum Rule {
    PathSuffix(&'static [&'static str]),
    UrlContains(&'static str),
}

const RULES: [(Rule, ResourceCategory); 5] = [
    (Rule::PathSuffix(&[".css"]), ResourceCategory::Css),
    (Rule::PathSuffix(&[".js"]), ResourceCategory::Js),
    (
        Rule::PathSuffix(&[".jpg", ".jpeg", ".png", ".gif", ".webp", ".svg", ".tif", ".tiff"]),
        ResourceCategory::Image,
    ),
    (Rule::UrlContains("iframe"), ResourceCategory::Frame),
    (
        Rule::PathSuffix(&[".mp4", ".webm", ".ogg", ".avi", ".wmv", ".mov", ".mpeg"]),
        ResourceCategory::Video,
    ),
];

impl ResourceCategory {
    /// Buckets that carry a running total, in report order
    pub const WEIGHTED: [ResourceCategory; 5] = [
        ResourceCategory::Css,
        ResourceCategory::Js,
        ResourceCategory::Image,
        ResourceCategory::Frame,
        ResourceCategory::Video,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ResourceCategory::Css => "CSS",
            ResourceCategory::Js => "JS",
            ResourceCategory::Image => "Images",
            ResourceCategory::Frame => "Iframes",
            ResourceCategory::Video => "Videos",
            ResourceCategory::Uncategorized => "Other",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Rule {
    fn matches(&self, url: &str, path: &str) -> bool {
        match self {
            Rule::PathSuffix(suffixes) => suffixes.iter().any(|s| path.ends_with(s)),
            Rule::UrlContains(needle) => url.contains(needle),
        }
    }
}

/// Classifies a resource URL; total over all inputs
pub fn classify(url: &str) -> ResourceCategory {
    let path = url_path(url);
    RULES
        .iter()
        .find(|(rule, _)| rule.matches(url, &path))
        .map(|(_, category)| *category)
        .unwrap_or(ResourceCategory::Uncategorized)
}

// Path component without query or fragment
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Per-bucket byte totals for one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotals {
    pub css: u64,
    pub js: u64,
    pub image: u64,
    pub frame: u64,
    pub video: u64,
}

impl CategoryTotals {
    /// Adds `bytes` to the bucket of `category`; uncategorized is dropped
    pub fn add(&mut self, category: ResourceCategory, bytes: u64) {
        if let Some(slot) = self.slot_mut(category) {
            *slot += bytes;
        }
    }

    pub fn get(&self, category: ResourceCategory) -> u64 {
        match category {
            ResourceCategory::Css => self.css,
            ResourceCategory::Js => self.js,
            ResourceCategory::Image => self.image,
            ResourceCategory::Frame => self.frame,
            ResourceCategory::Video => self.video,
            ResourceCategory::Uncategorized => 0,
        }
    }

    /// Sum of all buckets (excludes uncategorized weight)
    pub fn categorized_total(&self) -> u64 {
        self.css + self.js + self.image + self.frame + self.video
    }

    /// Buckets with a non-zero total, in report order
    pub fn non_zero(&self) -> Vec<(ResourceCategory, u64)> {
        ResourceCategory::WEIGHTED
            .iter()
            .map(|c| (*c, self.get(*c)))
            .filter(|(_, bytes)| *bytes > 0)
            .collect()
    }

    fn slot_mut(&mut self, category: ResourceCategory) -> Option<&mut u64> {
        match category {
            ResourceCategory::Css => Some(&mut self.css),
            ResourceCategory::Js => Some(&mut self.js),
            ResourceCategory::Image => Some(&mut self.image),
            ResourceCategory::Frame => Some(&mut self.frame),
            ResourceCategory::Video => Some(&mut self.video),
            ResourceCategory::Uncategorized => None,
        }
    }
}

/// Builds fresh totals from (url, bytes) pairs
pub fn aggregate<'a, I>(entries: I) -> CategoryTotals
where
    I: IntoIterator<Item = (&'a str, u64)>,
{
    let mut totals = CategoryTotals::default();
    for (url, bytes) in entries {
        totals.add(classify(url), bytes);
    }
    totals
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extensions() {
        assert_eq!(classify("https://s.com/a.css"), ResourceCategory::Css);
        assert_eq!(classify("https://s.com/a.css?v=3"), ResourceCategory::Css);
        assert_eq!(classify("https://s.com/app.js"), ResourceCategory::Js);
        assert_eq!(classify("https://s.com/p.webp"), ResourceCategory::Image);
        assert_eq!(classify("https://s.com/scan.tiff"), ResourceCategory::Image);
        assert_eq!(classify("https://s.com/clip.webm"), ResourceCategory::Video);
        assert_eq!(classify("https://s.com/font.woff2"), ResourceCategory::Uncategorized);
        assert_eq!(classify("https://s.com/"), ResourceCategory::Uncategorized);
    }

    #[test]
    fn test_suffix_is_case_sensitive() {
        assert_eq!(classify("https://s.com/PHOTO.JPG"), ResourceCategory::Uncategorized);
    }

    #[test]
    fn test_query_does_not_count_as_extension() {
        assert_eq!(classify("https://s.com/style?file=a.css"), ResourceCategory::Uncategorized);
    }

    #[test]
    fn test_first_match_wins() {
        // Extension rules come before the iframe substring rule...
        assert_eq!(classify("https://s.com/iframe/widget.js"), ResourceCategory::Js);
        // ...and the iframe rule comes before video
        assert_eq!(classify("https://s.com/iframe/clip.mp4"), ResourceCategory::Frame);
        assert_eq!(classify("https://s.com/embed?mode=iframe"), ResourceCategory::Frame);
    }

    #[test]
    fn test_aggregate_totals() {
        let totals = aggregate([
            ("https://s.com/a.css", 100),
            ("https://s.com/b.css", 50),
            ("https://s.com/c.js", 10),
            ("https://s.com/font.woff2", 999),
            ("https://s.com/d.png", 0),
        ]);
        assert_eq!(totals.css, 150);
        assert_eq!(totals.js, 10);
        assert_eq!(totals.image, 0);
        assert_eq!(totals.categorized_total(), 160);
        assert_eq!(
            totals.non_zero(),
            vec![(ResourceCategory::Css, 150), (ResourceCategory::Js, 10)]
        );
    }
}
