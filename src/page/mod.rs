// src/page/mod.rs
// =============================================================================
// Everything we learn from the page markup alone, without the network.
//
// Submodules:
// - extract: finds the sub-resources the page references
// - dom: element count and nesting depth
//
// inspect() parses the markup exactly once and returns plain data, so the
// (non-Send) parsed document never has to live across an .await.
// =============================================================================

mod dom;
mod extract;

pub use dom::{count_dom_elements, max_depth};
pub use extract::{
    base_url, extract_from_document, extract_resources, make_absolute_url, ResourceRef,
    SourceTag,
};

use scraper::Html;

/// What a single parse of the page yields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageStructure {
    pub resources: Vec<ResourceRef>,
    pub dom_elements: usize,
    pub max_depth: usize,
}

/// Parses the markup leniently and collects resources and DOM metrics
pub fn inspect(markup: &str, base_url: &str) -> PageStructure {
    let document = Html::parse_document(markup);

    PageStructure {
        resources: extract_from_document(&document, base_url),
        dom_elements: count_dom_elements(&document),
        max_depth: max_depth(document.root_element()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_bare_page() {
        let structure = inspect("<html><head></head><body></body></html>", "https://site.com");
        assert!(structure.resources.is_empty());
        assert_eq!(structure.dom_elements, 3);
        assert_eq!(structure.max_depth, 1);
    }
}
