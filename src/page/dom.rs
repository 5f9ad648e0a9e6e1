// src/page/dom.rs
// =============================================================================
// Structural metrics computed from the parsed page.
//
// - element count: every element node in the tree, including the html/head/
//   body elements html5ever synthesizes when the markup leaves them out
// - max depth: the deepest element below the root element, root = 0
//
// Depth is walked with an explicit stack, so a pathologically nested page
// cannot overflow the call stack.
// =============================================================================

use scraper::{ElementRef, Html};

/// Counts all element nodes in the document
pub fn count_dom_elements(document: &Html) -> usize {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .count()
}

/// Deepest element nesting below `root`; a childless root is 0
pub fn max_depth(root: ElementRef<'_>) -> usize {
    let mut deepest = 0;
    let mut stack = vec![(root, 0usize)];

    while let Some((element, depth)) = stack.pop() {
        deepest = deepest.max(depth);
        stack.extend(
            element
                .children()
                .filter_map(ElementRef::wrap)
                .map(|child| (child, depth + 1)),
        );
    }

    deepest
}
