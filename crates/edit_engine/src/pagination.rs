//! Page arithmetic over explicit break markers
//!
//! Pages are the regions between top-level page breaks: a document with
//! `n` breaks has `n + 1` pages, and the caret's page is one more than
//! the number of breaks strictly before its top-level block.

use doc_model::{Document, NodeType, Position, Selection};
use serde::{Deserialize, Serialize};

/// Current page and page count for a document and caret
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageIndex {
    pub current: usize,
    pub total: usize,
}

/// Compute the page the caret sits on and the total page count
pub fn page_index(doc: &Document, selection: &Selection) -> PageIndex {
    let breaks = doc.page_break_indices();
    let caret_block = selection.head.top_level_index();
    let before = breaks.iter().filter(|&&b| b < caret_block).count();
    PageIndex {
        current: before + 1,
        total: breaks.len() + 1,
    }
}

/// A caret at the start of page `page` (1-based), or `None` when the
/// page does not exist
pub fn go_to_page(doc: &Document, page: usize) -> Option<Selection> {
    let breaks = doc.page_break_indices();
    let total = breaks.len() + 1;
    if page == 0 || page > total {
        return None;
    }
    if page == 1 {
        return Some(caret_into_block(doc, 0).unwrap_or_else(Selection::doc_start));
    }
    let break_index = breaks[page - 2];
    Some(
        caret_into_block(doc, break_index + 1)
            .unwrap_or_else(|| Selection::caret(Position::new(vec![], break_index + 1))),
    )
}

/// Selection for the page after the caret's, when there is one
pub fn next_page(doc: &Document, selection: &Selection) -> Option<Selection> {
    let index = page_index(doc, selection);
    go_to_page(doc, index.current + 1)
}

/// Selection for the page before the caret's, when there is one
pub fn previous_page(doc: &Document, selection: &Selection) -> Option<Selection> {
    let index = page_index(doc, selection);
    index.current.checked_sub(1).and_then(|p| go_to_page(doc, p))
}

/// Caret at the first editable point of the top-level block `index`:
/// into its first text run when it has one, otherwise at the block
/// boundary
fn caret_into_block(doc: &Document, index: usize) -> Option<Selection> {
    let block = doc.children().get(index)?;
    if block.node_type() == NodeType::PageBreak {
        return Some(Selection::caret(Position::new(vec![], index)));
    }
    let mut path = vec![index];
    let mut node = block;
    while let Some(first) = node.children().first() {
        if first.node_type() == NodeType::Text {
            path.push(0);
            return Some(Selection::caret(Position::new(path, 0)));
        }
        path.push(0);
        node = first;
    }
    Some(Selection::caret(Position::new(path, 0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_model::Node;

    fn paged_doc() -> Document {
        Document::from_blocks(vec![
            Node::paragraph(vec![Node::text("page one")]),
            Node::page_break(),
            Node::paragraph(vec![Node::text("page two")]),
            Node::page_break(),
            Node::paragraph(vec![Node::text("page three")]),
        ])
    }

    #[test]
    fn test_total_is_breaks_plus_one() {
        let doc = paged_doc();
        let sel = Selection::doc_start();
        assert_eq!(page_index(&doc, &sel).total, 3);

        let flat = Document::with_empty_paragraph();
        assert_eq!(page_index(&flat, &sel).total, 1);
    }

    #[test]
    fn test_current_counts_breaks_strictly_before() {
        let doc = paged_doc();
        assert_eq!(
            page_index(&doc, &Selection::caret(Position::new(vec![0, 0], 3))).current,
            1
        );
        assert_eq!(
            page_index(&doc, &Selection::caret(Position::new(vec![2, 0], 0))).current,
            2
        );
        assert_eq!(
            page_index(&doc, &Selection::caret(Position::new(vec![4, 0], 0))).current,
            3
        );
    }

    #[test]
    fn test_caret_on_break_boundary_counts_as_earlier_page() {
        let doc = paged_doc();
        // Boundary offset 1 sits before the first break at index 1.
        let sel = Selection::caret(Position::new(vec![], 1));
        assert_eq!(page_index(&doc, &sel).current, 1);
    }

    #[test]
    fn test_go_to_page() {
        let doc = paged_doc();
        let first = go_to_page(&doc, 1).unwrap();
        assert_eq!(first.head, Position::new(vec![0, 0], 0));

        let second = go_to_page(&doc, 2).unwrap();
        assert_eq!(second.head, Position::new(vec![2, 0], 0));
        assert_eq!(page_index(&doc, &second).current, 2);

        assert!(go_to_page(&doc, 0).is_none());
        assert!(go_to_page(&doc, 4).is_none());
    }

    #[test]
    fn test_next_and_previous_page() {
        let doc = paged_doc();
        let start = go_to_page(&doc, 1).unwrap();
        let second = next_page(&doc, &start).unwrap();
        assert_eq!(page_index(&doc, &second).current, 2);
        let back = previous_page(&doc, &second).unwrap();
        assert_eq!(page_index(&doc, &back).current, 1);

        let last = go_to_page(&doc, 3).unwrap();
        assert!(next_page(&doc, &last).is_none());
        assert!(previous_page(&doc, &start).is_none());
    }

    #[test]
    fn test_page_index_serde_shape() {
        let index = PageIndex {
            current: 2,
            total: 5,
        };
        let json = serde_json::to_value(&index).unwrap();
        assert_eq!(json, serde_json::json!({"current": 2, "total": 5}));
        let back: PageIndex = serde_json::from_value(json).unwrap();
        assert_eq!(back, index);
    }

    #[test]
    fn test_go_to_page_with_leading_break() {
        let doc = Document::from_blocks(vec![
            Node::page_break(),
            Node::paragraph(vec![Node::text("after")]),
        ]);
        let second = go_to_page(&doc, 2).unwrap();
        assert_eq!(second.head, Position::new(vec![1, 0], 0));
        // Page 1 is the empty region before the break.
        let first = go_to_page(&doc, 1).unwrap();
        assert_eq!(page_index(&doc, &first).current, 1);
    }
}
