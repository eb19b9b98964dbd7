//! Document tree to markup serialization
//!
//! The markup dialect is the editor's HTML vocabulary: semantic block
//! tags, `data-type="page-break"` divs, and mark wrappers nested in
//! rank order so equal documents always serialize to equal strings.

use doc_model::{attrs, Document, Mark, Node, NodeType};

/// Serialize a document to its markup string
pub fn serialize(doc: &Document) -> String {
    let mut out = String::new();
    for block in doc.children() {
        write_node(&mut out, block);
    }
    out
}

fn write_node(out: &mut String, node: &Node) {
    match node.node_type() {
        NodeType::Paragraph => write_element(out, "p", "", node),
        NodeType::Heading => {
            let level = node.int_attr(attrs::LEVEL, 1).clamp(1, 6);
            let tag = format!("h{level}");
            write_element(out, &tag, "", node);
        }
        NodeType::BulletList => write_element(out, "ul", "", node),
        NodeType::OrderedList => {
            let start = node.int_attr(attrs::START, 1);
            let extra = if start != 1 {
                format!(" start=\"{start}\"")
            } else {
                String::new()
            };
            write_element(out, "ol", &extra, node);
        }
        NodeType::ListItem => write_element(out, "li", "", node),
        NodeType::Table => write_element(out, "table", "", node),
        NodeType::TableRow => write_element(out, "tr", "", node),
        NodeType::TableCell => write_element(out, "td", &cell_attrs(node), node),
        NodeType::TableHeaderCell => write_element(out, "th", &cell_attrs(node), node),
        NodeType::Blockquote => write_element(out, "blockquote", "", node),
        NodeType::CodeBlock => {
            out.push_str("<pre><code>");
            for child in node.children() {
                out.push_str(&esc_text(child.text_content()));
            }
            out.push_str("</code></pre>");
        }
        NodeType::HorizontalRule => out.push_str("<hr/>"),
        NodeType::PageBreak => {
            out.push_str("<div data-type=\"page-break\" class=\"page-break\"></div>");
        }
        NodeType::Image => {
            let src = esc_attr(node.str_attr(attrs::SRC));
            let alt = node.str_attr(attrs::ALT);
            if alt.is_empty() {
                out.push_str(&format!("<img src=\"{src}\"/>"));
            } else {
                out.push_str(&format!("<img src=\"{src}\" alt=\"{}\"/>", esc_attr(alt)));
            }
        }
        NodeType::Text => write_text(out, node),
        NodeType::HardBreak => out.push_str("<br/>"),
    }
}

fn write_element(out: &mut String, tag: &str, extra_attrs: &str, node: &Node) {
    out.push('<');
    out.push_str(tag);
    out.push_str(extra_attrs);
    out.push('>');
    for child in node.children() {
        write_node(out, child);
    }
    out.push_str("</");
    out.push_str(tag);
    out.push('>');
}

fn cell_attrs(node: &Node) -> String {
    let mut out = String::new();
    let colspan = node.int_attr(attrs::COLSPAN, 1);
    if colspan > 1 {
        out.push_str(&format!(" colspan=\"{colspan}\""));
    }
    let rowspan = node.int_attr(attrs::ROWSPAN, 1);
    if rowspan > 1 {
        out.push_str(&format!(" rowspan=\"{rowspan}\""));
    }
    let mut style = String::new();
    let background = node.str_attr(attrs::BACKGROUND_COLOR);
    if !background.is_empty() {
        style.push_str(&format!("background-color: {background}"));
    }
    let color = node.str_attr(attrs::TEXT_COLOR);
    if !color.is_empty() {
        if !style.is_empty() {
            style.push_str("; ");
        }
        style.push_str(&format!("color: {color}"));
    }
    if !style.is_empty() {
        out.push_str(&format!(" style=\"{}\"", esc_attr(&style)));
    }
    out
}

/// Wrap the escaped text in its mark tags, outermost first
///
/// Marks are stored sorted by rank, so nesting follows storage order
/// and serialization stays canonical.
fn write_text(out: &mut String, node: &Node) {
    let mut open = String::new();
    let mut close = String::new();
    for mark in node.marks() {
        let (o, c) = mark_tags(mark);
        open.push_str(&o);
        close.insert_str(0, &c);
    }
    out.push_str(&open);
    out.push_str(&esc_text(node.text_content()));
    out.push_str(&close);
}

fn mark_tags(mark: &Mark) -> (String, String) {
    match mark {
        Mark::Placeholder { key } => (
            format!("<span data-placeholder-key=\"{}\">", esc_attr(key)),
            "</span>".to_string(),
        ),
        Mark::Link { href } => (
            format!("<a href=\"{}\">", esc_attr(href)),
            "</a>".to_string(),
        ),
        Mark::TextColor { color } => (
            format!("<span style=\"color: {}\">", esc_attr(color)),
            "</span>".to_string(),
        ),
        Mark::Highlight { color } => (
            format!("<mark style=\"background-color: {}\">", esc_attr(color)),
            "</mark>".to_string(),
        ),
        Mark::Bold => ("<strong>".to_string(), "</strong>".to_string()),
        Mark::Italic => ("<em>".to_string(), "</em>".to_string()),
        Mark::Underline => ("<u>".to_string(), "</u>".to_string()),
        Mark::Strike => ("<s>".to_string(), "</s>".to_string()),
        Mark::Code => ("<code>".to_string(), "</code>".to_string()),
    }
}

fn esc_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn esc_attr(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
