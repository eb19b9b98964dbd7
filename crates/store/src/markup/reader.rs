//! Markup to document tree parsing
//!
//! Parses the editor markup dialect back into a [`Document`]. Unknown
//! tags are transparent (their children are kept), `<script>` subtrees
//! are dropped, and stray inline content at block level is gathered
//! into a trailing paragraph so the result always validates.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use doc_model::{attrs, Document, Mark, Node, NodeType};

use crate::error::{Result, StoreError};

/// Parse a markup string into a document
///
/// An empty input yields a document with a single empty paragraph.
pub fn deserialize(input: &str) -> Result<Document> {
    let wrapped = format!("<body>{input}</body>");
    let mut reader = Reader::from_str(&wrapped);
    let mut buf = Vec::new();

    let mut stack: Vec<Frame> = Vec::new();
    let mut blocks: Vec<Node> = Vec::new();
    let mut root_pending: Vec<Node> = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                if in_skip(&stack) {
                    stack.push(Frame::Skip);
                } else {
                    let frame = open_frame(&e, &stack)?;
                    stack.push(frame);
                }
            }
            Event::Empty(e) => {
                if !in_skip(&stack) {
                    match open_frame(&e, &stack)? {
                        Frame::Block(block) => {
                            close_block(block, &mut stack, &mut blocks, &mut root_pending);
                        }
                        Frame::Inline(node) => {
                            attach_inline(node, &mut stack, &mut root_pending);
                        }
                        Frame::Mark(_) | Frame::Transparent | Frame::Skip => {}
                    }
                }
            }
            Event::Text(e) => {
                if in_skip(&stack) {
                    continue;
                }
                let text = e.unescape()?.into_owned();
                if text.is_empty() {
                    continue;
                }
                let marks = active_marks(&stack);
                if text.trim().is_empty() && !inline_context(&stack) && marks.is_empty() {
                    continue;
                }
                let mut node = Node::text(text);
                for mark in marks {
                    node.add_mark(mark);
                }
                attach_inline(node, &mut stack, &mut root_pending);
            }
            Event::End(_) => match stack.pop() {
                Some(Frame::Block(block)) => {
                    close_block(block, &mut stack, &mut blocks, &mut root_pending);
                }
                Some(Frame::Mark(_) | Frame::Transparent | Frame::Skip) => {}
                Some(Frame::Inline(node)) => {
                    attach_inline(node, &mut stack, &mut root_pending);
                }
                // The closing </body> wrapper.
                None => {}
            },
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if !root_pending.is_empty() {
        blocks.push(Node::paragraph(root_pending));
    }
    if blocks.is_empty() {
        blocks.push(Node::empty_paragraph());
    }
    let doc = Document::from_blocks(blocks);
    doc.validate()?;
    Ok(doc)
}

/// A partially parsed block element
struct BlockFrame {
    kind: BlockKind,
    children: Vec<Node>,
    /// Inline nodes that arrived where only block children are allowed.
    pending: Vec<Node>,
}

enum BlockKind {
    Paragraph,
    Heading(u8),
    BulletList,
    OrderedList { start: i64 },
    ListItem,
    Table,
    TableRow,
    Cell {
        header: bool,
        colspan: i64,
        rowspan: i64,
        background: Option<String>,
        color: Option<String>,
    },
    Blockquote,
    CodeBlock,
    HorizontalRule,
    PageBreak,
    Image { src: String, alt: String },
}

impl BlockKind {
    fn is_textblock(&self) -> bool {
        matches!(
            self,
            BlockKind::Paragraph | BlockKind::Heading(_) | BlockKind::CodeBlock
        )
    }
}

enum Frame {
    Block(BlockFrame),
    /// A self-contained inline leaf that was opened with a start tag.
    Inline(Node),
    Mark(Mark),
    Transparent,
    Skip,
}

fn in_skip(stack: &[Frame]) -> bool {
    stack.iter().any(|f| matches!(f, Frame::Skip))
}

/// Marks of every mark frame above the nearest block frame
fn active_marks(stack: &[Frame]) -> Vec<Mark> {
    let mut marks = Vec::new();
    for frame in stack.iter().rev() {
        match frame {
            Frame::Mark(mark) => marks.push(mark.clone()),
            Frame::Block(_) => break,
            _ => {}
        }
    }
    marks
}

/// Whether text at the current position lands in a textblock
fn inline_context(stack: &[Frame]) -> bool {
    for frame in stack.iter().rev() {
        if let Frame::Block(block) = frame {
            return block.kind.is_textblock();
        }
    }
    false
}

fn open_frame(e: &BytesStart<'_>, stack: &[Frame]) -> Result<Frame> {
    let name = e.local_name().as_ref().to_ascii_lowercase();
    let frame = match name.as_slice() {
        b"p" => block(BlockKind::Paragraph),
        b"h1" => block(BlockKind::Heading(1)),
        b"h2" => block(BlockKind::Heading(2)),
        b"h3" => block(BlockKind::Heading(3)),
        b"h4" => block(BlockKind::Heading(4)),
        b"h5" => block(BlockKind::Heading(5)),
        b"h6" => block(BlockKind::Heading(6)),
        b"ul" => block(BlockKind::BulletList),
        b"ol" => {
            let start = attr_value(e, b"start")?
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(1);
            block(BlockKind::OrderedList { start })
        }
        b"li" => block(BlockKind::ListItem),
        b"table" => block(BlockKind::Table),
        b"tr" => block(BlockKind::TableRow),
        b"td" | b"th" => cell_frame(e, name == b"th")?,
        b"blockquote" => block(BlockKind::Blockquote),
        b"pre" => block(BlockKind::CodeBlock),
        b"div" => match attr_value(e, b"data-type")?.as_deref() {
            Some("page-break") => block(BlockKind::PageBreak),
            _ => Frame::Transparent,
        },
        b"hr" => block(BlockKind::HorizontalRule),
        b"img" => {
            let src = attr_value(e, b"src")?.unwrap_or_default();
            let alt = attr_value(e, b"alt")?.unwrap_or_default();
            block(BlockKind::Image { src, alt })
        }
        b"br" => Frame::Inline(Node::hard_break()),
        b"strong" | b"b" => Frame::Mark(Mark::Bold),
        b"em" | b"i" => Frame::Mark(Mark::Italic),
        b"u" => Frame::Mark(Mark::Underline),
        b"s" | b"strike" | b"del" => Frame::Mark(Mark::Strike),
        b"code" => {
            if inside_code_block(stack) {
                Frame::Transparent
            } else {
                Frame::Mark(Mark::Code)
            }
        }
        b"a" => {
            let href = attr_value(e, b"href")?.unwrap_or_default();
            Frame::Mark(Mark::Link { href })
        }
        b"span" => span_frame(e)?,
        b"mark" => {
            let color = attr_value(e, b"style")?
                .as_deref()
                .and_then(|s| css_value(s, "background-color"))
                .unwrap_or_else(|| "#ffff00".to_string());
            Frame::Mark(Mark::Highlight { color })
        }
        b"script" | b"style" => Frame::Skip,
        _ => Frame::Transparent,
    };
    Ok(frame)
}

fn block(kind: BlockKind) -> Frame {
    Frame::Block(BlockFrame {
        kind,
        children: Vec::new(),
        pending: Vec::new(),
    })
}

fn cell_frame(e: &BytesStart<'_>, header: bool) -> Result<Frame> {
    let colspan = attr_value(e, b"colspan")?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(1);
    let rowspan = attr_value(e, b"rowspan")?
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(1);
    let style = attr_value(e, b"style")?;
    let background = style
        .as_deref()
        .and_then(|s| css_value(s, "background-color"));
    let color = style.as_deref().and_then(|s| css_value(s, "color"));
    Ok(block(BlockKind::Cell {
        header,
        colspan,
        rowspan,
        background,
        color,
    }))
}

fn span_frame(e: &BytesStart<'_>) -> Result<Frame> {
    if let Some(key) = attr_value(e, b"data-placeholder-key")? {
        return Ok(Frame::Mark(Mark::Placeholder { key }));
    }
    if let Some(style) = attr_value(e, b"style")? {
        if let Some(color) = css_value(&style, "color") {
            return Ok(Frame::Mark(Mark::TextColor { color }));
        }
        if let Some(color) = css_value(&style, "background-color") {
            return Ok(Frame::Mark(Mark::Highlight { color }));
        }
    }
    Ok(Frame::Transparent)
}

/// True when the nearest enclosing block frame is a code block; a
/// `<code>` tag there is the pre/code wrapper, not an inline mark.
fn inside_code_block(stack: &[Frame]) -> bool {
    for frame in stack.iter().rev() {
        if let Frame::Block(b) = frame {
            return matches!(b.kind, BlockKind::CodeBlock);
        }
    }
    false
}

fn attr_value(e: &BytesStart<'_>, name: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref().eq_ignore_ascii_case(name) {
            let value = attr
                .unescape_value()
                .map_err(|err| StoreError::InvalidMarkup(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

/// Look up a property in an inline `style` declaration list
fn css_value(style: &str, property: &str) -> Option<String> {
    for declaration in style.split(';') {
        let mut parts = declaration.splitn(2, ':');
        let name = parts.next()?.trim();
        if name.eq_ignore_ascii_case(property) {
            let value = parts.next()?.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn attach_inline(node: Node, stack: &mut [Frame], root_pending: &mut Vec<Node>) {
    for frame in stack.iter_mut().rev() {
        if let Frame::Block(block) = frame {
            if block.kind.is_textblock() {
                block.children.push(node);
            } else {
                block.pending.push(node);
            }
            return;
        }
    }
    root_pending.push(node);
}

fn close_block(
    mut frame: BlockFrame,
    stack: &mut Vec<Frame>,
    blocks: &mut Vec<Node>,
    root_pending: &mut Vec<Node>,
) {
    if !frame.pending.is_empty() {
        let stray = std::mem::take(&mut frame.pending);
        frame.children.push(Node::paragraph(stray));
    }
    let node = build_node(frame);
    attach_block(node, stack, blocks, root_pending);
}

fn build_node(frame: BlockFrame) -> Node {
    match frame.kind {
        BlockKind::Paragraph => Node::paragraph(frame.children),
        BlockKind::Heading(level) => Node::heading(level, frame.children),
        BlockKind::BulletList => Node::bullet_list(frame.children),
        BlockKind::OrderedList { start } => {
            let mut list = Node::ordered_list(frame.children);
            if start != 1 {
                list.set_attr(attrs::START, start);
            }
            list
        }
        BlockKind::ListItem => Node::list_item(frame.children),
        BlockKind::Table => Node::table(frame.children),
        BlockKind::TableRow => Node::table_row(frame.children),
        BlockKind::Cell {
            header,
            colspan,
            rowspan,
            background,
            color,
        } => {
            let mut cell = if header {
                Node::table_header_cell(frame.children)
            } else {
                Node::table_cell(frame.children)
            };
            if colspan > 1 {
                cell.set_attr(attrs::COLSPAN, colspan);
            }
            if rowspan > 1 {
                cell.set_attr(attrs::ROWSPAN, rowspan);
            }
            if let Some(value) = background {
                cell.set_attr(attrs::BACKGROUND_COLOR, value);
            }
            if let Some(value) = color {
                cell.set_attr(attrs::TEXT_COLOR, value);
            }
            cell
        }
        BlockKind::Blockquote => Node::blockquote(frame.children),
        BlockKind::CodeBlock => {
            let mut text = String::new();
            for child in &frame.children {
                text.push_str(child.text_content());
            }
            Node::code_block(text)
        }
        BlockKind::HorizontalRule => Node::horizontal_rule(),
        BlockKind::PageBreak => Node::page_break(),
        BlockKind::Image { src, alt } => Node::image(src, alt),
    }
}

fn attach_block(
    node: Node,
    stack: &mut [Frame],
    blocks: &mut Vec<Node>,
    root_pending: &mut Vec<Node>,
) {
    for frame in stack.iter_mut().rev() {
        if let Frame::Block(parent) = frame {
            // Block children never land in textblocks; they hoist to the
            // nearest enclosing container instead.
            if parent.kind.is_textblock() {
                continue;
            }
            match parent.kind {
                BlockKind::Table => {
                    if node.node_type() == NodeType::TableRow {
                        parent.children.push(node);
                    } else {
                        tracing::debug!(kind = ?node.node_type(), "dropping non-row table child");
                    }
                }
                BlockKind::TableRow => {
                    if node.node_type().is_cell() {
                        parent.children.push(node);
                    } else {
                        tracing::debug!(kind = ?node.node_type(), "dropping non-cell row child");
                    }
                }
                BlockKind::BulletList | BlockKind::OrderedList { .. } => {
                    if node.node_type() == NodeType::ListItem {
                        parent.children.push(node);
                    } else {
                        parent.children.push(Node::list_item(vec![node]));
                    }
                }
                _ => parent.children.push(node),
            }
            return;
        }
    }
    if !root_pending.is_empty() {
        let stray = std::mem::take(root_pending);
        blocks.push(Node::paragraph(stray));
    }
    if NodeType::allowed_at_top_level(node.node_type()) {
        blocks.push(node);
    } else {
        tracing::debug!(kind = ?node.node_type(), "dropping stray block at top level");
    }
}
