//! Markdown for assistant replies.
//!
//! Replies are first normalized with [`format_markdown`] (models tend to emit
//! list numbers and code fences on lines of their own), then parsed with the
//! `markdown` crate into a flat list of [`Block`]s that the chat panel lays
//! out with egui widgets.

use std::collections::HashMap;
use std::sync::OnceLock;

use markdown::{mdast, to_mdast, ParseOptions};
use regex::Regex;

use crate::highlight::{highlight_code, CodeSegment};

struct Rewrite {
    pattern: Regex,
    replacement: &'static str,
}

fn rewrites() -> &'static [Rewrite] {
    static CACHED: OnceLock<Vec<Rewrite>> = OnceLock::new();
    CACHED.get_or_init(|| {
        [
            // "1.\n\nItem" -> "1. Item"
            (r"(\d+)\.\s*\n+\s*(\S)", "${1}. ${2}"),
            // opening fence: language tag, then exactly one newline
            (r"```(\w*)\s*\n?", "```${1}\n"),
            // every fence starts on its own line
            (r"\n?```", "\n```"),
            (r"•\s*", "* "),
            (r"\n{3,}", "\n\n"),
        ]
        .into_iter()
        .map(|(pattern, replacement)| Rewrite {
            pattern: Regex::new(pattern).expect("markdown rewrite regex must compile"),
            replacement,
        })
        .collect()
    })
}

/// Normalize model output into well-formed markdown.
pub fn format_markdown(text: &str) -> String {
    let mut result = text.to_string();
    for rewrite in rewrites() {
        result = rewrite
            .pattern
            .replace_all(&result, rewrite.replacement)
            .into_owned();
    }
    result
}

/// Inline formatting of a run of text
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpanStyle {
    pub strong: bool,
    pub emphasis: bool,
    pub strike: bool,
    pub code: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub style: SpanStyle,
    pub link: Option<String>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: SpanStyle::default(),
            link: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: u8, spans: Vec<Span> },
    Paragraph(Vec<Span>),
    /// Fenced or indented code; `code` has no trailing newline
    Code { language: Option<String>, code: String },
    /// One list entry. Continuation paragraphs of the same item carry an
    /// empty marker.
    ListItem { depth: usize, marker: String, spans: Vec<Span> },
    Quote(Vec<Span>),
    Rule,
    /// Header row first
    Table(Vec<Vec<String>>),
}

/// Normalize and parse `text` into display blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let formatted = format_markdown(text);
    if formatted.trim().is_empty() {
        return Vec::new();
    }

    let root = match to_mdast(&formatted, &ParseOptions::gfm()) {
        Ok(node) => node,
        Err(e) => {
            log::warn!("Markdown parse failed, showing raw text: {}", e);
            return vec![Block::Paragraph(vec![Span::plain(formatted)])];
        }
    };

    let nodes = match root {
        mdast::Node::Root(root) => root.children,
        other => vec![other],
    };

    let mut blocks = Vec::new();
    for node in &nodes {
        push_block(node, 0, &mut blocks);
    }
    blocks
}

/// Concatenated text of `spans`, ignoring formatting
pub fn plain_text(spans: &[Span]) -> String {
    spans.iter().map(|s| s.text.as_str()).collect()
}

fn push_block(node: &mdast::Node, depth: usize, out: &mut Vec<Block>) {
    match node {
        mdast::Node::Heading(heading) => out.push(Block::Heading {
            level: heading.depth,
            spans: spans_of(&heading.children),
        }),
        mdast::Node::Paragraph(paragraph) => {
            out.push(Block::Paragraph(spans_of(&paragraph.children)))
        }
        mdast::Node::Code(code) => out.push(Block::Code {
            language: code.lang.clone().filter(|l| !l.is_empty()),
            code: code.value.trim_end_matches('\n').to_string(),
        }),
        mdast::Node::Math(math) => out.push(Block::Code {
            language: Some("math".to_string()),
            code: math.value.clone(),
        }),
        mdast::Node::List(list) => push_list(list, depth, out),
        mdast::Node::Blockquote(quote) => {
            for child in &quote.children {
                match child {
                    mdast::Node::Paragraph(p) => out.push(Block::Quote(spans_of(&p.children))),
                    other => push_block(other, depth, out),
                }
            }
        }
        mdast::Node::ThematicBreak(_) => out.push(Block::Rule),
        mdast::Node::Table(table) => {
            let rows = table
                .children
                .iter()
                .filter_map(|row| match row {
                    mdast::Node::TableRow(row) => Some(
                        row.children
                            .iter()
                            .map(|cell| match cell {
                                mdast::Node::TableCell(cell) => plain_text(&spans_of(&cell.children)),
                                _ => String::new(),
                            })
                            .collect(),
                    ),
                    _ => None,
                })
                .collect();
            out.push(Block::Table(rows));
        }
        mdast::Node::Html(html) => out.push(Block::Paragraph(vec![Span::plain(html.value.trim())])),
        mdast::Node::Text(text) => out.push(Block::Paragraph(vec![Span::plain(&text.value)])),
        _ => {}
    }
}

fn push_list(list: &mdast::List, depth: usize, out: &mut Vec<Block>) {
    let start = list.start.unwrap_or(1);
    for (i, node) in list.children.iter().enumerate() {
        let mdast::Node::ListItem(item) = node else {
            continue;
        };
        let mut marker = if list.ordered {
            format!("{}.", start + i as u32)
        } else {
            "•".to_string()
        };
        if let Some(checked) = item.checked {
            marker = if checked { "☑".to_string() } else { "☐".to_string() };
        }

        let before = out.len();
        for child in &item.children {
            match child {
                mdast::Node::Paragraph(p) => {
                    let marker = if out.len() == before { marker.clone() } else { String::new() };
                    out.push(Block::ListItem { depth, marker, spans: spans_of(&p.children) });
                }
                mdast::Node::List(nested) => {
                    if out.len() == before {
                        out.push(Block::ListItem { depth, marker: marker.clone(), spans: Vec::new() });
                    }
                    push_list(nested, depth + 1, out);
                }
                other => push_block(other, depth + 1, out),
            }
        }
        if out.len() == before {
            out.push(Block::ListItem { depth, marker, spans: Vec::new() });
        }
    }
}

fn spans_of(nodes: &[mdast::Node]) -> Vec<Span> {
    let mut spans = Vec::new();
    collect_spans(nodes, SpanStyle::default(), None, &mut spans);
    spans
}

fn collect_spans(
    nodes: &[mdast::Node],
    style: SpanStyle,
    link: Option<&str>,
    out: &mut Vec<Span>,
) {
    let push = |text: &str, style: SpanStyle, out: &mut Vec<Span>| {
        out.push(Span {
            text: text.to_string(),
            style,
            link: link.map(String::from),
        });
    };

    for node in nodes {
        match node {
            mdast::Node::Text(text) => push(&text.value, style, out),
            mdast::Node::InlineCode(code) => push(&code.value, SpanStyle { code: true, ..style }, out),
            mdast::Node::InlineMath(math) => push(&math.value, SpanStyle { code: true, ..style }, out),
            mdast::Node::Strong(strong) => {
                collect_spans(&strong.children, SpanStyle { strong: true, ..style }, link, out)
            }
            mdast::Node::Emphasis(emphasis) => {
                collect_spans(&emphasis.children, SpanStyle { emphasis: true, ..style }, link, out)
            }
            mdast::Node::Delete(delete) => {
                collect_spans(&delete.children, SpanStyle { strike: true, ..style }, link, out)
            }
            mdast::Node::Link(l) => {
                if l.children.is_empty() {
                    out.push(Span { text: l.url.clone(), style, link: Some(l.url.clone()) });
                } else {
                    collect_spans(&l.children, style, Some(&l.url), out);
                }
            }
            mdast::Node::Image(image) => push(&image.alt, style, out),
            mdast::Node::Break(_) => push("\n", style, out),
            mdast::Node::Html(html) => push(&html.value, style, out),
            mdast::Node::Paragraph(p) => collect_spans(&p.children, style, link, out),
            _ => {}
        }
    }
}

/// A reply ready for layout: its blocks, and the colouring of each code
/// block whose language has a grammar (indexed like `blocks`).
#[derive(Debug, Clone, Default)]
pub struct RenderedReply {
    pub blocks: Vec<Block>,
    pub highlights: Vec<Option<Vec<CodeSegment>>>,
}

impl RenderedReply {
    pub fn new(content: &str) -> Self {
        let blocks = parse_blocks(content);
        let highlights = blocks
            .iter()
            .map(|block| match block {
                Block::Code { language: Some(language), code } => highlight_code(code, language),
                _ => None,
            })
            .collect();
        Self { blocks, highlights }
    }
}

/// Rendered replies per message, redone only when the content changes.
/// A streaming reply changes every frame; finished ones never do.
#[derive(Default)]
pub struct BlockCache {
    entries: HashMap<String, (String, RenderedReply)>,
}

impl BlockCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(&mut self, id: &str, content: &str) -> &RenderedReply {
        let entry = self
            .entries
            .entry(id.to_string())
            .or_insert_with(|| (String::new(), RenderedReply::default()));
        if entry.0 != content {
            entry.0 = content.to_string();
            entry.1 = RenderedReply::new(content);
        }
        &entry.1
    }

    /// Forget messages that are no longer in the transcript
    pub fn retain<'a>(&mut self, live_ids: impl IntoIterator<Item = &'a str>) {
        let live: std::collections::HashSet<&str> = live_ids.into_iter().collect();
        self.entries.retain(|id, _| live.contains(id.as_str()));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
