//! HtmlWriter - inner HTML for a normalized document tree.
//!
//! The markup matches what the editing surface shows: framework class
//! markers (`ql-align-*`, `ql-indent-*`, `ql-syntax`) are still present.
//! [`super::project`] turns it into the public HTML value.

use std::fmt;

use pulldown_cmark_escape::{FmtWriter, StrWrite, escape_href, escape_html};
use quire_delta::AttributeMap;
use serde_json::Value;

use crate::registry::RegionKind;
use crate::tree::{BlockEmbed, BlockNode, DocumentTree, Line, Node, TabGlyph};

/// Inner HTML of a document holding a single empty line.
pub const EMPTY_DOCUMENT_HTML: &str = "<p><br></p>";

/// Fixed horizontal offset of a tab-stop block embed.
const TABSTOP_LEFT: &str = "100px";

/// Render a tree to inner HTML.
pub fn render_html(tree: &DocumentTree) -> String {
    let mut out = String::new();
    write_html_fmt(&mut out, tree).expect("writing html into a String is infallible");
    out
}

/// Render a tree to inner HTML into any `fmt::Write` sink.
pub fn write_html_fmt<W: fmt::Write>(writer: W, tree: &DocumentTree) -> fmt::Result {
    let mut writer = FmtWriter(writer);
    if tree.blocks.is_empty() {
        return writer.write_str(EMPTY_DOCUMENT_HTML);
    }
    HtmlWriter::new(writer).run(tree)
}

/// Block containers that span several lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Container {
    Ordered,
    Bullet,
    Code,
}

impl Container {
    fn of(line: &Line) -> Option<Self> {
        if line.format("code-block").is_some() {
            return Some(Container::Code);
        }
        match line.format("list").and_then(Value::as_str) {
            Some("ordered") => Some(Container::Ordered),
            Some(_) => Some(Container::Bullet),
            None => None,
        }
    }

    fn open(self) -> &'static str {
        match self {
            Container::Ordered => "<ol>",
            Container::Bullet => "<ul>",
            Container::Code => "<pre class=\"ql-syntax\" spellcheck=\"false\">",
        }
    }

    fn close(self) -> &'static str {
        match self {
            Container::Ordered => "</ol>",
            Container::Bullet => "</ul>",
            Container::Code => "</pre>",
        }
    }
}

/// Inline marks, outermost first.
const MARKS: &[(&str, &str, &str)] = &[
    ("code", "<code>", "</code>"),
    ("link", "", "</a>"),
    ("script", "", ""),
    ("bold", "<strong>", "</strong>"),
    ("italic", "<em>", "</em>"),
    ("strike", "<s>", "</s>"),
    ("underline", "<u>", "</u>"),
];

pub struct HtmlWriter<W> {
    writer: W,
    container: Option<Container>,
}

impl<W: StrWrite<Error = fmt::Error>> HtmlWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            container: None,
        }
    }

    fn write(&mut self, s: &str) -> fmt::Result {
        self.writer.write_str(s)
    }

    pub fn run(mut self, tree: &DocumentTree) -> fmt::Result {
        for block in &tree.blocks {
            match block {
                BlockNode::Line(line) => self.write_line(line)?,
                BlockNode::Embed(embed) => {
                    self.switch_container(None)?;
                    self.write_block_embed(embed)?;
                }
            }
        }
        self.switch_container(None)
    }

    fn switch_container(&mut self, next: Option<Container>) -> fmt::Result {
        if self.container == next {
            return Ok(());
        }
        if let Some(open) = self.container.take() {
            self.write(open.close())?;
        }
        if let Some(next) = next {
            self.write(next.open())?;
        }
        self.container = next;
        Ok(())
    }

    fn write_line(&mut self, line: &Line) -> fmt::Result {
        let container = Container::of(line);
        self.switch_container(container)?;
        if container == Some(Container::Code) {
            self.write_children(&line.children)?;
            return self.write("\n");
        }

        let tag = line_tag(line);
        self.write("<")?;
        self.write(tag)?;
        let classes = line_classes(line);
        if !classes.is_empty() {
            self.write(" class=\"")?;
            escape_html(&mut self.writer, &classes.join(" "))?;
            self.write("\"")?;
        }
        self.write(">")?;
        if line.children.iter().all(Node::is_empty) {
            self.write("<br>")?;
        } else {
            self.write_children(&line.children)?;
        }
        self.write("</")?;
        self.write(tag)?;
        self.write(">")
    }

    fn write_block_embed(&mut self, embed: &BlockEmbed) -> fmt::Result {
        let text = match &embed.embed.value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        write!(
            self.writer,
            "<span class=\"v-block\" style=\"left: {TABSTOP_LEFT};\">"
        )?;
        escape_html(&mut self.writer, &text)?;
        self.write("</span>")
    }

    fn write_children(&mut self, children: &[Node]) -> fmt::Result {
        for child in children {
            self.write_node(child)?;
        }
        Ok(())
    }

    fn write_node(&mut self, node: &Node) -> fmt::Result {
        match node {
            Node::Text { text, attributes } => {
                let marks = self.open_marks(attributes.as_ref())?;
                escape_html(&mut self.writer, text)?;
                self.close_marks(&marks)
            }
            Node::Embed {
                kind,
                embed,
                attributes,
            } => {
                let marks = self.open_marks(attributes.as_ref())?;
                match kind {
                    RegionKind::NonBreakingSpace => self.write("<span>&nbsp;</span>")?,
                    RegionKind::Image => {
                        self.write("<img src=\"")?;
                        escape_href(&mut self.writer, embed.value.as_str().unwrap_or_default())?;
                        self.write("\">")?;
                    }
                    other => {
                        tracing::trace!(target: "quire::html", kind = %other, "embed has no markup");
                    }
                }
                self.close_marks(&marks)
            }
            Node::ReadOnly { children, .. } => {
                self.write("<span class=\"readonly-section\" contenteditable=\"false\">")?;
                self.write_children(children)?;
                self.write("</span>")
            }
            Node::Fragment { children, padding } => {
                if *padding == 0.0 {
                    self.write("<line-part>")?;
                } else {
                    write!(self.writer, "<line-part style=\"padding-left: {padding}px;\">")?;
                }
                self.write_children(children)?;
                self.write("</line-part>")
            }
            Node::Tab {
                level,
                content,
                glyph,
                ..
            } => match glyph {
                TabGlyph::Placeholder => {
                    write!(
                        self.writer,
                        "<tab level=\"{level}\" contenteditable=\"false\" style=\"width: 1px;\">"
                    )?;
                    escape_html(&mut self.writer, content)?;
                    self.write("</tab>")
                }
                TabGlyph::LiteralTab => {
                    write!(self.writer, "<tab level=\"{level}\" contenteditable=\"false\">\t</tab>")
                }
            },
            Node::PendingTab { content, .. } => {
                self.write("<pre-tab contenteditable=\"false\" style=\"width: 1px;\">")?;
                escape_html(&mut self.writer, content)?;
                self.write("</pre-tab>")
            }
        }
    }

    fn open_marks(&mut self, attributes: Option<&AttributeMap>) -> Result<Vec<&'static str>, fmt::Error> {
        let mut closes = Vec::new();
        let Some(attributes) = attributes else {
            return Ok(closes);
        };
        for (name, open, close) in MARKS {
            let Some(value) = attributes.get(*name).filter(|v| !quire_delta::is_removal(v)) else {
                continue;
            };
            match *name {
                "link" => {
                    self.write("<a href=\"")?;
                    escape_href(&mut self.writer, value.as_str().unwrap_or_default())?;
                    self.write("\" rel=\"noopener noreferrer\" target=\"_blank\">")?;
                    closes.push(*close);
                }
                "script" => match value.as_str() {
                    Some("sub") => {
                        self.write("<sub>")?;
                        closes.push("</sub>");
                    }
                    Some("super") => {
                        self.write("<sup>")?;
                        closes.push("</sup>");
                    }
                    _ => {}
                },
                _ => {
                    self.write(open)?;
                    closes.push(*close);
                }
            }
        }
        Ok(closes)
    }

    fn close_marks(&mut self, closes: &[&'static str]) -> fmt::Result {
        for close in closes.iter().rev() {
            self.write(close)?;
        }
        Ok(())
    }
}

fn line_tag(line: &Line) -> &'static str {
    if line.is_tab_container() {
        return "tabs-cont";
    }
    if line.format("list").is_some() {
        return "li";
    }
    if line.format("blockquote").is_some() {
        return "blockquote";
    }
    match line.format("header").and_then(Value::as_u64) {
        Some(1) => "h1",
        Some(2) => "h2",
        Some(3) => "h3",
        Some(4) => "h4",
        Some(5) => "h5",
        Some(6) => "h6",
        _ => "p",
    }
}

fn line_classes(line: &Line) -> Vec<String> {
    let mut classes = Vec::new();
    if let Some(align) = line.format("align").and_then(Value::as_str) {
        classes.push(format!("ql-align-{align}"));
    }
    if let Some(direction) = line.format("direction").and_then(Value::as_str) {
        classes.push(format!("ql-direction-{direction}"));
    }
    let indent = match line.format("indent") {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.parse().ok(),
        _ => None,
    };
    if let Some(indent) = indent.filter(|n| *n > 0) {
        classes.push(format!("ql-indent-{indent}"));
    }
    classes
}
