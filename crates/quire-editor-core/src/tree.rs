//! Document tree: the structural view materialized from the operation log.
//!
//! The tree is derived state. It is rebuilt from the log after every change,
//! reusing lines whose source is unchanged (matched by content hash), and
//! serializes back to a delta with [`DocumentTree::to_delta`]. Line fragments
//! and their padding are layout artifacts and never reach the delta.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use quire_delta::{AttributeMap, Delta, Embed, Insert, Op, attributes};
use serde_json::Value;

use crate::format::BLOCK_FORMATS;
use crate::registry::{RegionKind, RegionRegistry};
use crate::types::PLACEHOLDER;

/// How a tab marker is drawn after layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum TabGlyph {
    /// Zero-width caret anchor; the following fragment carries the offset.
    #[default]
    Placeholder,
    /// No stop configured for this tab: drawn as a literal tab character.
    LiteralTab,
}

/// An inline node.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Text {
        text: String,
        attributes: Option<AttributeMap>,
    },
    Embed {
        kind: RegionKind,
        embed: Embed,
        attributes: Option<AttributeMap>,
    },
    /// Protected span. `marker` is the `readonly` attribute value.
    ReadOnly { marker: Value, children: Vec<Node> },
    /// Content between tabs, offset by `padding` layout units.
    Fragment { children: Vec<Node>, padding: f32 },
    Tab {
        level: u32,
        content: String,
        glyph: TabGlyph,
        attributes: Option<AttributeMap>,
    },
    /// An uncommitted tab keystroke.
    PendingTab {
        content: String,
        locked: bool,
        attributes: Option<AttributeMap>,
    },
}

impl Node {
    pub fn kind(&self) -> RegionKind {
        match self {
            Node::Text { .. } => RegionKind::Text,
            Node::Embed { kind, .. } => *kind,
            Node::ReadOnly { .. } => RegionKind::ReadOnlySpan,
            Node::Fragment { .. } => RegionKind::LineFragment,
            Node::Tab { .. } => RegionKind::TabMarker,
            Node::PendingTab { .. } => RegionKind::PendingTabMarker,
        }
    }

    pub fn is_tab(&self) -> bool {
        matches!(self, Node::Tab { .. })
    }

    pub fn text_node(text: impl Into<String>) -> Self {
        Node::Text {
            text: text.into(),
            attributes: None,
        }
    }

    /// Rendered text content. A non-breaking space contributes `U+00A0`,
    /// other embeds nothing.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Node::Text { text, .. } => out.push_str(text),
            Node::Embed { kind, .. } => {
                if *kind == RegionKind::NonBreakingSpace {
                    out.push('\u{a0}');
                }
            }
            Node::ReadOnly { children, .. } | Node::Fragment { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
            Node::Tab { content, .. } | Node::PendingTab { content, .. } => out.push_str(content),
        }
    }

    /// Length in document units.
    pub fn len(&self) -> usize {
        match self {
            Node::Text { text, .. } => text.chars().count(),
            Node::Embed { .. } => 1,
            Node::ReadOnly { children, .. } | Node::Fragment { children, .. } => {
                children.iter().map(Node::len).sum()
            }
            Node::Tab { content, .. } | Node::PendingTab { content, .. } => content.chars().count(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn write_ops(&self, out: &mut Delta, inherited: &AttributeMap) {
        match self {
            Node::Text { text, attributes } => {
                out.insert(text.as_str(), merged(attributes.as_ref(), inherited, None));
            }
            Node::Embed {
                embed, attributes, ..
            } => {
                out.insert_embed(embed.clone(), merged(attributes.as_ref(), inherited, None));
            }
            Node::ReadOnly { marker, children } => {
                let mut inherited = inherited.clone();
                inherited.insert("readonly".into(), marker.clone());
                for child in children {
                    child.write_ops(out, &inherited);
                }
            }
            Node::Fragment { children, .. } => {
                for child in children {
                    child.write_ops(out, inherited);
                }
            }
            Node::Tab {
                level,
                content,
                attributes,
                ..
            } => {
                let extra = ("tab", Value::String(level.to_string()));
                out.insert(content.as_str(), merged(attributes.as_ref(), inherited, Some(extra)));
            }
            Node::PendingTab {
                content,
                attributes,
                ..
            } => {
                let extra = ("pre-tab", Value::Bool(true));
                out.insert(content.as_str(), merged(attributes.as_ref(), inherited, Some(extra)));
            }
        }
    }
}

fn merged(
    own: Option<&AttributeMap>,
    inherited: &AttributeMap,
    extra: Option<(&str, Value)>,
) -> Option<AttributeMap> {
    let mut map = own.cloned().unwrap_or_default();
    for (key, value) in inherited {
        map.insert(key.clone(), value.clone());
    }
    if let Some((key, value)) = extra {
        map.insert(key.into(), value);
    }
    attributes::non_empty(map)
}

/// A line of inline content terminated by a newline.
#[derive(Clone, Debug, PartialEq)]
pub struct Line {
    /// `Block` or `TabContainer`.
    pub kind: RegionKind,
    /// Attributes of the terminating newline (header, list, align, ...).
    pub formats: Option<AttributeMap>,
    pub children: Vec<Node>,
    /// Tab markers seen by the last fragmentation pass.
    pub tabs_count: Option<usize>,
    pub source_hash: u64,
}

impl Line {
    pub fn is_tab_container(&self) -> bool {
        self.kind == RegionKind::TabContainer
    }

    pub fn format(&self, key: &str) -> Option<&Value> {
        self.formats
            .as_ref()
            .and_then(|f| f.get(key))
            .filter(|v| !attributes::is_removal(v))
    }

    /// The line's own delta, newline included.
    pub fn to_delta(&self) -> Delta {
        let mut out = Delta::new();
        let none = AttributeMap::new();
        for child in &self.children {
            child.write_ops(&mut out, &none);
        }
        out.push(Op::insert("\n", self.formats.clone()));
        out
    }

    pub fn text(&self) -> String {
        self.children.iter().map(Node::text).collect()
    }
}

/// A block-level embed such as a fixed tab stop.
#[derive(Clone, Debug, PartialEq)]
pub struct BlockEmbed {
    pub embed: Embed,
    pub attributes: Option<AttributeMap>,
    pub source_hash: u64,
}

impl BlockEmbed {
    fn to_delta(&self) -> Delta {
        Delta::from_ops([Op::insert(self.embed.clone(), self.attributes.clone())])
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum BlockNode {
    Line(Line),
    Embed(BlockEmbed),
}

impl BlockNode {
    pub fn source_hash(&self) -> u64 {
        match self {
            BlockNode::Line(line) => line.source_hash,
            BlockNode::Embed(embed) => embed.source_hash,
        }
    }

    pub fn kind(&self) -> RegionKind {
        match self {
            BlockNode::Line(line) => line.kind,
            BlockNode::Embed(_) => RegionKind::FixedTabStop,
        }
    }

    fn to_delta(&self) -> Delta {
        match self {
            BlockNode::Line(line) => line.to_delta(),
            BlockNode::Embed(embed) => embed.to_delta(),
        }
    }
}

/// Hash a block's source delta for change detection.
pub fn hash_source(source: &Delta) -> u64 {
    let mut hasher = DefaultHasher::new();
    source.to_json().hash(&mut hasher);
    hasher.finish()
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DocumentTree {
    pub blocks: Vec<BlockNode>,
}

impl DocumentTree {
    /// Materialize a tree from a document delta.
    ///
    /// Blocks of `previous` whose source hash matches are cloned instead of
    /// rebuilt, keeping their normalization state.
    pub fn build(registry: &RegionRegistry, log: &Delta, previous: Option<&DocumentTree>) -> Self {
        let reuse: HashMap<u64, &BlockNode> = previous
            .map(|p| p.blocks.iter().map(|b| (b.source_hash(), b)).collect())
            .unwrap_or_default();
        let mut builder = TreeBuilder {
            registry,
            reuse,
            blocks: Vec::new(),
            reused: 0,
        };
        let mut line = Delta::new();
        for op in log.ops() {
            let Op::Insert {
                content,
                attributes,
            } = op
            else {
                tracing::trace!(target: "quire::tree", ?op, "skipping non-insert op in document");
                continue;
            };
            match content {
                Insert::Embed(embed) if RegionKind::for_embed(&embed.kind) == RegionKind::FixedTabStop => {
                    if !line.is_empty() {
                        builder.finish_line(std::mem::take(&mut line), None);
                    }
                    builder.block_embed(embed, attributes.as_ref());
                }
                Insert::Embed(_) => {
                    line.push(op.clone());
                }
                Insert::Text(text) => {
                    let mut rest = text.as_str();
                    while let Some(at) = rest.find('\n') {
                        line.insert(&rest[..at], attributes.clone());
                        builder.finish_line(std::mem::take(&mut line), attributes.clone());
                        rest = &rest[at + 1..];
                    }
                    line.insert(rest, attributes.clone());
                }
            }
        }
        if !line.is_empty() {
            builder.finish_line(line, None);
        }
        tracing::debug!(
            target: "quire::tree",
            blocks = builder.blocks.len(),
            reused = builder.reused,
            "built document tree"
        );
        let tree = DocumentTree {
            blocks: builder.blocks,
        };
        tree.check_structure(registry);
        tree
    }

    /// Serialize back to a document delta.
    pub fn to_delta(&self) -> Delta {
        let mut out = Delta::new();
        for block in &self.blocks {
            for op in block.to_delta().into_ops() {
                out.push(op);
            }
        }
        out
    }

    /// Recompute source hashes after normalization so the next build can
    /// reuse these blocks.
    pub fn seal(&mut self) {
        for block in &mut self.blocks {
            let hash = hash_source(&block.to_delta());
            match block {
                BlockNode::Line(line) => line.source_hash = hash,
                BlockNode::Embed(embed) => embed.source_hash = hash,
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &Line> {
        self.blocks.iter().filter_map(|b| match b {
            BlockNode::Line(line) => Some(line),
            BlockNode::Embed(_) => None,
        })
    }

    pub fn lines_mut(&mut self) -> impl Iterator<Item = &mut Line> {
        self.blocks.iter_mut().filter_map(|b| match b {
            BlockNode::Line(line) => Some(line),
            BlockNode::Embed(_) => None,
        })
    }

    /// Walk the whole tree asserting every parent/child pairing.
    ///
    /// # Panics
    ///
    /// On any pairing the registry does not allow.
    pub fn check_structure(&self, registry: &RegionRegistry) {
        for block in &self.blocks {
            registry.check_child(RegionKind::Document, block.kind());
            if let BlockNode::Line(line) = block {
                check_children(registry, line.kind, &line.children);
            }
        }
    }
}

fn check_children(registry: &RegionRegistry, parent: RegionKind, children: &[Node]) {
    for child in children {
        registry.check_child(parent, child.kind());
        match child {
            Node::ReadOnly { children, .. } | Node::Fragment { children, .. } => {
                check_children(registry, child.kind(), children);
            }
            _ => {}
        }
    }
}

struct TreeBuilder<'a> {
    registry: &'a RegionRegistry,
    reuse: HashMap<u64, &'a BlockNode>,
    blocks: Vec<BlockNode>,
    reused: usize,
}

impl TreeBuilder<'_> {
    fn finish_line(&mut self, inline: Delta, formats: Option<AttributeMap>) {
        let formats = block_formats(formats.as_ref());
        let mut source = inline.clone();
        source.push(Op::insert("\n", formats.clone()));
        let hash = hash_source(&source);
        if let Some(BlockNode::Line(line)) = self.reuse.get(&hash) {
            self.reused += 1;
            self.blocks.push(BlockNode::Line(line.clone()));
            return;
        }
        let kind = if attributes::is_set(formats.as_ref(), "tabs-cont") {
            RegionKind::TabContainer
        } else {
            RegionKind::Block
        };
        let children = build_children(self.registry, kind, &inline);
        self.blocks.push(BlockNode::Line(Line {
            kind,
            formats,
            children,
            tabs_count: None,
            source_hash: hash,
        }));
    }

    fn block_embed(&mut self, embed: &Embed, attributes: Option<&AttributeMap>) {
        let block = BlockEmbed {
            embed: embed.clone(),
            attributes: attributes.cloned(),
            source_hash: 0,
        };
        let source_hash = hash_source(&block.to_delta());
        self.blocks.push(BlockNode::Embed(BlockEmbed {
            source_hash,
            ..block
        }));
    }
}

/// Keep only the newline attributes that describe the line itself.
fn block_formats(formats: Option<&AttributeMap>) -> Option<AttributeMap> {
    let formats = attributes::without_removals(formats)?;
    attributes::non_empty(
        formats
            .into_iter()
            .filter(|(key, _)| BLOCK_FORMATS.contains(&key.as_str()))
            .collect(),
    )
}

/// Turn a line's inline ops into nodes.
///
/// Runs carrying `readonly` are grouped into a [`Node::ReadOnly`] wrapper.
/// Runs carrying `tab` or `pre-tab` become one marker per placeholder glyph.
fn build_children(registry: &RegionRegistry, parent: RegionKind, source: &Delta) -> Vec<Node> {
    let mut children: Vec<Node> = Vec::new();
    for op in source.ops() {
        let Op::Insert {
            content,
            attributes,
        } = op
        else {
            continue;
        };
        let mut attrs = attributes.clone().unwrap_or_default();
        attrs.remove("line-part");
        let readonly = attrs
            .remove("readonly")
            .filter(|v| !attributes::is_removal(v));
        let leaves = make_leaves(content, attrs);
        match readonly {
            Some(marker) => {
                for leaf in &leaves {
                    registry.check_child(RegionKind::ReadOnlySpan, leaf.kind());
                }
                match children.last_mut() {
                    Some(Node::ReadOnly {
                        marker: last,
                        children: inner,
                    }) if *last == marker => inner.extend(leaves),
                    _ => {
                        registry.check_child(parent, RegionKind::ReadOnlySpan);
                        children.push(Node::ReadOnly {
                            marker,
                            children: leaves,
                        });
                    }
                }
            }
            None => {
                for leaf in leaves {
                    registry.check_child(parent, leaf.kind());
                    children.push(leaf);
                }
            }
        }
    }
    children
}

fn make_leaves(content: &Insert, mut attrs: AttributeMap) -> Vec<Node> {
    let tab = attrs.remove("tab").filter(|v| !attributes::is_removal(v));
    let pre_tab = attrs
        .remove("pre-tab")
        .filter(|v| !attributes::is_removal(v));
    let attributes = attributes::non_empty(attrs);
    match content {
        Insert::Embed(embed) => vec![Node::Embed {
            kind: RegionKind::for_embed(&embed.kind),
            embed: embed.clone(),
            attributes,
        }],
        Insert::Text(text) => {
            if let Some(level) = tab {
                let level = parse_level(&level);
                split_markers(text)
                    .into_iter()
                    .map(|content| Node::Tab {
                        level,
                        content,
                        glyph: TabGlyph::Placeholder,
                        attributes: attributes.clone(),
                    })
                    .collect()
            } else if pre_tab.is_some() {
                split_markers(text)
                    .into_iter()
                    .map(|content| Node::PendingTab {
                        content,
                        locked: false,
                        attributes: attributes.clone(),
                    })
                    .collect()
            } else {
                vec![Node::Text {
                    text: text.clone(),
                    attributes,
                }]
            }
        }
    }
}

/// Read a tab level from its attribute value, never below 1.
pub fn parse_level(value: &Value) -> u32 {
    let level = match value {
        Value::Number(n) => n.as_u64().unwrap_or(1),
        Value::String(s) => s.trim().parse().unwrap_or(1),
        _ => 1,
    };
    u32::try_from(level).unwrap_or(u32::MAX).max(1)
}

/// Split a marker run so each placeholder glyph starts its own marker.
fn split_markers(text: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for c in text.chars() {
        if c == PLACEHOLDER || segments.is_empty() {
            segments.push(String::new());
        }
        if let Some(segment) = segments.last_mut() {
            segment.push(c);
        }
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build(json: &str) -> DocumentTree {
        let log = Delta::from_json(json).unwrap();
        DocumentTree::build(&RegionRegistry::standard(), &log, None)
    }

    fn first_line(tree: &DocumentTree) -> &Line {
        tree.lines().next().unwrap()
    }

    #[test]
    fn test_lines_and_formats() {
        let tree = build(r#"[{"insert":"Title"},{"insert":"\n","attributes":{"header":1}},{"insert":"body\n"}]"#);
        let lines: Vec<_> = tree.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].format("header"), Some(&json!(1)));
        assert_eq!(lines[1].text(), "body");
        assert_eq!(lines[1].kind, RegionKind::Block);
    }

    #[test]
    fn test_readonly_runs_group() {
        let tree = build(
            r#"[{"insert":"a"},{"insert":"sec","attributes":{"readonly":true}},{"insert":"ret","attributes":{"readonly":true,"bold":true}},{"insert":"\n"}]"#,
        );
        let line = first_line(&tree);
        assert_eq!(line.children.len(), 2);
        let Node::ReadOnly { children, .. } = &line.children[1] else {
            panic!("expected readonly span, got {:?}", line.children[1]);
        };
        assert_eq!(children.len(), 2);
        assert_eq!(line.children[1].text(), "secret");
    }

    #[test]
    fn test_tab_runs_split_per_placeholder() {
        let tree = build(
            r#"[{"insert":"\ufeff\ufeff","attributes":{"tab":"2"}},{"insert":"\n","attributes":{"tabs-cont":true}}]"#,
        );
        let line = first_line(&tree);
        assert!(line.is_tab_container());
        assert_eq!(line.children.len(), 2);
        assert!(matches!(line.children[0], Node::Tab { level: 2, .. }));
    }

    #[test]
    fn test_parse_level_clamps() {
        assert_eq!(parse_level(&json!("3")), 3);
        assert_eq!(parse_level(&json!(0)), 1);
        assert_eq!(parse_level(&json!("x")), 1);
        assert_eq!(parse_level(&json!(true)), 1);
    }

    #[test]
    fn test_block_embed_splits_lines() {
        let tree = build(r#"[{"insert":"ab"},{"insert":{"tabstop":"T"}},{"insert":"cd\n"}]"#);
        assert_eq!(tree.blocks.len(), 3);
        assert!(matches!(tree.blocks[1], BlockNode::Embed(_)));
        // The dangling line before the embed gains its newline
        assert_eq!(
            tree.to_delta().to_json(),
            r#"[{"insert":"ab\n"},{"insert":{"tabstop":"T"}},{"insert":"cd\n"}]"#
        );
    }

    #[test]
    fn test_round_trip_through_tree() {
        let json = r#"[{"insert":"x"},{"insert":"\ufeff","attributes":{"tab":"1"}},{"insert":"y"},{"insert":"lock","attributes":{"readonly":true}},{"insert":{"nbsp":true}},{"insert":"\n","attributes":{"align":"center","tabs-cont":true}}]"#;
        let tree = build(json);
        assert_eq!(tree.to_delta(), Delta::from_json(json).unwrap());
    }

    #[test]
    fn test_unchanged_lines_are_reused() {
        let registry = RegionRegistry::standard();
        let log = Delta::from_json(r#"[{"insert":"one\ntwo\n"}]"#).unwrap();
        let mut first = DocumentTree::build(&registry, &log, None);
        first.lines_mut().next().unwrap().tabs_count = Some(0);
        first.seal();
        let log = Delta::from_json(r#"[{"insert":"one\nthree\n"}]"#).unwrap();
        let second = DocumentTree::build(&registry, &log, Some(&first));
        let lines: Vec<_> = second.lines().collect();
        // Reused blocks keep their normalization state
        assert_eq!(lines[0].tabs_count, Some(0));
        assert_eq!(lines[1].tabs_count, None);
    }
}
