//! Region registry: the node kinds a document tree may contain and which
//! kinds may nest inside which.
//!
//! A registry is built once per editor and held by value. Nesting violations
//! found while building a tree are programming errors and panic.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::ConfigError;

/// Every structural node kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RegionKind {
    Document,
    /// An ordinary line (paragraph, header, list item, ...).
    Block,
    /// A line whose children are partitioned around tab markers.
    TabContainer,
    Text,
    ReadOnlySpan,
    LineFragment,
    TabMarker,
    PendingTabMarker,
    /// Block-level fixed-position marker embed.
    FixedTabStop,
    NonBreakingSpace,
    Image,
    /// Any other inline embed.
    Embed,
}

impl RegionKind {
    /// The attribute or embed name this kind is known by in a delta.
    pub fn format_name(self) -> &'static str {
        match self {
            RegionKind::Document => "document",
            RegionKind::Block => "block",
            RegionKind::TabContainer => "tabs-cont",
            RegionKind::Text => "text",
            RegionKind::ReadOnlySpan => "readonly",
            RegionKind::LineFragment => "line-part",
            RegionKind::TabMarker => "tab",
            RegionKind::PendingTabMarker => "pre-tab",
            RegionKind::FixedTabStop => "tabstop",
            RegionKind::NonBreakingSpace => "nbsp",
            RegionKind::Image => "image",
            RegionKind::Embed => "embed",
        }
    }

    /// Classify an embed token by its key.
    pub fn for_embed(kind: &str) -> RegionKind {
        match kind {
            "tabstop" => RegionKind::FixedTabStop,
            "nbsp" => RegionKind::NonBreakingSpace,
            "image" => RegionKind::Image,
            _ => RegionKind::Embed,
        }
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.format_name())
    }
}

/// How a kind participates in the tree.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralRole {
    Root,
    Block,
    BlockEmbed,
    /// Inline wrapper that holds other inline nodes.
    Inline,
    InlineEmbed,
    Leaf,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RegionSpec {
    pub allowed_children: Vec<RegionKind>,
    pub role: StructuralRole,
}

impl RegionSpec {
    pub fn new(role: StructuralRole, allowed_children: impl IntoIterator<Item = RegionKind>) -> Self {
        Self {
            allowed_children: allowed_children.into_iter().collect(),
            role,
        }
    }
}

/// Registered region kinds plus the inline wrapping order.
#[derive(Clone, Debug)]
pub struct RegionRegistry {
    specs: BTreeMap<RegionKind, RegionSpec>,
    inline_order: Vec<RegionKind>,
}

const INLINE_CONTENT: [RegionKind; 8] = [
    RegionKind::Text,
    RegionKind::ReadOnlySpan,
    RegionKind::LineFragment,
    RegionKind::TabMarker,
    RegionKind::PendingTabMarker,
    RegionKind::NonBreakingSpace,
    RegionKind::Image,
    RegionKind::Embed,
];

impl RegionRegistry {
    /// An empty registry. Most callers want [`RegionRegistry::standard`].
    pub fn empty() -> Self {
        Self {
            specs: BTreeMap::new(),
            inline_order: Vec::new(),
        }
    }

    /// The registry used by the editor: every kind the tree knows about.
    pub fn standard() -> Self {
        use RegionKind::*;

        let mut registry = Self::empty();
        let entries = [
            (
                Document,
                RegionSpec::new(StructuralRole::Root, [Block, TabContainer, FixedTabStop]),
            ),
            (Block, RegionSpec::new(StructuralRole::Block, INLINE_CONTENT)),
            (TabContainer, RegionSpec::new(StructuralRole::Block, INLINE_CONTENT)),
            (ReadOnlySpan, RegionSpec::new(StructuralRole::Inline, INLINE_CONTENT)),
            (
                LineFragment,
                RegionSpec::new(
                    StructuralRole::Inline,
                    [Text, ReadOnlySpan, NonBreakingSpace, Image, Embed],
                ),
            ),
            (TabMarker, RegionSpec::new(StructuralRole::Inline, [Text])),
            (PendingTabMarker, RegionSpec::new(StructuralRole::Inline, [Text])),
            (Text, RegionSpec::new(StructuralRole::Leaf, [])),
            (FixedTabStop, RegionSpec::new(StructuralRole::BlockEmbed, [Text])),
            (NonBreakingSpace, RegionSpec::new(StructuralRole::InlineEmbed, [])),
            (Image, RegionSpec::new(StructuralRole::InlineEmbed, [])),
            (Embed, RegionSpec::new(StructuralRole::InlineEmbed, [])),
        ];
        registry.specs.extend(entries);
        registry.inline_order = vec![ReadOnlySpan, LineFragment, TabMarker, PendingTabMarker];
        registry
    }

    /// Register a kind with its structural constraints.
    pub fn register(&mut self, kind: RegionKind, spec: RegionSpec) -> Result<(), ConfigError> {
        if self.specs.contains_key(&kind) {
            return Err(ConfigError::DuplicateRegion(kind));
        }
        tracing::trace!(target: "quire::registry", %kind, role = ?spec.role, "register region");
        self.specs.insert(kind, spec);
        Ok(())
    }

    /// Set the wrapping order for overlapping inline kinds, outermost first.
    pub fn set_inline_order(&mut self, order: Vec<RegionKind>) -> Result<(), ConfigError> {
        for kind in &order {
            self.spec(*kind)?;
        }
        self.inline_order = order;
        Ok(())
    }

    pub fn spec(&self, kind: RegionKind) -> Result<&RegionSpec, ConfigError> {
        self.specs
            .get(&kind)
            .ok_or(ConfigError::UnregisteredRegion(kind))
    }

    /// Check every referenced child kind is itself registered.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for spec in self.specs.values() {
            for child in &spec.allowed_children {
                self.spec(*child)?;
            }
        }
        Ok(())
    }

    /// Whether `parent` accepts a child of kind `child`.
    pub fn allows(&self, parent: RegionKind, child: RegionKind) -> bool {
        self.specs
            .get(&parent)
            .is_some_and(|spec| spec.allowed_children.contains(&child))
    }

    /// Assert that `parent` accepts `child`.
    ///
    /// # Panics
    ///
    /// When the pairing is not allowed. The registry is fixed at startup, so
    /// a violation means the tree builder itself is wrong.
    #[track_caller]
    pub fn check_child(&self, parent: RegionKind, child: RegionKind) {
        if !self.allows(parent, child) {
            panic!("region `{parent}` does not accept a `{child}` child");
        }
    }

    /// Wrapping rank of an inline kind; lower ranks wrap outside higher ones.
    pub fn inline_rank(&self, kind: RegionKind) -> Option<usize> {
        self.inline_order.iter().position(|k| *k == kind)
    }

    pub fn inline_order(&self) -> &[RegionKind] {
        &self.inline_order
    }
}

impl Default for RegionRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
