//! The [`Node`] value model: a single tagged-variant type covering URIs,
//! CURIEs, literals, blank nodes and variables, per the "polymorphism over
//! node kinds" design note — one `Node` rather than a per-kind struct
//! family.

use crate::uri;
use bitflags::bitflags;
use std::fmt;

bitflags! {
    /// Per-node flags computed at construction time from the node's body.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct NodeFlags: u8 {
        const HAS_NEWLINE = 1;
        const HAS_QUOTE = 2;
        const HAS_ESCAPE = 4;
    }
}

impl NodeFlags {
    fn compute(s: &str) -> Self {
        let mut flags = NodeFlags::empty();
        if s.contains('\n') {
            flags |= NodeFlags::HAS_NEWLINE;
        }
        if s.contains('"') {
            flags |= NodeFlags::HAS_QUOTE;
        }
        if s.contains('\\') {
            flags |= NodeFlags::HAS_ESCAPE;
        }
        flags
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Uri,
    Curie,
    Literal,
    Blank,
    Variable,
}

/// Mutually exclusive literal annotation: a literal carries at most one of
/// a datatype URI/CURIE node or a language tag.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LiteralAnnotation {
    None,
    Datatype(Box<Node>),
    Language(String),
}

/// A single value of the RDF node model. Immutable once constructed;
/// `Clone` deep-clones the owned string body (and, for a typed literal, the
/// boxed datatype node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    kind: NodeKind,
    value: String,
    annotation: LiteralAnnotation,
    flags: NodeFlags,
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl Node {
    fn bare(kind: NodeKind, value: impl Into<String>) -> Self {
        let value = value.into();
        let flags = NodeFlags::compute(&value);
        Self {
            kind,
            value,
            annotation: LiteralAnnotation::None,
            flags,
        }
    }

    /// A plain string value with no RDF kind attached to it. Used
    /// internally by the reader's arena for in-progress lexical buffers;
    /// exposed because the writer needs to build one-off scratch values
    /// without committing to a node kind (spec §4.1, `new_string`).
    pub fn new_string(s: impl Into<String>) -> Self {
        Self::bare(NodeKind::Literal, s)
    }

    pub fn new_blank(s: impl Into<String>) -> Self {
        Self::bare(NodeKind::Blank, s)
    }

    pub fn new_uri(s: impl Into<String>) -> Self {
        Self::bare(NodeKind::Uri, s)
    }

    pub fn new_curie(s: impl Into<String>) -> Self {
        Self::bare(NodeKind::Curie, s)
    }

    pub fn new_variable(s: impl Into<String>) -> Self {
        Self::bare(NodeKind::Variable, s)
    }

    /// Builds a literal, validating that at most one of `datatype`/`lang` is
    /// given, that a `datatype` node is itself a URI or CURIE, and that
    /// `lang` is a well-formed BCP 47 language tag. Returns `None` on a
    /// violation, matching "fails (returning empty)" in spec §4.1.
    pub fn new_literal(body: impl Into<String>, datatype: Option<Node>, lang: Option<&str>) -> Option<Self> {
        match (datatype, lang) {
            (Some(_), Some(_)) => None,
            (Some(dt), None) => Self::new_typed_literal(body, dt),
            (None, Some(lang)) => Self::new_plain_literal(body, lang),
            (None, None) => Some(Self::bare(NodeKind::Literal, body)),
        }
    }

    pub fn new_typed_literal(body: impl Into<String>, datatype: Node) -> Option<Self> {
        if !matches!(datatype.kind, NodeKind::Uri | NodeKind::Curie) {
            return None;
        }
        let value = body.into();
        let flags = NodeFlags::compute(&value);
        Some(Self {
            kind: NodeKind::Literal,
            value,
            annotation: LiteralAnnotation::Datatype(Box::new(datatype)),
            flags,
        })
    }

    /// Returns `None` if `lang` is not a well-formed BCP 47 tag.
    pub fn new_plain_literal(body: impl Into<String>, lang: &str) -> Option<Self> {
        let lang = oxilangtag::LanguageTag::parse_and_normalize(lang).ok()?;
        let value = body.into();
        let flags = NodeFlags::compute(&value);
        Some(Self {
            kind: NodeKind::Literal,
            value,
            annotation: LiteralAnnotation::Language(lang.into_inner()),
            flags,
        })
    }

    pub fn new_integer(i: i64) -> Self {
        Self::bare(NodeKind::Literal, i.to_string())
    }

    /// Formats `d` with at most `precision` fractional digits, stripping
    /// trailing zeros but keeping a single `0` after the point. `NaN`/`Inf`
    /// yield `None` per spec §4.1/§8.
    pub fn new_decimal(d: f64, precision: usize) -> Option<Self> {
        if !d.is_finite() {
            return None;
        }
        let mut s = format!("{:.*}", precision, d);
        if let Some(dot) = s.find('.') {
            let last_nonzero = s[dot + 1..]
                .rfind(|c: char| c != '0')
                .map(|i| dot + 1 + i)
                .unwrap_or(dot);
            s.truncate((last_nonzero + 1).max(dot + 2));
        } else {
            s.push_str(".0");
        }
        Some(Self::bare(NodeKind::Literal, s))
    }

    pub fn new_boolean(b: bool) -> Self {
        Self::bare(NodeKind::Literal, if b { "true" } else { "false" })
    }

    /// Base64-encodes `bytes` into a literal body, per spec §4.1.
    pub fn new_blob(bytes: &[u8], wrap: Option<usize>) -> Self {
        Self::bare(NodeKind::Literal, crate::uri::base64_encode(bytes, wrap))
    }

    pub fn new_file_uri(path: &str, host: Option<&str>) -> Self {
        Self::bare(NodeKind::Uri, uri::file_uri_encode(path, host))
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn flags(&self) -> NodeFlags {
        self.flags
    }

    pub fn datatype(&self) -> Option<&Node> {
        match &self.annotation {
            LiteralAnnotation::Datatype(n) => Some(n),
            _ => None,
        }
    }

    pub fn language(&self) -> Option<&str> {
        match &self.annotation {
            LiteralAnnotation::Language(l) => Some(l),
            _ => None,
        }
    }
}
