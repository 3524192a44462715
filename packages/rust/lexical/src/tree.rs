//! Typed Lexical node tree.
//!
//! Field order is fixed by the struct definitions, so serialization is
//! byte-identical across runs for the same input.

use serde::{Deserialize, Serialize};

/// Bold text format bit.
pub const FORMAT_BOLD: u32 = 1;
/// Italic text format bit.
pub const FORMAT_ITALIC: u32 = 2;
/// Inline-code text format bit.
pub const FORMAT_CODE: u32 = 16;
// Bits 4/8/32/64 (strikethrough, underline, subscript, superscript) are
// reserved by the editor and never set by this converter.

/// A node in the Lexical document tree, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LexicalNode {
    /// A paragraph block.
    #[serde(rename = "paragraph")]
    Paragraph {
        format: String,
        indent: u32,
        version: u32,
        children: Vec<LexicalNode>,
        direction: String,
    },

    /// A heading block; `tag` is the source tag (`h1`..`h6`).
    #[serde(rename = "heading")]
    Heading {
        format: String,
        indent: u32,
        version: u32,
        children: Vec<LexicalNode>,
        direction: String,
        tag: String,
    },

    /// A blockquote.
    #[serde(rename = "quote")]
    Quote {
        format: String,
        indent: u32,
        version: u32,
        children: Vec<LexicalNode>,
        direction: String,
    },

    /// A list item, nested inside a list.
    #[serde(rename = "listitem")]
    ListItem {
        format: String,
        indent: u32,
        version: u32,
        children: Vec<LexicalNode>,
        direction: String,
    },

    /// A bullet or numbered list container.
    #[serde(rename = "list")]
    List {
        #[serde(rename = "listType")]
        list_type: String,
        start: u32,
        tag: String,
        format: String,
        indent: u32,
        version: u32,
        children: Vec<LexicalNode>,
        direction: String,
    },

    /// A leaf text run; `format` is the inline-format bitmask.
    #[serde(rename = "text")]
    Text {
        mode: String,
        text: String,
        style: String,
        detail: u32,
        format: u32,
        version: u32,
    },

    /// A leaf text run that carries a hyperlink.
    #[serde(rename = "link")]
    Link {
        mode: String,
        text: String,
        style: String,
        detail: u32,
        format: u32,
        version: u32,
        fields: LinkFields,
    },
}

/// Link payload on a [`LexicalNode::Link`] node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkFields {
    /// Always `"custom"` for converter-produced links.
    #[serde(rename = "linkType")]
    pub link_type: String,
    /// The link target URL, verbatim from the `href` attribute.
    pub url: String,
}

impl LexicalNode {
    /// Build a paragraph node with the given children.
    pub fn paragraph(children: Vec<LexicalNode>) -> Self {
        Self::Paragraph {
            format: String::new(),
            indent: 0,
            version: 1,
            children,
            direction: "ltr".into(),
        }
    }

    /// Build a heading node for `h1`..`h6`.
    pub fn heading(tag: impl Into<String>, children: Vec<LexicalNode>) -> Self {
        Self::Heading {
            format: String::new(),
            indent: 0,
            version: 1,
            children,
            direction: "ltr".into(),
            tag: tag.into(),
        }
    }

    /// Build a blockquote node.
    pub fn quote(children: Vec<LexicalNode>) -> Self {
        Self::Quote {
            format: String::new(),
            indent: 0,
            version: 1,
            children,
            direction: "ltr".into(),
        }
    }

    /// Build a list-item node.
    pub fn list_item(children: Vec<LexicalNode>) -> Self {
        Self::ListItem {
            format: String::new(),
            indent: 0,
            version: 1,
            children,
            direction: "ltr".into(),
        }
    }

    /// Build a list container; `list_type` is `"bullet"` or `"number"`.
    pub fn list(list_type: impl Into<String>, tag: impl Into<String>, children: Vec<LexicalNode>) -> Self {
        Self::List {
            list_type: list_type.into(),
            start: 1,
            tag: tag.into(),
            format: String::new(),
            indent: 0,
            version: 1,
            children,
            direction: "ltr".into(),
        }
    }

    /// Build a plain text node with a format bitmask.
    pub fn text(text: impl Into<String>, format: u32) -> Self {
        Self::Text {
            mode: "normal".into(),
            text: text.into(),
            style: String::new(),
            detail: 0,
            format,
            version: 1,
        }
    }

    /// Build a link text node.
    pub fn link(text: impl Into<String>, format: u32, url: impl Into<String>) -> Self {
        Self::Link {
            mode: "normal".into(),
            text: text.into(),
            style: String::new(),
            detail: 0,
            format,
            version: 1,
            fields: LinkFields {
                link_type: "custom".into(),
                url: url.into(),
            },
        }
    }

    /// True for leaf text runs (text and link nodes), which declare no
    /// children and are never pruned.
    pub fn is_leaf_text(&self) -> bool {
        matches!(self, Self::Text { .. } | Self::Link { .. })
    }

    /// Borrow this node's children, if it declares any.
    pub fn children(&self) -> Option<&Vec<LexicalNode>> {
        match self {
            Self::Paragraph { children, .. }
            | Self::Heading { children, .. }
            | Self::Quote { children, .. }
            | Self::ListItem { children, .. }
            | Self::List { children, .. } => Some(children),
            Self::Text { .. } | Self::Link { .. } => None,
        }
    }

    fn children_mut(&mut self) -> Option<&mut Vec<LexicalNode>> {
        match self {
            Self::Paragraph { children, .. }
            | Self::Heading { children, .. }
            | Self::Quote { children, .. }
            | Self::ListItem { children, .. }
            | Self::List { children, .. } => Some(children),
            Self::Text { .. } | Self::Link { .. } => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Root / tree
// ---------------------------------------------------------------------------

/// The fixed `root` node wrapping the converted children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootNode {
    #[serde(rename = "type")]
    kind: String,
    format: String,
    indent: u32,
    version: u32,
    /// Top-level block nodes.
    pub children: Vec<LexicalNode>,
    direction: String,
}

/// A complete Lexical document: `{"root": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LexicalTree {
    /// The document root.
    pub root: RootNode,
}

impl LexicalTree {
    /// Wrap top-level children in the fixed root node.
    pub fn new(children: Vec<LexicalNode>) -> Self {
        Self {
            root: RootNode {
                kind: "root".into(),
                format: String::new(),
                indent: 0,
                version: 1,
                children,
                direction: "ltr".into(),
            },
        }
    }

    /// Serialize to a `serde_json::Value` for embedding in a payload.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).expect("lexical tree serializes")
    }
}

// ---------------------------------------------------------------------------
// Cleanup
// ---------------------------------------------------------------------------

/// Drop nodes whose declared `children` list ends up empty, recursively.
/// Leaf text nodes declare no children and always survive.
pub fn prune_empty(nodes: Vec<LexicalNode>) -> Vec<LexicalNode> {
    let mut cleaned = Vec::with_capacity(nodes.len());
    for mut node in nodes {
        match node.children_mut() {
            Some(children) => {
                let kept = prune_empty(std::mem::take(children));
                if kept.is_empty() && !node.is_leaf_text() {
                    continue;
                }
                *node.children_mut().expect("children checked above") = kept;
                cleaned.push(node);
            }
            None => cleaned.push(node),
        }
    }
    cleaned
}
