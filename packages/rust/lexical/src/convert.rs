//! Streaming converter state machine.
//!
//! The converter receives start-tag / text / end-tag events from a document
//! walk and builds prototype nodes in an arena (`Vec` with parent
//! back-indices) guided by a stack of open-node indices. The finished arena
//! is assembled into the typed tree and pruned.

use crate::tree::{FORMAT_BOLD, FORMAT_CODE, FORMAT_ITALIC, LexicalNode, LexicalTree, prune_empty};

// ---------------------------------------------------------------------------
// Tag classification
// ---------------------------------------------------------------------------

/// What a tag means to the converter. Unrecognized tags are transparent:
/// no node is emitted but their children are processed in place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TagClass {
    /// Emits a block node and opens it on the stack.
    Block(BlockTag),
    /// Emits a list container node.
    List(ListKind),
    /// Pushes an inline format flag.
    Bold,
    Italic,
    Code,
    /// Captures `href` into the pending link.
    Anchor,
    /// Structural container: transparent, children processed in place.
    Container,
    /// Skipped along with all descendants.
    Ignored,
    /// Anything else: treated like a container.
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BlockTag {
    Paragraph,
    Heading(u8),
    Quote,
    ListItem,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ListKind {
    Bullet,
    Number,
}

impl ListKind {
    fn list_type(self) -> &'static str {
        match self {
            Self::Bullet => "bullet",
            Self::Number => "number",
        }
    }

    fn tag(self) -> &'static str {
        match self {
            Self::Bullet => "ul",
            Self::Number => "ol",
        }
    }
}

pub(crate) fn classify(tag: &str) -> TagClass {
    match tag {
        "p" => TagClass::Block(BlockTag::Paragraph),
        "h1" => TagClass::Block(BlockTag::Heading(1)),
        "h2" => TagClass::Block(BlockTag::Heading(2)),
        "h3" => TagClass::Block(BlockTag::Heading(3)),
        "h4" => TagClass::Block(BlockTag::Heading(4)),
        "h5" => TagClass::Block(BlockTag::Heading(5)),
        "h6" => TagClass::Block(BlockTag::Heading(6)),
        "blockquote" => TagClass::Block(BlockTag::Quote),
        "li" => TagClass::Block(BlockTag::ListItem),
        "ul" => TagClass::List(ListKind::Bullet),
        "ol" => TagClass::List(ListKind::Number),
        "strong" | "b" => TagClass::Bold,
        "em" | "i" => TagClass::Italic,
        "code" => TagClass::Code,
        "a" => TagClass::Anchor,
        "div" | "section" | "article" | "main" | "aside" | "nav" | "header" | "footer" => {
            TagClass::Container
        }
        "script" | "style" | "iframe" => TagClass::Ignored,
        _ => TagClass::Unknown,
    }
}

// ---------------------------------------------------------------------------
// Arena
// ---------------------------------------------------------------------------

/// A node under construction.
#[derive(Debug)]
enum Proto {
    Paragraph,
    Heading(u8),
    Quote,
    ListItem,
    List(ListKind),
    Text { text: String, format: u32 },
    Link { text: String, format: u32, url: String },
}

#[derive(Debug)]
struct ArenaNode {
    proto: Proto,
    /// Back-reference to the enclosing block; `None` for top-level nodes.
    #[allow(dead_code)]
    parent: Option<usize>,
    children: Vec<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InlineFormat {
    Bold,
    Italic,
    Code,
}

impl InlineFormat {
    fn bit(self) -> u32 {
        match self {
            Self::Bold => FORMAT_BOLD,
            Self::Italic => FORMAT_ITALIC,
            Self::Code => FORMAT_CODE,
        }
    }
}

// ---------------------------------------------------------------------------
// Converter
// ---------------------------------------------------------------------------

/// Push-style HTML → Lexical converter.
#[derive(Debug, Default)]
pub(crate) struct LexicalConverter {
    arena: Vec<ArenaNode>,
    /// Indices of top-level nodes, in emission order.
    roots: Vec<usize>,
    /// Construction-time stack of open block/list indices.
    open: Vec<usize>,
    formats: Vec<InlineFormat>,
    pending_link: Option<String>,
    buffer: String,
    /// Depth inside an ignored subtree; zero means emitting normally.
    ignore_depth: usize,
}

impl LexicalConverter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn start_tag(&mut self, name: &str, href: Option<&str>) {
        if self.ignore_depth > 0 {
            self.ignore_depth += 1;
            return;
        }
        if classify(name) == TagClass::Ignored {
            self.ignore_depth = 1;
            return;
        }

        self.flush_text();

        match classify(name) {
            TagClass::Block(tag) => {
                let proto = match tag {
                    BlockTag::Paragraph => Proto::Paragraph,
                    BlockTag::Heading(level) => Proto::Heading(level),
                    BlockTag::Quote => Proto::Quote,
                    BlockTag::ListItem => Proto::ListItem,
                };
                let index = self.alloc(proto);
                self.open.push(index);
            }
            TagClass::List(kind) => {
                let index = self.alloc(Proto::List(kind));
                self.open.push(index);
            }
            TagClass::Bold => self.formats.push(InlineFormat::Bold),
            TagClass::Italic => self.formats.push(InlineFormat::Italic),
            TagClass::Code => self.formats.push(InlineFormat::Code),
            TagClass::Anchor => {
                if let Some(url) = href {
                    self.pending_link = Some(url.to_string());
                }
            }
            TagClass::Container | TagClass::Unknown => {}
            TagClass::Ignored => unreachable!("handled above"),
        }
    }

    pub(crate) fn end_tag(&mut self, name: &str) {
        if self.ignore_depth > 0 {
            self.ignore_depth -= 1;
            return;
        }

        self.flush_text();

        match classify(name) {
            TagClass::Block(_) | TagClass::List(_) => {
                self.open.pop();
            }
            TagClass::Bold => self.remove_format(InlineFormat::Bold),
            TagClass::Italic => self.remove_format(InlineFormat::Italic),
            TagClass::Code => self.remove_format(InlineFormat::Code),
            TagClass::Anchor => self.pending_link = None,
            TagClass::Container | TagClass::Unknown | TagClass::Ignored => {}
        }
    }

    pub(crate) fn text(&mut self, data: &str) {
        if self.ignore_depth > 0 {
            return;
        }
        // Whitespace-only runs are dropped; meaningful runs keep their
        // inner spacing and are trimmed once at flush time.
        if !data.trim().is_empty() {
            self.buffer.push_str(data);
        }
    }

    pub(crate) fn finish(mut self) -> LexicalTree {
        self.flush_text();

        let children: Vec<LexicalNode> = self
            .roots
            .clone()
            .into_iter()
            .map(|index| self.assemble(index))
            .collect();

        LexicalTree::new(prune_empty(children))
    }

    // -- internals ----------------------------------------------------------

    fn alloc(&mut self, proto: Proto) -> usize {
        let parent = self.open.last().copied();
        let index = self.arena.len();
        self.arena.push(ArenaNode {
            proto,
            parent,
            children: Vec::new(),
        });
        match parent {
            Some(p) => self.arena[p].children.push(index),
            None => self.roots.push(index),
        }
        index
    }

    fn remove_format(&mut self, format: InlineFormat) {
        if let Some(pos) = self.formats.iter().position(|f| *f == format) {
            self.formats.remove(pos);
        }
    }

    fn format_mask(&self) -> u32 {
        self.formats.iter().fold(0, |mask, f| mask | f.bit())
    }

    fn flush_text(&mut self) {
        if self.buffer.is_empty() {
            return;
        }
        let text = self.buffer.trim().to_string();
        self.buffer.clear();
        if text.is_empty() {
            return;
        }

        let format = self.format_mask();
        let proto = match &self.pending_link {
            Some(url) => Proto::Link {
                text,
                format,
                url: url.clone(),
            },
            None => Proto::Text { text, format },
        };

        if self.open.is_empty() {
            // Bare text outside any block: wrap in a synthetic paragraph.
            let para = self.alloc(Proto::Paragraph);
            let index = self.arena.len();
            self.arena.push(ArenaNode {
                proto,
                parent: Some(para),
                children: Vec::new(),
            });
            self.arena[para].children.push(index);
        } else {
            self.alloc(proto);
        }
    }

    fn assemble(&self, index: usize) -> LexicalNode {
        let entry = &self.arena[index];
        let children: Vec<LexicalNode> = entry
            .children
            .iter()
            .map(|&child| self.assemble(child))
            .collect();

        match &entry.proto {
            Proto::Paragraph => LexicalNode::paragraph(children),
            Proto::Heading(level) => LexicalNode::heading(format!("h{level}"), children),
            Proto::Quote => LexicalNode::quote(children),
            Proto::ListItem => LexicalNode::list_item(children),
            Proto::List(kind) => LexicalNode::list(kind.list_type(), kind.tag(), children),
            Proto::Text { text, format } => LexicalNode::text(text.clone(), *format),
            Proto::Link { text, format, url } => {
                LexicalNode::link(text.clone(), *format, url.clone())
            }
        }
    }
}
