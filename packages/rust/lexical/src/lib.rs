//! HTML → Lexical rich-text conversion.
//!
//! Converts an HTML body into the nested node tree used by the Payload
//! Lexical editor. The parse is a single pass over the markup: block tags
//! open nodes on a stack, inline tags toggle format bits, and text runs
//! flush into the innermost open block. Output is deterministic — the same
//! HTML always serializes to byte-identical JSON.

mod convert;
mod tree;

use ego_tree::NodeRef;
use scraper::{Html, node::Node};
use tracing::debug;

use convert::LexicalConverter;
pub use tree::{
    FORMAT_BOLD, FORMAT_CODE, FORMAT_ITALIC, LexicalNode, LexicalTree, LinkFields, prune_empty,
};

/// Convert an HTML fragment into a Lexical document tree.
///
/// Structural containers (`div`, `section`, …) are transparent; `script`,
/// `style`, and `iframe` subtrees are skipped entirely; bare text is wrapped
/// in a synthetic paragraph; blocks left without children are pruned.
pub fn html_to_lexical(html: &str) -> LexicalTree {
    let fragment = Html::parse_fragment(html);
    let mut converter = LexicalConverter::new();
    walk(&mut converter, fragment.tree.root());
    let tree = converter.finish();
    debug!(
        input_len = html.len(),
        blocks = tree.root.children.len(),
        "converted html to lexical"
    );
    tree
}

/// Feed the parsed DOM to the converter in document order, emitting
/// start/text/end events exactly as a streaming tag scan would.
fn walk(converter: &mut LexicalConverter, node: NodeRef<'_, Node>) {
    for child in node.children() {
        match child.value() {
            Node::Element(element) => {
                converter.start_tag(element.name(), element.attr("href"));
                walk(converter, child);
                converter.end_tag(element.name());
            }
            Node::Text(text) => converter.text(&text.text),
            _ => {}
        }
    }
}
