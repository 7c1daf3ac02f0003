//! Structured (JSON) rendering of a forest
//!
//! Include chains can be tens of thousands of levels deep, so the document is
//! stored flat and written with an explicit stack; neither building,
//! serializing nor dropping it recurses per level.

use std::collections::BTreeMap;

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::Forest;

const INDENT: &[u8] = b"  ";

/// Nested `{name, children}` mapping; `children` is omitted for leaves.
///
/// Node 0 is the top object. Children are keyed by name in a `BTreeMap`, so
/// serialized key order is the sorted order of child names.
#[derive(Debug, Clone)]
pub struct Document {
    nodes: Vec<DocumentNode>,
}

#[derive(Debug, Clone)]
struct DocumentNode {
    name: String,
    children: BTreeMap<String, usize>,
}

impl DocumentNode {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: BTreeMap::new(),
        }
    }
}

enum Step<'a> {
    Node { idx: usize, indent: usize },
    Entry {
        key: &'a str,
        idx: usize,
        indent: usize,
        first: bool,
    },
    Close { indent: usize },
}

impl Document {
    pub fn leaf(name: impl Into<String>) -> Self {
        Self {
            nodes: vec![DocumentNode::new(name)],
        }
    }

    /// Attach `child` below the top object, keyed by its name.
    pub fn with_child(mut self, child: Document) -> Self {
        let base = self.nodes.len();
        let key = child.name().to_string();
        self.nodes.extend(child.nodes.into_iter().map(|mut node| {
            node.children.values_mut().for_each(|idx| *idx += base);
            node
        }));
        self.nodes[0].children.insert(key, base);
        self
    }

    /// Name of the top object.
    pub fn name(&self) -> &str {
        &self.nodes[0].name
    }

    /// Names of the direct children of the top object, sorted.
    pub fn child_names(&self) -> Vec<&str> {
        self.nodes[0].children.keys().map(String::as_str).collect()
    }

    /// Pretty-printed JSON with two-space indentation, byte-compatible with
    /// `serde_json::to_vec_pretty` of the equivalent nested value.
    pub fn to_json_bytes(&self) -> ApplicationResult<Vec<u8>> {
        let mut out = Vec::new();
        let mut stack = vec![Step::Node { idx: 0, indent: 0 }];

        while let Some(step) = stack.pop() {
            match step {
                Step::Node { idx, indent } => {
                    let node = &self.nodes[idx];
                    out.extend_from_slice(b"{\n");
                    pad(&mut out, indent + 1);
                    out.extend_from_slice(b"\"name\": ");
                    write_string(&mut out, &node.name)?;
                    if node.children.is_empty() {
                        out.push(b'\n');
                        pad(&mut out, indent);
                        out.push(b'}');
                        continue;
                    }
                    out.extend_from_slice(b",\n");
                    pad(&mut out, indent + 1);
                    out.extend_from_slice(b"\"children\": {");
                    stack.push(Step::Close { indent });
                    for (position, (key, &child)) in node.children.iter().enumerate().rev() {
                        stack.push(Step::Entry {
                            key,
                            idx: child,
                            indent: indent + 2,
                            first: position == 0,
                        });
                    }
                }
                Step::Entry {
                    key,
                    idx,
                    indent,
                    first,
                } => {
                    if !first {
                        out.push(b',');
                    }
                    out.push(b'\n');
                    pad(&mut out, indent);
                    write_string(&mut out, key)?;
                    out.extend_from_slice(b": ");
                    stack.push(Step::Node { idx, indent });
                }
                Step::Close { indent } => {
                    out.push(b'\n');
                    pad(&mut out, indent + 1);
                    out.extend_from_slice(b"}\n");
                    pad(&mut out, indent);
                    out.push(b'}');
                }
            }
        }
        Ok(out)
    }
}

fn pad(out: &mut Vec<u8>, levels: usize) {
    for _ in 0..levels {
        out.extend_from_slice(INDENT);
    }
}

fn write_string(out: &mut Vec<u8>, value: &str) -> ApplicationResult<()> {
    serde_json::to_writer(&mut *out, value).map_err(|source| ApplicationError::Serialization {
        format: "json",
        source,
    })
}

/// Build the document for the whole forest, anchored at the forest label.
pub fn to_structured_document(forest: &Forest) -> Document {
    let mut document = Document::leaf(forest.label());
    // path[d] is the document node of the last category seen at depth d - 1
    let mut path = vec![0];
    for (depth, node) in forest.iter() {
        path.truncate(depth + 1);
        let parent = path[depth];
        let idx = document.nodes.len();
        document.nodes.push(DocumentNode::new(node.name.as_str()));
        document.nodes[parent]
            .children
            .insert(node.name.to_string(), idx);
        path.push(idx);
    }
    document
}
