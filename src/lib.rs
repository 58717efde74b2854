//! Element queries over an in-memory document tree.
//!
//! The crate models the element-lookup surface old page scripts had to build by
//! hand: whole-token class membership tests, class-attribute mutation, ancestor
//! walks bounded at `<body>`, and descendant queries dispatched across three
//! host-capability tiers (native selector query, XPath evaluation, manual tree
//! walk). The tier is picked once from an explicit [`Capabilities`] value, so
//! every tier can be exercised deterministically regardless of which primitives
//! a real host would expose.
//!
//! ```
//! use element_query::{Capabilities, Dom, QueryEngine};
//!
//! let dom = Dom::from_html(
//!     r#"<div id='root'><p class='a b'>x</p><span class='ab'>y</span></div>"#,
//! )?;
//! let root = dom.by_id("root").unwrap();
//! let engine = QueryEngine::new(Capabilities::full());
//! let hits = engine.elements_by_class(&dom, root, "a")?;
//! assert_eq!(hits.len(), 1);
//! assert_eq!(dom.tag_name(hits[0]), Some("p"));
//! # Ok::<(), element_query::Error>(())
//! ```

use std::collections::HashMap;
use std::error::Error as StdError;
use std::fmt;

mod ancestry;
mod class_list;
mod engine;
mod html;
mod selector;
mod xpath;

pub use engine::{Capabilities, QueryEngine, QueryTier};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    HtmlParse(String),
    UnsupportedSelector(String),
    XPathParse(String),
    Regex(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HtmlParse(msg) => write!(f, "html parse error: {msg}"),
            Self::UnsupportedSelector(selector) => write!(f, "unsupported selector: {selector}"),
            Self::XPathParse(msg) => write!(f, "xpath parse error: {msg}"),
            Self::Regex(msg) => write!(f, "regex error: {msg}"),
        }
    }
}

impl StdError for Error {}

/// Opaque handle to a node owned by a [`Dom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) usize);

#[derive(Debug, Clone)]
pub(crate) enum NodeType {
    Document,
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
    pub(crate) node_type: NodeType,
}

#[derive(Debug, Clone)]
pub(crate) struct Element {
    pub(crate) tag_name: String,
    pub(crate) attrs: HashMap<String, String>,
}

/// Arena-backed document tree. Nodes are addressed by [`NodeId`] and never
/// freed for the lifetime of the tree.
#[derive(Debug, Clone)]
pub struct Dom {
    nodes: Vec<Node>,
    root: NodeId,
    id_index: HashMap<String, Vec<NodeId>>,
}

impl Dom {
    pub fn new() -> Self {
        let root = Node {
            parent: None,
            children: Vec::new(),
            node_type: NodeType::Document,
        };
        Self {
            nodes: vec![root],
            root: NodeId(0),
            id_index: HashMap::new(),
        }
    }

    pub fn from_html(html: &str) -> Result<Self> {
        html::parse_html(html)
    }

    /// The document node. It is a valid query root and ancestor-walk boundary
    /// but is not itself an element.
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn create_node(&mut self, parent: Option<NodeId>, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            parent,
            children: Vec::new(),
            node_type,
        });
        if let Some(parent_id) = parent {
            self.nodes[parent_id.0].children.push(id);
        }
        id
    }

    pub(crate) fn create_element(
        &mut self,
        parent: NodeId,
        tag_name: String,
        attrs: HashMap<String, String>,
    ) -> NodeId {
        let element = Element { tag_name, attrs };
        let id = self.create_node(Some(parent), NodeType::Element(element));
        if let Some(id_attr) = self
            .element(id)
            .and_then(|element| element.attrs.get("id").cloned())
        {
            self.index_id(&id_attr, id);
        }
        id
    }

    pub(crate) fn create_text(&mut self, parent: NodeId, text: String) -> NodeId {
        self.create_node(Some(parent), NodeType::Text(text))
    }

    /// Appends a new element under `parent` and returns its handle.
    pub fn append_element(
        &mut self,
        parent: NodeId,
        tag_name: &str,
        attrs: &[(&str, &str)],
    ) -> NodeId {
        let attrs = attrs
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), (*value).to_string()))
            .collect();
        self.create_element(parent, tag_name.to_ascii_lowercase(), attrs)
    }

    /// Appends a new text node under `parent` and returns its handle.
    pub fn append_text(&mut self, parent: NodeId, text: &str) -> NodeId {
        self.create_text(parent, text.to_string())
    }

    pub(crate) fn element(&self, node_id: NodeId) -> Option<&Element> {
        match &self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub(crate) fn element_mut(&mut self, node_id: NodeId) -> Option<&mut Element> {
        match &mut self.nodes[node_id.0].node_type {
            NodeType::Element(element) => Some(element),
            _ => None,
        }
    }

    pub fn is_element(&self, node_id: NodeId) -> bool {
        self.element(node_id).is_some()
    }

    /// Lowercased tag name; `None` for the document node and text nodes.
    pub fn tag_name(&self, node_id: NodeId) -> Option<&str> {
        self.element(node_id).map(|e| e.tag_name.as_str())
    }

    /// Attribute value by name. Names are stored lowercased, so the lookup is
    /// ASCII case-insensitive.
    pub fn attr(&self, node_id: NodeId, name: &str) -> Option<&str> {
        let name = name.to_ascii_lowercase();
        self.element(node_id)
            .and_then(|element| element.attrs.get(&name))
            .map(String::as_str)
    }

    pub fn set_attr(&mut self, node_id: NodeId, name: &str, value: &str) {
        let name = name.to_ascii_lowercase();
        let is_id = name == "id";
        let old_id = if is_id {
            self.attr(node_id, "id").map(str::to_string)
        } else {
            None
        };
        let Some(element) = self.element_mut(node_id) else {
            return;
        };
        element.attrs.insert(name, value.to_string());
        if is_id {
            if let Some(old) = old_id {
                self.unindex_id(&old, node_id);
            }
            self.index_id(value, node_id);
        }
    }

    pub fn parent(&self, node_id: NodeId) -> Option<NodeId> {
        self.nodes[node_id.0].parent
    }

    pub fn children(&self, node_id: NodeId) -> &[NodeId] {
        &self.nodes[node_id.0].children
    }

    pub fn by_id(&self, id: &str) -> Option<NodeId> {
        self.id_index.get(id).and_then(|ids| ids.first().copied())
    }

    pub(crate) fn index_id(&mut self, id: &str, node_id: NodeId) {
        if id.is_empty() {
            return;
        }
        self.id_index
            .entry(id.to_string())
            .or_default()
            .push(node_id);
    }

    pub(crate) fn unindex_id(&mut self, id: &str, node_id: NodeId) {
        if let Some(ids) = self.id_index.get_mut(id) {
            ids.retain(|existing| *existing != node_id);
            if ids.is_empty() {
                self.id_index.remove(id);
            }
        }
    }

    /// Concatenated text of the node's subtree.
    pub fn text_content(&self, node_id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(node_id, &mut out);
        out
    }

    fn collect_text(&self, node_id: NodeId, out: &mut String) {
        match &self.nodes[node_id.0].node_type {
            NodeType::Text(text) => out.push_str(text),
            NodeType::Document | NodeType::Element(_) => {
                for child in &self.nodes[node_id.0].children {
                    self.collect_text(*child, out);
                }
            }
        }
    }

    /// Every element under `root` in document order, `root` itself excluded.
    /// This is the tag-wildcard enumeration the manual query tier walks.
    pub fn descendant_elements(&self, root: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendant_elements_dfs(root, &mut out);
        out
    }

    fn collect_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        if matches!(self.nodes[node_id.0].node_type, NodeType::Element(_)) {
            out.push(node_id);
        }
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    fn collect_descendant_elements_dfs(&self, node_id: NodeId, out: &mut Vec<NodeId>) {
        for child in &self.nodes[node_id.0].children {
            self.collect_elements_dfs(*child, out);
        }
    }

    /// Host primitive behind the native query tier: descendants of `root`
    /// carrying `class_name` as a whole token, in document order.
    pub fn elements_by_class(&self, root: NodeId, class_name: &str) -> Vec<NodeId> {
        self.descendant_elements(root)
            .into_iter()
            .filter(|candidate| self.has_class(*candidate, class_name))
            .collect()
    }
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}
