use html5ever::parse_document;
use html5ever::serialize::{serialize, SerializeOpts, TraversalScope};
use html5ever::tendril::{StrTendril, TendrilSink};
use html5ever::tree_builder::TreeBuilderOpts;
use html5ever::ParseOpts;
use markup5ever::{Attribute, LocalName, Namespace, QualName};
use markup5ever_rcdom::{Node, NodeData, RcDom, SerializableHandle};
use std::cell::RefCell;
use std::rc::Rc;

pub use markup5ever_rcdom::Handle;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

/// A parsed HTML document. Owns the tree that every form view borrows.
pub struct Document {
    dom: RcDom,
}

impl Document {
    /// Parse an HTML string into a mutable document tree.
    pub fn parse(html: &str) -> Self {
        let opts = ParseOpts {
            tree_builder: TreeBuilderOpts {
                drop_doctype: true,
                ..Default::default()
            },
            ..Default::default()
        };

        let dom = parse_document(RcDom::default(), opts).one(html);
        tracing::debug!(bytes = html.len(), "parsed HTML document");
        Self { dom }
    }

    /// The document root node.
    pub fn root(&self) -> &Handle {
        &self.dom.document
    }

    /// All `<form>` elements in document order.
    pub fn forms(&self) -> Vec<Handle> {
        find_all(self.root(), "form", &[])
    }

    /// Create a detached HTML element owned by this document's tree.
    /// The node has no parent until it is appended somewhere.
    pub fn create_element(&self, tag: &str, attrs: &[(&str, &str)]) -> Handle {
        let attrs = attrs
            .iter()
            .map(|(name, value)| Attribute {
                name: attr_name(name),
                value: StrTendril::from_slice(value),
            })
            .collect();

        Node::new(NodeData::Element {
            name: QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(tag)),
            attrs: RefCell::new(attrs),
            template_contents: RefCell::new(None),
            mathml_annotation_xml_integration_point: false,
        })
    }

    /// Serialize the whole document back to HTML.
    pub fn to_html(&self) -> String {
        serialize_node(self.root(), TraversalScope::ChildrenOnly(None))
    }
}

fn attr_name(name: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(name))
}

/// Lowercase tag name of an element, `None` for other node kinds.
pub fn tag_name(node: &Handle) -> Option<String> {
    match &node.data {
        NodeData::Element { name, .. } => Some(name.local.to_string()),
        _ => None,
    }
}

pub fn is_element(node: &Handle, tag: &str) -> bool {
    match &node.data {
        NodeData::Element { name, .. } => name.local.as_ref().eq_ignore_ascii_case(tag),
        _ => false,
    }
}

pub fn attr(node: &Handle, name: &str) -> Option<String> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .find(|a| a.name.local.as_ref() == name)
            .map(|a| a.value.to_string()),
        _ => None,
    }
}

pub fn has_attr(node: &Handle, name: &str) -> bool {
    match &node.data {
        NodeData::Element { attrs, .. } => {
            attrs.borrow().iter().any(|a| a.name.local.as_ref() == name)
        }
        _ => false,
    }
}

/// All attributes of an element in source order.
pub fn attrs(node: &Handle) -> Vec<(String, String)> {
    match &node.data {
        NodeData::Element { attrs, .. } => attrs
            .borrow()
            .iter()
            .map(|a| (a.name.local.to_string(), a.value.to_string()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Set an attribute, replacing an existing value in place.
pub fn set_attr(node: &Handle, name: &str, value: &str) {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        match attrs.iter_mut().find(|a| a.name.local.as_ref() == name) {
            Some(existing) => existing.value = StrTendril::from_slice(value),
            None => attrs.push(Attribute {
                name: attr_name(name),
                value: StrTendril::from_slice(value),
            }),
        }
    }
}

/// Remove an attribute. Returns whether it was present.
pub fn remove_attr(node: &Handle, name: &str) -> bool {
    if let NodeData::Element { attrs, .. } = &node.data {
        let mut attrs = attrs.borrow_mut();
        let before = attrs.len();
        attrs.retain(|a| a.name.local.as_ref() != name);
        return attrs.len() != before;
    }
    false
}

/// Element descendants of `root` in document order, `root` excluded.
pub fn descendants(root: &Handle) -> Vec<Handle> {
    let mut out = Vec::new();
    collect_descendants(root, &mut out);
    out
}

fn collect_descendants(node: &Handle, out: &mut Vec<Handle>) {
    for child in node.children.borrow().iter() {
        if matches!(child.data, NodeData::Element { .. }) {
            out.push(child.clone());
        }
        collect_descendants(child, out);
    }
}

/// Every descendant element with the given tag whose attributes equal all
/// `filters`. An empty tag matches any element.
pub fn find_all(root: &Handle, tag: &str, filters: &[(&str, &str)]) -> Vec<Handle> {
    descendants(root)
        .into_iter()
        .filter(|node| tag.is_empty() || is_element(node, tag))
        .filter(|node| {
            filters
                .iter()
                .all(|(name, value)| attr(node, name).as_deref() == Some(*value))
        })
        .collect()
}

/// First match of [`find_all`] in document order.
pub fn find_first(root: &Handle, tag: &str, filters: &[(&str, &str)]) -> Option<Handle> {
    find_all(root, tag, filters).into_iter().next()
}

/// Append `child` as the last child of `parent`, detaching it first.
pub fn append_child(parent: &Handle, child: Handle) {
    decompose(&child);
    child.parent.set(Some(Rc::downgrade(parent)));
    parent.children.borrow_mut().push(child);
}

/// Remove a node (and its subtree) from the tree.
pub fn decompose(node: &Handle) {
    let parent = node.parent.take().and_then(|weak| weak.upgrade());
    if let Some(parent) = parent {
        parent
            .children
            .borrow_mut()
            .retain(|child| !Rc::ptr_eq(child, node));
    }
}

/// Replace all children of `node` with a single text node.
pub fn set_text(node: &Handle, text: &str) {
    let old: Vec<Handle> = node.children.borrow_mut().drain(..).collect();
    for child in &old {
        child.parent.set(None);
    }
    if !text.is_empty() {
        let text_node = Node::new(NodeData::Text {
            contents: RefCell::new(StrTendril::from_slice(text)),
        });
        append_child(node, text_node);
    }
}

/// Concatenated text of all descendant text nodes, untrimmed.
pub fn text_content(node: &Handle) -> String {
    let mut out = String::new();
    collect_text(node, &mut out);
    out
}

fn collect_text(node: &Handle, out: &mut String) {
    match &node.data {
        NodeData::Text { contents } => out.push_str(&contents.borrow()),
        _ => {
            for child in node.children.borrow().iter() {
                collect_text(child, out);
            }
        }
    }
}

/// Outer HTML of a node.
pub fn outer_html(node: &Handle) -> String {
    serialize_node(node, TraversalScope::IncludeNode)
}

fn serialize_node(node: &Handle, scope: TraversalScope) -> String {
    let mut bytes = Vec::new();
    let opts = SerializeOpts {
        traversal_scope: scope,
        ..Default::default()
    };
    let handle = SerializableHandle::from(node.clone());
    if let Err(err) = serialize(&mut bytes, &handle, opts) {
        tracing::warn!(%err, "failed to serialize node");
    }
    String::from_utf8_lossy(&bytes).into_owned()
}
