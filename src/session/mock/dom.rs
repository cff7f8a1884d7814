//! In-memory DOM backing the mock session

use std::collections::{BTreeMap, HashMap};

use crate::session::traits::Rect;

/// Node identifier inside a [`MockDom`]
pub type NodeId = u64;

/// A mock element, also used as a builder when appending
#[derive(Debug, Clone)]
pub struct MockNode {
    pub tag: String,
    pub attributes: BTreeMap<String, String>,
    /// Text owned directly by this node (descendant text is appended on read)
    pub text: String,
    pub css: HashMap<String, String>,
    pub rect: Rect,
    pub displayed: bool,
    /// Numeric entry field: settles to "0" when emptied and renders
    /// thousands separators on blur
    pub numeric: bool,
    pub(super) parent: Option<NodeId>,
    pub(super) children: Vec<NodeId>,
}

impl MockNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            css: HashMap::new(),
            rect: Rect::new(0.0, 0.0, 100.0, 20.0),
            displayed: true,
            numeric: false,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn id(self, id: impl Into<String>) -> Self {
        self.attr("id", id)
    }

    /// Add a class to the `class` attribute
    pub fn class(mut self, class: impl Into<String>) -> Self {
        let class = class.into();
        let entry = self.attributes.entry("class".to_string()).or_default();
        if !entry.is_empty() {
            entry.push(' ');
        }
        entry.push_str(&class);
        self
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn value(self, value: impl Into<String>) -> Self {
        self.attr("value", value)
    }

    pub fn css(mut self, property: impl Into<String>, value: impl Into<String>) -> Self {
        self.css.insert(property.into(), value.into());
        self
    }

    pub fn rect(mut self, rect: Rect) -> Self {
        self.rect = rect;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.displayed = false;
        self
    }

    pub fn numeric(mut self) -> Self {
        self.numeric = true;
        self
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attributes
            .get("class")
            .map(|c| c.split_whitespace())
            .into_iter()
            .flatten()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }
}

/// Tree of mock nodes rooted at a `<body>`
#[derive(Debug)]
pub struct MockDom {
    nodes: HashMap<NodeId, MockNode>,
    root: NodeId,
    next_id: NodeId,
}

impl Default for MockDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDom {
    pub fn new() -> Self {
        let mut nodes = HashMap::new();
        nodes.insert(1, MockNode::new("body").rect(Rect::new(0.0, 0.0, 1280.0, 720.0)));
        Self {
            nodes,
            root: 1,
            next_id: 2,
        }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node(&self, id: NodeId) -> Option<&MockNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut MockNode> {
        self.nodes.get_mut(&id)
    }

    /// Append `node` under `parent` (the body when `None`). A missing parent
    /// falls back to the body.
    pub fn append(&mut self, parent: Option<NodeId>, mut node: MockNode) -> NodeId {
        let parent = parent.filter(|p| self.contains(*p)).unwrap_or(self.root);
        let id = self.allocate();
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        id
    }

    /// Detach and drop a subtree
    pub fn remove(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        if let Some(parent) = self.nodes.get(&id).and_then(|n| n.parent) {
            if let Some(p) = self.nodes.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        self.drop_subtree(id);
    }

    /// Replace a subtree with an identical copy under fresh ids, the way a
    /// reactive UI re-renders. Returns the new id of `id`.
    pub fn rerender(&mut self, id: NodeId) -> Option<NodeId> {
        if id == self.root || !self.contains(id) {
            return None;
        }
        let parent = self.nodes.get(&id)?.parent?;
        let position = self.nodes.get(&parent)?.children.iter().position(|c| *c == id)?;
        let fresh = self.copy_subtree(id, parent);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children[position] = fresh;
        }
        self.drop_subtree(id);
        Some(fresh)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Descendants of `id` in document order, excluding `id`
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_descendants(id, &mut out);
        out
    }

    /// Every node in document order, root first
    pub fn document_order(&self) -> Vec<NodeId> {
        let mut out = vec![self.root];
        self.collect_descendants(self.root, &mut out);
        out
    }

    pub fn ancestors(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut current = self.parent(id);
        while let Some(p) = current {
            out.push(p);
            current = self.parent(p);
        }
        out
    }

    /// Whether the node and all of its ancestors are displayed
    pub fn is_displayed(&self, id: NodeId) -> bool {
        std::iter::once(id)
            .chain(self.ancestors(id))
            .all(|n| self.nodes.get(&n).map(|n| n.displayed).unwrap_or(false))
    }

    /// Text of the node and its descendants, regardless of visibility
    pub fn string_value(&self, id: NodeId) -> String {
        let mut parts = Vec::new();
        self.collect_text(id, false, &mut parts);
        parts.join("\n")
    }

    /// Text a user would see: hidden subtrees contribute nothing
    pub fn rendered_text(&self, id: NodeId) -> String {
        if !self.is_displayed(id) {
            return String::new();
        }
        let mut parts = Vec::new();
        self.collect_text(id, true, &mut parts);
        parts.join("\n")
    }

    fn collect_text(&self, id: NodeId, visible_only: bool, parts: &mut Vec<String>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if visible_only && !node.displayed {
            return;
        }
        let own = node.text.trim();
        if !own.is_empty() {
            parts.push(own.to_string());
        }
        for child in &node.children {
            self.collect_text(*child, visible_only, parts);
        }
    }

    fn collect_descendants(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for child in self.children(id) {
            out.push(*child);
            self.collect_descendants(*child, out);
        }
    }

    fn allocate(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn copy_subtree(&mut self, id: NodeId, parent: NodeId) -> NodeId {
        let Some(original) = self.nodes.get(&id).cloned() else {
            return id;
        };
        let fresh = self.allocate();
        let mut copy = original.clone();
        copy.parent = Some(parent);
        copy.children.clear();
        self.nodes.insert(fresh, copy);
        for child in original.children {
            let child_copy = self.copy_subtree(child, fresh);
            if let Some(n) = self.nodes.get_mut(&fresh) {
                n.children.push(child_copy);
            }
        }
        fresh
    }

    fn drop_subtree(&mut self, id: NodeId) {
        if let Some(node) = self.nodes.remove(&id) {
            for child in node.children {
                self.drop_subtree(child);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_text() {
        let mut dom = MockDom::new();
        let list = dom.append(None, MockNode::new("ul"));
        dom.append(Some(list), MockNode::new("li").text("one"));
        dom.append(Some(list), MockNode::new("li").text("two").hidden());

        assert_eq!(dom.string_value(list), "one\ntwo");
        assert_eq!(dom.rendered_text(list), "one");
        assert_eq!(dom.descendants(dom.root()).len(), 3);
    }

    #[test]
    fn test_rerender_replaces_ids_in_place() {
        let mut dom = MockDom::new();
        let first = dom.append(None, MockNode::new("div").id("a"));
        let inner = dom.append(Some(first), MockNode::new("span").text("x"));
        let second = dom.append(None, MockNode::new("div").id("b"));

        let fresh = dom.rerender(first).unwrap();

        assert!(!dom.contains(first));
        assert!(!dom.contains(inner));
        assert_eq!(dom.children(dom.root()), &[fresh, second]);
        assert_eq!(dom.string_value(fresh), "x");
    }

    #[test]
    fn test_remove_subtree() {
        let mut dom = MockDom::new();
        let outer = dom.append(None, MockNode::new("div"));
        let inner = dom.append(Some(outer), MockNode::new("span"));
        dom.remove(outer);
        assert!(!dom.contains(outer));
        assert!(!dom.contains(inner));
        assert!(dom.children(dom.root()).is_empty());
    }

    #[test]
    fn test_class_builder_accumulates() {
        let node = MockNode::new("DIV").class("a").class("b");
        assert_eq!(node.tag, "div");
        assert!(node.has_class("a"));
        assert!(node.has_class("b"));
        assert_eq!(node.attribute("class"), Some("a b"));
    }
}
