//! Headless document model.
//!
//! Elements live in an arena owned by [`Document`] and are addressed by
//! [`NodeId`]. Only the parts of a browser document the hover card and media
//! renderers touch are modelled: tags, classes, attributes, inline style,
//! text, client rectangles, the viewport and keyboard focus.

use std::collections::BTreeMap;

use crate::hovercard::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 800.0,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    pub classes: Vec<String>,
    pub attributes: BTreeMap<String, String>,
    pub style: BTreeMap<String, String>,
    pub text: String,
    pub client_rects: Vec<Rect>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.classes.push(class.into());
        self
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_rect(mut self, rect: Rect) -> Self {
        self.client_rects.push(rect);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|candidate| candidate == class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Union of all client rects, or a zero rect when the element has no box.
    pub fn bounding_rect(&self) -> Rect {
        let mut rects = self.client_rects.iter();
        let Some(first) = rects.next() else {
            return Rect::default();
        };
        rects.fold(*first, |acc, rect| acc.union(rect))
    }
}

/// Detached element tree, used for content that is built once and inserted
/// into a document many times.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeSpec {
    pub element: Element,
    pub children: Vec<NodeSpec>,
}

impl NodeSpec {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }
}

#[derive(Debug, Clone, Default)]
pub struct Document {
    nodes: Vec<Element>,
    root: Option<NodeId>,
    focused: Option<NodeId>,
    pub viewport: Viewport,
}

impl Document {
    pub fn new() -> Self {
        let mut document = Self::default();
        let root = document.create(Element::new("body"));
        document.root = Some(root);
        document
    }

    pub fn root(&self) -> NodeId {
        self.root.unwrap_or(NodeId(0))
    }

    pub fn create(&mut self, element: Element) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Element {
            parent: None,
            children: Vec::new(),
            ..element
        });
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&Element> {
        self.nodes.get(id.0)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Element> {
        self.nodes.get_mut(id.0)
    }

    /// Creates `element` and appends it under `parent`.
    pub fn append(&mut self, parent: NodeId, element: Element) -> NodeId {
        let child = self.create(element);
        self.append_child(parent, child);
        child
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        if parent.0 >= self.nodes.len() || child.0 >= self.nodes.len() {
            return;
        }
        self.detach(child);
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
    }

    /// Builds fresh nodes for `spec` and its subtree, appended under `parent`.
    pub fn instantiate(&mut self, parent: NodeId, spec: &NodeSpec) -> NodeId {
        let node = self.append(parent, spec.element.clone());
        for child in &spec.children {
            self.instantiate(node, child);
        }
        node
    }

    /// Copies the element's own data without any children.
    pub fn clone_shallow(&mut self, id: NodeId) -> Option<NodeId> {
        let element = self.get(id)?.clone();
        Some(self.create(element))
    }

    pub fn clear_children(&mut self, id: NodeId) {
        let Some(element) = self.nodes.get_mut(id.0) else {
            return;
        };
        let children = std::mem::take(&mut element.children);
        for child in children {
            self.nodes[child.0].parent = None;
        }
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id)?.children.first().copied()
    }

    /// Walks from `id` up through its ancestors and returns the first match.
    pub fn closest(&self, id: NodeId, predicate: impl Fn(&Element) -> bool) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let element = self.get(current)?;
            if predicate(element) {
                return Some(current);
            }
            cursor = element.parent;
        }
        None
    }

    pub fn closest_with_class(&self, id: NodeId, class: &str) -> Option<NodeId> {
        self.closest(id, |element| element.has_class(class))
    }

    pub fn closest_with_attr(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.closest(id, |element| element.attributes.contains_key(name))
    }

    /// First attached element carrying `class`, in document order.
    pub fn find_by_class(&self, class: &str) -> Option<NodeId> {
        let mut stack = vec![self.root()];
        while let Some(id) = stack.pop() {
            let element = self.get(id)?;
            if element.has_class(class) {
                return Some(id);
            }
            stack.extend(element.children.iter().rev().copied());
        }
        None
    }

    pub fn add_class(&mut self, id: NodeId, class: &str) {
        if let Some(element) = self.get_mut(id)
            && !element.has_class(class)
        {
            element.classes.push(class.to_owned());
        }
    }

    pub fn remove_classes_with_prefix(&mut self, id: NodeId, prefix: &str) {
        if let Some(element) = self.get_mut(id) {
            element.classes.retain(|class| !class.starts_with(prefix));
        }
    }

    pub fn set_style(&mut self, id: NodeId, property: &str, value: impl Into<String>) {
        if let Some(element) = self.get_mut(id) {
            element.style.insert(property.to_owned(), value.into());
        }
    }

    pub fn remove_style(&mut self, id: NodeId, property: &str) {
        if let Some(element) = self.get_mut(id) {
            element.style.remove(property);
        }
    }

    pub fn style(&self, id: NodeId, property: &str) -> Option<&str> {
        self.get(id)?.style.get(property).map(String::as_str)
    }

    pub fn is_hidden(&self, id: NodeId) -> bool {
        self.style(id, "display") == Some("none")
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.focused
    }

    pub fn focus(&mut self, id: NodeId) {
        if self.get(id).is_some() {
            self.focused = Some(id);
        }
    }

    /// Concatenated text of the element and its descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut output = String::new();
        self.collect_text(id, &mut output);
        output
    }

    fn collect_text(&self, id: NodeId, output: &mut String) {
        let Some(element) = self.get(id) else {
            return;
        };
        output.push_str(&element.text);
        for child in &element.children {
            self.collect_text(*child, output);
        }
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.0].parent.take() {
            self.nodes[parent.0]
                .children
                .retain(|candidate| *candidate != child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Document, Element, NodeSpec};
    use crate::hovercard::geometry::Rect;

    #[test]
    fn closest_walks_ancestors_including_self() {
        let mut doc = Document::new();
        let container = doc.append(doc.root(), Element::new("div").with_class("outer"));
        let inner = doc.append(container, Element::new("span"));

        assert_eq!(doc.closest_with_class(inner, "outer"), Some(container));
        assert_eq!(doc.closest_with_class(container, "outer"), Some(container));
        assert_eq!(doc.closest_with_class(inner, "missing"), None);
    }

    #[test]
    fn find_by_class_ignores_detached_nodes() {
        let mut doc = Document::new();
        let _detached = doc.create(Element::new("div").with_class("target"));
        assert_eq!(doc.find_by_class("target"), None);

        let attached = doc.append(doc.root(), Element::new("div").with_class("target"));
        assert_eq!(doc.find_by_class("target"), Some(attached));
    }

    #[test]
    fn instantiate_builds_independent_copies() {
        let mut doc = Document::new();
        let spec = NodeSpec::new(Element::new("div").with_text("Ada"))
            .with_child(NodeSpec::new(Element::new("span").with_text(" Lovelace")));

        let first = doc.instantiate(doc.root(), &spec);
        let second = doc.instantiate(doc.root(), &spec);
        assert_ne!(first, second);

        doc.get_mut(first).expect("first copy exists").text = "changed".to_owned();
        assert_eq!(doc.text_content(second), "Ada Lovelace");
        assert_eq!(spec.element.text, "Ada");
    }

    #[test]
    fn clear_children_detaches_subtree() {
        let mut doc = Document::new();
        let parent = doc.append(doc.root(), Element::new("div"));
        let child = doc.append(parent, Element::new("p").with_class("gone"));

        doc.clear_children(parent);
        assert!(doc.get(parent).expect("parent exists").children().is_empty());
        assert_eq!(doc.get(child).expect("child exists").parent(), None);
        assert_eq!(doc.find_by_class("gone"), None);
    }

    #[test]
    fn bounding_rect_unions_client_rects() {
        let element = Element::new("a")
            .with_rect(Rect::new(10.0, 100.0, 50.0, 20.0))
            .with_rect(Rect::new(0.0, 120.0, 30.0, 20.0));
        assert_eq!(element.bounding_rect(), Rect::new(0.0, 100.0, 60.0, 40.0));
    }
}
