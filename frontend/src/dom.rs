// Copyright (c) 2025 sbksba
//
// This software is licensed under the terms of the MIT License.
// See the LICENSE file in the project root for the full license text.
//! In-memory element tree the synchronizer patches.
//!
//! Every element carries a [`NodeKey`] that is unique for the life of the
//! process. Deferred work (fades, notification dismissal) holds on to keys
//! rather than references, so a node that was already removed is simply not
//! found.
use std::fmt::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

/// Stable identity of an element.
pub type NodeKey = u64;

/// The document shared between the synchronizer and its timers.
pub type SharedDocument = Arc<Mutex<Document>>;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

// Elements serialized without a closing tag.
const VOID_TAGS: [&str; 4] = ["br", "input", "img", "hr"];

#[derive(Debug)]
pub enum Node {
    Element(Element),
    Text(String),
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Node::Element(element)
    }
}

#[derive(Debug)]
pub struct Element {
    key: NodeKey,
    tag: String,
    attrs: Vec<(String, String)>,
    children: Vec<Node>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            key: NEXT_KEY.fetch_add(1, Ordering::Relaxed),
            tag: tag.to_string(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    // --- Builders ---

    pub fn with_attr(mut self, name: &str, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.add_class(class);
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.set_hidden(hidden);
        self
    }

    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.children.push(Node::Text(text.into()));
        self
    }

    // --- Accessors ---

    pub fn key(&self) -> NodeKey {
        self.key
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_attr(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name.to_string(), value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|(n, _)| n != name);
    }

    pub fn id(&self) -> Option<&str> {
        self.attr("id")
    }

    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attr("class").unwrap_or("").split_whitespace()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes().any(|c| c == class)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        let joined = match self.attr("class") {
            Some(existing) if !existing.is_empty() => format!("{existing} {class}"),
            _ => class.to_string(),
        };
        self.set_attr("class", joined);
    }

    pub fn remove_class(&mut self, class: &str) {
        if !self.has_class(class) {
            return;
        }
        let kept: Vec<&str> = self.classes().filter(|c| *c != class).collect();
        let joined = kept.join(" ");
        self.set_attr("class", joined);
    }

    /// Replaces the whole class list, like assigning `className`.
    pub fn set_class_name(&mut self, classes: &str) {
        self.set_attr("class", classes.trim());
    }

    pub fn is_hidden(&self) -> bool {
        self.attr("hidden").is_some()
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        if hidden {
            self.set_attr("hidden", "");
        } else {
            self.remove_attr("hidden");
        }
    }

    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|node| match node {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        })
    }

    pub fn append(&mut self, child: impl Into<Node>) {
        self.children.push(child.into());
    }

    pub fn replace_children(&mut self, children: Vec<Node>) {
        self.children = children;
    }

    pub fn clear_children(&mut self) {
        self.children.clear();
    }

    /// Concatenated text of every descendant text node.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(text) => out.push_str(text),
                Node::Element(element) => element.collect_text(out),
            }
        }
    }

    /// Replaces all children with a single text node, like `textContent = ..`.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.children = vec![Node::Text(text.into())];
    }

    // --- Queries ---

    /// Depth-first search over this element and its descendants.
    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        if pred(self) {
            return Some(self);
        }
        self.child_elements().find_map(|child| child.find(pred))
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        if pred(self) {
            return Some(self);
        }
        for child in &mut self.children {
            if let Node::Element(element) = child {
                if let Some(found) = element.find_mut(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Visits this element and every descendant element.
    pub fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Element)) {
        f(self);
        for child in &mut self.children {
            if let Node::Element(element) = child {
                element.for_each_mut(f);
            }
        }
    }

    pub fn find_all(&self, pred: &dyn Fn(&Element) -> bool) -> Vec<&Element> {
        let mut out = Vec::new();
        self.collect_matches(pred, &mut out);
        out
    }

    fn collect_matches<'a>(&'a self, pred: &dyn Fn(&Element) -> bool, out: &mut Vec<&'a Element>) {
        if pred(self) {
            out.push(self);
        }
        for child in self.child_elements() {
            child.collect_matches(pred, out);
        }
    }

    /// Detaches the descendant with `key`. Returns `false` if it is not in
    /// this subtree anymore.
    pub fn remove_descendant(&mut self, key: NodeKey) -> bool {
        let before = self.children.len();
        self.children
            .retain(|node| !matches!(node, Node::Element(e) if e.key == key));
        if self.children.len() != before {
            return true;
        }
        self.children.iter_mut().any(|node| match node {
            Node::Element(element) => element.remove_descendant(key),
            Node::Text(_) => false,
        })
    }

    // --- Serialization ---

    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    /// Serialized children only, like `innerHTML`.
    pub fn inner_html(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            write_node(child, &mut out);
        }
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.tag);
        for (name, value) in &self.attrs {
            if value.is_empty() && name == "hidden" {
                let _ = write!(out, " {name}");
            } else {
                let _ = write!(out, " {name}=\"{}\"", escape_attr(value));
            }
        }
        out.push('>');
        if VOID_TAGS.contains(&self.tag.as_str()) {
            return;
        }
        for child in &self.children {
            write_node(child, out);
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn write_node(node: &Node, out: &mut String) {
    match node {
        Node::Text(text) => out.push_str(&escape_text(text)),
        Node::Element(element) => element.write_html(out),
    }
}

/// Escapes text content so it can never be read back as markup.
pub fn escape_text(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_attr(raw: &str) -> String {
    escape_text(raw).replace('"', "&quot;")
}

/// The page: a root element plus lookups used by the patches.
#[derive(Debug)]
pub struct Document {
    root: Element,
}

impl Document {
    pub fn new(root: Element) -> Self {
        Self { root }
    }

    pub fn into_shared(self) -> SharedDocument {
        Arc::new(Mutex::new(self))
    }

    pub fn root(&self) -> &Element {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Element {
        &mut self.root
    }

    pub fn find(&self, pred: &dyn Fn(&Element) -> bool) -> Option<&Element> {
        self.root.find(pred)
    }

    pub fn find_mut(&mut self, pred: &dyn Fn(&Element) -> bool) -> Option<&mut Element> {
        self.root.find_mut(pred)
    }

    pub fn by_id(&self, id: &str) -> Option<&Element> {
        self.root.find(&|e| e.id() == Some(id))
    }

    pub fn by_id_mut(&mut self, id: &str) -> Option<&mut Element> {
        self.root.find_mut(&|e| e.id() == Some(id))
    }

    pub fn by_key(&self, key: NodeKey) -> Option<&Element> {
        self.root.find(&|e| e.key() == key)
    }

    pub fn by_key_mut(&mut self, key: NodeKey) -> Option<&mut Element> {
        self.root.find_mut(&|e| e.key() == key)
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.by_key(key).is_some()
    }

    /// Detaches the element with `key`; a no-op if it is already gone.
    pub fn remove(&mut self, key: NodeKey) -> bool {
        self.root.remove_descendant(key)
    }

    pub fn to_html(&self) -> String {
        self.root.to_html()
    }
}
