//! Arena DOM with parent and sibling links.
//!
//! Nodes are never freed: removing a node detaches it, and its id stays valid
//! for lookups. That keeps ids stable for anything holding back-references
//! (marker sites, highlight wrappers) across mutations.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    Document {
        doctype: Option<String>,
    },
    Element {
        name: String,
        attributes: Vec<(String, Option<String>)>,
    },
    Text(String),
    Comment(String),
}

#[derive(Debug)]
pub enum DomError {
    UnknownNode(NodeId),
    NotAContainer(NodeId),
    NotAnElement(NodeId),
    /// `before` is not a child of `parent`.
    InvalidSibling { parent: NodeId, before: NodeId },
    CycleDetected { parent: NodeId, child: NodeId },
    DetachRoot,
}

impl fmt::Display for DomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomError::UnknownNode(id) => write!(f, "unknown node {id}"),
            DomError::NotAContainer(id) => write!(f, "node {id} cannot have children"),
            DomError::NotAnElement(id) => write!(f, "node {id} is not an element"),
            DomError::InvalidSibling { parent, before } => {
                write!(f, "node {before} is not a child of {parent}")
            }
            DomError::CycleDetected { parent, child } => {
                write!(f, "inserting {child} under {parent} would create a cycle")
            }
            DomError::DetachRoot => f.write_str("the document root cannot be detached"),
        }
    }
}

impl std::error::Error for DomError {}

#[derive(Debug)]
struct NodeRecord {
    kind: NodeKind,
    parent: Option<NodeId>,
    first_child: Option<NodeId>,
    last_child: Option<NodeId>,
    prev_sibling: Option<NodeId>,
    next_sibling: Option<NodeId>,
}

impl NodeRecord {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            first_child: None,
            last_child: None,
            prev_sibling: None,
            next_sibling: None,
        }
    }

    fn allows_children(&self) -> bool {
        matches!(self.kind, NodeKind::Document { .. } | NodeKind::Element { .. })
    }
}

#[derive(Debug)]
pub struct Dom {
    nodes: Vec<NodeRecord>,
}

impl Default for Dom {
    fn default() -> Self {
        Self::new()
    }
}

impl Dom {
    /// An empty document.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeRecord::new(NodeKind::Document { doctype: None })],
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the document root has no children.
    pub fn is_empty(&self) -> bool {
        self.first_child(self.root()).is_none()
    }

    fn record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.nodes.get(id.index())
    }

    fn record_mut(&mut self, id: NodeId) -> Result<&mut NodeRecord, DomError> {
        self.nodes.get_mut(id.index()).ok_or(DomError::UnknownNode(id))
    }

    fn push(&mut self, kind: NodeKind) -> NodeId {
        // Arena growth past u32 would need four billion nodes; saturate rather than wrap.
        let id = NodeId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        self.nodes.push(NodeRecord::new(kind));
        id
    }

    pub fn create_element(
        &mut self,
        name: &str,
        attributes: Vec<(String, Option<String>)>,
    ) -> NodeId {
        self.push(NodeKind::Element {
            name: name.to_ascii_lowercase(),
            attributes,
        })
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Text(text.into()))
    }

    pub fn create_comment(&mut self, text: impl Into<String>) -> NodeId {
        self.push(NodeKind::Comment(text.into()))
    }

    pub fn set_doctype(&mut self, doctype: String) {
        if let Some(NodeRecord {
            kind: NodeKind::Document { doctype: slot },
            ..
        }) = self.nodes.first_mut()
        {
            *slot = Some(doctype);
        }
    }

    pub fn doctype(&self) -> Option<&str> {
        match self.kind(self.root()) {
            Some(NodeKind::Document { doctype }) => doctype.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.record(id).map(|r| &r.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.parent
    }

    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.first_child
    }

    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.last_child
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.prev_sibling
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.record(id)?.next_sibling
    }

    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            dom: self,
            next: self.first_child(id),
        }
    }

    /// `id` and everything below it, in document order.
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        Descendants {
            dom: self,
            root: id,
            next: self.record(id).map(|_| id),
        }
    }

    /// Whether `id` is attached under the document root.
    pub fn is_connected(&self, id: NodeId) -> bool {
        self.ancestors(id).last() == Some(self.root())
    }

    /// `id` followed by its parent chain up to the topmost ancestor.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(self.record(id).map(|_| id), move |&n| self.parent(n))
    }

    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    pub fn element_name(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Element { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn comment_text(&self, id: NodeId) -> Option<&str> {
        match self.kind(id)? {
            NodeKind::Comment(text) => Some(text),
            _ => None,
        }
    }

    pub fn is_comment(&self, id: NodeId) -> bool {
        matches!(self.kind(id), Some(NodeKind::Comment(_)))
    }

    pub fn attributes(&self, id: NodeId) -> &[(String, Option<String>)] {
        match self.kind(id) {
            Some(NodeKind::Element { attributes, .. }) => attributes,
            _ => &[],
        }
    }

    /// Value of attribute `name`; valueless attributes read as `""`.
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.attributes(id)
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_deref().unwrap_or(""))
    }

    pub fn has_attribute(&self, id: NodeId, name: &str) -> bool {
        self.attribute(id, name).is_some()
    }

    pub fn set_attribute(
        &mut self,
        id: NodeId,
        name: &str,
        value: Option<String>,
    ) -> Result<(), DomError> {
        match &mut self.record_mut(id)?.kind {
            NodeKind::Element { attributes, .. } => {
                match attributes.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(name)) {
                    Some((_, slot)) => *slot = value,
                    None => attributes.push((name.to_ascii_lowercase(), value)),
                }
                Ok(())
            }
            _ => Err(DomError::NotAnElement(id)),
        }
    }

    /// Concatenated text of every text node under `id`.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        for node in self.descendants(id) {
            if let Some(NodeKind::Text(text)) = self.kind(node) {
                out.push_str(text);
            }
        }
        out
    }

    fn check_insert(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent_record = self.record(parent).ok_or(DomError::UnknownNode(parent))?;
        self.record(child).ok_or(DomError::UnknownNode(child))?;
        if !parent_record.allows_children() {
            return Err(DomError::NotAContainer(parent));
        }
        // Only a node with children can be an ancestor of `parent`.
        let may_contain = self.first_child(child).is_some() && self.contains(child, parent);
        if child == self.root() || child == parent || may_contain {
            return Err(DomError::CycleDetected { parent, child });
        }
        Ok(())
    }

    /// Move `child` to the end of `parent`'s children.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        self.unlink(child);
        let last = self.last_child(parent);
        {
            let record = self.record_mut(child)?;
            record.parent = Some(parent);
            record.prev_sibling = last;
        }
        match last {
            Some(last) => self.record_mut(last)?.next_sibling = Some(child),
            None => self.record_mut(parent)?.first_child = Some(child),
        }
        self.record_mut(parent)?.last_child = Some(child);
        Ok(())
    }

    /// Move `child` directly before `before`, which must be a child of `parent`.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: NodeId,
    ) -> Result<(), DomError> {
        self.check_insert(parent, child)?;
        if self.parent(before) != Some(parent) {
            return Err(DomError::InvalidSibling { parent, before });
        }
        if child == before {
            return Ok(());
        }
        self.unlink(child);
        let prev = self.previous_sibling(before);
        {
            let record = self.record_mut(child)?;
            record.parent = Some(parent);
            record.prev_sibling = prev;
            record.next_sibling = Some(before);
        }
        self.record_mut(before)?.prev_sibling = Some(child);
        match prev {
            Some(prev) => self.record_mut(prev)?.next_sibling = Some(child),
            None => self.record_mut(parent)?.first_child = Some(child),
        }
        Ok(())
    }

    /// Insert `child` directly after `after` in `after`'s parent.
    pub fn insert_after(&mut self, after: NodeId, child: NodeId) -> Result<(), DomError> {
        let parent = self.parent(after).ok_or(DomError::DetachRoot)?;
        match self.next_sibling(after) {
            Some(next) => self.insert_before(parent, child, next),
            None => self.append_child(parent, child),
        }
    }

    /// Detach `id` (and its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) -> Result<(), DomError> {
        if id == self.root() {
            return Err(DomError::DetachRoot);
        }
        self.record(id).ok_or(DomError::UnknownNode(id))?;
        self.unlink(id);
        Ok(())
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(record) = self.nodes.get_mut(id.index()) else {
            return;
        };
        let parent = record.parent.take();
        let prev = record.prev_sibling.take();
        let next = record.next_sibling.take();
        let Some(parent) = parent else {
            return;
        };
        match prev {
            Some(prev) => self.nodes[prev.index()].next_sibling = next,
            None => self.nodes[parent.index()].first_child = next,
        }
        match next {
            Some(next) => self.nodes[next.index()].prev_sibling = prev,
            None => self.nodes[parent.index()].last_child = prev,
        }
    }
}

pub struct Children<'a> {
    dom: &'a Dom,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.next_sibling(current);
        Some(current)
    }
}

/// Pre-order walk driven by the sibling links; no allocation, no recursion.
pub struct Descendants<'a> {
    dom: &'a Dom,
    root: NodeId,
    next: Option<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.dom.first_child(current).or_else(|| {
            let mut node = current;
            loop {
                if node == self.root {
                    return None;
                }
                if let Some(next) = self.dom.next_sibling(node) {
                    return Some(next);
                }
                node = self.dom.parent(node)?;
            }
        });
        Some(current)
    }
}
