//! Mutable syntax tree stored in a single arena.
//!
//! Every node lives in the tree's node vector and is addressed by a
//! [`NodeId`]. Parent and child links are indices, so the tree never holds a
//! second owning reference to a node.
//!
//! Each node caches the byte length of its text. Mutations update the cached
//! length of every ancestor before returning, so [`Tree::start_offset`] is
//! correct for any node right after any mutation. Composite text is never
//! stored; [`Tree::text`] rebuilds it from the leaves.
//!
//! Removed nodes stay in the arena as detached nodes. Their ids remain valid
//! but they are no longer reachable from the root.
//!
//! During a traversal, rules may only mutate the node being visited, its
//! subtree, or nodes later in document order. Mutating nodes that were
//! already visited is undefined behaviour as far as traversal order and
//! reported offsets go; see `RuleEngineBuilder::verify_mutation_region`.

use std::fmt;
use std::ops::Range;

use crate::kind::ElementKind;

/// Index of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Errors from illegal tree mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    /// The id was not created by this tree.
    #[error("node {0} does not belong to this tree")]
    UnknownNode(NodeId),

    /// The node has no parent, so it has no position to act on.
    #[error("node {0} is detached")]
    Detached(NodeId),

    /// Only detached nodes can be inserted.
    #[error("node {0} already has a parent")]
    AlreadyAttached(NodeId),

    /// The root cannot be removed, replaced or used as a sibling anchor.
    #[error("the root node cannot be {0}")]
    RootMutation(&'static str),

    /// Text can only be replaced on leaves.
    #[error("node {0} is a composite node")]
    NotALeaf(NodeId),

    /// Children can only be added to composite nodes.
    #[error("node {0} is a leaf and cannot have children")]
    NotAComposite(NodeId),

    /// The insertion would make a node its own ancestor.
    #[error("inserting {node} next to {anchor} would create a cycle")]
    Cycle {
        /// Node being inserted.
        node: NodeId,
        /// Anchor or parent of the insertion.
        anchor: NodeId,
    },
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: ElementKind,
    text: Option<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    len: usize,
    newlines: usize,
}

/// A mutable syntax tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<NodeData>,
    root: NodeId,
    revision: u64,
    comment_revision: u64,
    earliest_edit: Option<usize>,
}

impl Tree {
    /// Creates a tree holding only an empty root of the given kind.
    #[must_use]
    pub fn new(root_kind: ElementKind) -> Self {
        let mut tree = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            revision: 0,
            comment_revision: 0,
            earliest_edit: None,
        };
        tree.root = tree.push(root_kind, None);
        tree
    }

    fn push(&mut self, kind: ElementKind, text: Option<String>) -> NodeId {
        let id = NodeId(self.nodes.len());
        let len = text.as_ref().map_or(0, String::len);
        let newlines = text.as_deref().map_or(0, count_newlines);
        self.nodes.push(NodeData {
            kind,
            text,
            parent: None,
            children: Vec::new(),
            len,
            newlines,
        });
        id
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }

    fn data_mut(&mut self, node: NodeId) -> &mut NodeData {
        &mut self.nodes[node.index()]
    }

    fn check(&self, node: NodeId) -> Result<(), TreeError> {
        if node.index() < self.nodes.len() {
            Ok(())
        } else {
            Err(TreeError::UnknownNode(node))
        }
    }

    /// Creates a detached leaf.
    pub fn new_leaf(&mut self, kind: ElementKind, text: impl Into<String>) -> NodeId {
        self.push(kind, Some(text.into()))
    }

    /// Creates a detached, childless composite node.
    pub fn new_composite(&mut self, kind: ElementKind) -> NodeId {
        self.push(kind, None)
    }

    // ---- queries ----

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Returns the mutation counter. It increases on every successful mutation.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Returns a counter that increases whenever a comment leaf is attached,
    /// detached or rewritten.
    #[must_use]
    pub fn comment_revision(&self) -> u64 {
        self.comment_revision
    }

    /// Returns the lowest offset whose text changed since the last
    /// [`Tree::clear_earliest_edit`].
    ///
    /// Only mutations of nodes reachable from the root count.
    #[must_use]
    pub fn earliest_edit(&self) -> Option<usize> {
        self.earliest_edit
    }

    /// Forgets the edits recorded so far.
    pub fn clear_earliest_edit(&mut self) {
        self.earliest_edit = None;
    }

    /// Returns true if `node` was created by this tree.
    #[must_use]
    pub fn contains(&self, node: NodeId) -> bool {
        node.index() < self.nodes.len()
    }

    /// Returns the kind of a node.
    ///
    /// # Panics
    ///
    /// Panics if `node` does not belong to this tree. This holds for every
    /// query taking a [`NodeId`].
    #[must_use]
    pub fn kind(&self, node: NodeId) -> ElementKind {
        self.data(node).kind
    }

    /// Returns true if the node is a leaf.
    #[must_use]
    pub fn is_leaf(&self, node: NodeId) -> bool {
        self.data(node).text.is_some()
    }

    /// Returns the text of a leaf, or `None` for composite nodes.
    #[must_use]
    pub fn leaf_text(&self, node: NodeId) -> Option<&str> {
        self.data(node).text.as_deref()
    }

    /// Returns the byte length of the node's text.
    #[must_use]
    pub fn len(&self, node: NodeId) -> usize {
        self.data(node).len
    }

    /// Returns the parent of a node.
    #[must_use]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    /// Returns the ordered children of a node.
    #[must_use]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    /// Returns the first child of a node.
    #[must_use]
    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).first().copied()
    }

    /// Returns the last child of a node.
    #[must_use]
    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node).last().copied()
    }

    /// Returns the position of `child` among the children of `parent`.
    #[must_use]
    pub fn child_index(&self, parent: NodeId, child: NodeId) -> Option<usize> {
        if self.parent(child) != Some(parent) {
            return None;
        }
        self.children(parent).iter().position(|&c| c == child)
    }

    fn position(&self, node: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent(node)?;
        let index = self.child_index(parent, node)?;
        Some((parent, index))
    }

    /// Returns the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(node)?;
        self.children(parent).get(index + 1).copied()
    }

    /// Returns the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, node: NodeId) -> Option<NodeId> {
        let (parent, index) = self.position(node)?;
        index
            .checked_sub(1)
            .and_then(|i| self.children(parent).get(i).copied())
    }

    /// Returns true if the node is reachable from the root.
    #[must_use]
    pub fn is_attached(&self, node: NodeId) -> bool {
        self.ancestors_and_self(node).last() == Some(self.root)
    }

    /// Returns true if `ancestor` is `node` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, node: NodeId) -> bool {
        self.ancestors_and_self(node).any(|n| n == ancestor)
    }

    fn ancestors_and_self(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(node), move |&n| self.parent(n))
    }

    /// Returns the byte offset of the node's first character.
    ///
    /// For detached nodes the offset is relative to the top of their detached
    /// subtree.
    #[must_use]
    pub fn start_offset(&self, node: NodeId) -> usize {
        let mut offset = 0;
        let mut current = node;
        while let Some(parent) = self.parent(current) {
            offset += self
                .children(parent)
                .iter()
                .take_while(|&&c| c != current)
                .map(|&c| self.len(c))
                .sum::<usize>();
            current = parent;
        }
        offset
    }

    /// Returns the byte range covered by the node.
    #[must_use]
    pub fn text_range(&self, node: NodeId) -> Range<usize> {
        let start = self.start_offset(node);
        start..start + self.len(node)
    }

    /// Rebuilds the node's text from its leaves.
    #[must_use]
    pub fn text(&self, node: NodeId) -> String {
        let mut out = String::with_capacity(self.len(node));
        self.write_text(node, &mut out);
        out
    }

    fn write_text(&self, node: NodeId, out: &mut String) {
        let data = self.data(node);
        if let Some(text) = &data.text {
            out.push_str(text);
        } else {
            for &child in &data.children {
                self.write_text(child, out);
            }
        }
    }

    /// Returns the full text of the tree.
    #[must_use]
    pub fn to_text(&self) -> String {
        self.text(self.root)
    }

    /// Returns the text before the node in document order.
    #[must_use]
    pub fn text_before(&self, node: NodeId) -> String {
        let mut text = self.to_text();
        text.truncate(self.start_offset(node));
        text
    }

    /// Returns the node and all its descendants in pre-order.
    #[must_use]
    pub fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            out.push(current);
            stack.extend(self.children(current).iter().rev().copied());
        }
        out
    }

    /// Returns the leaves below (or at) the node in document order.
    #[must_use]
    pub fn leaves(&self, node: NodeId) -> Vec<NodeId> {
        self.descendants(node)
            .into_iter()
            .filter(|&n| self.is_leaf(n))
            .collect()
    }

    /// Returns the first leaf of the node's subtree.
    #[must_use]
    pub fn first_leaf(&self, node: NodeId) -> Option<NodeId> {
        if self.is_leaf(node) {
            return Some(node);
        }
        self.children(node).iter().find_map(|&c| self.first_leaf(c))
    }

    /// Returns the last leaf of the node's subtree.
    #[must_use]
    pub fn last_leaf(&self, node: NodeId) -> Option<NodeId> {
        if self.is_leaf(node) {
            return Some(node);
        }
        self.children(node)
            .iter()
            .rev()
            .find_map(|&c| self.last_leaf(c))
    }

    /// Returns the first leaf after the node's subtree in document order.
    #[must_use]
    pub fn next_leaf(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let mut sibling = self.next_sibling(current);
            while let Some(s) = sibling {
                if let Some(leaf) = self.first_leaf(s) {
                    return Some(leaf);
                }
                sibling = self.next_sibling(s);
            }
            current = self.parent(current)?;
        }
    }

    /// Returns the last leaf before the node's subtree in document order.
    #[must_use]
    pub fn prev_leaf(&self, node: NodeId) -> Option<NodeId> {
        let mut current = node;
        loop {
            let mut sibling = self.prev_sibling(current);
            while let Some(s) = sibling {
                if let Some(leaf) = self.last_leaf(s) {
                    return Some(leaf);
                }
                sibling = self.prev_sibling(s);
            }
            current = self.parent(current)?;
        }
    }

    /// Converts a byte offset into a 1-based (line, column) pair.
    ///
    /// Columns count characters, not bytes. Offsets past the end map to the
    /// position after the last character. Reads the cached lengths and
    /// newline counts instead of rebuilding the text.
    #[must_use]
    pub fn line_column(&self, offset: usize) -> (usize, usize) {
        let mut rest = offset.min(self.len(self.root));
        let mut line = 1;
        let mut node = self.root;
        'descend: while !self.is_leaf(node) {
            for &child in self.children(node) {
                let len = self.len(child);
                if rest < len {
                    node = child;
                    continue 'descend;
                }
                rest -= len;
                line += self.data(child).newlines;
            }
            break;
        }

        // `node` is now the leaf holding the offset, or the root when the
        // offset is the end of the text.
        let mut column = 1;
        let mut previous = if self.is_leaf(node) {
            let text = self.leaf_text(node).unwrap_or_default();
            let mut end = rest;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            let before = &text[..end];
            line += count_newlines(before);
            if let Some(newline) = before.rfind('\n') {
                return (line, before[newline + 1..].chars().count() + 1);
            }
            column += before.chars().count();
            self.prev_leaf(node)
        } else {
            self.last_leaf(node)
        };
        while let Some(leaf) = previous {
            let text = self.leaf_text(leaf).unwrap_or_default();
            if let Some(newline) = text.rfind('\n') {
                column += text[newline + 1..].chars().count();
                break;
            }
            column += text.chars().count();
            previous = self.prev_leaf(leaf);
        }
        (line, column)
    }

    // ---- mutations ----

    fn adjust_len(&mut self, from: Option<NodeId>, old: (usize, usize), new: (usize, usize)) {
        let mut current = from;
        while let Some(node) = current {
            let data = self.data_mut(node);
            data.len = data.len - old.0 + new.0;
            data.newlines = data.newlines - old.1 + new.1;
            current = data.parent;
        }
    }

    fn record_edit(&mut self, offset: usize) {
        self.earliest_edit = Some(self.earliest_edit.map_or(offset, |e| e.min(offset)));
    }

    fn has_comment(&self, node: NodeId) -> bool {
        self.descendants(node)
            .into_iter()
            .any(|n| self.is_leaf(n) && self.kind(n).is_comment())
    }

    fn check_insertable(&self, node: NodeId, anchor: NodeId) -> Result<(), TreeError> {
        self.check(node)?;
        self.check(anchor)?;
        if node == self.root {
            return Err(TreeError::RootMutation("inserted"));
        }
        if self.parent(node).is_some() {
            return Err(TreeError::AlreadyAttached(node));
        }
        if self.is_ancestor_or_self(node, anchor) {
            return Err(TreeError::Cycle { node, anchor });
        }
        Ok(())
    }

    fn attach(&mut self, parent: NodeId, index: usize, node: NodeId) {
        let size = (self.len(node), self.data(node).newlines);
        self.data_mut(parent).children.insert(index, node);
        self.data_mut(node).parent = Some(parent);
        self.adjust_len(Some(parent), (0, 0), size);
        self.revision += 1;
        if self.is_attached(parent) {
            if size.0 > 0 {
                let offset = if index + 1 == self.children(parent).len() {
                    self.start_offset(parent) + self.len(parent) - size.0
                } else {
                    self.start_offset(node)
                };
                self.record_edit(offset);
            }
            if self.has_comment(node) {
                self.comment_revision += 1;
            }
        }
    }

    fn sibling_position(&self, anchor: NodeId) -> Result<(NodeId, usize), TreeError> {
        if anchor == self.root {
            return Err(TreeError::RootMutation("used as a sibling anchor"));
        }
        self.position(anchor).ok_or(TreeError::Detached(anchor))
    }

    /// Inserts a detached node right before `anchor`.
    ///
    /// # Errors
    ///
    /// Fails if `node` is attached, `anchor` has no parent, or the insertion
    /// would create a cycle.
    pub fn insert_before(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_insertable(node, anchor)?;
        let (parent, index) = self.sibling_position(anchor)?;
        self.attach(parent, index, node);
        Ok(())
    }

    /// Inserts a detached node right after `anchor`.
    ///
    /// # Errors
    ///
    /// Same as [`Tree::insert_before`].
    pub fn insert_after(&mut self, anchor: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_insertable(node, anchor)?;
        let (parent, index) = self.sibling_position(anchor)?;
        self.attach(parent, index + 1, node);
        Ok(())
    }

    /// Appends a detached node as the last child of `parent`.
    ///
    /// # Errors
    ///
    /// Fails if `parent` is a leaf, `node` is attached, or the insertion
    /// would create a cycle.
    pub fn append_child(&mut self, parent: NodeId, node: NodeId) -> Result<(), TreeError> {
        self.check_insertable(node, parent)?;
        if self.is_leaf(parent) {
            return Err(TreeError::NotAComposite(parent));
        }
        let index = self.children(parent).len();
        self.attach(parent, index, node);
        Ok(())
    }

    /// Detaches a node (with its subtree) from its parent.
    ///
    /// # Errors
    ///
    /// Fails for the root and for nodes that are already detached.
    pub fn remove(&mut self, node: NodeId) -> Result<(), TreeError> {
        self.check(node)?;
        if node == self.root {
            return Err(TreeError::RootMutation("removed"));
        }
        let (parent, index) = self.position(node).ok_or(TreeError::Detached(node))?;
        let attached = self.is_attached(parent);
        let size = (self.len(node), self.data(node).newlines);
        if attached && size.0 > 0 {
            let offset = self.start_offset(node);
            self.record_edit(offset);
        }
        if attached && self.has_comment(node) {
            self.comment_revision += 1;
        }
        self.data_mut(parent).children.remove(index);
        self.data_mut(node).parent = None;
        self.adjust_len(Some(parent), size, (0, 0));
        self.revision += 1;
        Ok(())
    }

    /// Puts the detached node `replacement` where `node` is and detaches `node`.
    ///
    /// # Errors
    ///
    /// Combines the failure modes of [`Tree::insert_before`] and [`Tree::remove`].
    pub fn replace(&mut self, node: NodeId, replacement: NodeId) -> Result<(), TreeError> {
        self.insert_before(node, replacement)?;
        self.remove(node)
    }

    /// Replaces the text of a leaf.
    ///
    /// # Errors
    ///
    /// Fails if `node` is a composite node.
    pub fn replace_text(&mut self, node: NodeId, text: impl Into<String>) -> Result<(), TreeError> {
        self.check(node)?;
        let text = text.into();
        let Some(current) = self.leaf_text(node) else {
            return Err(TreeError::NotALeaf(node));
        };
        let common = current
            .bytes()
            .zip(text.bytes())
            .take_while(|(a, b)| a == b)
            .count();
        let changed = current != text;
        let old = (current.len(), count_newlines(current));
        let new = (text.len(), count_newlines(&text));

        if changed && self.is_attached(node) {
            let offset = self.start_offset(node) + common;
            self.record_edit(offset);
            if self.kind(node).is_comment() {
                self.comment_revision += 1;
            }
        }
        let data = self.data_mut(node);
        data.text = Some(text);
        data.len = new.0;
        data.newlines = new.1;
        let parent = data.parent;
        self.adjust_len(parent, old, new);
        self.revision += 1;
        Ok(())
    }

    /// Renders the tree structure, one node per line, for debugging and tests.
    #[must_use]
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_node(self.root, 0, &mut out);
        out
    }

    fn dump_node(&self, node: NodeId, depth: usize, out: &mut String) {
        use std::fmt::Write;
        let range = self.text_range(node);
        let _ = write!(
            out,
            "{}{:?}@{}..{}",
            "  ".repeat(depth),
            self.kind(node),
            range.start,
            range.end
        );
        if let Some(text) = self.leaf_text(node) {
            let _ = write!(out, " {text:?}");
        }
        out.push('\n');
        for &child in self.children(node) {
            self.dump_node(child, depth + 1, out);
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

fn count_newlines(text: &str) -> usize {
    text.bytes().filter(|&b| b == b'\n').count()
}

/// Converts a byte offset in `text` into a 1-based (line, column) pair.
#[must_use]
pub fn line_column(text: &str, offset: usize) -> (usize, usize) {
    let mut end = offset.min(text.len());
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    let before = &text[..end];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `val x` with a statement node: File[Statement[val, " ", x], "\n"]
    fn sample() -> (Tree, NodeId, [NodeId; 4]) {
        let mut tree = Tree::new(ElementKind::File);
        let root = tree.root();
        let stmt = tree.new_composite(ElementKind::Statement);
        let val = tree.new_leaf(ElementKind::ValKeyword, "val");
        let ws = tree.new_leaf(ElementKind::Whitespace, " ");
        let x = tree.new_leaf(ElementKind::Identifier, "x");
        let nl = tree.new_leaf(ElementKind::Whitespace, "\n");
        tree.append_child(stmt, val).unwrap();
        tree.append_child(stmt, ws).unwrap();
        tree.append_child(stmt, x).unwrap();
        tree.append_child(root, stmt).unwrap();
        tree.append_child(root, nl).unwrap();
        (tree, stmt, [val, ws, x, nl])
    }

    #[test]
    fn text_and_offsets() {
        let (tree, stmt, [val, ws, x, nl]) = sample();
        assert_eq!(tree.to_text(), "val x\n");
        assert_eq!(tree.text(stmt), "val x");
        assert_eq!(tree.text_range(val), 0..3);
        assert_eq!(tree.text_range(ws), 3..4);
        assert_eq!(tree.text_range(x), 4..5);
        assert_eq!(tree.text_range(nl), 5..6);
        assert_eq!(tree.len(tree.root()), 6);
    }

    #[test]
    fn navigation() {
        let (tree, stmt, [val, ws, x, nl]) = sample();
        assert_eq!(tree.parent(val), Some(stmt));
        assert_eq!(tree.next_sibling(val), Some(ws));
        assert_eq!(tree.prev_sibling(val), None);
        assert_eq!(tree.next_leaf(x), Some(nl));
        assert_eq!(tree.prev_leaf(nl), Some(x));
        assert_eq!(tree.first_leaf(tree.root()), Some(val));
        assert_eq!(tree.last_leaf(tree.root()), Some(nl));
        assert_eq!(tree.leaves(tree.root()), vec![val, ws, x, nl]);
    }

    #[test]
    fn replace_text_updates_every_offset() {
        let (mut tree, stmt, [val, ws, x, nl]) = sample();
        tree.replace_text(ws, "   ").unwrap();
        assert_eq!(tree.to_text(), "val   x\n");
        assert_eq!(tree.text_range(x), 6..7);
        assert_eq!(tree.text_range(nl), 7..8);
        assert_eq!(tree.len(stmt), 7);
        assert_eq!(tree.text_range(val), 0..3);
    }

    #[test]
    fn remove_and_insert() {
        let (mut tree, _, [val, ws, x, nl]) = sample();
        let before = tree.revision();
        tree.remove(ws).unwrap();
        assert_eq!(tree.to_text(), "valx\n");
        assert!(!tree.is_attached(ws));
        assert_eq!(tree.start_offset(nl), 4);

        let semi = tree.new_leaf(ElementKind::Semicolon, ";");
        tree.insert_after(x, semi).unwrap();
        let space = tree.new_leaf(ElementKind::Whitespace, " ");
        tree.insert_before(x, space).unwrap();
        assert_eq!(tree.to_text(), "val x;\n");
        assert_eq!(tree.text_range(val), 0..3);
        assert_eq!(tree.text_range(nl), 6..7);
        assert_eq!(tree.revision(), before + 3);
    }

    #[test]
    fn replace_swaps_nodes() {
        let (mut tree, _, [_, _, x, _]) = sample();
        let y = tree.new_leaf(ElementKind::Identifier, "yy");
        tree.replace(x, y).unwrap();
        assert_eq!(tree.to_text(), "val yy\n");
        assert!(!tree.is_attached(x));
        assert!(tree.is_attached(y));
    }

    #[test]
    fn illegal_mutations() {
        let (mut tree, stmt, [val, _, x, _]) = sample();
        let root = tree.root();
        assert_eq!(tree.remove(root), Err(TreeError::RootMutation("removed")));
        assert_eq!(tree.replace_text(stmt, "x"), Err(TreeError::NotALeaf(stmt)));
        assert_eq!(tree.insert_before(x, val), Err(TreeError::AlreadyAttached(val)));
        assert_eq!(tree.append_child(x, tree.root()), Err(TreeError::RootMutation("inserted")));

        let leaf = tree.new_leaf(ElementKind::Identifier, "z");
        assert_eq!(tree.append_child(val, leaf), Err(TreeError::NotAComposite(val)));
        assert_eq!(tree.remove(leaf), Err(TreeError::Detached(leaf)));

        tree.remove(stmt).unwrap();
        assert_eq!(
            tree.append_child(stmt, stmt),
            Err(TreeError::Cycle {
                node: stmt,
                anchor: stmt
            })
        );
    }

    #[test]
    fn line_column_counts_chars() {
        assert_eq!(line_column("ab\ncd", 0), (1, 1));
        assert_eq!(line_column("ab\ncd", 3), (2, 1));
        assert_eq!(line_column("ab\ncd", 4), (2, 2));
        assert_eq!(line_column("é\nx", 3), (2, 1));
        assert_eq!(line_column("ab", 99), (1, 3));
    }

    fn assert_positions_match_text(tree: &Tree) {
        let text = tree.to_text();
        for offset in 0..=text.len() + 1 {
            assert_eq!(
                tree.line_column(offset),
                line_column(&text, offset),
                "offset {offset} in {text:?}"
            );
        }
    }

    #[test]
    fn tree_line_column_agrees_with_text() {
        use crate::parser::{Parser, SourceParser};

        let mut tree = SourceParser::new()
            .parse("package a\n\n// é note\nfun f() {\n    g(1, \"ü\")\n}\n")
            .unwrap();
        assert_positions_match_text(&tree);

        let blank = tree
            .leaves(tree.root())
            .into_iter()
            .find(|&n| tree.leaf_text(n) == Some("\n\n"))
            .unwrap();
        tree.replace_text(blank, "\n").unwrap();
        assert_positions_match_text(&tree);

        let last = tree.last_leaf(tree.root()).unwrap();
        tree.remove(last).unwrap();
        assert_positions_match_text(&tree);

        assert_eq!(Tree::new(ElementKind::File).line_column(3), (1, 1));
    }

    #[test]
    fn earliest_edit_tracks_lowest_changed_offset() {
        let (mut tree, _, [val, ws, x, nl]) = sample();
        assert_eq!(tree.earliest_edit(), None);

        tree.replace_text(nl, "\n\n").unwrap();
        assert_eq!(tree.earliest_edit(), Some(6));
        tree.replace_text(x, "xy").unwrap();
        assert_eq!(tree.earliest_edit(), Some(5));
        tree.remove(ws).unwrap();
        assert_eq!(tree.earliest_edit(), Some(3));

        tree.clear_earliest_edit();
        tree.replace_text(val, "val").unwrap();
        let empty = tree.new_leaf(ElementKind::Whitespace, "");
        tree.insert_before(val, empty).unwrap();
        assert_eq!(tree.earliest_edit(), None);

        let detached = tree.new_composite(ElementKind::Statement);
        let leaf = tree.new_leaf(ElementKind::Identifier, "z");
        tree.append_child(detached, leaf).unwrap();
        assert_eq!(tree.earliest_edit(), None);
    }

    #[test]
    fn node_ids_are_arena_indices() {
        let mut tree = Tree::new(ElementKind::File);
        let ids: Vec<NodeId> = (0..1000)
            .map(|_| tree.new_leaf(ElementKind::Whitespace, " "))
            .collect();
        assert_eq!(tree.root().index(), 0);
        assert!(ids.iter().enumerate().all(|(i, id)| id.index() == i + 1));
    }

    #[test]
    fn comment_revision_moves_only_for_comments() {
        let (mut tree, _, [_, ws, _, nl]) = sample();
        let start = tree.comment_revision();
        tree.replace_text(ws, "  ").unwrap();
        assert_eq!(tree.comment_revision(), start);

        let comment = tree.new_leaf(ElementKind::EolComment, "// note");
        tree.insert_before(nl, comment).unwrap();
        assert_eq!(tree.comment_revision(), start + 1);
        tree.replace_text(comment, "// other").unwrap();
        assert_eq!(tree.comment_revision(), start + 2);
        tree.remove(comment).unwrap();
        assert_eq!(tree.comment_revision(), start + 3);
    }
}
