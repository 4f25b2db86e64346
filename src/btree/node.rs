use std::mem;

use crate::book::Book;

use super::error::{BTreeError, BTreeResult};

/// B-tree node: sorted entries and, for internal nodes, the children that
/// bracket them
///
/// In this B-tree variant:
/// - children[i] holds every key less than entries[i]
/// - children[i + 1] holds every key greater than entries[i]
/// - children.len() == entries.len() + 1 for internal nodes
/// - a node is a leaf iff it has no children
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Entries sorted by ISBN
    pub entries: Vec<Book>,
    /// Child nodes (empty for a leaf)
    pub children: Vec<Node>,
}

impl Node {
    /// Create a new empty leaf node
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with given entries and children
    pub fn with_entries(entries: Vec<Book>, children: Vec<Node>) -> Self {
        debug_assert!(children.is_empty() || children.len() == entries.len() + 1);
        Self { entries, children }
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if node holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if this is a leaf node
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Check if the node holds the maximum `2t - 1` entries
    pub fn is_full(&self, degree: usize) -> bool {
        self.entries.len() >= 2 * degree - 1
    }

    /// Index of the first entry with key >= `key`
    pub fn lower_bound(&self, key: &str) -> usize {
        self.entries.partition_point(|e| e.key() < key)
    }

    /// Index of the first entry with key > `key`
    pub fn upper_bound(&self, key: &str) -> usize {
        self.entries.partition_point(|e| e.key() <= key)
    }

    /// Split this node around its median entry
    ///
    /// Entries `[0, t-2]` stay here, entry `t-1` is returned as the median and
    /// entries from `t` on move to the returned right sibling. For internal
    /// nodes the first `t` children stay and the rest move.
    pub fn split(&mut self, degree: usize) -> BTreeResult<(Book, Node)> {
        if self.entries.len() < degree {
            return Err(BTreeError::InvariantViolation(format!(
                "cannot split node with {} entries (degree {})",
                self.entries.len(),
                degree
            )));
        }

        let right_entries = self.entries.split_off(degree);
        let median = self.entries.pop().ok_or_else(|| {
            BTreeError::InvariantViolation("split node lost its median".to_string())
        })?;
        let right_children = if self.is_leaf() {
            Vec::new()
        } else {
            self.children.split_off(degree)
        };

        Ok((median, Node::with_entries(right_entries, right_children)))
    }

    /// Merge children[index + 1] and the separating entry into children[index]
    pub fn merge_children(&mut self, index: usize) -> BTreeResult<()> {
        if index + 1 >= self.children.len() {
            return Err(BTreeError::InvariantViolation(format!(
                "no right sibling to merge at child {}",
                index
            )));
        }
        if self.children[index + 1].is_empty() {
            return Err(BTreeError::InvariantViolation(
                "cannot merge with an empty sibling".to_string(),
            ));
        }

        let separator = self.entries.remove(index);
        let mut right = self.children.remove(index + 1);

        let left = &mut self.children[index];
        left.entries.push(separator);
        left.entries.append(&mut right.entries);
        left.children.append(&mut right.children);

        Ok(())
    }

    /// Rotate the last entry of children[index - 1] through the parent into
    /// the front of children[index]
    pub fn borrow_from_prev(&mut self, index: usize) -> BTreeResult<()> {
        if index == 0 || index >= self.children.len() {
            return Err(BTreeError::InvariantViolation(format!(
                "no left sibling for child {}",
                index
            )));
        }

        let (left, right) = self.children.split_at_mut(index);
        let sibling = &mut left[index - 1];
        let child = &mut right[0];

        let lent = sibling.entries.pop().ok_or_else(|| {
            BTreeError::InvariantViolation("left sibling has no entry to lend".to_string())
        })?;
        let separator = mem::replace(&mut self.entries[index - 1], lent);
        child.entries.insert(0, separator);

        if !sibling.is_leaf() {
            let moved = sibling.children.pop().ok_or_else(|| {
                BTreeError::InvariantViolation("left sibling has no child to lend".to_string())
            })?;
            child.children.insert(0, moved);
        }

        Ok(())
    }

    /// Rotate the first entry of children[index + 1] through the parent onto
    /// the end of children[index]
    pub fn borrow_from_next(&mut self, index: usize) -> BTreeResult<()> {
        if index + 1 >= self.children.len() {
            return Err(BTreeError::InvariantViolation(format!(
                "no right sibling for child {}",
                index
            )));
        }

        let (left, right) = self.children.split_at_mut(index + 1);
        let child = &mut left[index];
        let sibling = &mut right[0];

        if sibling.is_empty() {
            return Err(BTreeError::InvariantViolation(
                "right sibling has no entry to lend".to_string(),
            ));
        }
        let lent = sibling.entries.remove(0);
        let separator = mem::replace(&mut self.entries[index], lent);
        child.entries.push(separator);

        if !sibling.is_leaf() {
            child.children.push(sibling.children.remove(0));
        }

        Ok(())
    }

    /// Right-most entry of the subtree rooted here
    pub fn predecessor(&self) -> Option<&Book> {
        let mut node = self;
        while let Some(child) = node.children.last() {
            node = child;
        }
        node.entries.last()
    }

    /// Left-most entry of the subtree rooted here
    pub fn successor(&self) -> Option<&Book> {
        let mut node = self;
        while let Some(child) = node.children.first() {
            node = child;
        }
        node.entries.first()
    }
}
