//! B-tree index of books keyed by ISBN
//!
//! This module provides a classic (CLRS-style) B-tree where every node,
//! internal or leaf, stores full entries. It supports:
//! - Unique string keys compared byte-wise
//! - Insert with pre-emptive splitting on the way down
//! - Delete with predecessor/successor substitution and borrow/merge fill
//! - Partial update of price and quantity
//! - In-order iteration and flattening
//!
//! The tree lives only in memory; the flattened entry list is what gets
//! persisted by the callers.

mod error;
mod node;

pub use error::{BTreeError, BTreeResult};
pub use node::Node;

use crate::book::{Book, BookPatch};

/// Default minimum degree: nodes hold between 2 and 5 entries
pub const DEFAULT_DEGREE: usize = 3;

/// Check that `degree` is usable as a minimum degree
///
/// It must be at least 2, and `2 * degree` must fit in a `usize` so node
/// capacities can be computed.
pub fn is_valid_degree(degree: usize) -> bool {
    degree >= 2 && degree.checked_mul(2).is_some()
}

/// B-tree data structure
///
/// Minimum degree `t` means:
/// - Every node except the root holds between `t-1` and `2t-1` entries
/// - The root holds between `0` and `2t-1` entries
/// - An internal node with `k` entries has `k+1` children
/// - All leaves are at the same depth
#[derive(Debug, Clone)]
pub struct BTree {
    /// Root node (an empty leaf for an empty tree)
    root: Node,

    /// Minimum degree
    degree: usize,

    /// Total number of entries in the tree
    entry_count: usize,
}

impl BTree {
    /// Create a new empty B-tree with the given minimum degree
    ///
    /// # Arguments
    /// * `degree` - The minimum degree `t` (see [`is_valid_degree`])
    ///
    /// # Returns
    /// * `Ok(BTree)` - A new empty B-tree
    /// * `Err(BTreeError)` - If degree is invalid
    pub fn new(degree: usize) -> BTreeResult<Self> {
        if !is_valid_degree(degree) {
            return Err(BTreeError::InvalidDegree(degree));
        }

        Ok(Self {
            root: Node::new(),
            degree,
            entry_count: 0,
        })
    }

    /// Get the minimum degree
    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Check if tree is empty
    pub fn is_empty(&self) -> bool {
        self.entry_count == 0
    }

    /// Get number of entries in the tree
    pub fn len(&self) -> usize {
        self.entry_count
    }

    /// Get tree height (1 for a single root leaf, 0 for an empty tree)
    pub fn height(&self) -> usize {
        if self.root.is_empty() && self.root.is_leaf() {
            return 0;
        }

        let mut height = 1;
        let mut node = &self.root;
        while let Some(child) = node.children.first() {
            node = child;
            height += 1;
        }
        height
    }

    /// Get the root node
    pub fn root(&self) -> &Node {
        &self.root
    }

    // ========== Search Operations ==========

    /// Look up a book by ISBN
    pub fn get(&self, isbn: &str) -> Option<&Book> {
        let mut node = &self.root;

        loop {
            let idx = node.lower_bound(isbn);
            if let Some(entry) = node.entries.get(idx) {
                if entry.key() == isbn {
                    return Some(entry);
                }
            }
            node = node.children.get(idx)?;
        }
    }

    /// Check whether an ISBN is present
    pub fn contains(&self, isbn: &str) -> bool {
        self.get(isbn).is_some()
    }

    fn get_mut(&mut self, isbn: &str) -> Option<&mut Book> {
        let mut node = &mut self.root;

        loop {
            let idx = node.lower_bound(isbn);
            if node.entries.get(idx).is_some_and(|e| e.key() == isbn) {
                return node.entries.get_mut(idx);
            }
            node = node.children.get_mut(idx)?;
        }
    }

    // ========== Insert Operations ==========

    /// Insert a book into the tree
    ///
    /// Fails with `DuplicateKey` if the ISBN is already present; the tree is
    /// left untouched in that case.
    pub fn insert(&mut self, book: Book) -> BTreeResult<()> {
        if self.contains(&book.isbn) {
            return Err(BTreeError::DuplicateKey(book.isbn));
        }

        if self.root.is_full(self.degree) {
            // Grow the tree: the old root becomes the only child of a new root
            let old_root = std::mem::take(&mut self.root);
            let mut new_root = Node::with_entries(Vec::new(), vec![old_root]);
            Self::split_child(&mut new_root, 0, self.degree)?;
            self.root = new_root;
        }

        Self::insert_non_full(&mut self.root, book, self.degree)?;
        self.entry_count += 1;

        Ok(())
    }

    /// Insert into a node known not to be full
    fn insert_non_full(node: &mut Node, book: Book, degree: usize) -> BTreeResult<()> {
        let mut idx = node.upper_bound(book.key());

        if node.is_leaf() {
            node.entries.insert(idx, book);
            return Ok(());
        }

        if node.children[idx].is_full(degree) {
            Self::split_child(node, idx, degree)?;
            if book.key() > node.entries[idx].key() {
                idx += 1;
            }
        }

        Self::insert_non_full(&mut node.children[idx], book, degree)
    }

    /// Split parent.children[index], promoting its median into the parent
    fn split_child(parent: &mut Node, index: usize, degree: usize) -> BTreeResult<()> {
        let (median, right) = parent.children[index].split(degree)?;
        parent.entries.insert(index, median);
        parent.children.insert(index + 1, right);
        Ok(())
    }

    // ========== Delete Operations ==========

    /// Delete the book with the given ISBN, returning it
    ///
    /// Fails with `NotFound` if the ISBN is absent; the tree is left
    /// structurally identical in that case.
    pub fn delete(&mut self, isbn: &str) -> BTreeResult<Book> {
        if !self.contains(isbn) {
            return Err(BTreeError::NotFound(isbn.to_string()));
        }

        let removed = Self::delete_from(&mut self.root, isbn, self.degree)?;
        self.entry_count -= 1;

        // Shrink the tree when the root has been emptied by a merge
        if self.root.is_empty() && !self.root.is_leaf() {
            if let Some(child) = self.root.children.pop() {
                self.root = child;
            }
        }

        Ok(removed)
    }

    /// Delete `isbn` from the subtree rooted at `node`
    ///
    /// Every node visited below the root has at least `t` entries on entry,
    /// so removing one never leaves it under-full.
    fn delete_from(node: &mut Node, isbn: &str, degree: usize) -> BTreeResult<Book> {
        let idx = node.lower_bound(isbn);

        if node.entries.get(idx).is_some_and(|e| e.key() == isbn) {
            if node.is_leaf() {
                return Ok(node.entries.remove(idx));
            }
            return Self::delete_internal(node, idx, degree);
        }

        if node.is_leaf() {
            return Err(BTreeError::NotFound(isbn.to_string()));
        }

        let was_last = idx == node.len();
        if node.children[idx].len() < degree {
            Self::fill(node, idx, degree)?;
        }

        // A merge with the left sibling shifts the target child one slot left
        let child_idx = if was_last && idx > node.len() {
            idx - 1
        } else {
            idx
        };
        Self::delete_from(&mut node.children[child_idx], isbn, degree)
    }

    /// Delete node.entries[index] from an internal node
    fn delete_internal(node: &mut Node, index: usize, degree: usize) -> BTreeResult<Book> {
        if node.children[index].len() >= degree {
            let pred = Self::take_neighbor(node.children[index].predecessor())?;
            let pred = Self::delete_from(&mut node.children[index], &pred, degree)?;
            return Ok(std::mem::replace(&mut node.entries[index], pred));
        }

        if node.children[index + 1].len() >= degree {
            let succ = Self::take_neighbor(node.children[index + 1].successor())?;
            let succ = Self::delete_from(&mut node.children[index + 1], &succ, degree)?;
            return Ok(std::mem::replace(&mut node.entries[index], succ));
        }

        let isbn = node.entries[index].isbn.clone();
        node.merge_children(index)?;
        Self::delete_from(&mut node.children[index], &isbn, degree)
    }

    fn take_neighbor(entry: Option<&Book>) -> BTreeResult<String> {
        entry.map(|e| e.isbn.clone()).ok_or_else(|| {
            BTreeError::InvariantViolation("internal node has an empty subtree".to_string())
        })
    }

    /// Give node.children[index] at least `t` entries
    fn fill(node: &mut Node, index: usize, degree: usize) -> BTreeResult<()> {
        if index != 0 && node.children[index - 1].len() >= degree {
            node.borrow_from_prev(index)
        } else if index != node.len() && node.children[index + 1].len() >= degree {
            node.borrow_from_next(index)
        } else if index != node.len() {
            node.merge_children(index)
        } else {
            node.merge_children(index - 1)
        }
    }

    // ========== Update Operations ==========

    /// Overwrite the supplied price/quantity of an existing book
    ///
    /// Returns false (and changes nothing) if the ISBN is absent.
    pub fn patch(&mut self, patch: &BookPatch) -> bool {
        match self.get_mut(&patch.isbn) {
            Some(book) => {
                patch.apply_to(book);
                true
            }
            None => false,
        }
    }

    // ========== Traversal ==========

    /// Iterate over all entries in key order
    pub fn iter(&self) -> BTreeIter<'_> {
        BTreeIter::new(self)
    }

    /// Copy out every entry in ascending key order
    pub fn flatten(&self) -> Vec<Book> {
        self.iter().cloned().collect()
    }

    // ========== Validation ==========

    /// Verify every structural invariant of the tree
    pub fn check_invariants(&self) -> BTreeResult<()> {
        let mut leaf_depth = None;
        let mut count = 0;
        self.check_node(&self.root, 0, true, None, None, &mut leaf_depth, &mut count)?;

        if count != self.entry_count {
            return Err(BTreeError::InvariantViolation(format!(
                "entry count is {} but tree holds {}",
                self.entry_count, count
            )));
        }
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn check_node(
        &self,
        node: &Node,
        depth: usize,
        is_root: bool,
        lower: Option<&str>,
        upper: Option<&str>,
        leaf_depth: &mut Option<usize>,
        count: &mut usize,
    ) -> BTreeResult<()> {
        let max = 2 * self.degree - 1;
        let min = if is_root { 0 } else { self.degree - 1 };
        if node.len() < min || node.len() > max {
            return Err(BTreeError::InvariantViolation(format!(
                "node at depth {} holds {} entries (allowed {}..={})",
                depth,
                node.len(),
                min,
                max
            )));
        }

        for pair in node.entries.windows(2) {
            if pair[0].key() >= pair[1].key() {
                return Err(BTreeError::InvariantViolation(format!(
                    "entries out of order: {} before {}",
                    pair[0].key(),
                    pair[1].key()
                )));
            }
        }
        let out_of_range = |key: &str| {
            lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi)
        };
        if let Some(entry) = node.entries.iter().find(|e| out_of_range(e.key())) {
            return Err(BTreeError::InvariantViolation(format!(
                "entry {} escapes its separator bounds",
                entry.key()
            )));
        }
        *count += node.len();

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(BTreeError::InvariantViolation(format!(
                        "leaf at depth {} but other leaves at depth {}",
                        depth, expected
                    )));
                }
                Some(_) => {}
            }
            return Ok(());
        }

        if node.children.len() != node.len() + 1 {
            return Err(BTreeError::InvariantViolation(format!(
                "internal node with {} entries has {} children",
                node.len(),
                node.children.len()
            )));
        }

        for (i, child) in node.children.iter().enumerate() {
            let lo = if i == 0 {
                lower
            } else {
                Some(node.entries[i - 1].key())
            };
            let hi = node.entries.get(i).map(Book::key).or(upper);
            self.check_node(child, depth + 1, false, lo, hi, leaf_depth, count)?;
        }

        Ok(())
    }
}

impl Default for BTree {
    fn default() -> Self {
        Self {
            root: Node::new(),
            degree: DEFAULT_DEGREE,
            entry_count: 0,
        }
    }
}

/// In-order iterator over B-tree entries
pub struct BTreeIter<'a> {
    /// Path from the root: each node with the index of its next entry
    stack: Vec<(&'a Node, usize)>,
}

impl<'a> BTreeIter<'a> {
    fn new(tree: &'a BTree) -> Self {
        let mut iter = Self { stack: Vec::new() };
        iter.descend_left(&tree.root);
        iter
    }

    fn descend_left(&mut self, mut node: &'a Node) {
        loop {
            self.stack.push((node, 0));
            match node.children.first() {
                Some(child) => node = child,
                None => break,
            }
        }
    }
}

impl<'a> Iterator for BTreeIter<'a> {
    type Item = &'a Book;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.stack.last_mut()?;
            let node: &'a Node = top.0;
            let idx = top.1;

            if idx < node.len() {
                top.1 += 1;
                if let Some(child) = node.children.get(idx + 1) {
                    self.descend_left(child);
                }
                return Some(&node.entries[idx]);
            }

            self.stack.pop();
        }
    }
}

#[cfg(test)]
mod tests;
