use crate::book::Isbn;
use crate::btree::{BTree, BTreeError};

use super::Operation;

/// What applying one operation did to the tree
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The tree was modified
    Applied,
    /// The operation was valid but had nothing to act on (PATCH of a missing ISBN)
    Unchanged,
    /// The operation was rejected; the tree is unchanged
    Failed(BTreeError),
}

/// Outcome of one operation, in log order
#[derive(Debug, Clone, PartialEq)]
pub struct OperationResult {
    /// 1-based position in the operation list
    pub position: usize,
    pub command: &'static str,
    pub isbn: Isbn,
    pub outcome: Outcome,
}

impl Operation {
    /// Apply this operation to the tree
    ///
    /// INSERT fills in a zero price/quantity when the payload has none.
    pub fn apply(&self, tree: &mut BTree) -> Outcome {
        let result = match self {
            Operation::Insert(book) => {
                let mut book = book.clone();
                book.price = book.price.or(Some(0.0));
                book.quantity = book.quantity.or(Some(0));
                tree.insert(book)
            }
            Operation::Delete { isbn, .. } => tree.delete(isbn).map(|_| ()),
            Operation::Patch(patch) => {
                if !tree.patch(patch) {
                    return Outcome::Unchanged;
                }
                Ok(())
            }
        };

        match result {
            Ok(()) => Outcome::Applied,
            Err(e) => Outcome::Failed(e),
        }
    }
}

/// Apply operations in order
///
/// A failed operation never stops the run: it is logged and recorded in the
/// returned list, and execution continues with the next one.
pub fn execute(tree: &mut BTree, operations: &[Operation]) -> Vec<OperationResult> {
    operations
        .iter()
        .enumerate()
        .map(|(i, operation)| {
            let position = i + 1;
            let outcome = operation.apply(tree);

            match &outcome {
                Outcome::Applied => tracing::debug!(
                    "#{} {} {} applied",
                    position,
                    operation.command(),
                    operation.isbn()
                ),
                Outcome::Unchanged => tracing::debug!(
                    "#{} {} {}: no such book, nothing changed",
                    position,
                    operation.command(),
                    operation.isbn()
                ),
                Outcome::Failed(e @ BTreeError::InvariantViolation(_)) => tracing::error!(
                    "#{} {} {} failed: {}",
                    position,
                    operation.command(),
                    operation.isbn(),
                    e
                ),
                Outcome::Failed(e) => tracing::warn!(
                    "#{} {} {} skipped: {}",
                    position,
                    operation.command(),
                    operation.isbn(),
                    e
                ),
            }

            OperationResult {
                position,
                command: operation.command(),
                isbn: operation.isbn().to_string(),
                outcome,
            }
        })
        .collect()
}
