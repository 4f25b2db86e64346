use super::*;

fn book(isbn: &str) -> Book {
    Book::new(isbn, format!("Title {}", isbn), "Author", Some(10.0), Some(1))
}

/// Zero-padded ISBN so that byte order matches numeric order
fn isbn(i: usize) -> String {
    format!("978-{:05}", i)
}

fn keys(tree: &BTree) -> Vec<String> {
    tree.iter().map(|b| b.isbn.clone()).collect()
}

fn node_keys(node: &Node) -> Vec<&str> {
    node.entries.iter().map(Book::key).collect()
}

/// root ["978-3"], children ["978-1", "978-2"] and ["978-4", "978-5", "978-6"]
fn two_level_tree() -> BTree {
    let mut tree = BTree::new(3).unwrap();
    for i in 1..=6 {
        tree.insert(book(&format!("978-{}", i))).unwrap();
    }
    assert_eq!(node_keys(tree.root()), vec!["978-3"]);
    tree
}

#[test]
fn test_new_tree() {
    let tree = BTree::new(3).unwrap();
    assert!(tree.is_empty());
    assert_eq!(tree.len(), 0);
    assert_eq!(tree.height(), 0);
    assert_eq!(tree.degree(), 3);
    assert!(tree.flatten().is_empty());
    tree.check_invariants().unwrap();
}

#[test]
fn test_invalid_degree() {
    assert_eq!(BTree::new(1).unwrap_err(), BTreeError::InvalidDegree(1));
    assert!(BTree::new(0).is_err());
    assert!(BTree::new(2).is_ok());
    assert_eq!(BTree::default().degree(), DEFAULT_DEGREE);
}

#[test]
fn test_degree_that_overflows_capacity_rejected() {
    assert_eq!(
        BTree::new(usize::MAX).unwrap_err(),
        BTreeError::InvalidDegree(usize::MAX)
    );
    assert!(BTree::new(usize::MAX / 2 + 1).is_err());

    let mut tree = BTree::new(usize::MAX / 2).unwrap();
    tree.insert(book("978-1")).unwrap();
    assert_eq!(keys(&tree), vec!["978-1"]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_single_insert_and_get() {
    let mut tree = BTree::new(3).unwrap();

    tree.insert(book("978-42")).unwrap();

    assert_eq!(tree.len(), 1);
    assert_eq!(tree.height(), 1);
    assert_eq!(tree.get("978-42").and_then(|b| b.name.as_deref()), Some("Title 978-42"));
    assert!(tree.get("978-41").is_none());
}

#[test]
fn test_root_split_on_seven_keys() {
    let mut tree = BTree::new(3).unwrap();
    let inserted = [
        "978-1", "978-2", "978-3", "978-4", "978-5", "978-6", "978-7",
    ];

    for key in inserted {
        tree.insert(book(key)).unwrap();
        tree.check_invariants().unwrap();
    }

    assert!(tree.height() >= 2);
    assert!(!tree.root().is_leaf());
    assert_eq!(keys(&tree), inserted.to_vec());
}

#[test]
fn test_split_promotes_median() {
    let tree = two_level_tree();
    let root = tree.root();

    assert_eq!(node_keys(&root.children[0]), vec!["978-1", "978-2"]);
    assert_eq!(node_keys(&root.children[1]), vec!["978-4", "978-5", "978-6"]);
}

#[test]
fn test_duplicate_insert_rejected() {
    let mut tree = two_level_tree();
    let before = tree.root().clone();

    let result = tree.insert(Book::new("978-4", "Other", "Someone", None, None));

    assert_eq!(result, Err(BTreeError::DuplicateKey("978-4".to_string())));
    assert_eq!(tree.len(), 6);
    assert_eq!(tree.root(), &before);
    assert_eq!(tree.get("978-4").and_then(|b| b.name.as_deref()), Some("Title 978-4"));
}

#[test]
fn test_duplicate_insert_into_full_root_keeps_shape() {
    let mut tree = BTree::new(3).unwrap();
    for i in 1..=5 {
        tree.insert(book(&isbn(i))).unwrap();
    }
    assert!(tree.root().is_full(3));

    assert!(tree.insert(book(&isbn(3))).is_err());

    assert_eq!(tree.height(), 1);
    assert_eq!(tree.len(), 5);
}

#[test]
fn test_insert_descending_and_interleaved() {
    let mut tree = BTree::new(3).unwrap();

    for i in (0..60).rev() {
        tree.insert(book(&isbn(i * 2))).unwrap();
    }
    for i in 0..60 {
        tree.insert(book(&isbn(i * 2 + 1))).unwrap();
    }

    tree.check_invariants().unwrap();
    assert_eq!(tree.len(), 120);
    assert_eq!(keys(&tree), (0..120).map(isbn).collect::<Vec<_>>());
}

#[test]
fn test_delete_from_leaf() {
    let mut tree = two_level_tree();

    let removed = tree.delete("978-5").unwrap();

    assert_eq!(removed.isbn, "978-5");
    assert_eq!(tree.len(), 5);
    assert!(!tree.contains("978-5"));
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_internal_merges_when_both_children_minimal() {
    let mut tree = two_level_tree();
    tree.delete("978-6").unwrap();
    let root = tree.root();
    assert_eq!(node_keys(root), vec!["978-3"]);
    assert_eq!(root.children[0].len(), 2);
    assert_eq!(root.children[1].len(), 2);

    tree.delete("978-3").unwrap();

    // Both children had t-1 entries: they merged and the root collapsed
    assert_eq!(tree.height(), 1);
    assert!(tree.root().is_leaf());
    assert_eq!(
        node_keys(tree.root()),
        vec!["978-1", "978-2", "978-4", "978-5"]
    );
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_internal_uses_predecessor() {
    let mut tree = two_level_tree();
    tree.insert(book("978-25")).unwrap();
    assert_eq!(tree.root().children[0].len(), 3);

    tree.delete("978-3").unwrap();

    let root = tree.root();
    assert_eq!(node_keys(root), vec!["978-25"]);
    assert_eq!(node_keys(&root.children[0]), vec!["978-1", "978-2"]);
    assert_eq!(
        node_keys(&root.children[1]),
        vec!["978-4", "978-5", "978-6"]
    );
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_internal_uses_successor() {
    let mut tree = two_level_tree();

    tree.delete("978-3").unwrap();

    let root = tree.root();
    assert_eq!(node_keys(root), vec!["978-4"]);
    assert_eq!(node_keys(&root.children[0]), vec!["978-1", "978-2"]);
    assert_eq!(node_keys(&root.children[1]), vec!["978-5", "978-6"]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_borrows_from_next_sibling() {
    let mut tree = two_level_tree();

    tree.delete("978-1").unwrap();

    let root = tree.root();
    assert_eq!(node_keys(root), vec!["978-4"]);
    assert_eq!(node_keys(&root.children[0]), vec!["978-2", "978-3"]);
    assert_eq!(node_keys(&root.children[1]), vec!["978-5", "978-6"]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_borrows_from_prev_sibling() {
    let mut tree = two_level_tree();
    tree.insert(book("978-25")).unwrap();
    tree.delete("978-6").unwrap();
    tree.delete("978-5").unwrap();

    let root = tree.root();
    assert_eq!(node_keys(root), vec!["978-25"]);
    assert_eq!(node_keys(&root.children[0]), vec!["978-1", "978-2"]);
    assert_eq!(node_keys(&root.children[1]), vec!["978-3", "978-4"]);
    tree.check_invariants().unwrap();
}

#[test]
fn test_delete_missing_key_leaves_tree_identical() {
    let mut tree = BTree::new(3).unwrap();
    for i in 0..40 {
        tree.insert(book(&isbn(i))).unwrap();
    }
    let before_root = tree.root().clone();
    let before = tree.flatten();

    let result = tree.delete("nonexistent");

    assert_eq!(result, Err(BTreeError::NotFound("nonexistent".to_string())));
    assert_eq!(tree.flatten(), before);
    assert_eq!(tree.root(), &before_root);
    assert_eq!(tree.len(), 40);
}

#[test]
fn test_delete_from_empty_tree() {
    let mut tree = BTree::new(3).unwrap();
    assert!(matches!(tree.delete("978-1"), Err(BTreeError::NotFound(_))));
    assert!(tree.is_empty());
}

#[test]
fn test_delete_until_empty() {
    let mut tree = BTree::new(3).unwrap();
    let n = 200;
    for i in 0..n {
        tree.insert(book(&isbn(i))).unwrap();
    }
    assert!(tree.height() >= 3);

    for i in 0..n {
        tree.delete(&isbn(i)).unwrap();
        tree.check_invariants().unwrap();
    }

    assert!(tree.is_empty());
    assert_eq!(tree.height(), 0);
    assert!(tree.flatten().is_empty());
}

#[test]
fn test_delete_reverse_and_middle_out() {
    let mut tree = BTree::new(3).unwrap();
    let n = 150;
    for i in 0..n {
        tree.insert(book(&isbn(i))).unwrap();
    }

    for i in (0..n).rev().step_by(2) {
        tree.delete(&isbn(i)).unwrap();
        tree.check_invariants().unwrap();
    }
    let remaining: Vec<String> = keys(&tree);
    assert_eq!(remaining.len(), n / 2);

    let mid = remaining.len() / 2;
    let mut order: Vec<&String> = remaining[mid..].iter().collect();
    order.extend(remaining[..mid].iter().rev());
    for key in order {
        tree.delete(key).unwrap();
        tree.check_invariants().unwrap();
    }

    assert!(tree.is_empty());
}

#[test]
fn test_minimum_degree_two() {
    let mut tree = BTree::new(2).unwrap();

    for i in [5, 2, 8, 1, 9, 3, 7, 4, 6, 0, 12, 11, 10] {
        tree.insert(book(&isbn(i))).unwrap();
        tree.check_invariants().unwrap();
    }
    for i in [4, 0, 12, 7, 5, 1, 9] {
        tree.delete(&isbn(i)).unwrap();
        tree.check_invariants().unwrap();
    }

    let expected: Vec<String> = [2, 3, 6, 8, 10, 11].into_iter().map(isbn).collect();
    assert_eq!(keys(&tree), expected);
}

#[test]
fn test_patch_updates_supplied_fields() {
    let mut tree = two_level_tree();

    assert!(tree.patch(&BookPatch::new("978-1", Some(9.99), None)));

    let patched = tree.get("978-1").unwrap();
    assert_eq!(patched.price, Some(9.99));
    assert_eq!(patched.quantity, Some(1));

    // Works for entries held by internal nodes too
    assert!(tree.patch(&BookPatch::new("978-3", None, Some(12))));
    let patched = tree.get("978-3").unwrap();
    assert_eq!(patched.price, Some(10.0));
    assert_eq!(patched.quantity, Some(12));
}

#[test]
fn test_patch_missing_key_is_noop() {
    let mut tree = two_level_tree();
    let before = tree.flatten();

    assert!(!tree.patch(&BookPatch::new("nonexistent", Some(1.0), Some(1))));

    assert_eq!(tree.flatten(), before);
}

#[test]
fn test_flatten_is_idempotent() {
    let mut tree = BTree::new(3).unwrap();
    for i in [17, 3, 99, 42, 8, 61, 23, 5, 77, 30] {
        tree.insert(book(&isbn(i))).unwrap();
    }

    let first = tree.flatten();
    let second = tree.flatten();

    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
    assert!(first.windows(2).all(|w| w[0].isbn < w[1].isbn));
}

#[test]
fn test_keys_compare_bytewise() {
    let mut tree = BTree::new(3).unwrap();
    for key in ["b", "B", "a", "10", "9", "A"] {
        tree.insert(book(key)).unwrap();
    }

    assert_eq!(keys(&tree), vec!["10", "9", "A", "B", "a", "b"]);
}

#[test]
fn test_check_invariants_detects_underfull_child() {
    let mut tree = two_level_tree();
    tree.root.children[0].entries.pop();

    assert!(matches!(
        tree.check_invariants(),
        Err(BTreeError::InvariantViolation(_))
    ));
}

mod proptest_btree {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    #[derive(Debug, Clone)]
    enum Op {
        Insert(u16),
        Delete(u16),
        Patch(u16, Option<u32>, Option<i64>),
    }

    fn arb_op() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u16..300).prop_map(Op::Insert),
            2 => (0u16..300).prop_map(Op::Delete),
            1 => (0u16..300, proptest::option::of(0u32..10_000), proptest::option::of(0i64..100))
                .prop_map(|(k, p, q)| Op::Patch(k, p, q)),
        ]
    }

    proptest! {
        /// The tree behaves like an ordered map and keeps every invariant.
        #[test]
        fn prop_matches_ordered_map(degree in 2usize..6, ops in proptest::collection::vec(arb_op(), 1..400)) {
            let mut tree = BTree::new(degree).unwrap();
            let mut model: BTreeMap<String, Book> = BTreeMap::new();

            for op in ops {
                match op {
                    Op::Insert(k) => {
                        let key = isbn(k as usize);
                        let result = tree.insert(book(&key));
                        prop_assert_eq!(result.is_ok(), !model.contains_key(&key));
                        model.entry(key.clone()).or_insert_with(|| book(&key));
                    }
                    Op::Delete(k) => {
                        let key = isbn(k as usize);
                        let result = tree.delete(&key);
                        match model.remove(&key) {
                            Some(expected) => prop_assert_eq!(result, Ok(expected)),
                            None => prop_assert_eq!(result, Err(BTreeError::NotFound(key))),
                        }
                    }
                    Op::Patch(k, price, quantity) => {
                        let patch = BookPatch::new(isbn(k as usize), price.map(|p| p as f64 / 100.0), quantity);
                        let patched = tree.patch(&patch);
                        match model.get_mut(&patch.isbn) {
                            Some(entry) => {
                                prop_assert!(patched);
                                patch.apply_to(entry);
                            }
                            None => prop_assert!(!patched),
                        }
                    }
                }
                prop_assert!(tree.check_invariants().is_ok());
            }

            let expected: Vec<Book> = model.into_values().collect();
            prop_assert_eq!(tree.flatten(), expected);
        }

        /// Inserting N unique keys then deleting all of them empties the tree.
        #[test]
        fn prop_insert_then_delete_all_is_empty(keys in proptest::collection::hash_set("[0-9a-z-]{1,8}", 1..200)) {
            let mut tree = BTree::default();
            for key in &keys {
                tree.insert(book(key)).unwrap();
            }
            prop_assert_eq!(tree.len(), keys.len());

            for key in &keys {
                prop_assert!(tree.delete(key).is_ok());
            }

            prop_assert!(tree.is_empty());
            prop_assert!(tree.flatten().is_empty());
            prop_assert!(tree.check_invariants().is_ok());
        }
    }
}
