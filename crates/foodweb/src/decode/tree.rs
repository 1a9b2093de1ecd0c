//! Decode failure trees.
//!
//! A failed decode produces a tree mirroring where in the input each check
//! failed. Trees are transient: built during one decode call, folded into a
//! flat report, then dropped.

use serde_json::Value;

/// Code attached when a value was expected to be JSON null.
///
/// Doubles as the placeholder the reporter strips under [`ErrorTree::Lazy`]
/// nodes, where a `nullable` branch rejecting a present value is an
/// artifact of recursive unwinding rather than a reportable error.
pub const NULL_CODE: &str = "null";

/// Where and why a decode failed, before flattening.
///
/// Every leaf carries exactly one code; the constructors make empty nodes
/// unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorTree {
    /// A single failed check: the offending input and one error code.
    Leaf { input: Value, code: String },
    /// A failure inside an object field.
    Key { key: String, tree: Box<ErrorTree> },
    /// A failure inside an array element.
    Index { index: usize, tree: Box<ErrorTree> },
    /// A failure of one union alternative.
    Member { member: usize, tree: Box<ErrorTree> },
    /// A failure produced while unwinding a recursive decoder.
    Lazy { id: String, tree: Box<ErrorTree> },
    /// Two sibling failures joined.
    Both { left: Box<ErrorTree>, right: Box<ErrorTree> },
}

impl ErrorTree {
    pub fn leaf(input: Value, code: impl Into<String>) -> Self {
        ErrorTree::Leaf {
            input,
            code: code.into(),
        }
    }

    pub fn key(key: impl Into<String>, tree: ErrorTree) -> Self {
        ErrorTree::Key {
            key: key.into(),
            tree: Box::new(tree),
        }
    }

    pub fn index(index: usize, tree: ErrorTree) -> Self {
        ErrorTree::Index {
            index,
            tree: Box::new(tree),
        }
    }

    pub fn member(member: usize, tree: ErrorTree) -> Self {
        ErrorTree::Member {
            member,
            tree: Box::new(tree),
        }
    }

    pub fn lazy(id: impl Into<String>, tree: ErrorTree) -> Self {
        ErrorTree::Lazy {
            id: id.into(),
            tree: Box::new(tree),
        }
    }

    pub fn both(left: ErrorTree, right: ErrorTree) -> Self {
        ErrorTree::Both {
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Joins sibling failures into one tree, left to right.
///
/// Returns `None` for an empty list, so callers cannot build an empty node.
pub fn combine_all(trees: Vec<ErrorTree>) -> Option<ErrorTree> {
    trees.into_iter().reduce(ErrorTree::both)
}
