//! Numeric-tree payloads.
//!
//! Every draft payload is a finite numeric tree: scalars or nested lists of
//! scalars, no NaN/Infinity/non-numeric leaves. The tree shape is what the
//! lenses exchange; the engine only validates and hashes it.

use serde::{Deserialize, Serialize};

use super::error::DraftInvariantError;

/// A scalar or a nested list of scalars.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericTree {
    Scalar(f64),
    List(Vec<NumericTree>),
}

impl NumericTree {
    /// The canonical empty payload.
    pub fn empty() -> Self {
        NumericTree::List(Vec::new())
    }

    pub fn from_scalars(values: impl IntoIterator<Item = f64>) -> Self {
        NumericTree::List(values.into_iter().map(NumericTree::Scalar).collect())
    }

    pub fn is_list(&self) -> bool {
        matches!(self, NumericTree::List(_))
    }

    /// Number of scalar leaves.
    pub fn leaf_count(&self) -> usize {
        match self {
            NumericTree::Scalar(_) => 1,
            NumericTree::List(items) => items.iter().map(NumericTree::leaf_count).sum(),
        }
    }

    /// Apply `f` to every scalar leaf, preserving shape.
    pub fn map_leaves(&self, f: &impl Fn(f64) -> f64) -> NumericTree {
        match self {
            NumericTree::Scalar(v) => NumericTree::Scalar(f(*v)),
            NumericTree::List(items) => {
                NumericTree::List(items.iter().map(|t| t.map_leaves(f)).collect())
            }
        }
    }

    /// Scalar leaves in depth-first order.
    pub fn flatten(&self) -> Vec<f64> {
        fn walk(tree: &NumericTree, out: &mut Vec<f64>) {
            match tree {
                NumericTree::Scalar(v) => out.push(*v),
                NumericTree::List(items) => items.iter().for_each(|t| walk(t, out)),
            }
        }
        let mut out = Vec::new();
        walk(self, &mut out);
        out
    }
}

/// Check that every leaf is finite.
pub fn assert_finite(tree: &NumericTree) -> Result<(), DraftInvariantError> {
    match tree {
        NumericTree::Scalar(v) if !v.is_finite() => Err(DraftInvariantError::NonFiniteValue),
        NumericTree::Scalar(_) => Ok(()),
        NumericTree::List(items) => items.iter().try_for_each(assert_finite),
    }
}

/// Check the full payload invariant: a finite tree whose top level is a list.
pub fn assert_numeric_tree(tree: &NumericTree) -> Result<(), DraftInvariantError> {
    if !tree.is_list() {
        return Err(DraftInvariantError::NonListPayload { got: "scalar" });
    }
    assert_finite(tree)
}
