//! ## Multidimensional Range Tree
//!
//! This module provides the range tree itself: a tree of trees that indexes a set of
//! points in k-dimensional integer space and answers orthogonal range queries — every
//! stored point whose coordinate in each dimension lies in a half-open `[low, high)`
//! interval.
//!
//! The top-level tree partitions points by dimension 1. Every node carries an associated
//! structure indexing the same points by the next dimension; at the last dimension that
//! structure is a flat [`OrderedList`](crate::ordered_list::OrderedList). Bulk inserts
//! and removals fan the per-node associated-structure updates out over rayon; queries
//! are synchronous and emit whole subtrees through their associated structures once a
//! subtree's value range is known to sit inside the query.
//!
//! ### Example
//!
//! ```
//! use rangetree::geometry::{BoxQuery, GridPoint};
//! use rangetree::range_tree::RangeTree;
//!
//! let mut tree: RangeTree<GridPoint<()>> = RangeTree::new(2).unwrap();
//! tree.insert(vec![
//!     GridPoint::new(vec![1, 2], None),
//!     GridPoint::new(vec![3, 4], None),
//!     GridPoint::new(vec![7, 1], None),
//! ]);
//!
//! let query = BoxQuery::unbounded(2).with_bound(1, 0, 5).with_bound(2, 0, 5);
//! let found = tree.get_range(&query);
//! assert_eq!(found.len(), 2);
//! assert_eq!(tree.len(), 3);
//! ```

use crate::batch;
use crate::exceptions::RangeTreeError;
use crate::geometry::{Bound, RangePoint, RangeQuery};
use crate::ordered_list::OrderedList;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default minimum `min(|left|, |right|) / |node|` before a subtree is rebuilt.
pub const DEFAULT_REBALANCE_RATIO: f64 = 0.3;

/// Batches smaller than this stay on the current thread instead of the rayon pool.
const PARALLEL_CUTOFF: usize = 1024;

/// The structure a node delegates the remaining dimensions to: another tree level for
/// inner dimensions, a flat ordered list keyed on the last dimension otherwise. The two
/// shapes are closed and fixed at construction.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
enum Assoc<P: RangePoint> {
    Tree(DimTree<P>),
    List(OrderedList<P>),
}

impl<P: RangePoint> Assoc<P> {
    fn empty(dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        if dimension + 1 < max_dimensions {
            Assoc::Tree(DimTree::new(dimension + 1, max_dimensions, ratio))
        } else {
            Assoc::List(OrderedList::new(max_dimensions))
        }
    }

    fn build(points: Vec<P>, dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        if dimension + 1 < max_dimensions {
            Assoc::Tree(DimTree::build(points, dimension + 1, max_dimensions, ratio))
        } else {
            let mut list = OrderedList::new(max_dimensions);
            list.insert(points);
            Assoc::List(list)
        }
    }

    fn insert(&mut self, batch: Vec<P>) -> usize {
        match self {
            Assoc::Tree(tree) => tree.insert_batch(batch),
            Assoc::List(list) => list.insert(batch),
        }
    }

    fn remove(&mut self, batch: &[P]) -> Vec<P> {
        match self {
            Assoc::Tree(tree) => tree.remove_batch(batch),
            Assoc::List(list) => list.remove(batch),
        }
    }

    fn range<Q: RangeQuery>(&self, query: &Q, out: &mut Vec<P>) {
        match self {
            Assoc::Tree(tree) => tree.range(query, out),
            Assoc::List(list) => list.range(query, out),
        }
    }

    fn all(&self, out: &mut Vec<P>) {
        match self {
            Assoc::Tree(tree) => tree.all(out),
            Assoc::List(list) => list.all(out),
        }
    }

    fn len(&self) -> usize {
        match self {
            Assoc::Tree(tree) => tree.len(),
            Assoc::List(list) => list.len(),
        }
    }
}

/// One node of a tree level.
///
/// An internal node's `value` is the largest coordinate in its left subtree: points with
/// `coord <= value` descend left, points with `coord > value` descend right. A leaf's
/// `value` is the coordinate shared by every point in its associated structure. Leaves
/// have both children absent.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct DimNode<P: RangePoint> {
    value: i64,
    child_count: usize,
    left: Option<Box<DimNode<P>>>,
    right: Option<Box<DimNode<P>>>,
    assoc: Assoc<P>,
}

impl<P: RangePoint> DimNode<P> {
    fn empty_leaf(value: i64, dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        DimNode {
            value,
            child_count: 0,
            left: None,
            right: None,
            assoc: Assoc::empty(dimension, max_dimensions, ratio),
        }
    }

    fn is_leaf(&self) -> bool {
        self.left.is_none()
    }

    /// Builds a balanced subtree from a non-empty batch sorted at `dimension`.
    ///
    /// The pivot is the lower median of the distinct coordinates, so the pivot value
    /// itself lands in the left half and every level splits as close to halves as the
    /// value multiplicities allow.
    fn build(points: Vec<P>, dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        let values = batch::distinct_values(&points, dimension);
        if values.len() == 1 {
            let assoc = Assoc::build(points, dimension, max_dimensions, ratio);
            return DimNode {
                value: values[0],
                child_count: assoc.len(),
                left: None,
                right: None,
                assoc,
            };
        }

        let pivot = batch::median_value(&values);
        let parallel = points.len() >= PARALLEL_CUTOFF;
        let covering = points.clone();
        let (le, gt) = batch::split_at_value(points, pivot, dimension);
        let (assoc, (left, right)) = batch::join_when(
            parallel,
            move || Assoc::build(covering, dimension, max_dimensions, ratio),
            move || {
                batch::join_when(
                    parallel,
                    move || Self::build(le, dimension, max_dimensions, ratio),
                    move || Self::build(gt, dimension, max_dimensions, ratio),
                )
            },
        );
        DimNode {
            value: pivot,
            child_count: assoc.len(),
            left: Some(Box::new(left)),
            right: Some(Box::new(right)),
            assoc,
        }
    }

    /// Inserts a non-empty batch sorted at `dimension` and returns how many points were
    /// newly stored.
    ///
    /// Structure only ever grows downward here: a leaf that receives foreign coordinates
    /// is split in place and the batch keeps descending. Once the partition for this
    /// node is known, the two child subtrees and this node's own associated structure
    /// are disjoint, so the three updates run under a join.
    fn insert(&mut self, batch: Vec<P>, dimension: usize, max_dimensions: usize, ratio: f64) -> usize {
        if self.is_leaf() {
            let first = batch[0].coord(dimension);
            let last = batch[batch.len() - 1].coord(dimension);
            if first == self.value && last == self.value {
                let added = self.assoc.insert(batch);
                self.child_count += added;
                return added;
            }
            self.split_leaf(&batch, dimension, max_dimensions, ratio);
        }

        let parallel = batch.len() >= PARALLEL_CUTOFF;
        let covering = batch.clone();
        let (le, gt) = batch::split_at_value(batch, self.value, dimension);
        let assoc = &mut self.assoc;
        let left = self.left.as_deref_mut();
        let right = self.right.as_deref_mut();
        let (own_added, (left_added, right_added)) = batch::join_when(
            parallel,
            move || assoc.insert(covering),
            move || {
                batch::join_when(
                    parallel,
                    move || match left {
                        Some(node) if !le.is_empty() => {
                            node.insert(le, dimension, max_dimensions, ratio)
                        }
                        _ => 0,
                    },
                    move || match right {
                        Some(node) if !gt.is_empty() => {
                            node.insert(gt, dimension, max_dimensions, ratio)
                        }
                        _ => 0,
                    },
                )
            },
        );
        debug_assert_eq!(own_added, left_added + right_added);
        self.child_count += own_added;
        own_added
    }

    /// Turns a leaf into an internal node ahead of a batch that carries coordinates
    /// other than the leaf's value. The existing points move into a cloned child; the
    /// node keeps its own associated structure, which absorbs the batch afterwards.
    fn split_leaf(&mut self, batch: &[P], dimension: usize, max_dimensions: usize, ratio: f64) {
        let value = self.value;
        let first_gt = batch.partition_point(|p| p.coord(dimension) <= value);
        if first_gt < batch.len() {
            // Shift-left: larger coordinates grow a fresh right subtree. Equal
            // coordinates keep descending left, so the pivot stays at the leaf value.
            let gt = &batch[first_gt..];
            let fresh = batch::median_value(&batch::distinct_values(gt, dimension));
            let left = DimNode {
                value,
                child_count: self.child_count,
                left: None,
                right: None,
                assoc: self.assoc.clone(),
            };
            self.left = Some(Box::new(left));
            self.right = Some(Box::new(DimNode::empty_leaf(
                fresh,
                dimension,
                max_dimensions,
                ratio,
            )));
        } else {
            // Shift-right: every foreign coordinate is smaller. The existing points
            // move right and the pivot drops to the incoming side's maximum.
            let lt = &batch[..batch.partition_point(|p| p.coord(dimension) < value)];
            let fresh = batch::median_value(&batch::distinct_values(lt, dimension));
            let right = DimNode {
                value,
                child_count: self.child_count,
                left: None,
                right: None,
                assoc: self.assoc.clone(),
            };
            self.value = lt[lt.len() - 1].coord(dimension);
            self.left = Some(Box::new(DimNode::empty_leaf(
                fresh,
                dimension,
                max_dimensions,
                ratio,
            )));
            self.right = Some(Box::new(right));
        }
    }

    /// Removes a non-empty batch sorted at `dimension` and returns the points that were
    /// actually removed. Ancestors prune exactly those points from their associated
    /// structures; a child left with no points is spliced out by promoting its sibling.
    fn remove(&mut self, batch: Vec<P>, dimension: usize) -> Vec<P> {
        if self.is_leaf() {
            let matching: Vec<P> = batch
                .into_iter()
                .filter(|p| p.coord(dimension) == self.value)
                .collect();
            if matching.is_empty() {
                return Vec::new();
            }
            let removed = self.assoc.remove(&matching);
            self.child_count -= removed.len();
            return removed;
        }

        let parallel = batch.len() >= PARALLEL_CUTOFF;
        let (le, gt) = batch::split_at_value(batch, self.value, dimension);
        let left = self.left.as_deref_mut();
        let right = self.right.as_deref_mut();
        let (mut removed, mut from_right) = batch::join_when(
            parallel,
            move || match left {
                Some(node) if !le.is_empty() => node.remove(le, dimension),
                _ => Vec::new(),
            },
            move || match right {
                Some(node) if !gt.is_empty() => node.remove(gt, dimension),
                _ => Vec::new(),
            },
        );
        removed.append(&mut from_right);
        if !removed.is_empty() {
            let dropped = self.assoc.remove(&removed);
            debug_assert_eq!(dropped.len(), removed.len());
            self.child_count -= removed.len();
        }

        if self.left.as_ref().is_some_and(|n| n.child_count == 0) {
            if let Some(sibling) = self.right.take() {
                *self = *sibling;
            }
        } else if self.right.as_ref().is_some_and(|n| n.child_count == 0) {
            if let Some(sibling) = self.left.take() {
                *self = *sibling;
            }
        }
        removed
    }

    /// Range descent with the two covered-side flags.
    ///
    /// `left_covered` records that an ancestor already guaranteed every point of this
    /// subtree satisfies the high bound; `right_covered` the same for the low bound.
    /// The first pivot strictly inside `(low, high)` sets one flag per side, after
    /// which the fully covered child is emitted through its associated structure
    /// instead of being descended — that structure prunes at the next dimension.
    fn range<Q: RangeQuery>(
        &self,
        query: &Q,
        bound: Bound,
        dimension: usize,
        out: &mut Vec<P>,
        left_covered: bool,
        right_covered: bool,
    ) {
        if self.is_leaf() {
            if bound.contains(self.value) {
                self.assoc.range(query, out);
            }
            return;
        }

        if bound.high() <= self.value {
            if let Some(left) = &self.left {
                left.range(query, bound, dimension, out, left_covered, right_covered);
            }
            return;
        }
        if bound.low() > self.value {
            if let Some(right) = &self.right {
                right.range(query, bound, dimension, out, left_covered, right_covered);
            }
            return;
        }

        // The bound straddles the pivot: low <= value < high.
        if let (Some(left), Some(right)) = (&self.left, &self.right) {
            if left_covered {
                left.range(query, bound, dimension, out, true, false);
                right.assoc.range(query, out);
            } else if right_covered {
                left.assoc.range(query, out);
                right.range(query, bound, dimension, out, false, true);
            } else {
                left.range(query, bound, dimension, out, true, false);
                right.range(query, bound, dimension, out, false, true);
            }
        }
    }

    fn is_skewed(&self, ratio: f64) -> bool {
        match (&self.left, &self.right) {
            (Some(left), Some(right)) => {
                let smaller = left.child_count.min(right.child_count) as f64;
                smaller / (self.child_count as f64) < ratio
            }
            _ => false,
        }
    }

    /// Top-down rebalance pass. Checking a node before its children means a skewed
    /// ancestor rebuilds once instead of both levels rebuilding separately.
    fn rebalance(&mut self, dimension: usize, max_dimensions: usize, ratio: f64) {
        if self.is_leaf() {
            return;
        }
        if self.is_skewed(ratio) {
            let mut points = Vec::with_capacity(self.child_count);
            self.assoc.all(&mut points);
            batch::sort_by_dimension(&mut points, dimension);
            *self = DimNode::build(points, dimension, max_dimensions, ratio);
            return;
        }
        if let Some(left) = self.left.as_deref_mut() {
            left.rebalance(dimension, max_dimensions, ratio);
        }
        if let Some(right) = self.right.as_deref_mut() {
            right.rebalance(dimension, max_dimensions, ratio);
        }
    }
}

/// One tree level, keyed on a single dimension.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
struct DimTree<P: RangePoint> {
    dimension: usize,
    max_dimensions: usize,
    ratio: f64,
    size: usize,
    root: Option<Box<DimNode<P>>>,
}

impl<P: RangePoint> DimTree<P> {
    fn new(dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        DimTree {
            dimension,
            max_dimensions,
            ratio,
            size: 0,
            root: None,
        }
    }

    fn build(mut points: Vec<P>, dimension: usize, max_dimensions: usize, ratio: f64) -> Self {
        let mut tree = Self::new(dimension, max_dimensions, ratio);
        if points.is_empty() {
            return tree;
        }
        batch::sort_by_dimension(&mut points, dimension);
        let root = DimNode::build(points, dimension, max_dimensions, ratio);
        tree.size = root.child_count;
        tree.root = Some(Box::new(root));
        tree
    }

    fn insert_batch(&mut self, mut batch: Vec<P>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        batch::sort_by_dimension(&mut batch, self.dimension);
        let added = match &mut self.root {
            slot @ None => {
                // First batch goes through the bulk builder and comes out balanced.
                let root = DimNode::build(batch, self.dimension, self.max_dimensions, self.ratio);
                let added = root.child_count;
                *slot = Some(Box::new(root));
                added
            }
            Some(root) => {
                let added = root.insert(batch, self.dimension, self.max_dimensions, self.ratio);
                if added > 0 {
                    root.rebalance(self.dimension, self.max_dimensions, self.ratio);
                }
                added
            }
        };
        self.size += added;
        added
    }

    fn remove_batch(&mut self, batch: &[P]) -> Vec<P> {
        if batch.is_empty() {
            return Vec::new();
        }
        let Some(root) = self.root.as_deref_mut() else {
            return Vec::new();
        };
        let mut batch = batch.to_vec();
        batch::sort_by_dimension(&mut batch, self.dimension);
        let removed = root.remove(batch, self.dimension);
        self.size -= removed.len();
        if root.child_count == 0 {
            self.root = None;
        } else if !removed.is_empty() {
            root.rebalance(self.dimension, self.max_dimensions, self.ratio);
        }
        removed
    }

    fn range<Q: RangeQuery>(&self, query: &Q, out: &mut Vec<P>) {
        let Some(root) = self.root.as_deref() else {
            return;
        };
        match query.bounds(self.dimension) {
            // Unrestricted here: the whole tree qualifies at this dimension, and the
            // root's associated structure prunes from the next one.
            None => root.assoc.range(query, out),
            Some(bound) => {
                if bound.is_empty() {
                    return;
                }
                root.range(query, bound, self.dimension, out, false, false);
            }
        }
    }

    fn all(&self, out: &mut Vec<P>) {
        if let Some(root) = self.root.as_deref() {
            root.assoc.all(out);
        }
    }

    fn len(&self) -> usize {
        self.size
    }

    fn clear(&mut self) {
        self.root = None;
        self.size = 0;
    }
}

/// A k-dimensional orthogonal range index over points implementing
/// [`RangePoint`](crate::geometry::RangePoint).
///
/// The tree is not safe for concurrent mutation; callers serialise mutating calls.
/// A bulk `insert` or `remove` internally fans per-node work out over rayon and joins
/// before returning, while queries never spawn workers. Cloning deep-copies the tree
/// structure and shares the stored points.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RangeTree<P: RangePoint> {
    tree: DimTree<P>,
}

impl<P: RangePoint> RangeTree<P> {
    /// Creates an empty tree over the given number of dimensions with the default
    /// rebalance ratio.
    ///
    /// # Errors
    ///
    /// Returns `RangeTreeError::InvalidDimensions` if `max_dimensions` is zero.
    pub fn new(max_dimensions: usize) -> Result<Self, RangeTreeError> {
        Self::with_rebalance_ratio(max_dimensions, DEFAULT_REBALANCE_RATIO)
    }

    /// Creates an empty tree with a custom rebalance ratio.
    ///
    /// A subtree is rebuilt once either child holds less than `ratio` of its points.
    ///
    /// # Errors
    ///
    /// Returns `RangeTreeError::InvalidDimensions` if `max_dimensions` is zero, or
    /// `RangeTreeError::InvalidRatio` if `ratio` is outside `(0, 0.5]`.
    pub fn with_rebalance_ratio(
        max_dimensions: usize,
        ratio: f64,
    ) -> Result<Self, RangeTreeError> {
        if max_dimensions == 0 {
            return Err(RangeTreeError::InvalidDimensions {
                dimensions: max_dimensions,
            });
        }
        if !(ratio > 0.0 && ratio <= 0.5) {
            return Err(RangeTreeError::InvalidRatio { ratio });
        }
        Ok(RangeTree {
            tree: DimTree::new(1, max_dimensions, ratio),
        })
    }

    /// Creates a tree from an initial batch via the bulk builder.
    ///
    /// # Errors
    ///
    /// Returns `RangeTreeError::InvalidDimensions` if `max_dimensions` is zero.
    pub fn bulk(max_dimensions: usize, points: Vec<P>) -> Result<Self, RangeTreeError> {
        let mut tree = Self::new(max_dimensions)?;
        tree.insert(points);
        Ok(tree)
    }

    /// Inserts a batch of points.
    ///
    /// A point equal to a stored one under the total coordinate order replaces the
    /// stored reference; among equal points within one batch the last one wins.
    ///
    /// # Returns
    ///
    /// The number of newly stored points; replacements do not count.
    pub fn insert(&mut self, points: Vec<P>) -> usize {
        if points.is_empty() {
            return 0;
        }
        debug_assert!(points
            .iter()
            .all(|p| p.max_dimensions() == self.tree.max_dimensions));
        info!("Inserting a batch of {} points", points.len());
        self.tree.insert_batch(points)
    }

    /// Removes every point equal to a batch element under the total coordinate order.
    /// Points that are not stored are silently ignored.
    ///
    /// # Returns
    ///
    /// The number of points removed.
    pub fn remove(&mut self, points: &[P]) -> usize {
        if points.is_empty() {
            return 0;
        }
        info!("Removing a batch of {} points", points.len());
        self.tree.remove_batch(points).len()
    }

    /// Returns every stored point matching the query.
    ///
    /// A dimension without a bound is unrestricted; a bound with `low >= high` matches
    /// nothing. The result order is unspecified but deterministic for a given tree
    /// shape.
    pub fn get_range<Q: RangeQuery>(&self, query: &Q) -> Vec<P> {
        let mut out = Vec::new();
        self.tree.range(query, &mut out);
        out
    }

    /// Returns every stored point; equivalent to a query with every bound absent.
    pub fn all(&self) -> Vec<P> {
        let mut out = Vec::new();
        self.tree.all(&mut out);
        out
    }

    /// The number of distinct points stored.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.len() == 0
    }

    /// Drops every stored point.
    pub fn clear(&mut self) {
        info!("Clearing the tree");
        self.tree.clear();
    }

    pub fn max_dimensions(&self) -> usize {
        self.tree.max_dimensions
    }

    pub fn rebalance_ratio(&self) -> f64 {
        self.tree.ratio
    }
}
