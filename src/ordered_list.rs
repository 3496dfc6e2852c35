//! ## Ordered List
//!
//! The innermost container of the range tree: a flat, sorted, deduplicated array of
//! points keyed on the final dimension. At this depth the candidate set is already
//! narrow, so a sorted array beats another tree level on memory, cache behaviour, and
//! bulk merging.
//!
//! Elements are ordered by `(coord(dimension), total lexicographic order)`; at most one
//! element exists per distinct point under the total order, and re-inserting an equal
//! point overwrites the stored reference.

use crate::geometry::{RangePoint, RangeQuery};
use std::cmp::Ordering;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Sorted, deduplicated point list for one dimension.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OrderedList<P: RangePoint> {
    points: Vec<P>,
    dimension: usize,
}

impl<P: RangePoint> OrderedList<P> {
    /// Creates an empty list keyed on the given 1-based dimension.
    pub fn new(dimension: usize) -> Self {
        OrderedList {
            points: Vec::new(),
            dimension,
        }
    }

    /// The list order: coordinate at the key dimension first, full lexicographic order
    /// as the tie break. Two points compare equal iff all coordinates match.
    fn compare(&self, a: &P, b: &P) -> Ordering {
        match a.coord(self.dimension).cmp(&b.coord(self.dimension)) {
            Ordering::Equal => {
                if a.less(b, self.dimension) {
                    Ordering::Less
                } else if b.less(a, self.dimension) {
                    Ordering::Greater
                } else {
                    Ordering::Equal
                }
            }
            ord => ord,
        }
    }

    /// Merges a batch into the list and returns the number of newly added points.
    ///
    /// Collisions under the total order overwrite the stored reference and do not count;
    /// among equal points within one batch the last one wins. Cost is O(n + m).
    pub fn insert(&mut self, mut batch: Vec<P>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        batch.sort_by(|a, b| self.compare(a, b));

        let mut merged = Vec::with_capacity(self.points.len() + batch.len());
        let mut added = 0;
        let mut existing = std::mem::take(&mut self.points).into_iter().peekable();
        let mut incoming = batch.into_iter().peekable();

        while let Some(mut item) = incoming.next() {
            // Collapse duplicates within the batch; the sort is stable, so the last
            // batch writer survives.
            while incoming
                .peek()
                .is_some_and(|next| self.compare(&item, next) == Ordering::Equal)
            {
                item = incoming.next().unwrap();
            }
            while existing
                .peek()
                .is_some_and(|e| self.compare(e, &item) == Ordering::Less)
            {
                merged.push(existing.next().unwrap());
            }
            if existing
                .peek()
                .is_some_and(|e| self.compare(e, &item) == Ordering::Equal)
            {
                // Overwrite: drop the stored reference, keep the incoming one.
                existing.next();
            } else {
                added += 1;
            }
            merged.push(item);
        }
        merged.extend(existing);
        self.points = merged;
        added
    }

    /// Appends every point matching the query's bound at the key dimension.
    ///
    /// An absent bound emits everything; an inverted bound emits nothing.
    pub fn range<Q: RangeQuery>(&self, query: &Q, out: &mut Vec<P>) {
        match query.bounds(self.dimension) {
            None => out.extend_from_slice(&self.points),
            Some(bound) => {
                if bound.is_empty() {
                    return;
                }
                let start = self
                    .points
                    .partition_point(|p| p.coord(self.dimension) < bound.low());
                for p in &self.points[start..] {
                    if p.coord(self.dimension) < bound.high() {
                        out.push(p.clone());
                    } else {
                        break;
                    }
                }
            }
        }
    }

    /// Appends every point in list order.
    pub fn all(&self, out: &mut Vec<P>) {
        out.extend_from_slice(&self.points);
    }

    /// Removes every batch element present in the list (total-order equality) and
    /// returns the removed points. Absent elements are silently ignored.
    pub fn remove(&mut self, batch: &[P]) -> Vec<P> {
        let mut removed = Vec::new();
        for target in batch {
            if let Ok(index) = self.points.binary_search_by(|p| self.compare(p, target)) {
                removed.push(self.points.remove(index));
            }
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
