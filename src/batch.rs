//! Bulk batch helpers shared by the tree levels: stable sorting by a single dimension,
//! pivot splits, distinct-value extraction, and the parallel fan-out primitive.

use crate::geometry::RangePoint;

/// Stable sort by the coordinate at the given dimension.
///
/// Stability matters: equal points keep their batch order through every level, so the
/// last writer in a batch is the one that lands in the innermost list.
pub(crate) fn sort_by_dimension<P: RangePoint>(points: &mut [P], dimension: usize) {
    points.sort_by(|a, b| a.coord(dimension).cmp(&b.coord(dimension)));
}

/// Splits a batch sorted at `dimension` into `(coord <= value, coord > value)`.
pub(crate) fn split_at_value<P: RangePoint>(
    mut points: Vec<P>,
    value: i64,
    dimension: usize,
) -> (Vec<P>, Vec<P>) {
    let cut = points.partition_point(|p| p.coord(dimension) <= value);
    let right = points.split_off(cut);
    (points, right)
}

/// Returns the sorted distinct coordinates at `dimension` of a batch sorted at `dimension`.
pub(crate) fn distinct_values<P: RangePoint>(points: &[P], dimension: usize) -> Vec<i64> {
    let mut values = Vec::new();
    for p in points {
        let v = p.coord(dimension);
        if values.last() != Some(&v) {
            values.push(v);
        }
    }
    values
}

/// Lower median of a non-empty sorted value list.
///
/// The lower median keeps the pivot in the left half, matching the equal-goes-left
/// search invariant.
pub(crate) fn median_value(values: &[i64]) -> i64 {
    values[(values.len() - 1) / 2]
}

/// Runs the two closures on the rayon pool when `parallel` is set, inline otherwise.
///
/// Callers hand each closure a disjoint part of the tree, so the pair needs no locking;
/// the join returns only after both sides finish.
pub(crate) fn join_when<A, B, RA, RB>(parallel: bool, a: A, b: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    if parallel {
        rayon::join(a, b)
    } else {
        (a(), b())
    }
}
