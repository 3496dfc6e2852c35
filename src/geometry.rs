//! ## Points, Bounds, and Queries
//!
//! This module defines the capability traits the range tree is generic over: `RangePoint`
//! for stored values and `RangeQuery` for orthogonal queries. It also provides the concrete
//! `GridPoint` point type, the half-open `Bound` interval, and the `BoxQuery` query type
//! that cover the common cases.

use crate::exceptions::RangeTreeError;
use std::cmp::Ordering;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Trait representing a point that can be stored in a range tree.
///
/// A type implementing `RangePoint` must report its dimensionality and expose an integer
/// coordinate per dimension. Dimensions are 1-based; calling `coord` with a dimension
/// outside `1..=max_dimensions()` is a programmer error and may panic. The comparison
/// methods have default implementations in terms of `coord` and only need to be overridden
/// when a type can compare faster than coordinate-by-coordinate.
pub trait RangePoint: Clone + PartialEq + std::fmt::Debug + Send + Sync {
    /// Returns the number of dimensions of the point.
    fn max_dimensions(&self) -> usize;

    /// Returns the coordinate along the specified 1-based dimension.
    fn coord(&self, dimension: usize) -> i64;

    /// Returns true iff the two points share coordinates `1..=dimension`.
    fn equal_at(&self, other: &Self, dimension: usize) -> bool {
        (1..=dimension).all(|d| self.coord(d) == other.coord(d))
    }

    /// Strict less-than on the given dimension only.
    fn less_than(&self, other: &Self, dimension: usize) -> bool {
        self.coord(dimension) < other.coord(dimension)
    }

    /// Strict lexicographic less-than over coordinates `1..=dimension`.
    ///
    /// With `dimension == max_dimensions()` this is the total point order used for
    /// deduplication and stable bulk sorting.
    fn less(&self, other: &Self, dimension: usize) -> bool {
        for d in 1..=dimension {
            match self.coord(d).cmp(&other.coord(d)) {
                Ordering::Less => return true,
                Ordering::Greater => return false,
                Ordering::Equal => {}
            }
        }
        false
    }
}

/// Points behind an `Arc` are points too; the tree then shares one allocation per point
/// across every level that indexes it.
impl<P: RangePoint> RangePoint for Arc<P> {
    fn max_dimensions(&self) -> usize {
        (**self).max_dimensions()
    }

    fn coord(&self, dimension: usize) -> i64 {
        (**self).coord(dimension)
    }

    fn equal_at(&self, other: &Self, dimension: usize) -> bool {
        (**self).equal_at(other, dimension)
    }

    fn less_than(&self, other: &Self, dimension: usize) -> bool {
        (**self).less_than(other, dimension)
    }

    fn less(&self, other: &Self, dimension: usize) -> bool {
        (**self).less(other, dimension)
    }
}

/// An n-dimensional integer point with an optional data payload.
///
/// Re-inserting a point whose coordinates equal a stored point's replaces the stored
/// reference, so the payload is the natural place for cell contents in sparse-matrix
/// style usage.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridPoint<T> {
    pub coords: Vec<i64>,
    pub data: Option<T>,
}

impl<T> GridPoint<T> {
    pub fn new(coords: Vec<i64>, data: Option<T>) -> Self {
        GridPoint { coords, data }
    }

    /// Checked coordinate access for host layers that validate dimensions.
    ///
    /// # Errors
    ///
    /// Returns `RangeTreeError::InvalidDimension` if the dimension is outside
    /// `1..=coords.len()`.
    pub fn try_coord(&self, dimension: usize) -> Result<i64, RangeTreeError> {
        if dimension >= 1 && dimension <= self.coords.len() {
            Ok(self.coords[dimension - 1])
        } else {
            Err(RangeTreeError::InvalidDimension {
                requested: dimension,
                available: self.coords.len(),
            })
        }
    }
}

impl<T> RangePoint for GridPoint<T>
where
    T: std::fmt::Debug + Clone + PartialEq + Send + Sync,
{
    fn max_dimensions(&self) -> usize {
        self.coords.len()
    }

    fn coord(&self, dimension: usize) -> i64 {
        self.coords[dimension - 1]
    }
}

/// A half-open interval `[low, high)` in a single dimension.
///
/// `low >= high` is legal and matches nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Bound {
    low: i64,
    high: i64,
}

impl Bound {
    pub fn new(low: i64, high: i64) -> Self {
        Bound { low, high }
    }

    pub fn low(&self) -> i64 {
        self.low
    }

    pub fn high(&self) -> i64 {
        self.high
    }

    /// Returns true iff `low <= value < high`.
    pub fn contains(&self, value: i64) -> bool {
        self.low <= value && value < self.high
    }

    /// Returns true iff the interval matches nothing.
    pub fn is_empty(&self) -> bool {
        self.low >= self.high
    }
}

/// Trait representing an orthogonal range query.
///
/// `bounds` returns the interval restricting the given 1-based dimension, or `None` when
/// that dimension is unrestricted.
pub trait RangeQuery {
    fn bounds(&self, dimension: usize) -> Option<Bound>;
}

/// An axis-aligned box query over a fixed number of dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoxQuery {
    dims: Vec<Option<Bound>>,
}

impl BoxQuery {
    /// Creates a query with every dimension unrestricted.
    pub fn unbounded(dimensions: usize) -> Self {
        BoxQuery {
            dims: vec![None; dimensions],
        }
    }

    /// Restricts the given 1-based dimension to `[low, high)`.
    pub fn with_bound(mut self, dimension: usize, low: i64, high: i64) -> Self {
        self.dims[dimension - 1] = Some(Bound::new(low, high));
        self
    }
}

impl RangeQuery for BoxQuery {
    fn bounds(&self, dimension: usize) -> Option<Bound> {
        self.dims.get(dimension - 1).copied().flatten()
    }
}
