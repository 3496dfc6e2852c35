//! ## Custom Errors for Rangetree
//!
//! This module defines custom errors and exceptions that are used internally by Rangetree.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents errors specific to invalid operations or parameters in Rangetree.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug)]
pub enum RangeTreeError {
    /// Occurs when a tree is created with zero dimensions.
    InvalidDimensions {
        /// The dimension count that was provided.
        dimensions: usize,
    },
    /// Occurs when a rebalance ratio outside (0, 0.5] is provided.
    InvalidRatio {
        /// The ratio value that was provided.
        ratio: f64,
    },
    /// Occurs when an invalid dimension is requested from a point.
    InvalidDimension {
        /// The dimension that was requested.
        requested: usize,
        /// The maximum number of dimensions available.
        available: usize,
    },
}

impl fmt::Display for RangeTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RangeTreeError::InvalidDimensions { dimensions } => {
                write!(
                    f,
                    "Invalid dimensions: {dimensions}. A range tree needs at least one dimension."
                )
            }
            RangeTreeError::InvalidRatio { ratio } => {
                write!(
                    f,
                    "Invalid rebalance ratio: {ratio}. The ratio must be in (0, 0.5]."
                )
            }
            RangeTreeError::InvalidDimension {
                requested,
                available,
            } => {
                write!(
                    f,
                    "Invalid dimension: requested {requested}, but only {available} dimensions available"
                )
            }
        }
    }
}

impl Error for RangeTreeError {}
