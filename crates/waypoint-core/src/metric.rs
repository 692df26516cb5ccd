//! Distance metrics between stop positions
//!
//! The routing layer only ever asks for a non-negative integer cost
//! between two adjacent stops. [`Manhattan`] is the default metric;
//! [`Euclidean`] and [`Chebyshev`] are stock alternatives, and any
//! `Fn(&Position, &Position) -> u32` closure works too.

use crate::identity::Position;

/// Symmetric, non-negative cost between two positions
pub trait DistanceMetric: Send + Sync {
    /// Cost of travelling from `a` to `b`
    ///
    /// Must satisfy `distance(a, b) == distance(b, a)`.
    fn distance(&self, a: &Position, b: &Position) -> u32;
}

/// Taxicab distance: `|dx| + |dy|`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Manhattan;

impl DistanceMetric for Manhattan {
    fn distance(&self, a: &Position, b: &Position) -> u32 {
        a.x.abs_diff(b.x).saturating_add(a.y.abs_diff(b.y))
    }
}

/// Chessboard distance: `max(|dx|, |dy|)`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Chebyshev;

impl DistanceMetric for Chebyshev {
    fn distance(&self, a: &Position, b: &Position) -> u32 {
        a.x.abs_diff(b.x).max(a.y.abs_diff(b.y))
    }
}

/// Straight-line distance rounded to the nearest integer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Euclidean;

impl DistanceMetric for Euclidean {
    fn distance(&self, a: &Position, b: &Position) -> u32 {
        let dx = f64::from(a.x.abs_diff(b.x));
        let dy = f64::from(a.y.abs_diff(b.y));
        // `as` saturates, so huge spans clamp to u32::MAX
        dx.hypot(dy).round() as u32
    }
}

impl<F> DistanceMetric for F
where
    F: Fn(&Position, &Position) -> u32 + Send + Sync,
{
    fn distance(&self, a: &Position, b: &Position) -> u32 {
        self(a, b)
    }
}
