//! Distance metric shared by every index implementation.
//!
//! Build and query must agree on the metric, so there is exactly one.

/// Squared Euclidean distance between two vectors of equal length.
///
/// The square root is skipped: it is monotone and therefore does not change
/// neighbor order, and `1 / (1 + d)` stays in (0, 1] either way.
#[inline]
pub fn squared_euclidean(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "Vectors must have same dimension");

    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum()
}
