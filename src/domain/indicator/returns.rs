//! Simple return stage.
//!
//! R[i] = P[i] / P[i-1] - 1
//! Undefined for the first bar and when P[i-1] == 0.

/// Return between two consecutive prices.
pub fn period_return(prev: f64, curr: f64) -> Option<f64> {
    if prev == 0.0 {
        None
    } else {
        Some(curr / prev - 1.0)
    }
}
