//! Realized volatility stage.
//!
//! VOL(n)[i] = sample_std(R[i-n+1..=i]) * annualization_factor
//! Warmup: undefined until n consecutive defined returns exist, so with an
//! undefined first return the first valid index is n.

use super::sample_std;

/// Realized volatility at index `i` over the trailing `window` returns.
pub fn realized_vol_at(
    returns: &[Option<f64>],
    i: usize,
    window: usize,
    annualization_factor: f64,
) -> Option<f64> {
    if window == 0 || i + 1 < window {
        return None;
    }
    let trailing: Option<Vec<f64>> = returns[i + 1 - window..=i].iter().copied().collect();
    sample_std(&trailing?).map(|s| s * annualization_factor)
}
