//! Volatility-targeted position sizing.
//!
//! POS[i] = clamp(target_vol / VOL[i], 0, max_leverage) * SIGNAL[i]
//! Undefined, zero or non-finite volatility gives no exposure, as does a cap
//! that is negative or NaN.

pub fn target_position(
    realized_vol: Option<f64>,
    signal: u8,
    target_vol: f64,
    max_leverage: f64,
) -> f64 {
    if signal == 0 || max_leverage.is_nan() || max_leverage < 0.0 {
        return 0.0;
    }
    match realized_vol {
        // `f64::max` drops a NaN ratio in favour of 0.
        Some(vol) if vol.is_finite() && vol > 0.0 => {
            (target_vol / vol).max(0.0).min(max_leverage) * f64::from(signal)
        }
        _ => 0.0,
    }
}
