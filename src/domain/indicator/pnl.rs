//! PnL stage.
//!
//! PNL[i] = POS[i-1] * R[i]; 0 when the return is undefined.
//! CUM[i] = CUM[i-1] + PNL[i], seeded at 0.

pub fn period_pnl(lagged_position: f64, ret: Option<f64>) -> f64 {
    match ret {
        Some(r) => lagged_position * r,
        None => 0.0,
    }
}
