//! Trend signal stage.
//!
//! MA(n)[i] = mean(P[i-n+1..=i]), warmup: first (n-1) bars undefined.
//! SIGNAL[i] = 1 if P[i] > MA(n)[i] else 0 (0 while MA is undefined).
//! REGIME[i] counts signal flips since the start of the series.

use super::mean;

pub fn trailing_mean_at(prices: &[f64], i: usize, window: usize) -> Option<f64> {
    if window == 0 || i + 1 < window {
        return None;
    }
    Some(mean(&prices[i + 1 - window..=i]))
}

/// Long-only regime filter.
pub fn trend_signal(price: f64, moving_average: Option<f64>) -> u8 {
    match moving_average {
        Some(ma) if price > ma => 1,
        _ => 0,
    }
}

/// Regime id given the previous row's `(signal, regime_id)`.
pub fn next_regime(prev: Option<(u8, u32)>, signal: u8) -> u32 {
    match prev {
        Some((prev_signal, id)) if prev_signal != signal => id + 1,
        Some((_, id)) => id,
        None => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn moving_average_warmup() {
        let prices = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(trailing_mean_at(&prices, 1, 3), None);
        assert_eq!(trailing_mean_at(&prices, 2, 3), Some(2.0));
        assert_eq!(trailing_mean_at(&prices, 3, 3), Some(3.0));
    }

    #[test]
    fn signal_requires_strictly_above_average() {
        assert_eq!(trend_signal(101.0, Some(100.0)), 1);
        assert_eq!(trend_signal(100.0, Some(100.0)), 0);
        assert_eq!(trend_signal(99.0, Some(100.0)), 0);
    }

    #[test]
    fn signal_is_flat_before_warmup() {
        assert_eq!(trend_signal(1_000.0, None), 0);
    }

    #[test]
    fn regime_increments_on_flip() {
        let signals = [0u8, 0, 1, 1, 0, 1];
        let mut prev = None;
        let mut ids = Vec::new();
        for s in signals {
            let id = next_regime(prev, s);
            ids.push(id);
            prev = Some((s, id));
        }
        assert_eq!(ids, vec![0, 0, 1, 1, 2, 3]);
    }
}
