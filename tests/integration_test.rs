//! End-to-end update cycles through the public session API.
//!
//! Tests cover:
//! - Warm-up boundary and the Ready transition
//! - No-op reruns and idempotent re-ingestion
//! - Look-ahead protection and PnL accounting
//! - Constant-price scenario
//! - Corrections, late inserts and capacity eviction
//! - Out-of-range parameters that bypassed validation
//! - Incremental cycles against a single full recompute

mod common;

use common::*;
use voltrend::domain::error::VoltrendError;
use voltrend::domain::pipeline::IndicatorPipeline;
use voltrend::domain::session::{ConfigChange, CycleStatus, TrendSession};
use voltrend::domain::window::WindowRange;

mod warm_up {
    use super::*;

    #[test]
    fn below_required_history_is_warming_up() {
        let config = EngineConfig::default();
        let mut session = TrendSession::new(config.clone());
        session.ingest(&trending(49, 100.0));
        let report = session.run_cycle().unwrap();
        assert_eq!(
            report.status,
            CycleStatus::WarmingUp {
                available: 49,
                required: 50
            }
        );
        assert!(report.rows.is_empty());
    }

    #[test]
    fn every_length_below_required_is_never_ready() {
        let config = small_config();
        let bars = trending(config.warmup_len(), 100.0);
        let mut session = TrendSession::new(config.clone());
        for bar in &bars[..config.warmup_len() - 1] {
            session.ingest(std::slice::from_ref(bar));
            let status = session.run_cycle().unwrap().status;
            assert!(matches!(status, CycleStatus::WarmingUp { .. }));
        }
        session.ingest(&bars[config.warmup_len() - 1..]);
        assert_eq!(session.run_cycle().unwrap().status, CycleStatus::Ready);
    }

    #[test]
    fn summarize_while_warming_up_is_empty_window() {
        let mut session = TrendSession::new(EngineConfig::default());
        session.ingest(&trending(10, 100.0));
        session.run_cycle().unwrap();
        assert!(matches!(
            session.summarize(WindowRange::All),
            Err(VoltrendError::EmptyWindow)
        ));
    }
}

mod idempotence {
    use super::*;

    #[test]
    fn rerun_without_data_changes_nothing() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(40, 100.0));
        session.run_cycle().unwrap();
        let rows = session.rows().to_vec();
        let watermark = session.watermark();

        for _ in 0..3 {
            let report = session.run_cycle().unwrap();
            assert_eq!(report.recomputed, None);
        }
        assert_eq!(session.rows(), rows.as_slice());
        assert_eq!(session.watermark(), watermark);
    }

    #[test]
    fn same_batch_twice_equals_once() {
        let batch = trending(40, 100.0);
        let mut once = TrendSession::new(small_config());
        once.ingest(&batch);
        once.run_cycle().unwrap();

        let mut twice = TrendSession::new(small_config());
        twice.ingest(&batch);
        twice.run_cycle().unwrap();
        twice.ingest(&batch);
        assert_eq!(twice.run_cycle().unwrap().recomputed, None);

        assert_eq!(once.series().as_slice(), twice.series().as_slice());
        assert_eq!(once.rows(), twice.rows());
    }
}

mod accounting {
    use super::*;

    #[test]
    fn pnl_uses_prior_bar_position() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(80, 100.0));
        session.run_cycle().unwrap();
        let rows = session.rows();

        let mut witnessed_lag = false;
        for w in rows.windows(2) {
            let (prev, curr) = (&w[0], &w[1]);
            let ret = curr.ret.unwrap();
            assert_eq!(curr.pnl, prev.position * ret);
            if prev.position != curr.position && ret != 0.0 {
                assert_ne!(curr.pnl, curr.position * ret);
                witnessed_lag = true;
            }
        }
        assert!(witnessed_lag);
    }

    #[test]
    fn cumulative_pnl_is_prefix_sum() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(80, 100.0));
        session.run_cycle().unwrap();

        let mut running = 0.0;
        for row in session.rows() {
            running += row.pnl;
            assert_eq!(row.cumulative_pnl, running);
        }
    }

    #[test]
    fn steady_uptrend_never_draws_down() {
        let prices: Vec<f64> = (0..60).map(|i| 100.0 * 1.01f64.powi(i)).collect();
        let mut session = TrendSession::new(small_config());
        session.ingest(&daily(&prices));
        session.run_cycle().unwrap();

        assert!(session.rows().iter().all(|r| r.pnl >= 0.0));
        let report = session.summarize(WindowRange::All).unwrap();
        assert_eq!(report.max_drawdown, 0.0);
    }
}

mod constant_prices {
    use super::*;

    #[test]
    fn sixty_constant_bars_produce_flat_report() {
        let mut session = TrendSession::new(EngineConfig::default());
        session.ingest(&daily(&[250.0; 60]));
        let report = session.run_cycle().unwrap();
        assert_eq!(report.status, CycleStatus::Ready);

        let rows = session.rows();
        assert!(rows[1..].iter().all(|r| r.ret == Some(0.0)));
        assert!(rows[..20].iter().all(|r| r.realized_vol.is_none()));
        assert!(rows[20..].iter().all(|r| r.realized_vol == Some(0.0)));
        assert!(rows.iter().all(|r| r.position == 0.0));
        assert!(rows.iter().all(|r| r.pnl == 0.0));

        let summary = session.summarize(WindowRange::All).unwrap();
        assert_eq!(summary.max_drawdown, 0.0);
        assert_eq!(summary.time_in_market, 0.0);
        assert_eq!(summary.sharpe_like, None);
    }
}

mod corrections_and_capacity {
    use super::*;

    #[test]
    fn correction_recomputes_forward_only() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(50, 100.0));
        session.run_cycle().unwrap();
        let before = session.rows().to_vec();

        let outcome = session.ingest(&[obs(30, 140.0)]);
        assert_eq!(outcome.replaced, 1);
        let scope = session.run_cycle().unwrap().recomputed.unwrap();
        assert_eq!(scope.from, day(30));
        assert_eq!(scope.rows, 20);
        assert_eq!(&session.rows()[..30], &before[..30]);
        assert_ne!(session.rows()[30..], before[30..]);

        let mut fresh = TrendSession::new(small_config());
        fresh.ingest(session.series().as_slice());
        fresh.run_cycle().unwrap();
        assert_eq!(session.rows(), fresh.rows());
    }

    #[test]
    fn late_bar_inside_history_recomputes_from_its_slot() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(40, 100.0));
        session.run_cycle().unwrap();
        let before = session.rows().to_vec();

        let late = PriceObservation::new(day(20) + chrono::Duration::hours(12), 131.0);
        let outcome = session.ingest(&[late]);
        assert_eq!(outcome.inserted, 1);
        assert_eq!(session.series().as_slice()[21], late);

        let scope = session.run_cycle().unwrap().recomputed.unwrap();
        assert_eq!(scope.start_index, 21);
        assert_eq!(scope.from, late.timestamp);
        assert_eq!(scope.rows, 20);
        assert_eq!(session.rows().len(), 41);
        assert_eq!(&session.rows()[..21], &before[..21]);

        let expected = IndicatorPipeline::new(&small_config()).run_full(session.series().as_slice());
        assert_eq!(session.rows(), expected.as_slice());
    }

    #[test]
    fn correcting_oldest_retained_bar_keeps_evicted_history() {
        let bounded = EngineConfig {
            capacity: 30,
            ..small_config()
        };
        let bars = trending(50, 100.0);
        let correction = obs(20, 125.0);

        let mut session = TrendSession::new(bounded);
        session.ingest(&bars[..30]);
        session.run_cycle().unwrap();
        session.ingest(&bars[30..]);
        session.run_cycle().unwrap();
        assert_eq!(session.series().earliest_timestamp(), Some(day(20)));
        let oldest = session.rows()[0].clone();
        assert_ne!(oldest.cumulative_pnl, oldest.pnl);

        session.ingest(&[correction]);
        let scope = session.run_cycle().unwrap().recomputed.unwrap();
        assert_eq!(scope.start_index, 0);
        assert_eq!(scope.rows, 30);
        assert!(session.rows()[0].ret.is_some());
        assert_ne!(session.rows()[0].ret, oldest.ret);

        let mut unbounded = TrendSession::new(small_config());
        unbounded.ingest(&bars[..30]);
        unbounded.run_cycle().unwrap();
        unbounded.ingest(&bars[30..]);
        unbounded.run_cycle().unwrap();
        unbounded.ingest(&[correction]);
        unbounded.run_cycle().unwrap();

        assert_eq!(session.rows(), &unbounded.rows()[20..]);
    }

    #[test]
    fn capacity_five_keeps_most_recent_five() {
        let mut session = TrendSession::new(EngineConfig {
            capacity: 5,
            vol_window: 2,
            ma_window: 3,
            ..EngineConfig::default()
        });
        session.ingest(&trending(10, 100.0));
        assert_eq!(session.series().len(), 5);
        let kept: Vec<_> = session.series().as_slice().iter().map(|o| o.timestamp).collect();
        assert_eq!(kept, (5..10).map(day).collect::<Vec<_>>());
        session.run_cycle().unwrap();
        assert_eq!(session.rows().len(), 5);
    }

    #[test]
    fn rejected_bars_do_not_corrupt_series() {
        let mut session = TrendSession::new(small_config());
        let mut batch = trending(30, 100.0);
        batch.push(obs(31, 0.0));
        batch.push(obs(32, f64::INFINITY));
        let outcome = session.ingest(&batch);
        assert_eq!(outcome.rejected.len(), 2);
        assert_eq!(session.series().len(), 30);
        assert_eq!(session.run_cycle().unwrap().status, CycleStatus::Ready);
    }

    #[test]
    fn window_resize_forces_full_recompute() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(40, 100.0));
        session.run_cycle().unwrap();

        let resized = EngineConfig {
            vol_window: 8,
            ..small_config()
        };
        assert!(matches!(
            session.reconfigure(resized.clone()),
            ConfigChange::Reset { .. }
        ));
        session.run_cycle().unwrap();

        let expected = IndicatorPipeline::new(&resized).run_full(session.series().as_slice());
        assert_eq!(session.rows(), expected.as_slice());
    }
}

mod unvalidated_config {
    use super::*;

    fn run_with_cap(max_leverage: f64) -> Vec<f64> {
        let mut session = TrendSession::new(EngineConfig {
            max_leverage,
            ..small_config()
        });
        session.ingest(&trending(40, 100.0));
        assert_eq!(session.run_cycle().unwrap().status, CycleStatus::Ready);
        session.rows().iter().map(|r| r.position).collect()
    }

    #[test]
    fn negative_leverage_cap_holds_no_position() {
        assert!(run_with_cap(-1.0).iter().all(|p| *p == 0.0));
    }

    #[test]
    fn nan_leverage_cap_holds_no_position() {
        assert!(run_with_cap(f64::NAN).iter().all(|p| *p == 0.0));
    }

    #[test]
    fn reconfigured_to_nan_cap_keeps_cycling() {
        let mut session = TrendSession::new(small_config());
        session.ingest(&trending(40, 100.0));
        session.run_cycle().unwrap();

        let change = session.reconfigure(EngineConfig {
            max_leverage: f64::NAN,
            ..small_config()
        });
        assert!(matches!(change, ConfigChange::Reset { .. }));
        let report = session.run_cycle().unwrap();
        assert_eq!(report.status, CycleStatus::Ready);
        assert!(session.rows().iter().all(|r| r.position == 0.0 && r.pnl == 0.0));
    }
}

mod incremental {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]
        #[test]
        fn any_batching_matches_full_recompute(
            moves in prop::collection::vec(-0.03f64..0.03, 30..120),
            batch in 1usize..15,
        ) {
            let mut price = 100.0;
            let prices: Vec<f64> = moves
                .iter()
                .map(|m| {
                    price *= 1.0 + m;
                    price
                })
                .collect();
            let bars = daily(&prices);

            let mut session = TrendSession::new(small_config());
            for chunk in bars.chunks(batch) {
                session.ingest(chunk);
                session.run_cycle().unwrap();
            }

            let expected = IndicatorPipeline::new(&small_config()).run_full(&bars);
            prop_assert_eq!(session.rows(), expected.as_slice());
        }
    }
}
