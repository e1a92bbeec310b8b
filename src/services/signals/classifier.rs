//! Per-timeframe trend classification with momentum confirmation.

use crate::types::{Direction, IndicatorResult, SignalParams, TimeframeSignal};

/// Classify one timeframe from its indicator values.
///
/// Trend direction comes from the fast/slow crossover; equal values count as
/// bearish. Momentum confirms the direction only when it clears the dead-band
/// on the matching side.
pub fn classify(result: &IndicatorResult, params: &SignalParams) -> TimeframeSignal {
    let (fast, slow) = match (result.fast_trend, result.slow_trend) {
        (Some(fast), Some(slow)) => (fast, slow),
        _ => {
            return TimeframeSignal {
                direction: Direction::Neutral,
                confirmed: false,
                reason: "insufficient data".to_string(),
                trend_spread_pct: None,
                momentum: result.momentum,
                fast_trend: result.fast_trend,
                slow_trend: result.slow_trend,
            };
        }
    };

    let direction = if fast > slow {
        Direction::Bullish
    } else {
        Direction::Bearish
    };

    let trend_spread_pct = if slow != 0.0 {
        Some((fast - slow) / slow * 100.0)
    } else {
        None
    };

    let (confirmed, reason) = match result.momentum {
        None => (false, "momentum unavailable".to_string()),
        Some(m) if direction == Direction::Bullish => {
            let upper = params.upper_threshold;
            if m > upper {
                (true, format!("momentum {:.1} > {}", m, upper))
            } else {
                (false, format!("momentum {:.1} not above {}", m, upper))
            }
        }
        Some(m) => {
            let lower = params.lower_threshold;
            if m < lower {
                (true, format!("momentum {:.1} < {}", m, lower))
            } else {
                (false, format!("momentum {:.1} not below {}", m, lower))
            }
        }
    };

    TimeframeSignal {
        direction,
        confirmed,
        reason,
        trend_spread_pct,
        momentum: result.momentum,
        fast_trend: Some(fast),
        slow_trend: Some(slow),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> SignalParams {
        SignalParams {
            fast_period: 9,
            slow_period: 21,
            momentum_period: 14,
            upper_threshold: 52.0,
            lower_threshold: 48.0,
        }
    }

    fn result(fast: f64, slow: f64, momentum: Option<f64>) -> IndicatorResult {
        IndicatorResult {
            fast_trend: Some(fast),
            slow_trend: Some(slow),
            momentum,
        }
    }

    #[test]
    fn test_confirmed_bullish() {
        let signal = classify(&result(105.0, 100.0, Some(61.27)), &params());
        assert_eq!(signal.direction, Direction::Bullish);
        assert!(signal.confirmed);
        assert_eq!(signal.reason, "momentum 61.3 > 52");
        assert!((signal.trend_spread_pct.unwrap() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_unconfirmed_bullish_inside_band() {
        let signal = classify(&result(105.0, 100.0, Some(50.2)), &params());
        assert_eq!(signal.direction, Direction::Bullish);
        assert!(!signal.confirmed);
        assert_eq!(signal.reason, "momentum 50.2 not above 52");
    }

    #[test]
    fn test_confirmed_bearish() {
        let signal = classify(&result(95.0, 100.0, Some(31.04)), &params());
        assert_eq!(signal.direction, Direction::Bearish);
        assert!(signal.confirmed);
        assert_eq!(signal.reason, "momentum 31.0 < 48");
        assert!((signal.trend_spread_pct.unwrap() + 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearish_with_high_momentum_not_confirmed() {
        let signal = classify(&result(95.0, 100.0, Some(70.0)), &params());
        assert_eq!(signal.direction, Direction::Bearish);
        assert!(!signal.confirmed);
        assert_eq!(signal.reason, "momentum 70.0 not below 48");
    }

    #[test]
    fn test_threshold_boundaries_do_not_confirm() {
        let bull = classify(&result(105.0, 100.0, Some(52.0)), &params());
        assert!(!bull.confirmed);
        let bear = classify(&result(95.0, 100.0, Some(48.0)), &params());
        assert!(!bear.confirmed);
    }

    #[test]
    fn test_equal_trends_are_bearish() {
        let signal = classify(&result(100.0, 100.0, Some(40.0)), &params());
        assert_eq!(signal.direction, Direction::Bearish);
        assert!(signal.confirmed);
        assert_eq!(signal.trend_spread_pct, Some(0.0));
    }

    #[test]
    fn test_missing_momentum_never_confirms() {
        let signal = classify(&result(105.0, 100.0, None), &params());
        assert_eq!(signal.direction, Direction::Bullish);
        assert!(!signal.confirmed);
        assert_eq!(signal.reason, "momentum unavailable");
    }

    #[test]
    fn test_missing_trend_is_neutral() {
        let input = IndicatorResult {
            fast_trend: Some(105.0),
            slow_trend: None,
            momentum: Some(80.0),
        };
        let signal = classify(&input, &params());
        assert_eq!(signal.direction, Direction::Neutral);
        assert!(!signal.confirmed);
        assert_eq!(signal.reason, "insufficient data");
        assert!(signal.trend_spread_pct.is_none());

        let signal = classify(&IndicatorResult::unavailable(), &params());
        assert_eq!(signal.direction, Direction::Neutral);
    }

    #[test]
    fn test_classify_is_deterministic() {
        let input = result(101.3, 100.9, Some(55.5));
        assert_eq!(classify(&input, &params()), classify(&input, &params()));
    }
}
