//! Cross-timeframe aggregation into one asset signal.

use crate::types::{AssetSignal, Confidence, Direction, TimeframeSignal};

/// Aggregate the complete set of timeframe verdicts for an asset.
///
/// Confirmed counts decide first. Raw directions only break a confirmed tie,
/// and such a verdict is weak with its strength halved.
pub fn aggregate(signals: &[TimeframeSignal]) -> AssetSignal {
    let total = signals.len();

    let mut confirmed_bullish = 0;
    let mut confirmed_bearish = 0;
    let mut bullish_count = 0;
    let mut bearish_count = 0;

    for signal in signals {
        match signal.direction {
            Direction::Bullish => {
                bullish_count += 1;
                if signal.confirmed {
                    confirmed_bullish += 1;
                }
            }
            Direction::Bearish => {
                bearish_count += 1;
                if signal.confirmed {
                    confirmed_bearish += 1;
                }
            }
            Direction::Neutral => {}
        }
    }

    let ratio = |count: usize| {
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    };

    let (overall, confidence, strength) = if confirmed_bullish > confirmed_bearish {
        (
            Direction::Bullish,
            Confidence::ConfirmedBullish,
            ratio(confirmed_bullish),
        )
    } else if confirmed_bearish > confirmed_bullish {
        (
            Direction::Bearish,
            Confidence::ConfirmedBearish,
            ratio(confirmed_bearish),
        )
    } else if bullish_count > bearish_count {
        (
            Direction::Bullish,
            Confidence::WeakBullish,
            ratio(bullish_count) * 0.5,
        )
    } else if bearish_count > bullish_count {
        (
            Direction::Bearish,
            Confidence::WeakBearish,
            ratio(bearish_count) * 0.5,
        )
    } else if bullish_count > 0 {
        (Direction::Neutral, Confidence::Neutral, 0.5)
    } else {
        (Direction::Neutral, Confidence::Neutral, 0.0)
    };

    AssetSignal {
        overall,
        confidence,
        strength,
        bullish_count,
        bearish_count,
        total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tf(direction: Direction, confirmed: bool) -> TimeframeSignal {
        TimeframeSignal {
            direction,
            confirmed,
            reason: String::new(),
            trend_spread_pct: None,
            momentum: None,
            fast_trend: None,
            slow_trend: None,
        }
    }

    #[test]
    fn test_confirmed_outranks_raw_majority() {
        let signals = vec![
            tf(Direction::Bullish, true),
            tf(Direction::Bullish, true),
            tf(Direction::Bearish, false),
            tf(Direction::Bearish, false),
        ];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::ConfirmedBullish);
        assert_eq!(result.overall, Direction::Bullish);
        assert!((result.strength - 0.5).abs() < 1e-9);
        assert_eq!(result.bullish_count, 2);
        assert_eq!(result.bearish_count, 2);
        assert_eq!(result.total, 4);
    }

    #[test]
    fn test_single_confirmed_beats_three_weak() {
        let signals = vec![
            tf(Direction::Bearish, true),
            tf(Direction::Bullish, false),
            tf(Direction::Bullish, false),
            tf(Direction::Bullish, false),
        ];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::ConfirmedBearish);
        assert!((result.strength - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_confirmed_tie_falls_back_to_raw_counts() {
        let signals = vec![
            tf(Direction::Bullish, true),
            tf(Direction::Bearish, true),
            tf(Direction::Bearish, false),
            tf(Direction::Neutral, false),
        ];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::WeakBearish);
        assert_eq!(result.overall, Direction::Bearish);
        assert!((result.strength - 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_weak_bullish_strength_is_halved() {
        let signals = vec![
            tf(Direction::Bullish, false),
            tf(Direction::Bullish, false),
            tf(Direction::Bullish, false),
            tf(Direction::Bearish, false),
        ];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::WeakBullish);
        assert!((result.strength - 0.375).abs() < 1e-9);
    }

    #[test]
    fn test_full_tie_is_neutral_half_strength() {
        let signals = vec![
            tf(Direction::Bullish, false),
            tf(Direction::Bearish, false),
            tf(Direction::Neutral, false),
            tf(Direction::Neutral, false),
        ];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::Neutral);
        assert_eq!(result.overall, Direction::Neutral);
        assert_eq!(result.strength, 0.5);
    }

    #[test]
    fn test_all_neutral_is_zero_strength() {
        let signals = vec![tf(Direction::Neutral, false); 4];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::Neutral);
        assert_eq!(result.strength, 0.0);
    }

    #[test]
    fn test_empty_set() {
        let result = aggregate(&[]);
        assert_eq!(result.confidence, Confidence::Neutral);
        assert_eq!(result.strength, 0.0);
        assert_eq!(result.total, 0);
    }

    #[test]
    fn test_unanimous_confirmed_is_full_strength() {
        let signals = vec![tf(Direction::Bullish, true); 4];
        let result = aggregate(&signals);
        assert_eq!(result.confidence, Confidence::ConfirmedBullish);
        assert_eq!(result.strength, 1.0);
    }
}
