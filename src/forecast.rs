use rand::Rng;
use tracing::warn;

use crate::error::{PipelineError, Result};
use crate::repair::VALUE_FLOOR;
use crate::timekey::{self, MonthKey};

/// How many tail values feed the trend estimate.
const TREND_WINDOW: usize = 5;

/// Trend magnitude cap as a fraction of the last value; noisy tails must
/// not extrapolate into runaway slopes.
const TREND_CLAMP: f64 = 0.10;

/// Perturbation magnitude as a fraction of the last value.
const NOISE_MIN: f64 = 0.03;
const NOISE_MAX: f64 = 0.10;

/// Probability that a perturbation follows the trend direction.
const FOLLOW_PROB: f64 = 0.7;

/// Below this per-month slope the series is described as stable.
const STABLE_BELOW: f64 = 0.5;

/// Projection for `N` future months: values, their keys, and a one-line
/// trend description.
#[derive(Debug, Clone)]
pub struct Forecast {
    pub keys: Vec<MonthKey>,
    pub values: Vec<f64>,
    pub trend: String,
}

/// Project `horizon` future values from a gap-filled history.
///
/// The recent slope is taken over the last up-to-5 points, clamped to 10%
/// of the last value, and applied with linearly decaying weight; each step
/// adds a bounded perturbation that follows the trend direction 70% of the
/// time. Output is floored at 0.1 and rounded to 2 decimals.
pub fn project<R: Rng>(
    history: &[f64],
    last_key: MonthKey,
    horizon: usize,
    rng: &mut R,
) -> Result<Forecast> {
    if history.is_empty() {
        return Err(PipelineError::InsufficientData(
            "cannot forecast from an empty series".into(),
        ));
    }
    if horizon == 0 {
        return Err(PipelineError::InsufficientData(
            "forecast horizon must be positive".into(),
        ));
    }

    let last = *history.last().expect("history checked non-empty");
    let window = &history[history.len().saturating_sub(TREND_WINDOW)..];
    let raw_trend = if window.len() >= 2 {
        (window[window.len() - 1] - window[0]) / window.len() as f64
    } else {
        0.0
    };
    let cap = last.abs() * TREND_CLAMP;
    let trend = raw_trend.clamp(-cap, cap);
    let trend_sign = if trend < 0.0 { -1.0 } else { 1.0 };

    let steps = horizon as f64;
    let mut keys = Vec::with_capacity(horizon);
    let mut values = Vec::with_capacity(horizon);
    let mut key = last_key;

    for i in 0..horizon {
        // Trend weight decays toward zero across the horizon.
        let decay = 1.0 - i as f64 / steps;
        let contribution = trend * decay * (i as f64 + 1.0);

        let magnitude = last * rng.gen_range(NOISE_MIN..=NOISE_MAX);
        let sign = if rng.gen_bool(FOLLOW_PROB) {
            trend_sign
        } else {
            -trend_sign
        };

        let value = round2((last + contribution + sign * magnitude).max(VALUE_FLOOR));
        key = key.succ();
        keys.push(key);
        values.push(value);
    }

    Ok(Forecast {
        keys,
        values,
        trend: describe_trend(trend),
    })
}

/// Resolve a forecast anchor from a raw period label, falling back to the
/// current month when the label does not parse.
pub fn anchor_month(raw: &str) -> MonthKey {
    MonthKey::from_raw(raw).unwrap_or_else(|| {
        let now = timekey::current_month();
        warn!(raw, fallback = %now, "unparseable forecast anchor, using current month");
        now
    })
}

fn describe_trend(trend: f64) -> String {
    if trend.abs() < STABLE_BELOW {
        "stable".to_string()
    } else if trend > 0.0 {
        format!("rising, ~{:.2}/month", trend)
    } else {
        format!("falling, ~{:.2}/month", trend.abs())
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn key(s: &str) -> MonthKey {
        s.parse().unwrap()
    }

    #[test]
    fn flat_series_is_stable_with_bounded_noise() {
        let forecast = project(&[10.0, 10.0, 10.0], key("2023-10"), 3, &mut rng()).unwrap();
        assert_eq!(forecast.trend, "stable");
        assert_eq!(forecast.values.len(), 3);
        for v in &forecast.values {
            let delta = (v - 10.0).abs();
            // perturbation is 3-10% of the last value, up to rounding
            assert!(delta >= 0.29 && delta <= 1.01, "delta {delta} out of band");
        }
    }

    #[test]
    fn keys_continue_the_month_sequence() {
        let forecast = project(&[5.0, 6.0], key("2023-12"), 3, &mut rng()).unwrap();
        let rendered: Vec<String> = forecast.keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(rendered, vec!["2024-01", "2024-02", "2024-03"]);
    }

    #[test]
    fn empty_history_is_refused() {
        let err = project(&[], key("2023-01"), 3, &mut rng()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn zero_horizon_is_refused() {
        let err = project(&[10.0], key("2023-01"), 0, &mut rng()).unwrap_err();
        assert!(matches!(err, PipelineError::InsufficientData(_)));
    }

    #[test]
    fn single_point_history_has_no_trend() {
        let forecast = project(&[20.0], key("2023-06"), 2, &mut rng()).unwrap();
        assert_eq!(forecast.trend, "stable");
    }

    #[test]
    fn steep_rise_is_clamped_and_described() {
        // raw slope (100-20)/5 = 16, clamped to 10% of 100 = 10
        let history = [20.0, 40.0, 60.0, 80.0, 100.0];
        let forecast = project(&history, key("2023-05"), 4, &mut rng()).unwrap();
        assert_eq!(forecast.trend, "rising, ~10.00/month");
        for v in &forecast.values {
            assert!(*v >= VALUE_FLOOR);
        }
    }

    #[test]
    fn falling_series_is_described_with_magnitude() {
        let history = [40.0, 38.0, 36.0, 34.0, 32.0];
        // raw slope (32-40)/5 = -1.6, within the 3.2 clamp
        let forecast = project(&history, key("2023-05"), 2, &mut rng()).unwrap();
        assert_eq!(forecast.trend, "falling, ~1.60/month");
    }

    #[test]
    fn values_never_go_negative() {
        let history = [0.5, 0.4, 0.3, 0.2, 0.1];
        let mut r = rng();
        for _ in 0..20 {
            let forecast = project(&history, key("2023-05"), 6, &mut r).unwrap();
            for v in &forecast.values {
                assert!(*v >= VALUE_FLOOR);
            }
        }
    }

    #[test]
    fn anchor_falls_back_to_current_month() {
        assert_eq!(anchor_month("2023年6月").to_string(), "2023-06");
        let fallback = anchor_month("not a month");
        assert_eq!(fallback, timekey::current_month());
    }
}
