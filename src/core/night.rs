use std::time::{Duration, Instant};

use crate::quantity::power::Watts;

/// Tolerant night detection from the PV power alone.
///
/// This is a leaky integrator of «darkness time»: dark samples charge it in real time,
/// bright samples drain it with the decay factor. With a decay factor below 1, a short flash
/// at dusk or dawn erodes the accumulated darkness only partially.
///
/// The night is detected while the accumulator is full, it is not latched.
pub struct NightClassifier {
    threshold: Watts,
    confirm_time: Duration,
    decay_factor: f64,

    /// Accumulated darkness in seconds, always within `[0, confirm_time]`.
    accumulator: f64,

    last_sample_at: Option<Instant>,
}

impl NightClassifier {
    pub const fn new(threshold: Watts, confirm_time: Duration, decay_factor: f64) -> Self {
        Self { threshold, confirm_time, decay_factor, accumulator: 0.0, last_sample_at: None }
    }

    /// Feed the next PV sample and return whether it is night.
    pub fn update(&mut self, now: Instant, pv: Watts) -> bool {
        let time_delta = self
            .last_sample_at
            .map_or(0.0, |last_sample_at| {
                now.saturating_duration_since(last_sample_at).as_secs_f64()
            });
        self.last_sample_at = Some(now);

        let capacity = self.confirm_time.as_secs_f64();
        self.accumulator = if pv < self.threshold {
            (self.accumulator + time_delta).min(capacity)
        } else {
            (self.accumulator - time_delta * self.decay_factor).max(0.0)
        };
        self.is_night()
    }

    #[must_use]
    pub fn is_night(&self) -> bool {
        self.accumulator >= self.confirm_time.as_secs_f64()
    }

    /// Accumulated darkness in seconds.
    #[must_use]
    pub const fn accumulator(&self) -> f64 {
        self.accumulator
    }

    pub fn reset(&mut self) {
        self.accumulator = 0.0;
        self.last_sample_at = None;
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const DARK: Watts = Watts(0);
    const BRIGHT: Watts = Watts(1500);

    fn classifier() -> NightClassifier {
        NightClassifier::new(Watts(200), Duration::from_secs(1800), 0.25)
    }

    #[test]
    fn first_sample_contributes_nothing() {
        let mut classifier = classifier();
        assert!(!classifier.update(Instant::now(), DARK));
        assert_abs_diff_eq!(classifier.accumulator(), 0.0);
    }

    #[test]
    fn accumulator_stays_within_bounds() {
        let mut classifier = classifier();
        let mut now = Instant::now();
        let steps = [0_u64, 7, 600, 3600, 1, 0, 5000, 13, 2, 900].into_iter().cycle().take(200);
        for (i, step) in steps.enumerate() {
            now += Duration::from_secs(step);
            let pv = if (i / 3) % 2 == 0 { DARK } else { BRIGHT };
            classifier.update(now, pv);
            let accumulator = classifier.accumulator();
            assert!((0.0..=1800.0).contains(&accumulator), "{accumulator}");
        }
    }

    #[test]
    fn night_is_detected_once_full() {
        let mut classifier = classifier();
        let start = Instant::now();
        classifier.update(start, DARK);
        assert!(!classifier.update(start + Duration::from_secs(1795), DARK));
        assert!(classifier.update(start + Duration::from_secs(1800), DARK));
        assert!(classifier.update(start + Duration::from_secs(5000), DARK));
        assert_abs_diff_eq!(classifier.accumulator(), 1800.0);
    }

    #[test]
    fn brightness_decays_slower() {
        let mut classifier = classifier();
        let start = Instant::now();
        classifier.update(start, DARK);
        classifier.update(start + Duration::from_secs(1800), DARK);

        // 60 seconds of brightness only erode 15 seconds of darkness:
        assert!(!classifier.update(start + Duration::from_secs(1860), BRIGHT));
        assert_abs_diff_eq!(classifier.accumulator(), 1785.0);

        // …and another 15 seconds of darkness restore the night:
        assert!(classifier.update(start + Duration::from_secs(1875), DARK));
    }

    #[test]
    fn enough_brightness_flips_back_to_day() {
        let mut classifier = classifier();
        let start = Instant::now();
        classifier.update(start, DARK);
        assert!(classifier.update(start + Duration::from_secs(1800), DARK));
        assert!(!classifier.update(start + Duration::from_secs(1800 + 7200), BRIGHT));
        assert_abs_diff_eq!(classifier.accumulator(), 0.0);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut classifier = classifier();
        let start = Instant::now();
        classifier.update(start, Watts(200));
        classifier.update(start + Duration::from_secs(1800), Watts(200));
        assert!(!classifier.is_night());
    }

    #[test]
    fn reset_ok() {
        let mut classifier = classifier();
        let start = Instant::now();
        classifier.update(start, DARK);
        classifier.update(start + Duration::from_secs(1800), DARK);
        classifier.reset();
        assert!(!classifier.is_night());
        assert!(!classifier.update(start + Duration::from_secs(3600), DARK));
    }
}
