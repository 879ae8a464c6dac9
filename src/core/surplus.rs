use std::time::{Duration, Instant};

use crate::{core::measurement::Measurement, quantity::power::Watts};

/// Debounced PV surplus detection.
///
/// Surplus is only confirmed after it has been present for the entire confirmation time,
/// so that a cloud gap does not trigger any switching.
pub struct SurplusDetector {
    threshold: Watts,
    confirm_time: Duration,

    /// Onset of the current uninterrupted surplus.
    since: Option<Instant>,
}

#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Surplus {
    /// Surplus is present in the current measurement.
    pub is_present: bool,

    /// Surplus has been present for at least the confirmation time.
    pub is_confirmed: bool,
}

impl SurplusDetector {
    pub const fn new(threshold: Watts, confirm_time: Duration) -> Self {
        Self { threshold, confirm_time, since: None }
    }

    pub fn update(&mut self, now: Instant, measurement: &Measurement) -> Surplus {
        let is_present = measurement.pv >= measurement.load + self.threshold;
        if is_present {
            self.since.get_or_insert(now);
        } else {
            self.since = None;
        }
        let is_confirmed = self
            .since
            .is_some_and(|since| now.saturating_duration_since(since) >= self.confirm_time);
        Surplus { is_present, is_confirmed }
    }

    pub fn reset(&mut self) {
        self.since = None;
    }

    #[cfg(test)]
    pub const fn since(&self) -> Option<Instant> {
        self.since
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::percent::Percent;

    fn measurement(pv: i64, load: i64) -> Measurement {
        Measurement { state_of_charge: Percent(60.0), load: Watts(load), pv: Watts(pv) }
    }

    const SURPLUS: Measurement =
        Measurement { state_of_charge: Percent(60.0), load: Watts(500), pv: Watts(700) };

    fn detector() -> SurplusDetector {
        SurplusDetector::new(Watts(100), Duration::from_secs(60))
    }

    #[test]
    fn threshold_is_inclusive() {
        let now = Instant::now();
        assert!(detector().update(now, &measurement(600, 500)).is_present);
        assert!(!detector().update(now, &measurement(599, 500)).is_present);
    }

    #[test]
    fn short_surplus_is_not_confirmed() {
        let start = Instant::now();
        let mut detector = detector();
        for seconds in (0..60).step_by(5) {
            let surplus =
                detector.update(start + Duration::from_secs(seconds), &SURPLUS);
            assert!(surplus.is_present);
            assert!(!surplus.is_confirmed, "confirmed after {seconds}s");
        }
    }

    #[test]
    fn sustained_surplus_is_confirmed() {
        let start = Instant::now();
        let mut detector = detector();
        assert!(!detector.update(start, &SURPLUS).is_confirmed);
        assert!(!detector.update(start + Duration::from_secs(30), &SURPLUS).is_confirmed);
        assert!(detector.update(start + Duration::from_secs(60), &SURPLUS).is_confirmed);
        assert_eq!(detector.since(), Some(start));
    }

    #[test]
    fn single_dip_resets_onset() {
        let start = Instant::now();
        let mut detector = detector();
        assert!(!detector.update(start, &SURPLUS).is_confirmed);
        let dip = detector.update(start + Duration::from_secs(55), &measurement(100, 500));
        assert!(!dip.is_present);
        assert_eq!(detector.since(), None);

        let restart = start + Duration::from_secs(60);
        assert!(!detector.update(restart, &SURPLUS).is_confirmed);
        assert_eq!(detector.since(), Some(restart));
        assert!(!detector.update(restart + Duration::from_secs(59), &SURPLUS).is_confirmed);
        assert!(detector.update(restart + Duration::from_secs(60), &SURPLUS).is_confirmed);
    }

    #[test]
    fn reset_ok() {
        let start = Instant::now();
        let mut detector = detector();
        assert!(detector.update(start, &SURPLUS).is_present);
        detector.reset();
        assert!(!detector.update(start + Duration::from_secs(120), &SURPLUS).is_confirmed);
    }
}
