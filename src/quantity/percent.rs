quantity!(Percent(f64), unit = "%", order = float);

impl Percent {
    /// Scale the raw register value by the device-specific divisor.
    ///
    /// For example, a Venus GX reports the SoC in whole percents (divisor 1),
    /// while some BMS expose it in tenths of a percent (divisor 10).
    pub fn from_register(value: u16, divisor: f64) -> Self {
        Self(f64::from(value) / divisor)
    }

    #[must_use]
    pub fn is_within_bounds(self) -> bool {
        (0.0..=100.0).contains(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_register_ok() {
        assert_eq!(Percent::from_register(60, 1.0), Percent(60.0));
        assert_eq!(Percent::from_register(395, 10.0), Percent(39.5));
    }

    #[test]
    fn ordering_ok() {
        assert!(Percent(39.0) <= Percent(39.0));
        assert!(Percent(38.9) < Percent(39.0));
        assert!(Percent(50.0) > Percent(49.99));
    }

    #[test]
    fn bounds_ok() {
        assert!(Percent(0.0).is_within_bounds());
        assert!(Percent(100.0).is_within_bounds());
        assert!(!Percent(100.5).is_within_bounds());
        assert!(!Percent(-1.0).is_within_bounds());
    }
}
