use std::time::{Duration, Instant};

use crate::core::reported::Reported;

/// Write discipline for a single device register.
///
/// The throttle keeps the last known register value and skips writes that would not change
/// anything. It also enforces the minimal gap between consecutive writes, so that a borderline
/// measurement flipping every cycle does not hammer the device.
///
/// After a successful write the value is **optimistically** assumed to be applied:
/// the device is not re-read until the next cycle refreshes the value via [`Self::observe`].
/// Should the device acknowledge a write and silently not apply it, the throttle keeps
/// believing it was applied for the rest of the cycle.
pub struct WriteThrottle<T> {
    min_gap: Duration,
    last_write_at: Option<Instant>,
    current: Reported<T>,
}

impl<T: Copy + PartialEq> WriteThrottle<T> {
    pub const fn new(min_gap: Duration) -> Self {
        Self { min_gap, last_write_at: None, current: Reported::Unknown }
    }

    /// Refresh the last known value from the device.
    pub fn observe(&mut self, reported: Reported<T>) {
        self.current = reported;
    }

    pub const fn current(&self) -> Reported<T> {
        self.current
    }

    #[must_use]
    pub fn permits(&self, now: Instant, desired: T) -> bool {
        !self.current.is(&desired)
            && self
                .last_write_at
                .is_none_or(|last_write_at| {
                    now.saturating_duration_since(last_write_at) >= self.min_gap
                })
    }

    /// Run the write if it changes the value and the minimal gap has passed.
    ///
    /// Returns whether the write has been performed. The `write` future is not polled at all
    /// when the throttle declines it. When it fails, the state is left untouched so that the next
    /// cycle retries.
    pub async fn maybe_write<E>(
        &mut self,
        now: Instant,
        desired: T,
        write: impl Future<Output = Result<(), E>>,
    ) -> Result<bool, E> {
        if !self.permits(now, desired) {
            return Ok(false);
        }
        write.await?;
        self.last_write_at = Some(now);
        self.current = Reported::Known(desired);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{core::operating_mode::OperatingMode, prelude::*};

    async fn succeed() -> Result {
        Ok(())
    }

    fn throttle() -> WriteThrottle<OperatingMode> {
        WriteThrottle::new(Duration::from_secs(5))
    }

    #[tokio::test]
    async fn writes_when_unknown() -> Result {
        let mut throttle = throttle();
        assert!(throttle.maybe_write(Instant::now(), OperatingMode::On, succeed()).await?);
        assert_eq!(throttle.current(), Reported::Known(OperatingMode::On));
        Ok(())
    }

    #[tokio::test]
    async fn skips_redundant_write() -> Result {
        let mut throttle = throttle();
        throttle.observe(Reported::Known(OperatingMode::On));
        let written = throttle
            .maybe_write(Instant::now(), OperatingMode::On, async {
                bail!("must not be called");
            })
            .await?;
        assert!(!written);
        Ok(())
    }

    #[tokio::test]
    async fn enforces_min_gap() -> Result {
        let mut throttle = throttle();
        let start = Instant::now();
        assert!(throttle.maybe_write(start, OperatingMode::On, succeed()).await?);

        let early = start + Duration::from_secs(4);
        assert!(!throttle.permits(early, OperatingMode::Off));
        assert!(!throttle.maybe_write(early, OperatingMode::Off, succeed()).await?);
        assert_eq!(throttle.current(), Reported::Known(OperatingMode::On));

        let late = start + Duration::from_secs(5);
        assert!(throttle.maybe_write(late, OperatingMode::Off, succeed()).await?);
        assert_eq!(throttle.current(), Reported::Known(OperatingMode::Off));
        Ok(())
    }

    #[tokio::test]
    async fn gap_also_applies_to_another_value() -> Result {
        let mut throttle = throttle();
        let start = Instant::now();
        throttle.maybe_write(start, OperatingMode::ChargerOnly, succeed()).await?;
        throttle.observe(Reported::Known(OperatingMode::Off));
        assert!(!throttle.permits(start + Duration::from_secs(1), OperatingMode::On));
        Ok(())
    }

    #[tokio::test]
    async fn failed_write_keeps_state() {
        let mut throttle = throttle();
        let start = Instant::now();
        throttle.observe(Reported::Unrecognized(2));
        let result = throttle
            .maybe_write(start, OperatingMode::Off, async { bail!("connection reset") })
            .await;
        assert!(result.is_err());
        assert_eq!(throttle.current(), Reported::Unrecognized(2));

        // Not throttled by the failed attempt:
        assert!(throttle.permits(start, OperatingMode::Off));
    }
}
