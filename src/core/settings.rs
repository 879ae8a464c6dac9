use std::time::Duration;

use bon::Builder;

use crate::quantity::{percent::Percent, power::Watts};

/// Immutable controller configuration, constructed once at startup.
///
/// Defaults match the command-line defaults, they are primarily here for the tests.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct Settings {
    /// Switch off (via the off-delay) once the SoC drops to this level.
    #[builder(default = Percent(39.0))]
    pub soc_min: Percent,

    /// Keep charging only until the SoC reaches this level, then switch on.
    #[builder(default = Percent(50.0))]
    pub soc_charge_min: Percent,

    /// PV production must exceed the load by at least this margin to count as surplus.
    #[builder(default = Watts(100))]
    pub surplus_threshold: Watts,

    #[builder(default = Duration::from_secs(60))]
    pub surplus_confirm_time: Duration,

    /// PV production below this level counts as darkness.
    #[builder(default = Watts(200))]
    pub night_threshold: Watts,

    /// Accumulated darkness needed to detect the night.
    #[builder(default = Duration::from_secs(1800))]
    pub night_confirm_time: Duration,

    /// How fast the daylight erodes the accumulated darkness, relatively to how it accrues.
    #[builder(default = 0.25)]
    pub night_decay_factor: f64,

    #[builder(default = true)]
    pub turn_off_at_night_below_charge_min: bool,

    /// Allow switching to [`crate::core::energy_mode::EnergyMode::Night`] at night.
    #[builder(default = false)]
    pub allow_night_energy_mode: bool,

    /// Dwell time in charger-only mode before switching off completely.
    #[builder(default = Duration::from_secs(30))]
    pub off_delay: Duration,

    #[builder(default = Duration::from_secs(5))]
    pub min_write_gap: Duration,

    #[builder(default = Duration::from_secs(30))]
    pub min_energy_mode_write_gap: Duration,
}
