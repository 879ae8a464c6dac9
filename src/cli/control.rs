use std::time::Duration;

use clap::{ArgAction, Parser, builder::BoolishValueParser};

use crate::{
    cli::error::ConfigurationError,
    core::settings::Settings,
    quantity::{percent::Percent, power::Watts},
};

#[derive(Parser)]
pub struct ControlArgs {
    /// Switch off (after the off-delay) once the SoC drops to this percentage.
    #[clap(long = "soc-min", env = "SOC_MIN", default_value = "39")]
    soc_min: Percent,

    /// Only charge until the SoC reaches this percentage, then switch on.
    #[clap(long = "soc-charge-min", env = "SOC_CHARGE_MIN", default_value = "50")]
    soc_charge_min: Percent,

    /// PV production must exceed the load by this many watts to count as surplus.
    #[clap(long = "pv-surplus-w", env = "PV_SURPLUS_W", default_value = "100")]
    surplus_threshold: Watts,

    #[clap(
        long = "pv-surplus-confirm-time",
        env = "PV_SURPLUS_CONFIRM_TIME",
        default_value = "60s"
    )]
    surplus_confirm_time: humantime::Duration,

    /// PV production below this many watts counts as darkness.
    #[clap(long = "pv-night-w", env = "PV_NIGHT_W", default_value = "200")]
    night_threshold: Watts,

    /// Accumulated darkness needed to detect the night.
    #[clap(long = "night-confirm-time", env = "NIGHT_CONFIRM_TIME", default_value = "30min")]
    night_confirm_time: humantime::Duration,

    /// Daylight drains the darkness accumulator this many times slower than the darkness fills it.
    #[clap(long = "night-decay-factor", env = "NIGHT_DECAY_FACTOR", default_value = "0.25")]
    night_decay_factor: f64,

    #[clap(
        long = "turn-off-at-night-when-below-charge-min",
        env = "TURN_OFF_AT_NIGHT_WHEN_BELOW_CHARGE_MIN",
        default_value = "true",
        default_missing_value = "true",
        num_args = 0..=1,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
    )]
    turn_off_at_night_below_charge_min: bool,

    /// Switch to the ESS mode without phase compensation at night, three-phase systems only.
    #[clap(
        long = "ess-allow-night-switch",
        env = "ESS_ALLOW_NIGHT_SWITCH",
        default_value = "false",
        default_missing_value = "true",
        num_args = 0..=1,
        action = ArgAction::Set,
        value_parser = BoolishValueParser::new(),
    )]
    allow_night_energy_mode: bool,

    /// Dwell time in the charger-only mode before switching off.
    #[clap(long = "off-delay", env = "OFF_DELAY", default_value = "30s")]
    off_delay: humantime::Duration,

    #[clap(long = "poll-interval", env = "POLL_INTERVAL", default_value = "5s")]
    poll_interval: humantime::Duration,

    /// Minimal time between two operating mode writes.
    #[clap(long = "min-write-gap", env = "MIN_WRITE_GAP", default_value = "5s")]
    min_write_gap: humantime::Duration,

    /// Minimal time between two ESS mode writes.
    #[clap(long = "min-ess-write-gap", env = "MIN_ESS_WRITE_GAP", default_value = "30s")]
    min_energy_mode_write_gap: humantime::Duration,
}

impl ControlArgs {
    pub fn poll_interval(&self) -> Result<Duration, ConfigurationError> {
        let poll_interval: Duration = self.poll_interval.into();
        if poll_interval.is_zero() {
            return Err(ConfigurationError::PollInterval);
        }
        Ok(poll_interval)
    }

    pub fn settings(&self) -> Result<Settings, ConfigurationError> {
        let thresholds =
            [("SoC minimum", self.soc_min), ("SoC charging minimum", self.soc_charge_min)];
        for (name, value) in thresholds {
            if !value.is_within_bounds() {
                return Err(ConfigurationError::SocOutOfRange { name, value });
            }
        }
        if self.soc_min >= self.soc_charge_min {
            return Err(ConfigurationError::SocThresholds {
                soc_min: self.soc_min,
                soc_charge_min: self.soc_charge_min,
            });
        }
        if !(0.0..=1.0).contains(&self.night_decay_factor) {
            return Err(ConfigurationError::NightDecayFactor(self.night_decay_factor));
        }

        Ok(Settings::builder()
            .soc_min(self.soc_min)
            .soc_charge_min(self.soc_charge_min)
            .surplus_threshold(self.surplus_threshold)
            .surplus_confirm_time(self.surplus_confirm_time.into())
            .night_threshold(self.night_threshold)
            .night_confirm_time(self.night_confirm_time.into())
            .night_decay_factor(self.night_decay_factor)
            .turn_off_at_night_below_charge_min(self.turn_off_at_night_below_charge_min)
            .allow_night_energy_mode(self.allow_night_energy_mode)
            .off_delay(self.off_delay.into())
            .min_write_gap(self.min_write_gap.into())
            .min_energy_mode_write_gap(self.min_energy_mode_write_gap.into())
            .build())
    }
}
