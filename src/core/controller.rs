//! Operating mode automaton.

use std::{
    fmt::{Display, Formatter},
    time::Instant,
};

use crate::{
    api::{modbus::RegisterPort, multiplus::Device},
    core::{
        energy_mode::EnergyMode,
        measurement::Measurement,
        night::NightClassifier,
        operating_mode::OperatingMode,
        reported::Reported,
        settings::Settings,
        surplus::{Surplus, SurplusDetector},
        throttle::WriteThrottle,
    },
    prelude::*,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum State {
    /// Waiting for a confirmed surplus.
    Off,

    /// Charging only during the day until the SoC reaches the charging minimum.
    Charging,

    /// Latched until the SoC drops to the minimum.
    On,

    /// Charging only for the off-delay, then off.
    OffDelay { since: Instant },
}

impl From<Reported<OperatingMode>> for State {
    fn from(mode: Reported<OperatingMode>) -> Self {
        match mode {
            Reported::Known(OperatingMode::On) => Self::On,
            Reported::Known(OperatingMode::ChargerOnly) => Self::Charging,
            Reported::Known(OperatingMode::Off) | Reported::Unrecognized(_) | Reported::Unknown => {
                Self::Off
            }
        }
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Off => write!(f, "Off"),
            Self::Charging => write!(f, "Charging"),
            Self::On => write!(f, "On"),
            Self::OffDelay { .. } => write!(f, "OffDelay"),
        }
    }
}

/// Restart gate after an automatic shutdown.
///
/// After the controller has switched the system off, it must observe a night before it may
/// switch it on again. Otherwise, a renewed surplus later the same day would restart it.
#[must_use]
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct ShutdownMemory {
    pub await_next_day: bool,
    pub night_seen_since_shutdown: bool,
}

impl ShutdownMemory {
    /// Remember the shutdown.
    ///
    /// A shutdown caused by the night counts the night as already seen.
    pub const fn arm(&mut self, night_seen: bool) {
        self.await_next_day = true;
        self.night_seen_since_shutdown = night_seen;
    }

    pub const fn observe(&mut self, is_night: bool) {
        if self.await_next_day && is_night {
            self.night_seen_since_shutdown = true;
        }
    }

    #[must_use]
    pub const fn blocks_restart(self) -> bool {
        self.await_next_day && !self.night_seen_since_shutdown
    }

    pub const fn clear(&mut self) {
        self.await_next_day = false;
        self.night_seen_since_shutdown = false;
    }
}

/// Everything read from the device in the current cycle.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Sample {
    pub measurement: Measurement,
    pub operating_mode: Reported<OperatingMode>,
    pub energy_mode: Reported<EnergyMode>,
}

pub struct Controller {
    settings: Settings,

    /// `None` until initialized from the device.
    state: Option<State>,

    surplus: SurplusDetector,
    night: NightClassifier,
    shutdown: ShutdownMemory,
    operating_mode: WriteThrottle<OperatingMode>,
    energy_mode: WriteThrottle<EnergyMode>,
}

impl Controller {
    pub fn new(settings: Settings) -> Self {
        Self {
            state: None,
            surplus: SurplusDetector::new(
                settings.surplus_threshold,
                settings.surplus_confirm_time,
            ),
            night: NightClassifier::new(
                settings.night_threshold,
                settings.night_confirm_time,
                settings.night_decay_factor,
            ),
            shutdown: ShutdownMemory::default(),
            operating_mode: WriteThrottle::new(settings.min_write_gap),
            energy_mode: WriteThrottle::new(settings.min_energy_mode_write_gap),
            settings,
        }
    }

    pub const fn state(&self) -> Option<State> {
        self.state
    }

    #[cfg(test)]
    pub const fn shutdown_memory(&self) -> ShutdownMemory {
        self.shutdown
    }

    #[cfg(test)]
    #[must_use]
    pub const fn night_accumulator(&self) -> f64 {
        self.night.accumulator()
    }

    /// Forget everything: the automaton gets re-initialized from the device on the next step.
    ///
    /// The write timestamps are kept, so that a quick disable–enable does not bypass the gaps.
    pub fn disable(&mut self) {
        self.state = None;
        self.surplus.reset();
        self.night.reset();
        self.shutdown.clear();
    }

    /// Advance the automaton by one cycle and issue the writes.
    ///
    /// A failed write aborts the step before the transition is applied,
    /// the next step retries from the same state.
    pub async fn step<P: RegisterPort>(
        &mut self,
        device: &mut Device<P>,
        now: Instant,
        sample: &Sample,
    ) -> Result<State> {
        self.operating_mode.observe(sample.operating_mode);
        self.energy_mode.observe(sample.energy_mode);

        let state = *self.state.get_or_insert_with(|| {
            let state = State::from(sample.operating_mode);
            info!(%state, mode = %sample.operating_mode, "initialized");
            state
        });
        let measurement = &sample.measurement;

        let is_night = self.night.update(now, measurement.pv);
        self.shutdown.observe(is_night);
        let surplus = self.surplus.update(now, measurement);

        let desired_energy_mode =
            EnergyMode::desired(is_night, self.settings.allow_night_energy_mode);
        self.sync_energy_mode(device, now, desired_energy_mode).await?;

        info!(
            %state,
            soc = %measurement.state_of_charge,
            load = %measurement.load,
            pv = %measurement.pv,
            surplus.is_present = surplus.is_present,
            surplus.is_confirmed = surplus.is_confirmed,
            is_night,
            night_accumulator = format!(
                "{:.0}s/{:.0}s",
                self.night.accumulator(),
                self.settings.night_confirm_time.as_secs_f64(),
            ),
            await_next_day = self.shutdown.await_next_day,
            night_seen_since_shutdown = self.shutdown.night_seen_since_shutdown,
            mode = %self.operating_mode.current(),
            energy_mode = format!("{}→{desired_energy_mode}", self.energy_mode.current()),
            "status",
        );

        let next_state = self.transition(device, now, state, measurement, surplus, is_night).await?;
        if next_state != state {
            info!(from = %state, to = %next_state, "transitioned");
        }
        self.state = Some(next_state);
        Ok(next_state)
    }

    async fn transition<P: RegisterPort>(
        &mut self,
        device: &mut Device<P>,
        now: Instant,
        state: State,
        measurement: &Measurement,
        surplus: Surplus,
        is_night: bool,
    ) -> Result<State> {
        let soc = measurement.state_of_charge;

        match state {
            State::Off => {
                if self.shutdown.blocks_restart() {
                    debug!("waiting for the night before restarting");
                    return Ok(State::Off);
                }
                if !surplus.is_confirmed {
                    return Ok(State::Off);
                }
                let next_state = if soc < self.settings.soc_charge_min {
                    self.switch(device, now, OperatingMode::ChargerOnly).await?;
                    State::Charging
                } else {
                    self.switch(device, now, OperatingMode::On).await?;
                    State::On
                };
                self.shutdown.clear();
                Ok(next_state)
            }

            State::Charging => {
                if self.settings.turn_off_at_night_below_charge_min
                    && is_night
                    && soc < self.settings.soc_charge_min
                    && !surplus.is_confirmed
                {
                    self.switch(device, now, OperatingMode::Off).await?;
                    self.shutdown.arm(true);
                    self.surplus.reset();
                    return Ok(State::Off);
                }
                self.switch(device, now, OperatingMode::ChargerOnly).await?;
                if soc >= self.settings.soc_charge_min {
                    self.switch(device, now, OperatingMode::On).await?;
                    Ok(State::On)
                } else {
                    Ok(State::Charging)
                }
            }

            State::On => {
                self.switch(device, now, OperatingMode::On).await?;
                if soc <= self.settings.soc_min {
                    self.switch(device, now, OperatingMode::ChargerOnly).await?;
                    Ok(State::OffDelay { since: now })
                } else {
                    Ok(State::On)
                }
            }

            State::OffDelay { since } => {
                self.switch(device, now, OperatingMode::ChargerOnly).await?;
                if now.saturating_duration_since(since) >= self.settings.off_delay {
                    self.switch(device, now, OperatingMode::Off).await?;
                    self.shutdown.arm(false);
                    self.surplus.reset();
                    Ok(State::Off)
                } else {
                    Ok(State::OffDelay { since })
                }
            }
        }
    }

    /// Command the operating mode through the throttle.
    async fn switch<P: RegisterPort>(
        &mut self,
        device: &mut Device<P>,
        now: Instant,
        mode: OperatingMode,
    ) -> Result<bool> {
        let current = self.operating_mode.current();
        self.operating_mode
            .maybe_write(now, mode, async {
                warn!(from = %current, to = %mode, "switching the operating mode…");
                device.write_operating_mode(mode).await
            })
            .await
    }

    async fn sync_energy_mode<P: RegisterPort>(
        &mut self,
        device: &mut Device<P>,
        now: Instant,
        desired: EnergyMode,
    ) -> Result<bool> {
        let current = self.energy_mode.current();
        if current.is_unknown() {
            debug!("current energy mode is unknown, skipping");
            return Ok(false);
        }
        self.energy_mode
            .maybe_write(now, desired, async {
                warn!(from = %current, to = %desired, "switching the energy mode…");
                device.write_energy_mode(desired).await
            })
            .await
    }
}
