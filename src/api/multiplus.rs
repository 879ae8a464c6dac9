//! Victron MultiPlus behind a Venus GX, as seen through its Modbus TCP register map.

use bon::Builder;
use itertools::Itertools;
use tokio_modbus::{Address, SlaveId};

use crate::{
    api::modbus::RegisterPort,
    core::{
        energy_mode::EnergyMode,
        measurement::Measurement,
        operating_mode::OperatingMode,
        reported::Reported,
    },
    prelude::*,
    quantity::{percent::Percent, power::Watts},
};

/// Number of the load registers, one per phase.
const N_LOAD_REGISTERS: u16 = 3;

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ModeCodes {
    pub charger_only: u16,
    pub on: u16,
    pub off: u16,
}

impl Default for ModeCodes {
    fn default() -> Self {
        Self { charger_only: 1, on: 3, off: 4 }
    }
}

impl ModeCodes {
    pub const fn encode(self, mode: OperatingMode) -> u16 {
        match mode {
            OperatingMode::ChargerOnly => self.charger_only,
            OperatingMode::On => self.on,
            OperatingMode::Off => self.off,
        }
    }

    pub const fn decode(self, code: u16) -> Reported<OperatingMode> {
        if code == self.charger_only {
            Reported::Known(OperatingMode::ChargerOnly)
        } else if code == self.on {
            Reported::Known(OperatingMode::On)
        } else if code == self.off {
            Reported::Known(OperatingMode::Off)
        } else {
            Reported::Unrecognized(code)
        }
    }
}

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct EnergyModeCodes {
    pub day: u16,
    pub night: u16,
}

impl Default for EnergyModeCodes {
    fn default() -> Self {
        Self { day: 1, night: 2 }
    }
}

impl EnergyModeCodes {
    pub const fn encode(self, mode: EnergyMode) -> u16 {
        match mode {
            EnergyMode::Day => self.day,
            EnergyMode::Night => self.night,
        }
    }

    pub const fn decode(self, code: u16) -> Reported<EnergyMode> {
        if code == self.day {
            Reported::Known(EnergyMode::Day)
        } else if code == self.night {
            Reported::Known(EnergyMode::Night)
        } else {
            Reported::Unrecognized(code)
        }
    }
}

/// Where to find everything on the device.
///
/// Register numbers are as documented, the transport applies the address offset.
#[must_use]
#[derive(Clone, Debug, Builder)]
pub struct RegisterMap {
    /// Unit ID for the enable flag and the measurements.
    #[builder(default = 100)]
    pub read_unit_id: SlaveId,

    /// The controller only acts while this register reads exactly 1.
    #[builder(default = 806)]
    pub enable_flag: Address,

    #[builder(default = 843)]
    pub state_of_charge: Address,

    #[builder(default = 1.0)]
    pub state_of_charge_divisor: f64,

    /// First of the three contiguous per-phase load registers.
    #[builder(default = 817)]
    pub load_base: Address,

    #[builder(default = vec![811, 812, 813])]
    pub pv: Vec<Address>,

    #[builder(default = 227)]
    pub mode_unit_id: SlaveId,

    #[builder(default = 33)]
    pub mode: Address,

    #[builder(default)]
    pub mode_codes: ModeCodes,

    #[builder(default = 100)]
    pub energy_mode_unit_id: SlaveId,

    /// ESS «Hub4» mode.
    #[builder(default = 2902)]
    pub energy_mode: Address,

    #[builder(default)]
    pub energy_mode_codes: EnergyModeCodes,
}

/// Typed device operations on top of the raw registers.
pub struct Device<P> {
    port: P,
    registers: RegisterMap,
}

impl<P: RegisterPort> Device<P> {
    pub const fn new(port: P, registers: RegisterMap) -> Self {
        Self { port, registers }
    }

    #[cfg(test)]
    pub const fn port(&self) -> &P {
        &self.port
    }

    #[cfg(test)]
    pub const fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    pub async fn connect(&mut self) -> Result {
        self.port.connect().await.context("failed to connect to the device")
    }

    pub async fn close(&mut self) {
        self.port.close().await;
    }

    #[instrument(skip_all)]
    pub async fn read_enable_flag(&mut self) -> Result<u16> {
        let register = self.registers.enable_flag;
        self.port
            .read_u16(self.registers.read_unit_id, register)
            .await
            .with_context(|| format!("failed to read the enable flag from #{register}"))
    }

    #[instrument(skip_all)]
    pub async fn read_measurement(&mut self) -> Result<Measurement> {
        let unit_id = self.registers.read_unit_id;

        let register = self.registers.state_of_charge;
        let state_of_charge = Percent::from_register(
            self.port
                .read_u16(unit_id, register)
                .await
                .with_context(|| format!("failed to read the SoC from #{register}"))?,
            self.registers.state_of_charge_divisor,
        );

        let register = self.registers.load_base;
        let load = self
            .port
            .read_block(unit_id, register, N_LOAD_REGISTERS)
            .await
            .with_context(|| format!("failed to read the load from #{register}+"))?
            .into_iter()
            .map(Watts::from)
            .sum();

        let mut pv = Watts(0);
        for register in self.registers.pv.iter().copied() {
            pv += Watts::from(
                self.port
                    .read_u16(unit_id, register)
                    .await
                    .with_context(|| format!("failed to read the PV power from #{register}"))?,
            );
        }

        let measurement = Measurement { state_of_charge, load, pv };
        debug!(?measurement, "measured");
        Ok(measurement)
    }

    /// Read the current operating mode, a failure is tolerated and reported as unknown.
    #[instrument(skip_all)]
    pub async fn read_operating_mode(&mut self) -> Reported<OperatingMode> {
        let (unit_id, register) = (self.registers.mode_unit_id, self.registers.mode);
        match self.port.read_u16(unit_id, register).await {
            Ok(code) => self.registers.mode_codes.decode(code),
            Err(error) => {
                let error = Error::from(error);
                warn!(unit_id, register, "failed to read the operating mode: {error:#}");
                Reported::Unknown
            }
        }
    }

    /// Read the current energy mode, a failure is tolerated and reported as unknown.
    #[instrument(skip_all)]
    pub async fn read_energy_mode(&mut self) -> Reported<EnergyMode> {
        let (unit_id, register) = (self.registers.energy_mode_unit_id, self.registers.energy_mode);
        match self.port.read_u16(unit_id, register).await {
            Ok(code) => self.registers.energy_mode_codes.decode(code),
            Err(error) => {
                let error = Error::from(error);
                warn!(unit_id, register, "failed to read the energy mode: {error:#}");
                Reported::Unknown
            }
        }
    }

    #[instrument(skip_all, fields(mode = %mode))]
    pub async fn write_operating_mode(&mut self, mode: OperatingMode) -> Result {
        let (unit_id, register) = (self.registers.mode_unit_id, self.registers.mode);
        self.port
            .write_u16(unit_id, register, self.registers.mode_codes.encode(mode))
            .await
            .with_context(|| format!("failed to switch the operating mode to {mode}"))
    }

    #[instrument(skip_all, fields(mode = %mode))]
    pub async fn write_energy_mode(&mut self, mode: EnergyMode) -> Result {
        let (unit_id, register) = (self.registers.energy_mode_unit_id, self.registers.energy_mode);
        self.port
            .write_u16(unit_id, register, self.registers.energy_mode_codes.encode(mode))
            .await
            .with_context(|| format!("failed to switch the energy mode to {mode}"))
    }
}

impl RegisterMap {
    /// Human-readable summary for the startup log.
    pub fn summary(&self) -> String {
        format!(
            "enable: {}#{} | SoC: {}#{} (÷{}) | load: {}#{}+{} | PV: {}#{} | mode: {}#{} {:?} | \
             ESS: {}#{} {:?}",
            self.read_unit_id,
            self.enable_flag,
            self.read_unit_id,
            self.state_of_charge,
            self.state_of_charge_divisor,
            self.read_unit_id,
            self.load_base,
            N_LOAD_REGISTERS,
            self.read_unit_id,
            self.pv.iter().join(","),
            self.mode_unit_id,
            self.mode,
            self.mode_codes,
            self.energy_mode_unit_id,
            self.energy_mode,
            self.energy_mode_codes,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::modbus::testing::FakePort;

    fn device() -> Device<FakePort> {
        let port = FakePort::connected()
            .with(100, 843, 605)
            .with(100, 817, 100)
            .with(100, 818, 250)
            .with(100, 819, 150)
            .with(100, 811, 300)
            .with(100, 812, 0)
            .with(100, 813, 420)
            .with(227, 33, 3)
            .with(100, 2902, 7);
        Device::new(port, RegisterMap::builder().state_of_charge_divisor(10.0).build())
    }

    #[test]
    fn mode_codes_ok() {
        let codes = ModeCodes::default();
        for mode in [OperatingMode::ChargerOnly, OperatingMode::On, OperatingMode::Off] {
            assert_eq!(codes.decode(codes.encode(mode)), Reported::Known(mode));
        }
        assert_eq!(codes.decode(2), Reported::Unrecognized(2));
    }

    #[tokio::test]
    async fn read_measurement_ok() -> Result {
        let measurement = device().read_measurement().await?;
        assert_eq!(measurement.state_of_charge, Percent(60.5));
        assert_eq!(measurement.load, Watts(500));
        assert_eq!(measurement.pv, Watts(720));
        Ok(())
    }

    #[tokio::test]
    async fn read_measurement_fails_on_missing_register() {
        let mut device = device();
        device.port_mut().fail_reads(100, 818);
        assert!(device.read_measurement().await.is_err());
    }

    #[tokio::test]
    async fn read_modes_ok() {
        let mut device = device();
        assert_eq!(device.read_operating_mode().await, Reported::Known(OperatingMode::On));
        assert_eq!(device.read_energy_mode().await, Reported::Unrecognized(7));
    }

    #[tokio::test]
    async fn read_mode_failure_is_tolerated() {
        let mut device = device();
        device.port_mut().fail_reads(227, 33);
        device.port_mut().fail_reads(100, 2902);
        assert_eq!(device.read_operating_mode().await, Reported::Unknown);
        assert_eq!(device.read_energy_mode().await, Reported::Unknown);
    }

    #[tokio::test]
    async fn write_modes_ok() -> Result {
        let mut device = device();
        device.write_operating_mode(OperatingMode::Off).await?;
        device.write_energy_mode(EnergyMode::Night).await?;
        assert_eq!(device.port().get(227, 33), Some(4));
        assert_eq!(device.port().get(100, 2902), Some(2));
        Ok(())
    }
}
