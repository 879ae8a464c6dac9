use clap::Parser;
use itertools::Itertools;
use tokio_modbus::{Address, SlaveId};

use crate::{
    api::multiplus::{EnergyModeCodes, ModeCodes, RegisterMap},
    cli::error::ConfigurationError,
};

#[derive(Parser)]
pub struct RegisterArgs {
    /// Unit ID of the system device: enable flag, SoC, load, and PV.
    #[clap(long = "read-unit-id", env = "READ_UNIT_ID", default_value = "100")]
    read_unit_id: SlaveId,

    /// The controller only acts while this register reads 1.
    #[clap(long = "reg-enable", env = "REG_ENABLE", default_value = "806")]
    enable_flag: Address,

    #[clap(long = "reg-soc", env = "REG_SOC", default_value = "843")]
    state_of_charge: Address,

    /// The raw SoC register gets divided by this.
    #[clap(long = "soc-divisor", env = "SOC_DIVISOR", default_value = "1")]
    state_of_charge_divisor: f64,

    /// First of the three per-phase AC consumption registers.
    #[clap(long = "reg-load-base", env = "REG_LOAD_BASE", default_value = "817")]
    load_base: Address,

    /// PV power registers to sum up.
    #[clap(
        long = "pv-regs",
        env = "PV_REGS",
        value_delimiter = ',',
        num_args = 1..,
        default_value = "811,812,813"
    )]
    pv: Vec<Address>,

    /// Unit ID of the VE.Bus device.
    #[clap(long = "mode-unit-id", env = "MODE_UNIT_ID", default_value = "227")]
    mode_unit_id: SlaveId,

    #[clap(long = "reg-mode", env = "REG_MODE", default_value = "33")]
    mode: Address,

    #[clap(long = "mode-charger-only-value", env = "MODE_CHARGER_ONLY_VALUE", default_value = "1")]
    charger_only_code: u16,

    #[clap(long = "mode-on-value", env = "MODE_ON_VALUE", default_value = "3")]
    on_code: u16,

    #[clap(long = "mode-off-value", env = "MODE_OFF_VALUE", default_value = "4")]
    off_code: u16,

    #[clap(long = "ess-unit-id", env = "ESS_UNIT_ID", default_value = "100")]
    energy_mode_unit_id: SlaveId,

    #[clap(long = "reg-ess-mode", env = "REG_ESS_MODE", default_value = "2902")]
    energy_mode: Address,

    /// ESS mode with phase compensation.
    #[clap(long = "ess-day-value", env = "ESS_DAY_VALUE", default_value = "1")]
    day_code: u16,

    /// ESS mode without phase compensation.
    #[clap(long = "ess-night-value", env = "ESS_NIGHT_VALUE", default_value = "2")]
    night_code: u16,
}

impl RegisterArgs {
    pub fn register_map(&self) -> Result<RegisterMap, ConfigurationError> {
        let divisor = self.state_of_charge_divisor;
        if !divisor.is_finite() || divisor <= 0.0 {
            return Err(ConfigurationError::SocDivisor(divisor));
        }

        let mode_codes = ModeCodes {
            charger_only: self.charger_only_code,
            on: self.on_code,
            off: self.off_code,
        };
        if ![mode_codes.charger_only, mode_codes.on, mode_codes.off].into_iter().all_unique() {
            return Err(ConfigurationError::ModeCodes {
                charger_only: mode_codes.charger_only,
                on: mode_codes.on,
                off: mode_codes.off,
            });
        }

        let energy_mode_codes = EnergyModeCodes { day: self.day_code, night: self.night_code };
        if energy_mode_codes.day == energy_mode_codes.night {
            return Err(ConfigurationError::EnergyModeCodes {
                day: energy_mode_codes.day,
                night: energy_mode_codes.night,
            });
        }

        Ok(RegisterMap::builder()
            .read_unit_id(self.read_unit_id)
            .enable_flag(self.enable_flag)
            .state_of_charge(self.state_of_charge)
            .state_of_charge_divisor(divisor)
            .load_base(self.load_base)
            .pv(self.pv.clone())
            .mode_unit_id(self.mode_unit_id)
            .mode(self.mode)
            .mode_codes(mode_codes)
            .energy_mode_unit_id(self.energy_mode_unit_id)
            .energy_mode(self.energy_mode)
            .energy_mode_codes(energy_mode_codes)
            .build())
    }
}
