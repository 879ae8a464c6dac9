use crate::quantity::percent::Percent;

/// Invalid combination of the command-line options.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("SoC divisor must be a positive number, got {0}")]
    SocDivisor(f64),

    #[error("night decay factor must be within [0, 1], got {0}")]
    NightDecayFactor(f64),

    #[error("{name} must be within [0, 100]%, got {value}")]
    SocOutOfRange { name: &'static str, value: Percent },

    #[error("minimal SoC ({soc_min}) must be below the charging minimum ({soc_charge_min})")]
    SocThresholds { soc_min: Percent, soc_charge_min: Percent },

    #[error("operating mode codes must be distinct, got {charger_only}/{on}/{off}")]
    ModeCodes { charger_only: u16, on: u16, off: u16 },

    #[error("energy mode codes must be distinct, got {day}/{night}")]
    EnergyModeCodes { day: u16, night: u16 },

    #[error("polling interval must not be zero")]
    PollInterval,
}
