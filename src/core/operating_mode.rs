use std::fmt::{Display, Formatter};

/// MultiPlus switch position.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperatingMode {
    /// Only charge the battery from AC-in, the inverter stays off.
    ChargerOnly,

    /// Charger and inverter are both on.
    On,

    /// Everything is off.
    Off,
}

impl Display for OperatingMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ChargerOnly => write!(f, "ChargerOnly"),
            Self::On => write!(f, "On"),
            Self::Off => write!(f, "Off"),
        }
    }
}
