use std::fmt::{Display, Formatter};

/// ESS mode the system should run with.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EnergyMode {
    /// Optimized with phase compensation («ESS1»).
    Day,

    /// Optimized without phase compensation («ESS2»), only makes sense for three-phase systems.
    Night,
}

impl EnergyMode {
    pub const fn desired(is_night: bool, allow_night_switch: bool) -> Self {
        if is_night && allow_night_switch { Self::Night } else { Self::Day }
    }
}

impl Display for EnergyMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Day => write!(f, "Day"),
            Self::Night => write!(f, "Night"),
        }
    }
}
