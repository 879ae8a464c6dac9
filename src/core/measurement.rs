use crate::quantity::{percent::Percent, power::Watts};

/// Single snapshot of the system, taken once per cycle.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Measurement {
    pub state_of_charge: Percent,

    /// Total AC consumption over all phases.
    pub load: Watts,

    /// Total PV production over all configured PV registers.
    pub pv: Watts,
}
