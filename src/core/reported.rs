use std::fmt::{Display, Formatter};

/// Value the device reported for one of the mode registers.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Reported<T> {
    /// The register could not be read.
    Unknown,

    Known(T),

    /// The register contains a code that is mapped to none of the modes.
    Unrecognized(u16),
}

impl<T: PartialEq> Reported<T> {
    pub fn is(&self, value: &T) -> bool {
        matches!(self, Self::Known(known) if known == value)
    }

    pub const fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl<T: Display> Display for Reported<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unknown => write!(f, "Unknown"),
            Self::Known(value) => Display::fmt(value, f),
            Self::Unrecognized(code) => write!(f, "Unknown({code})"),
        }
    }
}
