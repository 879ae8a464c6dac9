quantity!(
    /// Active power, as reported by the registers.
    Watts(i64),
    unit = "W",
    order = exact
);

impl From<u16> for Watts {
    fn from(watts: u16) -> Self {
        Self(i64::from(watts))
    }
}
