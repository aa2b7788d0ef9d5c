use std::{fmt::Display, ops::Deref, time::Duration};

/// Share of the warning window that has already elapsed. Never negative and never above 100.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.);
    pub const FULL: Percentage = Percentage(100.);

    /// Pins out of range values to the nearest bound.
    pub fn saturating(value: f64) -> Percentage {
        if value.is_nan() {
            return Percentage::ZERO;
        }
        Percentage(value.clamp(0., 100.))
    }

    pub fn is_full(&self) -> bool {
        self.0 >= 100.
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

pub fn duration_percentage(value: Duration, whole: Duration) -> Percentage {
    if whole.is_zero() {
        return Percentage::FULL;
    }
    Percentage::saturating(value.as_secs_f64() / whole.as_secs_f64() * 100.)
}
