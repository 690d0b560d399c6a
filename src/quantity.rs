use std::fmt::{Debug, Display, Formatter};

use average::Mean;

/// Active power.
#[must_use]
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, derive_more::From)]
pub struct Watts(pub f64);

impl Watts {
    pub const ZERO: Self = Self(0.0);

    /// Arithmetic mean, zero when there is nothing to average.
    pub fn mean(values: impl IntoIterator<Item = Self>) -> Self {
        let estimate: Mean = values.into_iter().map(|power| power.0).collect();
        if estimate.is_empty() { Self::ZERO } else { estimate.mean().into() }
    }
}

impl Debug for Watts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}W", self.0)
    }
}

impl Display for Watts {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1} W", self.0)
    }
}
