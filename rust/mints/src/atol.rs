use anyhow::bail;
use ordered_float::NotNan;
use std::ops::Deref;

/// Values of integer decision variables are confined to this range so that
/// interval arithmetic in the presolver and move evaluation can add two
/// in-range values without overflowing `i64`.
pub const INT_MIN: i64 = i64::MIN / 2 + 1;
pub const INT_MAX: i64 = (i64::MAX - 1) / 2;

/// Clamp into the representable value range.
pub fn saturate(value: i64) -> i64 {
    value.clamp(INT_MIN, INT_MAX)
}

/// Absolute tolerance for feasibility and float comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ATol(NotNan<f64>);

impl Default for ATol {
    fn default() -> Self {
        Self(NotNan::new(1e-5).unwrap())
    }
}

impl Deref for ATol {
    type Target = f64;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl ATol {
    pub fn new(value: f64) -> anyhow::Result<Self> {
        if value <= 0.0 {
            bail!("ATol must be positive: {value}");
        }
        Ok(ATol(NotNan::new(value)?))
    }

    pub fn into_inner(&self) -> f64 {
        self.0.into_inner()
    }

    /// `value` is an integer within tolerance.
    pub fn is_integer(&self, value: f64) -> bool {
        (value - value.round()).abs() < self.into_inner()
    }
}

impl PartialEq<f64> for ATol {
    fn eq(&self, other: &f64) -> bool {
        self.0 == NotNan::new(*other).unwrap()
    }
}

impl PartialOrd<f64> for ATol {
    fn partial_cmp(&self, other: &f64) -> Option<std::cmp::Ordering> {
        self.0.partial_cmp(&NotNan::new(*other).ok()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saturate_clamps_extremes() {
        assert_eq!(saturate(i64::MAX), INT_MAX);
        assert_eq!(saturate(i64::MIN), INT_MIN);
        assert_eq!(saturate(42), 42);
        assert!(INT_MAX.checked_add(INT_MAX).is_some());
    }

    #[test]
    fn is_integer_within_tolerance() {
        let atol = ATol::default();
        assert!(atol.is_integer(3.0));
        assert!(atol.is_integer(3.0 + 1e-9));
        assert!(!atol.is_integer(3.5));
    }

    #[test]
    fn rejects_non_positive() {
        assert!(ATol::new(0.0).is_err());
        assert!(ATol::new(-1.0).is_err());
        assert!(ATol::new(1e-8).is_ok());
    }
}
