//! Range validation for a single breathing-measurement sample.

use crate::error::Error;

/// SpO2 bounds, percent.
pub const SPO2_MIN: i64 = 0;
pub const SPO2_MAX: i64 = 100;

/// One vital-sign sample as submitted by a device or client.
///
/// The FEV1/FVC ratio is deliberately absent: it is derived by the storage
/// layer at insert time and never accepted as input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vitals {
    /// Peripheral oxygen saturation, integer percent.
    pub spo2: i64,
    /// Forced expiratory volume in one second, litres.
    pub fev1: f64,
    /// Forced vital capacity, litres.
    pub fvc: f64,
    /// Peak expiratory flow, litres/min.
    pub pef: f64,
}

impl Vitals {
    /// Check every field against its declared range.
    pub fn validate(&self) -> Result<(), Error> {
        if !(SPO2_MIN..=SPO2_MAX).contains(&self.spo2) {
            return Err(Error::Validation(format!(
                "spo2 must be an integer between {SPO2_MIN} and {SPO2_MAX}, got {}",
                self.spo2
            )));
        }
        for (name, value) in [("fev1", self.fev1), ("fvc", self.fvc), ("pef", self.pef)] {
            if !value.is_finite() || value <= 0.0 {
                return Err(Error::Validation(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Derived FEV1/FVC ratio. Only meaningful after `validate` has passed
    /// (fvc is then known to be positive).
    pub fn fev1_fvc(&self) -> f64 {
        self.fev1 / self.fvc
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn good() -> Vitals {
        Vitals {
            spo2: 97,
            fev1: 3.2,
            fvc: 4.1,
            pef: 430.0,
        }
    }

    #[test]
    fn valid_sample_passes() {
        assert!(good().validate().is_ok());
    }

    #[test]
    fn spo2_bounds_are_inclusive() {
        assert!(Vitals { spo2: 0, ..good() }.validate().is_ok());
        assert!(Vitals { spo2: 100, ..good() }.validate().is_ok());
        assert!(Vitals { spo2: 101, ..good() }.validate().is_err());
        assert!(Vitals { spo2: -1, ..good() }.validate().is_err());
    }

    #[test]
    fn flow_values_must_be_positive() {
        assert!(Vitals { fev1: 0.0, ..good() }.validate().is_err());
        assert!(Vitals { fvc: -1.0, ..good() }.validate().is_err());
        assert!(Vitals { pef: 0.0, ..good() }.validate().is_err());
    }

    #[test]
    fn non_finite_flow_values_are_rejected() {
        assert!(Vitals { fev1: f64::NAN, ..good() }.validate().is_err());
        assert!(Vitals { fvc: f64::INFINITY, ..good() }.validate().is_err());
    }

    #[test]
    fn ratio_is_fev1_over_fvc() {
        let v = Vitals {
            fev1: 3.0,
            fvc: 4.0,
            ..good()
        };
        assert!((v.fev1_fvc() - 0.75).abs() < f64::EPSILON);
    }
}
