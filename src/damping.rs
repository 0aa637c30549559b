#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};

use crate::prelude::*;

//------------------------------------------------------------------------------
// Rayleigh damping
//------------------------------------------------------------------------------

/// Mass and stiffness proportional damping, `C = alpha*M + beta*K`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RayleighDamping {
    pub alpha: f64, // mass proportional coefficient
    pub beta: f64,  // stiffness proportional coefficient
}

impl RayleighDamping {
    pub fn new(alpha: f64, beta: f64) -> Self {
        if alpha < 0. || beta < 0. {
            log::warn!(
                "Negative Rayleigh coefficients (alpha = {}, beta = {}) do not dissipate energy",
                alpha,
                beta
            );
        }
        RayleighDamping { alpha, beta }
    }

    /// Fit the coefficients so the modal damping ratio equals `zeta1` at angular
    /// frequency `omega1` and `zeta2` at `omega2`.
    ///
    /// The damping ratio of a mode with angular frequency `w` is
    /// `zeta(w) = alpha/(2w) + beta*w/2`; two reference points give a 2x2 system.
    pub fn from_damping_ratios(omega1: f64, zeta1: f64, omega2: f64, zeta2: f64) -> Result<Self> {
        if !(omega1 > 0.) || !(omega2 > 0.) {
            return Err(Error::invalid(
                "omega",
                format!("reference frequencies must be positive ({}, {})", omega1, omega2),
            ));
        }
        if omega1 == omega2 {
            return Err(Error::invalid(
                "omega",
                "reference frequencies must be distinct",
            ));
        }

        let denom = omega2 * omega2 - omega1 * omega1;
        let alpha = 2. * omega1 * omega2 * (zeta1 * omega2 - zeta2 * omega1) / denom;
        let beta = 2. * (zeta2 * omega2 - zeta1 * omega1) / denom;
        Ok(Self::new(alpha, beta))
    }

    /// Modal damping ratio at angular frequency `omega`
    pub fn damping_ratio(&self, omega: f64) -> f64 {
        self.alpha / (2. * omega) + self.beta * omega / 2.
    }

    pub fn damping_matrix(&self, M: &MatrixD, K: &MatrixD) -> MatrixD {
        M * self.alpha + K * self.beta
    }
}

//------------------------------------------------------------------------------
// Damping specification
//------------------------------------------------------------------------------

/// How the damping matrix is specified by the assembly layer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DampingSpec {
    Rayleigh {
        alpha: f64,
        beta: f64,
    },
    /// Damping ratios at two reference angular frequencies
    ModalRatios {
        omega1: f64,
        zeta1: f64,
        omega2: f64,
        zeta2: f64,
    },
}

impl DampingSpec {
    pub fn coefficients(&self) -> Result<RayleighDamping> {
        match *self {
            DampingSpec::Rayleigh { alpha, beta } => Ok(RayleighDamping::new(alpha, beta)),
            DampingSpec::ModalRatios {
                omega1,
                zeta1,
                omega2,
                zeta2,
            } => RayleighDamping::from_damping_ratios(omega1, zeta1, omega2, zeta2),
        }
    }
}

impl Default for DampingSpec {
    fn default() -> Self {
        DampingSpec::Rayleigh {
            alpha: 0.,
            beta: 0.,
        }
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_damping_ratio_fit() {
        let (w1, w2) = (2., 20.);
        let rd = RayleighDamping::from_damping_ratios(w1, 0.02, w2, 0.05).unwrap();

        assert_relative_eq!(rd.damping_ratio(w1), 0.02, epsilon = 1e-12);
        assert_relative_eq!(rd.damping_ratio(w2), 0.05, epsilon = 1e-12);
    }

    #[test]
    fn test_equal_ratios() {
        // Equal ratios give alpha = 2*zeta*w1*w2/(w1+w2), beta = 2*zeta/(w1+w2)
        let rd = RayleighDamping::from_damping_ratios(1., 0.1, 3., 0.1).unwrap();
        assert_relative_eq!(rd.alpha, 0.15, epsilon = 1e-14);
        assert_relative_eq!(rd.beta, 0.05, epsilon = 1e-14);
    }

    #[test]
    fn test_invalid_reference_frequencies() {
        assert!(RayleighDamping::from_damping_ratios(1., 0.1, 1., 0.2).is_err());
        assert!(RayleighDamping::from_damping_ratios(0., 0.1, 1., 0.2).is_err());
        assert!(RayleighDamping::from_damping_ratios(-1., 0.1, 1., 0.2).is_err());
    }

    #[test]
    fn test_damping_matrix() {
        let M = MatrixD::identity(2, 2);
        let K = MatrixD::from_row_slice(2, 2, &[2., -1., -1., 2.]);
        let C = RayleighDamping::new(0.5, 0.1).damping_matrix(&M, &K);
        assert_relative_eq!(
            C,
            MatrixD::from_row_slice(2, 2, &[0.7, -0.1, -0.1, 0.7]),
            epsilon = 1e-14
        );
    }

    #[test]
    fn test_spec_from_json() {
        let spec: DampingSpec = serde_json::from_str(
            r#"{"type": "modal_ratios", "omega1": 1.0, "zeta1": 0.1, "omega2": 3.0, "zeta2": 0.1}"#,
        )
        .unwrap();
        let rd = spec.coefficients().unwrap();
        assert_relative_eq!(rd.beta, 0.05, epsilon = 1e-14);
    }
}
