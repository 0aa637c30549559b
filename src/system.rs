#![allow(non_snake_case)]

use crate::damping::RayleighDamping;
use crate::prelude::*;

/// Assembled mass, stiffness and damping matrices over the free DOFs.
#[derive(Debug, Clone)]
pub struct SystemMatrices {
    pub M: MatrixD, // mass
    pub K: MatrixD, // stiffness
    pub C: MatrixD, // damping
}

impl SystemMatrices {
    pub fn new(M: MatrixD, K: MatrixD, C: MatrixD) -> Result<Self> {
        let n = check_square("mass matrix", &M)?;
        if check_square("stiffness matrix", &K)? != n {
            return Err(Error::DimensionMismatch {
                what: "stiffness matrix",
                expected: n,
                found: K.nrows(),
            });
        }
        if check_square("damping matrix", &C)? != n {
            return Err(Error::DimensionMismatch {
                what: "damping matrix",
                expected: n,
                found: C.nrows(),
            });
        }
        Ok(SystemMatrices { M, K, C })
    }

    pub fn undamped(M: MatrixD, K: MatrixD) -> Result<Self> {
        let C = MatrixD::zeros(M.nrows(), M.ncols());
        Self::new(M, K, C)
    }

    pub fn with_rayleigh(M: MatrixD, K: MatrixD, damping: &RayleighDamping) -> Result<Self> {
        check_square("mass matrix", &M)?;
        if K.shape() != M.shape() {
            return Err(Error::DimensionMismatch {
                what: "stiffness matrix",
                expected: M.nrows(),
                found: K.nrows(),
            });
        }
        let C = damping.damping_matrix(&M, &K);
        Self::new(M, K, C)
    }

    /// Number of free degrees of freedom
    pub fn ndofs(&self) -> usize {
        self.M.nrows()
    }

    /// Dynamic stiffness `M + (h/2)C + (h/2)^2 K` for time step `h`
    pub fn dynamic_stiffness(&self, h: f64) -> MatrixD {
        let hh = h / 2.;
        let mut A = self.M.clone();
        A.add_assign(&self.C * hh);
        A.add_assign(&self.K * (hh * hh));
        A
    }

    pub fn kinetic_energy(&self, V: &VectorD) -> f64 {
        0.5 * V.dot(&(&self.M * V))
    }

    pub fn strain_energy(&self, U: &VectorD) -> f64 {
        0.5 * U.dot(&(&self.K * U))
    }

    /// Total mechanical energy `V'MV/2 + U'KU/2`
    pub fn energy(&self, U: &VectorD, V: &VectorD) -> f64 {
        self.kinetic_energy(V) + self.strain_energy(U)
    }

    pub fn check_vector<T: nalgebra::Scalar>(
        &self,
        what: &'static str,
        v: &nalgebra::DVector<T>,
    ) -> Result<()> {
        if v.len() != self.ndofs() {
            return Err(Error::DimensionMismatch {
                what,
                expected: self.ndofs(),
                found: v.len(),
            });
        }
        Ok(())
    }
}

fn check_square(what: &'static str, A: &MatrixD) -> Result<usize> {
    if A.nrows() != A.ncols() {
        return Err(Error::NotSquare {
            what,
            rows: A.nrows(),
            cols: A.ncols(),
        });
    }
    Ok(A.nrows())
}

#[cfg(test)]
mod tests {

    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_dimension_checks() {
        let M = MatrixD::identity(3, 3);
        assert!(matches!(
            SystemMatrices::undamped(M.clone(), MatrixD::identity(2, 2)),
            Err(Error::DimensionMismatch { .. })
        ));
        assert!(matches!(
            SystemMatrices::undamped(MatrixD::zeros(3, 2), M.clone()),
            Err(Error::NotSquare { .. })
        ));

        let sys = SystemMatrices::undamped(M.clone(), M).unwrap();
        assert_eq!(sys.ndofs(), 3);
        assert!(sys.check_vector("U0", &VectorD::zeros(3)).is_ok());
        assert!(sys.check_vector("U0", &VectorD::zeros(4)).is_err());
    }

    #[test]
    fn test_dynamic_stiffness() {
        let M = MatrixD::from_diagonal(&VectorD::from_vec(vec![1., 2.]));
        let K = MatrixD::from_diagonal(&VectorD::from_vec(vec![4., 8.]));
        let sys = SystemMatrices::with_rayleigh(M, K, &RayleighDamping::new(1., 0.)).unwrap();

        // M + 0.5*C + 0.25*K with C = M
        let A = sys.dynamic_stiffness(1.);
        assert_relative_eq!(A[(0, 0)], 1. + 0.5 + 1.);
        assert_relative_eq!(A[(1, 1)], 2. + 1. + 2.);
        assert_eq!(A[(0, 1)], 0.);
    }

    #[test]
    fn test_energy() {
        let M = MatrixD::from_diagonal(&VectorD::from_vec(vec![2., 1.]));
        let K = MatrixD::from_diagonal(&VectorD::from_vec(vec![1., 4.]));
        let sys = SystemMatrices::undamped(M, K).unwrap();
        let U = VectorD::from_vec(vec![1., 0.5]);
        let V = VectorD::from_vec(vec![0.5, 1.]);
        assert_relative_eq!(sys.energy(&U, &V), 0.5 * (0.5 + 1.) + 0.5 * (1. + 1.));
    }
}
