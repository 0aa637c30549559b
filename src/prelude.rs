use nalgebra::Dyn;

pub use nalgebra::ComplexField;

pub use itertools::{izip, Itertools};
pub use std::ops::AddAssign;

pub use crate::error::{Error, Result};

//------------------------------------------------------------------------------
// Types
//------------------------------------------------------------------------------

/// Matrix (DOFs x DOFs)
pub type MatrixD = nalgebra::OMatrix<f64, Dyn, Dyn>;

/// Matrix (DOFs x Modes)
pub type MatrixDxM = nalgebra::OMatrix<f64, Dyn, Dyn>;

/// Column vector (Degrees of Freedom)
pub type VectorD = nalgebra::DVector<f64>;

/// Column vector (Modes)
pub type VectorM = nalgebra::DVector<f64>;

pub type Complex = nalgebra::Complex<f64>;

/// Complex matrix (Modes x Modes or DOFs x Modes)
pub type ComplexMatrixD = nalgebra::DMatrix<Complex>;

/// Complex column vector (Degrees of Freedom or Modes)
pub type ComplexVectorD = nalgebra::DVector<Complex>;

pub type Cholesky = nalgebra::Cholesky<f64, Dyn>;

//------------------------------------------------------------------------------
// Traits
//------------------------------------------------------------------------------

pub trait ToComplexExt {
    fn to_complex(&self) -> ComplexMatrixD;
}

impl ToComplexExt for MatrixD {
    fn to_complex(&self) -> ComplexMatrixD {
        self.map(|x| Complex::new(x, 0.))
    }
}

pub trait ComplexVecExt {
    fn amplitudes(&self) -> VectorD;
    fn is_finite(&self) -> bool;
}

impl ComplexVecExt for ComplexVectorD {
    fn amplitudes(&self) -> VectorD {
        self.map(|z| z.modulus())
    }
    fn is_finite(&self) -> bool {
        self.iter().all(|z| z.re.is_finite() && z.im.is_finite())
    }
}
