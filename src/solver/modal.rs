#![allow(non_snake_case)]

use std::f64::consts::PI;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::SweepConfig;
use crate::prelude::*;
use crate::system::SystemMatrices;

//------------------------------------------------------------------------------
// Modal basis
//------------------------------------------------------------------------------

/// Truncated set of eigenpairs, eigenvectors stored as the columns of `vectors`.
#[derive(Debug, Clone)]
pub struct ModalBasis {
    pub eigenvalues: VectorM,
    pub vectors: MatrixDxM,
}

impl ModalBasis {
    /// Eigenvalues must be sorted ascending by magnitude and match the number of columns.
    pub fn new(eigenvalues: VectorM, vectors: MatrixDxM) -> Result<Self> {
        if eigenvalues.is_empty() || vectors.ncols() == 0 {
            return Err(Error::EmptyModalBasis);
        }
        if eigenvalues.len() != vectors.ncols() {
            return Err(Error::DimensionMismatch {
                what: "eigenvalues",
                expected: vectors.ncols(),
                found: eigenvalues.len(),
            });
        }
        if eigenvalues
            .iter()
            .tuple_windows()
            .any(|(a, b)| a.abs() > b.abs())
        {
            return Err(Error::invalid(
                "eigenvalues",
                "must be sorted ascending by magnitude",
            ));
        }
        Ok(ModalBasis {
            eigenvalues,
            vectors,
        })
    }

    /// Build a basis from unordered (eigenvalue, eigenvector) pairs, sorted ascending by |eigenvalue|.
    pub fn from_pairs(mut pairs: Vec<(f64, VectorD)>) -> Result<Self> {
        let ndofs = match pairs.first() {
            Some((_, v)) => v.len(),
            None => return Err(Error::EmptyModalBasis),
        };
        if let Some((_, v)) = pairs.iter().find(|(_, v)| v.len() != ndofs) {
            return Err(Error::DimensionMismatch {
                what: "eigenvector",
                expected: ndofs,
                found: v.len(),
            });
        }

        pairs.sort_by(|(a, _), (b, _)| a.abs().total_cmp(&b.abs()));

        let eigenvalues = VectorM::from_iterator(pairs.len(), pairs.iter().map(|(l, _)| *l));
        let vectors = MatrixDxM::from_columns(&pairs.iter().map(|(_, v)| v.clone()).collect_vec());
        Self::new(eigenvalues, vectors)
    }

    /// Keep the lowest `num_modes` modes
    pub fn truncate(&self, num_modes: usize) -> Result<Self> {
        if num_modes == 0 {
            return Err(Error::EmptyModalBasis);
        }
        let m = num_modes.min(self.num_modes());
        Ok(ModalBasis {
            eigenvalues: self.eigenvalues.rows(0, m).into_owned(),
            vectors: self.vectors.columns(0, m).into_owned(),
        })
    }

    pub fn num_modes(&self) -> usize {
        self.vectors.ncols()
    }

    pub fn ndofs(&self) -> usize {
        self.vectors.nrows()
    }

    /// Undamped natural frequencies (rad/s), negative eigenvalues map to zero
    pub fn natural_frequencies(&self) -> VectorM {
        self.eigenvalues.map(|l| l.max(0.).sqrt())
    }

    /// Scale each eigenvector so that `phi' M phi = 1`
    pub fn mass_normalized(&self, M: &MatrixD) -> Result<Self> {
        if M.nrows() != self.ndofs() {
            return Err(Error::DimensionMismatch {
                what: "mass matrix",
                expected: self.ndofs(),
                found: M.nrows(),
            });
        }
        let mut vectors = self.vectors.clone();
        for mut phi in vectors.column_iter_mut() {
            let m = phi.dot(&(M * &phi));
            if !(m > 0.) {
                return Err(Error::invalid(
                    "mass matrix",
                    format!("modal mass {} is not positive", m),
                ));
            }
            phi /= m.sqrt();
        }
        Ok(ModalBasis {
            eigenvalues: self.eigenvalues.clone(),
            vectors,
        })
    }
}

//------------------------------------------------------------------------------
// Reduced system
//------------------------------------------------------------------------------

/// System matrices and load projected onto a modal basis.
///
/// `Mr = Phi' M Phi`, `Kr = Phi' K Phi`, `Cr = Phi' C Phi`, `Fr = Phi' F`.
/// The projection is a congruence transform, so the basis does not need to
/// be orthonormal.
#[derive(Debug, Clone)]
pub struct ReducedSystem {
    Mr: MatrixD,
    Kr: MatrixD,
    Cr: MatrixD,
    Fr: ComplexVectorD,
    Phi: ComplexMatrixD,
}

impl ReducedSystem {
    pub fn new(system: &SystemMatrices, basis: &ModalBasis, F: &ComplexVectorD) -> Result<Self> {
        if basis.ndofs() != system.ndofs() {
            return Err(Error::DimensionMismatch {
                what: "eigenvector",
                expected: system.ndofs(),
                found: basis.ndofs(),
            });
        }
        system.check_vector("load pattern", F)?;

        let Phi = &basis.vectors;
        let Phi_c = Phi.to_complex();

        Ok(ReducedSystem {
            Mr: Phi.tr_mul(&(&system.M * Phi)),
            Kr: Phi.tr_mul(&(&system.K * Phi)),
            Cr: Phi.tr_mul(&(&system.C * Phi)),
            Fr: Phi_c.tr_mul(F),
            Phi: Phi_c,
        })
    }

    pub fn from_real_load(
        system: &SystemMatrices,
        basis: &ModalBasis,
        F: &VectorD,
    ) -> Result<Self> {
        Self::new(system, basis, &F.map(|f| Complex::new(f, 0.)))
    }

    pub fn num_modes(&self) -> usize {
        self.Mr.nrows()
    }

    pub fn ndofs(&self) -> usize {
        self.Phi.nrows()
    }

    pub fn Mr(&self) -> &MatrixD {
        &self.Mr
    }
    pub fn Kr(&self) -> &MatrixD {
        &self.Kr
    }
    pub fn Cr(&self) -> &MatrixD {
        &self.Cr
    }
    pub fn Fr(&self) -> &ComplexVectorD {
        &self.Fr
    }

    /// Reduced dynamic stiffness `-w^2 Mr + i w Cr + Kr`
    pub fn dynamic_stiffness(&self, omega: f64) -> ComplexMatrixD {
        let m = self.num_modes();
        ComplexMatrixD::from_fn(m, m, |i, j| {
            Complex::new(
                self.Kr[(i, j)] - omega * omega * self.Mr[(i, j)],
                omega * self.Cr[(i, j)],
            )
        })
    }

    /// Modal coordinates of the harmonic response at angular frequency `omega`.
    ///
    /// An exactly singular dynamic stiffness (undamped resonance) yields
    /// non-finite coordinates rather than an error.
    pub fn solve_reduced(&self, omega: f64) -> ComplexVectorD {
        match self.dynamic_stiffness(omega).lu().solve(&self.Fr) {
            Some(Ur) => Ur,
            None => {
                log::warn!(
                    "Singular reduced dynamic stiffness at omega = {} rad/s (resonance)",
                    omega
                );
                ComplexVectorD::from_element(self.num_modes(), Complex::new(f64::INFINITY, 0.))
            }
        }
    }

    /// Full-space harmonic response `U = Phi Ur` at angular frequency `omega`
    pub fn solve_frequency(&self, omega: f64) -> ComplexVectorD {
        &self.Phi * self.solve_reduced(omega)
    }

    /// Response at zero frequency, the static solution within the modal subspace
    pub fn static_response(&self) -> VectorD {
        self.solve_frequency(0.).map(|z| z.re)
    }
}

//------------------------------------------------------------------------------
// Frequency sweep
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyUnit {
    Hertz,
    #[default]
    RadiansPerSecond,
}

impl FrequencyUnit {
    pub fn to_angular(&self, f: f64) -> f64 {
        match self {
            FrequencyUnit::Hertz => 2. * PI * f,
            FrequencyUnit::RadiansPerSecond => f,
        }
    }
}

/// Complex displacement per requested frequency, in sweep order.
#[derive(Debug, Clone, Default)]
pub struct FrequencyResponse {
    entries: Vec<(f64, ComplexVectorD)>,
}

impl FrequencyResponse {
    pub fn len(&self) -> usize {
        self.entries.len()
    }
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
    pub fn frequencies(&self) -> Vec<f64> {
        self.entries.iter().map(|(f, _)| *f).collect_vec()
    }
    /// Frequency (as requested) and full-space displacement of entry `i`
    pub fn get(&self, i: usize) -> Option<(f64, &ComplexVectorD)> {
        self.entries.get(i).map(|(f, U)| (*f, U))
    }
    pub fn iter(&self) -> impl Iterator<Item = (f64, &ComplexVectorD)> {
        self.entries.iter().map(|(f, U)| (*f, U))
    }
    /// Amplitude `|U[dof]|` across the sweep
    pub fn amplitude(&self, dof: usize) -> Vec<f64> {
        self.entries
            .iter()
            .map(|(_, U)| U.get(dof).map_or(f64::NAN, |z| z.modulus()))
            .collect_vec()
    }
    pub fn is_finite(&self, i: usize) -> bool {
        self.entries.get(i).map_or(false, |(_, U)| U.is_finite())
    }
}

/// Frequency list must be non-empty and finite
pub(crate) fn check_frequencies(frequencies: &[f64]) -> Result<()> {
    if frequencies.is_empty() {
        return Err(Error::EmptyFrequencyList);
    }
    if let Some(f) = frequencies.iter().find(|f| !f.is_finite()) {
        return Err(Error::invalid(
            "frequencies",
            format!("non-finite frequency {}", f),
        ));
    }
    Ok(())
}

/// Frequency sweep dispatching on `config.parallel` and `config.num_threads`.
pub fn sweep(reduced: &ReducedSystem, config: &SweepConfig) -> Result<FrequencyResponse> {
    config.validate()?;
    log::info!(
        "Modal frequency sweep: {} dofs, {} modes, {} frequencies",
        reduced.ndofs(),
        reduced.num_modes(),
        config.frequencies.len()
    );

    if !config.parallel {
        return sweep_sequential(reduced, &config.frequencies, config.unit);
    }
    match config.num_threads {
        Some(n) if n > 0 => {
            let pool = rayon::ThreadPoolBuilder::new().num_threads(n).build()?;
            pool.install(|| sweep_parallel(reduced, &config.frequencies, config.unit))
        }
        _ => sweep_parallel(reduced, &config.frequencies, config.unit),
    }
}

pub fn sweep_sequential(
    reduced: &ReducedSystem,
    frequencies: &[f64],
    unit: FrequencyUnit,
) -> Result<FrequencyResponse> {
    check_frequencies(frequencies)?;
    let entries = frequencies
        .iter()
        .map(|&f| (f, reduced.solve_frequency(unit.to_angular(f))))
        .collect_vec();
    Ok(FrequencyResponse { entries })
}

/// Parallel over frequencies; `collect` keeps results in input order.
pub fn sweep_parallel(
    reduced: &ReducedSystem,
    frequencies: &[f64],
    unit: FrequencyUnit,
) -> Result<FrequencyResponse> {
    check_frequencies(frequencies)?;
    let entries: Vec<(f64, ComplexVectorD)> = frequencies
        .par_iter()
        .map(|&f| (f, reduced.solve_frequency(unit.to_angular(f))))
        .collect();
    Ok(FrequencyResponse { entries })
}
