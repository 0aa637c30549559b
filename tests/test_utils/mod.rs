#![allow(non_snake_case)]
#![allow(dead_code)]

use structdyn::{prelude::*, solver::ModalBasis};

pub fn init_logger() {
    let _ = env_logger::Builder::from_env("STRUCTDYN_LOG")
        .is_test(true)
        .try_init();
}

/// Fixed-fixed spring-mass chain, `K = k*tridiag(-1, 2, -1)`, `M = diag(masses)`
pub fn spring_chain(masses: &[f64], k: f64) -> (MatrixD, MatrixD) {
    let n = masses.len();
    let M = MatrixD::from_diagonal(&VectorD::from_column_slice(masses));
    let K = MatrixD::from_fn(n, n, |i, j| {
        if i == j {
            2. * k
        } else if i.abs_diff(j) == 1 {
            -k
        } else {
            0.
        }
    });
    (M, K)
}

/// Mass-orthonormal eigenpairs of `K phi = lambda M phi` for diagonal `M`
pub fn modal_basis(M: &MatrixD, K: &MatrixD) -> ModalBasis {
    let m_inv_sqrt = M.diagonal().map(|m| 1. / m.sqrt());
    let D = MatrixD::from_diagonal(&m_inv_sqrt);
    let eig = (&D * K * &D).symmetric_eigen();
    let pairs = eig
        .eigenvalues
        .iter()
        .zip(eig.eigenvectors.column_iter())
        .map(|(&l, y)| (l, &D * y))
        .collect_vec();
    ModalBasis::from_pairs(pairs).unwrap()
}
