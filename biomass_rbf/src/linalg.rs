/////////////////////////////////////////////////////////////////////////////////////////////
//
// Dense factorisation helpers for assembling and solving the augmented RBF system.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Dense direct solve of the saddle-point system
//!
//! ```text
//! | A + sI   P | | w |   | y |
//! |  P^T     0 | | c | = | 0 |
//! ```
//!
//! where `A` is the kernel matrix, `s` the nugget and `P` the monomial basis
//! evaluated at the source points. The polynomial block constrains the kernel
//! weights to be orthogonal to the drift space, which makes the system uniquely
//! solvable for conditionally positive definite kernels on distinct, unisolvent
//! points.

use crate::error::{FitError, FitResult};
use faer::{
    concat,
    linalg::solvers::Solve,
    Mat, MatRef,
};
use log::debug;

/// Relative threshold on `|R_ii| / |R_00|` below which the monomial basis is
/// treated as rank deficient.
pub const MONOMIAL_RANK_TOLERANCE: f64 = 1E-10;

/// Returns the numerical rank of `matrix` from a column pivoted QR factorisation.
///
/// Diagonal entries of `R` whose magnitude is at most `relative_tolerance * |R_00|`
/// are counted as zero.
pub fn numerical_rank(matrix: MatRef<f64>, relative_tolerance: f64) -> usize {
    if matrix.nrows() == 0 || matrix.ncols() == 0 {
        return 0;
    }

    let qr = matrix.col_piv_qr();
    let rc = qr.thin_R();
    let thresh = relative_tolerance * rc.get(0, 0).abs();

    rc.diagonal()
        .column_vector()
        .iter()
        .filter(|val| val.abs() > thresh)
        .count()
}

/// Relative rank tolerance appropriate for an `m x n` matrix in double precision.
pub fn default_rank_tolerance(nrows: usize, ncols: usize) -> f64 {
    nrows.max(ncols) as f64 * f64::EPSILON
}

/// Solves the augmented interpolation system and returns the kernel weights
/// (`N x 1`) and, when a drift is present, the polynomial coefficients.
///
/// Fails with [`FitError::SingularSystem`] when the left hand side is rank
/// deficient or the factorisation yields non-finite coefficients.
pub fn solve_augmented_system(
    a_matrix: Mat<f64>,
    poly_matrix: Option<&Mat<f64>>,
    values: &Mat<f64>,
) -> FitResult<(Mat<f64>, Option<Mat<f64>>)> {
    let num_points = a_matrix.nrows();

    let (lhs, rhs) = match poly_matrix {
        Some(poly_matrix) => {
            let num_poly = poly_matrix.ncols();
            let poly_t = poly_matrix.transpose().to_owned();
            let lhs_zeros = Mat::<f64>::zeros(num_poly, num_poly);

            (
                concat![[a_matrix, poly_matrix], [poly_t, lhs_zeros]],
                concat![[values], [Mat::<f64>::zeros(num_poly, values.ncols())]],
            )
        }
        None => (a_matrix, values.clone()),
    };

    let system_size = lhs.nrows();
    let rank = numerical_rank(lhs.as_ref(), default_rank_tolerance(system_size, system_size));

    debug!("Augmented system size {}, numerical rank {}", system_size, rank);

    if rank < system_size {
        return Err(FitError::singular(format!(
            "augmented system of size {} has numerical rank {}",
            system_size, rank
        )));
    }

    let solution = lhs.partial_piv_lu().solve(rhs);

    if solution.col_iter().any(|c| c.iter().any(|v| !v.is_finite())) {
        return Err(FitError::singular("factorisation produced non-finite coefficients"));
    }

    let (point_coefficients, poly_coefficients) = solution.as_ref().split_at_row(num_points);

    Ok((
        point_coefficients.to_owned(),
        match poly_matrix {
            Some(_) => Some(poly_coefficients.to_owned()),
            None => None,
        },
    ))
}
