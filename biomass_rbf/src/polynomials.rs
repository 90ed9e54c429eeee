/////////////////////////////////////////////////////////////////////////////////////////////
//
// Evaluates the polynomial basis used for drift terms in RBF interpolation.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::common;
use faer::{unzip, zip, Mat};

/// Evaluates the complete monomial basis of `degree` at each row of `points`.
///
/// Points are first mapped through `(x - translation) / scale` per dimension so the
/// monomials are well scaled. Columns are ordered `[1, x_0 .. x_{d-1}, x_i * x_j (i <= j)]`.
pub fn evaluate_monomials(
    points: &Mat<f64>,
    degree: i32,
    basis_size: usize,
    translation_factor: &[f64],
    scale_factor: &[f64],
) -> Mat<f64> {
    let mut scaled_points = points.clone();

    common::scale_points(&mut scaled_points, translation_factor, scale_factor);

    let (n, d) = scaled_points.shape();
    let mut monomials = Mat::<f64>::zeros(n, basis_size);

    if basis_size == 0 {
        return monomials;
    }

    // constant column
    monomials.col_mut(0).fill(1.0);

    // linear columns
    if degree >= 1 {
        monomials.subcols_mut(1, d).copy_from(&scaled_points.as_ref());
    }

    // quadratic columns
    if degree == 2 {
        let start = 1 + d;
        let mut k = 0usize;

        for i in 0..d {
            let xi = scaled_points.col(i);
            for j in i..d {
                let xj = scaled_points.col(j);
                let mut dst = monomials.col_mut(start + k);

                zip!(&mut dst, &xi, &xj).for_each(|unzip!(dst, xi, xj)| {
                    *dst = xi * xj;
                });

                k += 1;
            }
        }
    }

    monomials
}

/// Evaluates the same basis for a single point, writing into `out`.
///
/// Produces bit-identical values to the matching row of [`evaluate_monomials`]; the
/// per-query evaluation path uses it to avoid allocating a matrix per call.
pub fn evaluate_monomials_row(
    point: &[f64],
    degree: i32,
    translation_factor: &[f64],
    scale_factor: &[f64],
    out: &mut Vec<f64>,
) {
    out.clear();

    if degree < 0 {
        return;
    }

    let scaled: Vec<f64> = point
        .iter()
        .enumerate()
        .map(|(d, x)| (*x - translation_factor[d]) / scale_factor[d])
        .collect();

    out.push(1.0);

    if degree >= 1 {
        out.extend_from_slice(&scaled);
    }

    if degree == 2 {
        for i in 0..scaled.len() {
            for j in i..scaled.len() {
                out.push(scaled[i] * scaled[j]);
            }
        }
    }
}
