/////////////////////////////////////////////////////////////////////////////////////////////
//
// Supplies general-purpose utilities for matrices, distances, and kernel matrix assembly.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::KernelFunction;
use faer::{Mat, RowRef};
use serde::{Deserialize, Serialize};

/// Returns an owned `Mat<T>` from a subset of row indices.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use biomass_rbf_utils::select_mat_rows;
///
/// let matrix = mat![
///     [0.0, 1.0],
///     [1.0, 1.0],
///     [2.0, 2.0],
///     [3.0, 3.0f64],
/// ];
///
/// let sub_matrix = select_mat_rows(&matrix, &[2, 0]);
///
/// assert_eq!(
///     sub_matrix,
///     mat![
///         [2.0, 2.0],
///         [0.0, 1.0f64],
///     ]
/// );
/// ```
#[inline(always)]
pub fn select_mat_rows<T>(existing_mat: &Mat<T>, row_indices: &[usize]) -> Mat<T>
where
    T: Clone,
{
    Mat::from_fn(row_indices.len(), existing_mat.ncols(), |i, j| {
        existing_mat.get(row_indices[i], j).clone()
    })
}

/// Computes the axis aligned bounding box (AABB) extents of a matrix of points.
///
/// The result is arranged as `[min_0, ..., min_n, max_0, ..., max_n]`, where `n + 1`
/// is the number of columns. An empty matrix yields an empty vector.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use biomass_rbf_utils::get_pointarray_extents;
///
/// let points = mat![
///     [1.0, 2.0, 0.0, 10.0],
///     [3.0, -1.0, 0.0, 30.0],
///     [0.5, 4.0, 0.0, 20.0f64]
/// ];
/// let extents = get_pointarray_extents(&points);
/// assert_eq!(extents, vec![0.5, -1.0, 0.0, 10.0, 3.0, 4.0, 0.0, 30.0]);
/// ```
#[inline(always)]
pub fn get_pointarray_extents(points: &Mat<f64>) -> Vec<f64> {
    let ncols = points.ncols();

    if points.nrows() == 0 {
        return Vec::new();
    }

    let mut extents = vec![0.0; 2 * ncols];
    for col in 0..ncols {
        extents[col] = points[(0, col)];
        extents[col + ncols] = points[(0, col)];
    }

    for row in points.row_iter() {
        for (col, item) in row.iter().enumerate() {
            if *item < extents[col] {
                extents[col] = *item;
            }
            if *item > extents[col + ncols] {
                extents[col + ncols] = *item;
            }
        }
    }

    extents
}

/// Calculates the euclidean distance between two points.
///
/// Differences are scaled by the largest one before squaring, so the result is
/// finite whenever the true distance is representable.
///
/// # Examples
///
/// ```
/// use faer::mat;
/// use biomass_rbf_utils::get_distance;
///
/// let points = mat![
///     [1.0, 2.0, 1.0, 1.0],
///     [4.0, 6.0, 1.0, 1.0],
/// ];
///
/// assert_eq!(get_distance(points.row(0), points.row(1)), 5.0);
/// ```
#[inline(always)]
pub fn get_distance(target: RowRef<f64>, source: RowRef<f64>) -> f64 {
    let scale = target
        .iter()
        .zip(source.iter())
        .fold(0.0_f64, |acc, (t, s)| acc.max((t - s).abs()));

    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }

    let mut dist = 0.0;
    for (t, s) in target.iter().zip(source.iter()) {
        let diff = (t - s) / scale;
        dist += diff * diff;
    }
    scale * dist.sqrt()
}

/// Builds a symmetric kernel matrix using a typed kernel function, adding a nugget on the diagonal.
#[inline(always)]
pub fn get_a_matrix_symmetric_solver_typed<K>(points: &Mat<f64>, kernel_function: &K, nugget: f64) -> Mat<f64>
where
    K: KernelFunction,
{
    let n = points.nrows();

    let mut a_matrix = Mat::<f64>::zeros(n, n);

    for j in 0..n {
        let source_row = points.row(j);

        for i in j..n {
            let mut k_val = kernel_function.evaluate(points.row(i), source_row);

            if i == j {
                k_val += nugget;
            }

            a_matrix[(i, j)] = k_val;
            a_matrix[(j, i)] = k_val;
        }
    }

    a_matrix
}

// Runtime dispatcher generated from the kernel registry below.
// Each registered kernel type must implement `KernelFunction + Default`.
macro_rules! for_each_kernel {
    ( registry = [ $( ($V:ident, $Kty:path) ),* $(,)? ] ) => {

        /// Runtime kernel selector built from the kernel registry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum KernelType {
            $( $V, )*
        }

        /// Builds the symmetric interpolation matrix of `points` against themselves,
        /// with `nugget` added on the diagonal.
        #[inline(always)]
        pub fn get_a_matrix_symmetric_solver(
            points: &Mat<f64>,
            kernel_type: KernelType,
            nugget: f64,
        ) -> Mat<f64> {
            match kernel_type {
                $(
                    KernelType::$V => {
                        let k = <$Kty as Default>::default();
                        get_a_matrix_symmetric_solver_typed(points, &k, nugget)
                    }
                ),*
            }
        }

        /// Evaluates the selected kernel function at distance `r`.
        #[inline(always)]
        pub fn kernel_phi(r: f64, kernel_type: KernelType) -> f64 {
            match kernel_type {
                $(
                    KernelType::$V => <$Kty as Default>::default().phi(r),
                )*
            }
        }
    };
}

for_each_kernel! {
    registry = [
        (LinearRbf,          crate::kernels::LinearRbfKernel),
        (ThinPlateSplineRbf, crate::kernels::ThinPlateSplineRbfKernel),
        (CubicRbf,           crate::kernels::CubicRbfKernel),
    ]
}
