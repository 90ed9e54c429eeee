/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the core RBF interpolator: fitting the augmented system and evaluating it.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::{
    common,
    error::{EvalError, FitError, FitResult},
    interpolant_config::InterpolantSettings,
    kdtree::{DistanceMetric, KDTree},
    linalg, polynomials,
};

use biomass_rbf_utils::{self, KernelType};
use faer::{Mat, RowRef};
use log::{debug, info};
use rayon::prelude::*;
use roots;
use std::time::Instant;

/// Largest acceptable training residual relative to `max(1, max |y|)`.
///
/// An exact fit reproduces every training value to solver precision; a larger
/// residual means the factorisation lost accuracy to near-singularity.
pub const FIT_RESIDUAL_TOLERANCE: f64 = 1E-6;

/// Coefficients of a solved RBF system.
///
/// After fitting, an RBF interpolator produces a set of coefficients
/// that define the contribution of each basis function. These
/// coefficients are stored in this struct and used during evaluation.
#[derive(Debug, Clone)]
pub struct Coefficients {
    /// Coefficients associated with the RBF centers (data points).
    pub point_coefficients: Mat<f64>,

    /// Coefficients associated with the polynomial drift term, if present.
    ///
    /// This is `None` when no polynomial component was included in the
    /// system, or `Some(matrix)` otherwise.
    pub poly_coefficients: Option<Mat<f64>>,
}

impl Coefficients {
    pub(crate) fn new(point_coefficients: Mat<f64>, poly_coefficients: Option<Mat<f64>>) -> Self {
        Self {
            point_coefficients,
            poly_coefficients,
        }
    }
}

/// A convenience builder for constructing an [`RBFInterpolator`].
///
/// The builder should be created via [`RBFInterpolator::builder`].
pub struct RBFInterpolatorBuilder {
    points: Mat<f64>,
    point_values: Mat<f64>,
    interpolant_settings: InterpolantSettings,
}

impl RBFInterpolatorBuilder {
    fn new(points: Mat<f64>, point_values: Mat<f64>, interpolant_settings: InterpolantSettings) -> Self {
        Self {
            points,
            point_values,
            interpolant_settings,
        }
    }

    /// Replaces the kernel and drift configuration.
    pub fn interpolant_settings(mut self, interpolant_settings: InterpolantSettings) -> Self {
        self.interpolant_settings = interpolant_settings;
        self
    }

    /// Validates the inputs, solves the augmented system and returns the fitted
    /// [`RBFInterpolator`].
    ///
    /// # Errors
    /// - [`FitError::DimensionMismatch`] if `points` and `point_values` disagree in
    ///   row count or `point_values` is not a single column.
    /// - [`FitError::InvalidInput`] for a non-finite coordinate or value.
    /// - [`FitError::InvalidSettings`] for a drift below the kernel minimum.
    /// - [`FitError::InsufficientData`] for fewer than `basis_size + 1` points.
    /// - [`FitError::SingularSystem`] for coincident points, a drift basis that is
    ///   not unisolvent on the points, or a numerically singular factorisation.
    pub fn build(self) -> FitResult<RBFInterpolator> {
        RBFInterpolator::fit(self.points, self.point_values, self.interpolant_settings)
    }
}

/// Radial basis function interpolant fitted to a fixed set of scattered points.
///
/// The interpolant has the form
///
/// ```text
/// s(x) = sum_j w_j phi(|x - x_j|) + sum_k c_k p_k(x)
/// ```
///
/// where `phi` is the configured radial kernel and `p_k` the monomials of the
/// polynomial drift, evaluated on coordinates scaled into `[-1, 1]^d`.
///
/// A fitted interpolator is immutable. Every evaluation method takes `&self`, so a
/// single instance can be shared across threads behind an `Arc` without locking.
///
/// ### Example
/// ```
/// use biomass_rbf::{InterpolantSettings, RBFInterpolator};
/// use faer::mat;
///
/// let points = mat![
///     [1.0, 1.0, 1.0, 1.0],
///     [2.0, 1.0, 1.0, 1.0],
///     [1.0, 2.0, 1.0, 1.0],
///     [1.0, 1.0, 2.0, 1.0],
///     [1.0, 1.0, 1.0, 2.0],
///     [3.0, 3.0, 3.0, 3.0],
/// ];
/// let values = mat![[10.0], [12.0], [11.0], [13.0], [9.0], [20.0]];
///
/// let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
///     .build()
///     .unwrap();
///
/// let value = rbfi.evaluate_point(&[1.0, 1.0, 1.0, 1.0]).unwrap();
/// assert!((value - 10.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone)]
pub struct RBFInterpolator {
    /// Coordinates of the input data points.
    pub points: Mat<f64>,

    /// Scalar values at each input point.
    pub point_values: Mat<f64>,

    /// Solved coefficients for the RBF and polynomial terms.
    pub coefficients: Coefficients,

    /// Kernel settings used to configure the interpolator.
    interpolant_settings: InterpolantSettings,

    kernel_type: KernelType,

    /// Per-dimension translation factor (used for scaling/normalization for the monomial matrix).
    translation_factor: Vec<f64>,

    /// Per-dimension scaling factor (used for scaling/normalization for the monomial matrix).
    scale_factor: Vec<f64>,
}

impl RBFInterpolator {
    /// Creates a new [`RBFInterpolatorBuilder`] for the given points,
    /// values, and kernel settings.
    ///
    /// This is the way to construct an interpolator.
    pub fn builder(
        points: Mat<f64>,
        point_values: Mat<f64>,
        interpolant_settings: InterpolantSettings,
    ) -> RBFInterpolatorBuilder {
        RBFInterpolatorBuilder::new(points, point_values, interpolant_settings)
    }

    fn fit(
        points: Mat<f64>,
        point_values: Mat<f64>,
        interpolant_settings: InterpolantSettings,
    ) -> FitResult<Self> {
        let solver_start = Instant::now();

        validate_training_data(&points, &point_values)?;

        let num_points = points.nrows();
        let dimensions = points.ncols();

        let interpolant_settings = {
            let mut ks = interpolant_settings;
            ks.set_basis_size(dimensions)?;
            ks
        };

        if num_points < interpolant_settings.min_points() {
            return Err(FitError::InsufficientData {
                num_points,
                required: interpolant_settings.min_points(),
            });
        }

        let duplicates = find_duplicates(&points, &interpolant_settings);

        if let Some((first, second)) = duplicates.first() {
            return Err(FitError::singular(format!(
                "{} pair(s) of training inputs are indistinguishable to the kernel, \
                 first at rows {} and {}",
                duplicates.len(),
                first,
                second
            )));
        }

        let (translation_factor, scale_factor) = common::get_cheb_cube_scaling_factors(&points);

        let monomials = match interpolant_settings.basis_size != 0 {
            true => {
                let monomials = polynomials::evaluate_monomials(
                    &points,
                    interpolant_settings.polynomial_degree,
                    interpolant_settings.basis_size,
                    &translation_factor,
                    &scale_factor,
                );

                let rank = linalg::numerical_rank(monomials.as_ref(), linalg::MONOMIAL_RANK_TOLERANCE);

                if rank < interpolant_settings.basis_size {
                    return Err(FitError::singular(format!(
                        "training inputs are not unisolvent for a degree {} drift \
                         (monomial rank {} of {})",
                        interpolant_settings.polynomial_degree,
                        rank,
                        interpolant_settings.basis_size
                    )));
                }

                Some(monomials)
            }
            false => None,
        };

        let kernel_type: KernelType = interpolant_settings.into();

        let a_matrix = biomass_rbf_utils::get_a_matrix_symmetric_solver(
            &points,
            kernel_type,
            interpolant_settings.nugget,
        );

        let (point_coefficients, poly_coefficients) =
            linalg::solve_augmented_system(a_matrix, monomials.as_ref(), &point_values)?;

        let interpolator = Self {
            points,
            point_values,
            coefficients: Coefficients::new(point_coefficients, poly_coefficients),
            interpolant_settings,
            kernel_type,
            translation_factor,
            scale_factor,
        };

        let max_residual = interpolator.max_training_residual();
        let value_scale = interpolator
            .point_values
            .col(0)
            .iter()
            .fold(1.0_f64, |acc, v| acc.max(v.abs()));

        debug!(
            "Max training residual {:.3e} (value scale {:.3e})",
            max_residual, value_scale
        );

        if !(max_residual <= FIT_RESIDUAL_TOLERANCE * value_scale) {
            return Err(FitError::singular(format!(
                "solution does not reproduce the training values (max residual {:.3e})",
                max_residual
            )));
        }

        info!(
            "Took {:?} to solve RBF for {} points using the following settings: \
             Kernel: {:?}, Polynomial degree: {}, Nugget: {}",
            solver_start.elapsed(),
            num_points,
            interpolator.interpolant_settings.kernel_type,
            interpolator.interpolant_settings.polynomial_degree,
            interpolator.interpolant_settings.nugget,
        );

        Ok(interpolator)
    }

    /// Number of kernel centres.
    pub fn num_points(&self) -> usize {
        self.points.nrows()
    }

    /// Number of coordinates per point.
    pub fn dimensions(&self) -> usize {
        self.points.ncols()
    }

    /// Settings the interpolator was fitted with, including the derived basis size.
    pub fn settings(&self) -> &InterpolantSettings {
        &self.interpolant_settings
    }

    /// Evaluates the interpolant at one point given as a coordinate slice.
    ///
    /// # Errors
    /// - [`EvalError::DimensionMismatch`] if `point.len()` differs from [`Self::dimensions`].
    /// - [`EvalError::InvalidInput`] if any coordinate is NaN or infinite.
    /// - [`EvalError::NonFiniteResult`] if the kernel sum overflows, which happens
    ///   only for queries many orders of magnitude outside the training data.
    pub fn evaluate_point(&self, point: &[f64]) -> Result<f64, EvalError> {
        if point.len() != self.dimensions() {
            return Err(EvalError::DimensionMismatch {
                expected: self.dimensions(),
                found: point.len(),
            });
        }

        if let Some((idx, value)) = point.iter().enumerate().find(|(_, v)| !v.is_finite()) {
            return Err(EvalError::InvalidInput {
                field: format!("coordinate {}", idx),
                value: *value,
            });
        }

        let mut monomials = Vec::with_capacity(self.interpolant_settings.basis_size);
        let value = self.evaluate_unchecked(point, &mut monomials);

        match value.is_finite() {
            true => Ok(value),
            false => Err(EvalError::NonFiniteResult { value }),
        }
    }

    /// Evaluate the interpolant at each row of `target_points`.
    ///
    /// Rows are evaluated in parallel on the rayon thread pool. Each row follows the
    /// same arithmetic as [`Self::evaluate_point`], so results are bit-identical to
    /// evaluating the rows one at a time.
    ///
    /// ### Returns
    /// A `(n_targets x 1)` matrix of interpolated values.
    pub fn evaluate(&self, target_points: &Mat<f64>) -> Result<Mat<f64>, EvalError> {
        if target_points.ncols() != self.dimensions() {
            return Err(EvalError::DimensionMismatch {
                expected: self.dimensions(),
                found: target_points.ncols(),
            });
        }

        for (i, row) in target_points.row_iter().enumerate() {
            if let Some((j, value)) = row.iter().enumerate().find(|(_, v)| !v.is_finite()) {
                return Err(EvalError::InvalidInput {
                    field: format!("row {} coordinate {}", i, j),
                    value: *value,
                });
            }
        }

        let values: Vec<f64> = (0..target_points.nrows())
            .into_par_iter()
            .map_init(
                || (Vec::new(), Vec::new()),
                |(point, monomials), i| {
                    copy_row(target_points.row(i), point);
                    self.evaluate_unchecked(point, monomials)
                },
            )
            .collect();

        if let Some(value) = values.iter().find(|v| !v.is_finite()) {
            return Err(EvalError::NonFiniteResult { value: *value });
        }

        Ok(Mat::from_fn(values.len(), 1, |i, _| values[i]))
    }

    /// Evaluate the interpolant **at the original source points**.
    ///
    /// - When `add_nugget = true`, the diagonal nugget term is added back so the
    ///   evaluated values should match the input samples to within solver precision.
    /// - When `add_nugget = false`, you observe the smoothed fit. With the default
    ///   zero nugget both are identical.
    pub fn evaluate_at_source(&self, add_nugget: bool) -> Mat<f64> {
        let mut point = Vec::with_capacity(self.dimensions());
        let mut monomials = Vec::with_capacity(self.interpolant_settings.basis_size);

        Mat::from_fn(self.num_points(), 1, |i, _| {
            copy_row(self.points.row(i), &mut point);
            let mut value = self.evaluate_unchecked(&point, &mut monomials);

            if add_nugget {
                value += self.interpolant_settings.nugget * self.coefficients.point_coefficients[(i, 0)];
            }

            value
        })
    }

    fn max_training_residual(&self) -> f64 {
        let fitted = self.evaluate_at_source(true);

        fitted
            .col(0)
            .iter()
            .zip(self.point_values.col(0).iter())
            .map(|(f, y)| (f - y).abs())
            .fold(0.0_f64, |acc, r| if r.is_nan() { f64::NAN } else { acc.max(r) })
    }

    // The single-point kernel sum plus drift. All public evaluation paths funnel
    // through here so they agree bit for bit.
    fn evaluate_unchecked(&self, point: &[f64], monomials: &mut Vec<f64>) -> f64 {
        let weights = &self.coefficients.point_coefficients;

        let mut value = 0.0;
        for (j, source) in self.points.row_iter().enumerate() {
            let r = distance_to_row(point, source);
            value += weights[(j, 0)] * biomass_rbf_utils::kernel_phi(r, self.kernel_type);
        }

        if let Some(poly_coefficients) = &self.coefficients.poly_coefficients {
            polynomials::evaluate_monomials_row(
                point,
                self.interpolant_settings.polynomial_degree,
                &self.translation_factor,
                &self.scale_factor,
                monomials,
            );

            for (k, p) in monomials.iter().enumerate() {
                value += p * poly_coefficients[(k, 0)];
            }
        }

        value
    }
}

fn validate_training_data(points: &Mat<f64>, point_values: &Mat<f64>) -> FitResult<()> {
    if points.ncols() == 0 {
        return Err(FitError::DimensionMismatch {
            reason: "training points have no coordinates".to_string(),
        });
    }

    if point_values.ncols() != 1 {
        return Err(FitError::DimensionMismatch {
            reason: format!("expected a single value column, got {}", point_values.ncols()),
        });
    }

    if points.nrows() != point_values.nrows() {
        return Err(FitError::DimensionMismatch {
            reason: format!(
                "{} training points but {} training values",
                points.nrows(),
                point_values.nrows()
            ),
        });
    }

    for row in 0..points.nrows() {
        let finite_coords = points.row(row).iter().all(|v| v.is_finite());

        if !finite_coords || !point_values[(row, 0)].is_finite() {
            return Err(FitError::InvalidInput { row });
        }
    }

    Ok(())
}

fn copy_row(row: RowRef<f64>, out: &mut Vec<f64>) {
    out.clear();
    out.extend(row.iter().copied());
}

// Euclidean distance scaled by the largest component difference, so squaring
// cannot overflow for finite coordinates.
fn distance_to_row(point: &[f64], source: RowRef<f64>) -> f64 {
    let scale = point
        .iter()
        .zip(source.iter())
        .fold(0.0_f64, |acc, (t, s)| acc.max((t - s).abs()));

    if scale == 0.0 || !scale.is_finite() {
        return scale;
    }

    let mut sum = 0.0;
    for (t, s) in point.iter().zip(source.iter()) {
        let diff = (t - s) / scale;
        sum += diff * diff;
    }
    scale * sum.sqrt()
}

/// Computes the smallest separation the kernel can resolve at the scale `h_ref`.
///
/// Two points closer than the returned distance produce kernel rows that agree
/// to within `f64::EPSILON * |phi(h_ref) - phi(0)|`, which the factorisation
/// cannot tell apart. The cutoff is the first root of
/// `|phi(r) - phi(0)| - target` above zero, bracketed by doubling from
/// `h_ref * f64::EPSILON` and refined by inverse quadratic interpolation.
///
/// Returns `0.0` when the kernel is flat at `h_ref` (e.g. the thin plate spline at
/// `r = 1`) so that only exact duplicates are flagged.
pub fn duplicate_cutoff_distance(h_ref: f64, kernel_type: KernelType) -> f64 {
    let phi = |r: f64| biomass_rbf_utils::kernel_phi(r, kernel_type);

    let eps = f64::EPSILON;
    let mut rtol = 1E-12;

    let phi0 = phi(0.0);
    let target = eps * (phi(h_ref) - phi0).abs();

    if !h_ref.is_finite() || h_ref <= 0.0 || !target.is_finite() || target == 0.0 {
        return 0.0;
    }

    let resid = |r: f64| (phi(r) - phi0).abs() - target;

    let mut lower = h_ref * eps;
    if resid(lower) > 0.0 {
        return lower;
    }

    while resid(2.0 * lower) <= 0.0 {
        if 2.0 * lower >= h_ref {
            return 0.0;
        }
        lower *= 2.0;
    }

    // Solve on [1, 2] in units of `lower`, residual in units of `target`, so the
    // solver tolerance is relative at every scale.
    let scaled_resid = |u: f64| resid(u * lower) / target;

    match roots::find_root_inverse_quadratic(1.0, 2.0, scaled_resid, &mut rtol) {
        Ok(u) => u * lower,
        _ => lower,
    }
}

/// Finds pairs of training inputs that the kernel cannot distinguish.
///
/// The cutoff from [`duplicate_cutoff_distance`] is computed for the largest
/// extent of the data. A KD-tree with infinity-norm distance then reports every
/// pair of rows within that cutoff, including exact duplicates.
///
/// Returns `(i, j)` row pairs with `i < j`, sorted ascending.
pub fn find_duplicates(points: &Mat<f64>, interpolant_settings: &InterpolantSettings) -> Vec<(usize, usize)> {
    let dims = points.ncols();
    let extents = biomass_rbf_utils::get_pointarray_extents(points);

    if extents.is_empty() {
        return Vec::new();
    }

    let mins = &extents[..dims];
    let maxs = &extents[dims..];
    let max_length = maxs
        .iter()
        .zip(mins.iter())
        .map(|(a, b)| (a - b).abs())
        .fold(0.0_f64, f64::max);

    let tolerance = duplicate_cutoff_distance(max_length, (*interpolant_settings).into());

    debug!("Duplicate cutoff distance {:.3e} for extent {:.3e}", tolerance, max_length);

    KDTree::new(points).pairs_within(tolerance, DistanceMetric::InfinityNorm)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::generate_random_points;
    use crate::interpolant_config::{Drift, RBFKernelType};
    use faer::mat;

    fn smooth_function(point: RowRef<f64>) -> f64 {
        let x: Vec<f64> = point.iter().copied().collect();
        (3.0 * x[0]).sin() + x[1] * x[2] - (x[3] - 0.5).powi(2) + 2.0
    }

    fn random_problem(n: usize, seed: u64) -> (Mat<f64>, Mat<f64>) {
        let points = generate_random_points(n, 4, Some(seed));
        let values = Mat::from_fn(n, 1, |i, _| smooth_function(points.row(i)));
        (points, values)
    }

    fn six_point_problem() -> (Mat<f64>, Mat<f64>) {
        (
            mat![
                [1.0, 1.0, 1.0, 1.0],
                [2.0, 1.0, 1.0, 1.0],
                [1.0, 2.0, 1.0, 1.0],
                [1.0, 1.0, 2.0, 1.0],
                [1.0, 1.0, 1.0, 2.0],
                [3.0, 3.0, 3.0, 3.0],
            ],
            mat![[10.0], [12.0], [11.0], [13.0], [9.0], [20.0]],
        )
    }

    #[test]
    fn interpolator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RBFInterpolator>();
    }

    #[test]
    fn reproduces_training_values() {
        for kernel in [RBFKernelType::ThinPlateSpline, RBFKernelType::Cubic, RBFKernelType::Linear] {
            let (points, values) = random_problem(60, 11);
            let settings = InterpolantSettings::builder(kernel).build();
            let rbfi = RBFInterpolator::builder(points.clone(), values.clone(), settings)
                .build()
                .unwrap();

            let fitted = rbfi.evaluate(&points).unwrap();
            for i in 0..points.nrows() {
                assert!(
                    (fitted[(i, 0)] - values[(i, 0)]).abs() < 1E-6,
                    "{:?} row {}: {} vs {}",
                    kernel,
                    i,
                    fitted[(i, 0)],
                    values[(i, 0)]
                );
            }
        }
    }

    #[test]
    fn six_point_problem_fits_exactly() {
        let (points, values) = six_point_problem();
        let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();

        assert_eq!(rbfi.num_points(), 6);
        assert_eq!(rbfi.dimensions(), 4);
        assert_eq!(rbfi.settings().basis_size, 5);

        let fitted = rbfi.evaluate_at_source(false);
        let expected = [10.0, 12.0, 11.0, 13.0, 9.0, 20.0];
        for (i, y) in expected.iter().enumerate() {
            assert!((fitted[(i, 0)] - y).abs() < 1E-6);
        }

        let far = rbfi.evaluate_point(&[100.0, 100.0, 100.0, 100.0]).unwrap();
        assert!(far.is_finite());
    }

    #[test]
    fn linear_drift_reproduces_affine_data_everywhere() {
        let points = generate_random_points(30, 4, Some(5));
        let affine = |x: &[f64]| 1.5 + 2.0 * x[0] - x[1] + 0.5 * x[2] + 3.0 * x[3];
        let values = Mat::from_fn(30, 1, |i, _| {
            let row: Vec<f64> = points.row(i).iter().copied().collect();
            affine(&row)
        });

        let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();

        for query in [[0.5, 0.5, 0.5, 0.5], [4.0, -3.0, 10.0, 2.0]] {
            let value = rbfi.evaluate_point(&query).unwrap();
            assert!((value - affine(&query)).abs() < 1E-6 * affine(&query).abs().max(1.0));
        }
    }

    #[test]
    fn batch_and_single_evaluations_are_bit_identical() {
        let (points, values) = random_problem(50, 3);
        let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();

        let targets = generate_random_points(200, 4, Some(99));
        let batch = rbfi.evaluate(&targets).unwrap();

        for i in 0..targets.nrows() {
            let row: Vec<f64> = targets.row(i).iter().copied().collect();
            let single = rbfi.evaluate_point(&row).unwrap();
            assert_eq!(single.to_bits(), batch[(i, 0)].to_bits());
        }

        let again = rbfi.evaluate(&targets).unwrap();
        assert_eq!(batch, again);
    }

    #[test]
    fn row_order_does_not_change_the_surface() {
        let (points, values) = random_problem(40, 21);
        let order: Vec<usize> = (0..40).rev().collect();
        let shuffled_points = biomass_rbf_utils::select_mat_rows(&points, &order);
        let shuffled_values = biomass_rbf_utils::select_mat_rows(&values, &order);

        let a = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();
        let b = RBFInterpolator::builder(shuffled_points, shuffled_values, InterpolantSettings::default())
            .build()
            .unwrap();

        let targets = generate_random_points(50, 4, Some(1234));
        let va = a.evaluate(&targets).unwrap();
        let vb = b.evaluate(&targets).unwrap();

        for i in 0..targets.nrows() {
            assert!((va[(i, 0)] - vb[(i, 0)]).abs() < 1E-8);
        }
    }

    #[test]
    fn too_few_points_is_insufficient_data() {
        let (points, values) = six_point_problem();
        let points = points.as_ref().subrows(0, 5).to_owned();
        let values = values.as_ref().subrows(0, 5).to_owned();

        let result = RBFInterpolator::builder(points, values, InterpolantSettings::default()).build();

        assert!(matches!(
            result,
            Err(FitError::InsufficientData { num_points: 5, required: 6 })
        ));
    }

    #[test]
    fn duplicate_inputs_are_singular() {
        let (points, values) = six_point_problem();
        let mut points = concat_rows(&points, &mat![[2.0, 1.0, 1.0, 1.0]]);
        let values = concat_rows(&values, &mat![[12.0]]);

        let result = RBFInterpolator::builder(points.clone(), values.clone(), InterpolantSettings::default())
            .build();
        assert!(matches!(result, Err(FitError::SingularSystem { .. })));

        // A near-duplicate with a conflicting value is reported, not averaged.
        points[(6, 0)] = 2.0 + 1E-10;
        let values = Mat::from_fn(7, 1, |i, _| if i == 6 { 99.0 } else { values[(i, 0)] });
        let result = RBFInterpolator::builder(points, values, InterpolantSettings::default()).build();
        assert!(matches!(result, Err(FitError::SingularSystem { .. })));
    }

    #[test]
    fn inputs_on_a_hyperplane_are_singular() {
        // Every point has weather_index == 1, so the linear drift is not unisolvent.
        let points = mat![
            [1.0, 1.0, 1.0, 1.0],
            [2.0, 1.0, 1.0, 1.0],
            [1.0, 2.0, 1.0, 1.0],
            [1.0, 1.0, 2.0, 1.0],
            [3.0, 3.0, 3.0, 1.0],
            [2.0, 3.0, 1.0, 1.0],
            [4.0, 1.0, 2.0, 1.0],
        ];
        let values = Mat::from_fn(7, 1, |i, _| i as f64);

        let result = RBFInterpolator::builder(points.clone(), values.clone(), InterpolantSettings::default())
            .build();
        assert!(matches!(result, Err(FitError::SingularSystem { .. })));

        // Tilted hyperplane x0 + x1 + x2 + x3 = 4.
        let tilted = Mat::from_fn(7, 4, |i, j| {
            let v = points[(i, j)];
            if j == 3 { 4.0 - points[(i, 0)] - points[(i, 1)] - points[(i, 2)] } else { v }
        });
        let result = RBFInterpolator::builder(tilted, values, InterpolantSettings::default()).build();
        assert!(matches!(result, Err(FitError::SingularSystem { .. })));
    }

    #[test]
    fn malformed_training_arrays_are_rejected() {
        let (points, values) = six_point_problem();

        let short_values = values.as_ref().subrows(0, 5).to_owned();
        let result = RBFInterpolator::builder(points.clone(), short_values, InterpolantSettings::default()).build();
        assert!(matches!(result, Err(FitError::DimensionMismatch { .. })));

        let mut bad_points = points.clone();
        bad_points[(3, 2)] = f64::NAN;
        let result = RBFInterpolator::builder(bad_points, values.clone(), InterpolantSettings::default()).build();
        assert!(matches!(result, Err(FitError::InvalidInput { row: 3 })));

        let mut bad_values = values.clone();
        bad_values[(5, 0)] = f64::INFINITY;
        let result = RBFInterpolator::builder(points, bad_values, InterpolantSettings::default()).build();
        assert!(matches!(result, Err(FitError::InvalidInput { row: 5 })));
    }

    #[test]
    fn invalid_drift_is_rejected_before_solving() {
        let (points, values) = six_point_problem();
        let settings = InterpolantSettings::builder(RBFKernelType::ThinPlateSpline)
            .drift(Drift::None)
            .build();

        let result = RBFInterpolator::builder(points, values, settings).build();
        assert!(matches!(result, Err(FitError::InvalidSettings { .. })));
    }

    #[test]
    fn nugget_smooths_and_is_restored_at_source() {
        let (points, values) = random_problem(40, 8);
        let settings = InterpolantSettings::builder(RBFKernelType::ThinPlateSpline)
            .nugget(0.1)
            .build();

        let rbfi = RBFInterpolator::builder(points, values.clone(), settings)
            .build()
            .unwrap();

        let restored = rbfi.evaluate_at_source(true);
        let smoothed = rbfi.evaluate_at_source(false);

        let mut max_smoothing = 0.0_f64;
        for i in 0..values.nrows() {
            assert!((restored[(i, 0)] - values[(i, 0)]).abs() < 1E-6);
            max_smoothing = max_smoothing.max((smoothed[(i, 0)] - values[(i, 0)]).abs());
        }
        assert!(max_smoothing > 1E-6);
    }

    #[test]
    fn query_validation() {
        let (points, values) = six_point_problem();
        let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();

        assert_eq!(
            rbfi.evaluate_point(&[1.0, 1.0, 1.0]),
            Err(EvalError::DimensionMismatch { expected: 4, found: 3 })
        );
        assert!(matches!(
            rbfi.evaluate_point(&[1.0, f64::NAN, 1.0, 1.0]),
            Err(EvalError::InvalidInput { .. })
        ));
        assert!(matches!(
            rbfi.evaluate(&mat![[1.0, 1.0]]),
            Err(EvalError::DimensionMismatch { expected: 4, found: 2 })
        ));
        assert!(matches!(
            rbfi.evaluate(&mat![[1.0, 1.0, f64::INFINITY, 1.0]]),
            Err(EvalError::InvalidInput { .. })
        ));
    }

    #[test]
    fn cutoff_distance_is_small_and_kernel_dependent() {
        let tps = duplicate_cutoff_distance(100.0, KernelType::ThinPlateSplineRbf);
        let cubic = duplicate_cutoff_distance(100.0, KernelType::CubicRbf);
        let linear = duplicate_cutoff_distance(100.0, KernelType::LinearRbf);

        assert!(tps > 0.0 && tps < 1E-4);
        assert!(cubic > 0.0 && cubic < 1E-2);
        assert!((linear - 100.0 * f64::EPSILON).abs() < 1E-16);

        // The thin plate spline vanishes at r = 1, so the scale carries no information.
        assert_eq!(duplicate_cutoff_distance(1.0, KernelType::ThinPlateSplineRbf), 0.0);
        assert_eq!(duplicate_cutoff_distance(0.0, KernelType::CubicRbf), 0.0);
    }

    #[test]
    fn distance_survives_large_finite_coordinates() {
        let source = mat![[-1E200, 0.0, 0.0, 0.0]];
        let r = distance_to_row(&[1E200, 0.0, 0.0, 0.0], source.row(0));
        assert_eq!(r, 2E200);

        let source = mat![[1.0, 2.0, 2.0, 4.0]];
        assert_eq!(distance_to_row(&[0.0; 4], source.row(0)), 5.0);
        assert_eq!(distance_to_row(&[1.0, 2.0, 2.0, 4.0], source.row(0)), 0.0);
    }

    #[test]
    fn overflowing_query_is_an_error_not_nan() {
        let (points, values) = six_point_problem();
        let rbfi = RBFInterpolator::builder(points, values, InterpolantSettings::default())
            .build()
            .unwrap();

        for far in [1E154, 1E200, f64::MAX] {
            assert!(matches!(
                rbfi.evaluate_point(&[far, 5.0, 1.0, 50.0]),
                Err(EvalError::NonFiniteResult { .. })
            ));
        }
        assert!(matches!(
            rbfi.evaluate(&mat![[1.0, 1.0, 1.0, 1.0], [1E154, 5.0, 1.0, 50.0]]),
            Err(EvalError::NonFiniteResult { .. })
        ));
    }

    fn concat_rows(top: &Mat<f64>, bottom: &Mat<f64>) -> Mat<f64> {
        faer::concat![[top], [bottom]]
    }
}
