/////////////////////////////////////////////////////////////////////////////////////////////
//
// Defines shared helpers for random point generation, scaling, and result rounding.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use biomass_rbf_utils;
use faer::Mat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Number of decimal places in every value handed back to callers.
pub const OUTPUT_DECIMALS: usize = 2;

/// Round `value` to `decimals` places.
///
/// Rounding is decided on the exact decimal expansion of the stored double, with
/// exact ties going to the even digit. A value such as `2.675`, stored as
/// `2.67499999...`, therefore rounds down. Non-finite values are returned unchanged.
///
/// # Example
/// ```
/// use biomass_rbf::round_to_precision;
///
/// assert_eq!(round_to_precision(10.004999, 2), 10.0);
/// assert_eq!(round_to_precision(-2.345, 1), -2.3);
/// assert_eq!(round_to_precision(2.675, 2), 2.67);
/// assert_eq!(round_to_precision(0.125, 2), 0.12);
/// ```
pub fn round_to_precision(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }

    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Generate a matrix of random points in the unit hypercube.
///
/// # Parameters
/// - `n`: Number of points to generate (rows in the output matrix).
/// - `d`: Number of dimensions per point (columns in the output matrix).
/// - `seed`: Optional random seed. `Some(seed)` reproduces the same points on every
///   run; `None` seeds from the operating system.
///
/// # Example
/// ```
/// use biomass_rbf::generate_random_points;
///
/// let pts = generate_random_points(100, 4, Some(42));
/// assert_eq!(pts.ncols(), 4);
/// ```
pub fn generate_random_points(n: usize, d: usize, seed: Option<u64>) -> Mat<f64> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    Mat::from_fn(n, d, |_, _| rng.random_range(0.0..1.0))
}

/// Compute translation and scale factors to map points into the `[-1, 1]^d` cube.
///
/// The translation is the midpoint of each coordinate range and the scale is half
/// the range, with zeros replaced by `1.0` to avoid division by zero.
pub fn get_cheb_cube_scaling_factors(point_locations: &Mat<f64>) -> (Vec<f64>, Vec<f64>) {
    let dimensions = point_locations.ncols();
    let extents = biomass_rbf_utils::get_pointarray_extents(point_locations);

    if extents.is_empty() {
        return (vec![0.0; dimensions], vec![1.0; dimensions]);
    }

    let translation_factor = (0..dimensions)
        .map(|d| (extents[d + dimensions] + extents[d]) / 2.0)
        .collect();

    let scale_factor = (0..dimensions)
        .map(|d| (extents[d + dimensions] - extents[d]) / 2.0)
        .map(|s| if s == 0.0 { 1.0 } else { s })
        .collect();

    (translation_factor, scale_factor)
}

/// Apply translation and scaling in place: `x <- (x - translation_factor[d]) / scale_factor[d]`.
pub fn scale_points(points: &mut Mat<f64>, translation_factor: &[f64], scale_factor: &[f64]) {
    points.row_iter_mut().for_each(|row| {
        row.iter_mut().enumerate().for_each(|(col_idx, element)| {
            *element = (*element - translation_factor[col_idx]) / scale_factor[col_idx];
        });
    });
}
