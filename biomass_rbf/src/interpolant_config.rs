/////////////////////////////////////////////////////////////////////////////////////////////
//
// Specifies kernel, drift, and smoothing options for configuring RBF interpolants.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! Specifies kernel, drift, and smoothing options for configuring RBF interpolants.
use crate::error::{FitError, FitResult};
use biomass_rbf_utils::KernelType;
use serde::{Deserialize, Serialize};

/// Polynomial drift appended to the kernel expansion.
///
/// The drift guarantees that trends of the given degree are reproduced exactly and,
/// for conditionally positive definite kernels, makes the augmented system
/// well-posed for distinct points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Drift {
    None,
    Constant,
    Linear,
    Quadratic,
}

impl Drift {
    /// Polynomial degree of the drift, `-1` for no drift.
    pub fn degree(&self) -> i32 {
        match self {
            Drift::None => -1,
            Drift::Constant => 0,
            Drift::Linear => 1,
            Drift::Quadratic => 2,
        }
    }
}

/// Radial kernels available to the interpolator.
///
/// - `Linear`: `phi(r) = -r`, needs at least a constant drift.
/// - `ThinPlateSpline`: `phi(r) = r^2 log r`, needs at least a linear drift.
/// - `Cubic`: `phi(r) = r^3`, needs at least a linear drift.
#[derive(Clone, Debug, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RBFKernelType {
    Linear,
    ThinPlateSpline,
    Cubic,
}

/// Returns the minimum required [`Drift`] for the provided [`RBFKernelType`]
pub fn get_min_drift(kernel: RBFKernelType) -> Drift {
    match kernel {
        RBFKernelType::Linear => Drift::Constant,
        RBFKernelType::ThinPlateSpline => Drift::Linear,
        RBFKernelType::Cubic => Drift::Linear,
    }
}

/// A convenience builder for constructing a [`InterpolantSettings`] instance
/// with parameters tailored to the selected kernel type.
///
/// The builder should be called via the [`InterpolantSettings::builder`] method.
///
/// See [`InterpolantSettings`] for details on each field.
#[derive(Debug, Clone, Copy)]
pub struct InterpolantSettingsBuilder {
    pub kernel_type: RBFKernelType,
    pub drift: Drift,
    pub nugget: f64,
}

impl InterpolantSettingsBuilder {
    fn new(kernel_type: RBFKernelType) -> Self {
        Self {
            kernel_type,
            drift: get_min_drift(kernel_type),
            nugget: 0.0,
        }
    }

    /// Sets the drift term.
    pub fn drift(mut self, drift: Drift) -> Self {
        self.drift = drift;
        self
    }

    /// Sets the nugget (smoothing) value.
    pub fn nugget(mut self, nugget: f64) -> Self {
        self.nugget = nugget;
        self
    }

    /// Builds and returns an instance of [`InterpolantSettings`] from the values
    /// defined in the builder.
    pub fn build(self) -> InterpolantSettings {
        InterpolantSettings {
            kernel_type: self.kernel_type,
            drift: self.drift,
            nugget: self.nugget,
            basis_size: 0,
            polynomial_degree: -1,
        }
    }
}

/// Kernel, drift and smoothing configuration of an RBF interpolant.
///
/// The default is a thin plate spline with linear drift and zero smoothing, which
/// reproduces every training value exactly and extends affine trends outside the
/// training data.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct InterpolantSettings {
    /// The RBF kernel to use for interpolation.
    pub kernel_type: RBFKernelType,

    /// The polynomial drift term added to the RBF system.
    pub drift: Drift,

    /// Smoothing parameter added to the kernel diagonal. `0.0` enforces an exact fit
    /// to all input data; larger values relax it towards a least-squares fit.
    #[serde(default)]
    pub nugget: f64,

    /// Number of polynomial basis columns, derived from the drift and dimensionality.
    #[serde(skip)]
    pub basis_size: usize,

    /// Degree of the polynomial drift, derived alongside `basis_size`.
    #[serde(skip)]
    pub polynomial_degree: i32,
}

impl Default for InterpolantSettings {
    fn default() -> Self {
        InterpolantSettings::builder(RBFKernelType::ThinPlateSpline).build()
    }
}

impl InterpolantSettings {
    /// Returns a new [`InterpolantSettingsBuilder`] for the given kernel type.
    pub fn builder(kernel_type: RBFKernelType) -> InterpolantSettingsBuilder {
        InterpolantSettingsBuilder::new(kernel_type)
    }

    /// Derives the polynomial basis size from the drift and the input dimensionality.
    ///
    /// A complete polynomial of degree `k` in `d` variables has `C(d + k, k)` terms,
    /// so linear drift in four dimensions contributes five columns.
    pub fn set_basis_size(&mut self, dimensions: usize) -> FitResult<()> {
        let poly_degree = self.drift.degree();
        let min_degree = get_min_drift(self.kernel_type).degree();

        if poly_degree < min_degree {
            return Err(FitError::InvalidSettings {
                reason: format!(
                    "{:?} kernel requires a polynomial drift of degree {} or higher, got {:?}",
                    self.kernel_type, min_degree, self.drift
                ),
            });
        }

        if !self.nugget.is_finite() || self.nugget < 0.0 {
            return Err(FitError::InvalidSettings {
                reason: format!("nugget must be finite and non-negative, got {}", self.nugget),
            });
        }

        self.basis_size = match poly_degree < 0 {
            true => 0,
            false => binomial(dimensions + poly_degree as usize, poly_degree as usize),
        };
        self.polynomial_degree = poly_degree;

        Ok(())
    }

    /// Minimum number of distinct points needed for a solvable system: one kernel
    /// centre beyond the polynomial degrees of freedom.
    pub fn min_points(&self) -> usize {
        self.basis_size + 1
    }
}

fn binomial(n: usize, k: usize) -> usize {
    (0..k).fold(1, |acc, i| acc * (n - i) / (i + 1))
}

impl From<RBFKernelType> for KernelType {
    fn from(v: RBFKernelType) -> Self {
        match v {
            RBFKernelType::Linear => KernelType::LinearRbf,
            RBFKernelType::ThinPlateSpline => KernelType::ThinPlateSplineRbf,
            RBFKernelType::Cubic => KernelType::CubicRbf,
        }
    }
}

impl From<InterpolantSettings> for KernelType {
    fn from(v: InterpolantSettings) -> Self {
        v.kernel_type.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linear_drift_in_four_dimensions_has_five_terms() {
        let mut settings = InterpolantSettings::default();
        settings.set_basis_size(4).unwrap();

        assert_eq!(settings.kernel_type, RBFKernelType::ThinPlateSpline);
        assert_eq!(settings.drift, Drift::Linear);
        assert_eq!(settings.nugget, 0.0);
        assert_eq!(settings.basis_size, 5);
        assert_eq!(settings.polynomial_degree, 1);
        assert_eq!(settings.min_points(), 6);
    }

    #[test]
    fn basis_sizes_for_each_drift() {
        for (drift, dims, expected) in [
            (Drift::Constant, 4, 1),
            (Drift::Linear, 1, 2),
            (Drift::Linear, 3, 4),
            (Drift::Quadratic, 2, 6),
            (Drift::Quadratic, 3, 10),
            (Drift::Quadratic, 4, 15),
        ] {
            let mut settings = InterpolantSettings::builder(RBFKernelType::Linear)
                .drift(drift)
                .build();
            settings.set_basis_size(dims).unwrap();
            assert_eq!(settings.basis_size, expected, "{:?} in {}D", drift, dims);
        }
    }

    #[test]
    fn drift_below_kernel_minimum_is_rejected() {
        let mut settings = InterpolantSettings::builder(RBFKernelType::ThinPlateSpline)
            .drift(Drift::Constant)
            .build();

        assert!(matches!(
            settings.set_basis_size(4),
            Err(FitError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn negative_nugget_is_rejected() {
        let mut settings = InterpolantSettings::builder(RBFKernelType::Cubic)
            .nugget(-1.0)
            .build();

        assert!(matches!(
            settings.set_basis_size(4),
            Err(FitError::InvalidSettings { .. })
        ));
    }

    #[test]
    fn settings_deserialize_without_derived_fields() {
        let json = r#"{ "kernel_type": "Cubic", "drift": "Quadratic" }"#;
        let settings: InterpolantSettings = serde_json::from_str(json).unwrap();

        assert_eq!(settings.kernel_type, RBFKernelType::Cubic);
        assert_eq!(settings.drift, Drift::Quadratic);
        assert_eq!(settings.nugget, 0.0);
        assert_eq!(settings.basis_size, 0);
    }
}
