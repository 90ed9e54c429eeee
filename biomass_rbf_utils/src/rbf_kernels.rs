/////////////////////////////////////////////////////////////////////////////////////////////
//
// Implements the concrete RBF kernel functions.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use crate::KernelFunction;

/// Linear RBF kernel with `phi(r) = -r`.
///
/// Conditionally positive definite of order 1, so it needs at least a constant drift.
#[derive(Clone, Debug, Copy, Default)]
pub struct LinearRbfKernel;

impl KernelFunction for LinearRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        -r
    }
}

/// Thin plate spline RBF kernel with `phi(r) = r^2 log r` and `phi(0) = 0`.
///
/// Conditionally positive definite of order 2, so it needs at least a linear drift.
#[derive(Clone, Debug, Copy, Default)]
pub struct ThinPlateSplineRbfKernel;

impl KernelFunction for ThinPlateSplineRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        match r.abs() < f64::EPSILON {
            true => 0.0,
            false => r.powi(2) * r.ln(),
        }
    }
}

/// Cubic RBF kernel with `phi(r) = r^3`.
#[derive(Clone, Debug, Copy, Default)]
pub struct CubicRbfKernel;

impl KernelFunction for CubicRbfKernel {
    #[inline(always)]
    fn phi(&self, r: f64) -> f64 {
        r.powi(3)
    }
}
