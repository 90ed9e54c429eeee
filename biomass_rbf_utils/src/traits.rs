/////////////////////////////////////////////////////////////////////////////////////////////
//
// Declares the kernel evaluation trait shared by all radial kernels.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::RowRef;

/// A radial kernel `phi(r)` evaluated between a target and a source point.
///
/// Implementors only need to supply [`KernelFunction::phi`]; the point-to-point
/// evaluation takes the Euclidean distance between the two rows, so the same kernel
/// works for any input dimensionality.
pub trait KernelFunction {
    /// Kernel value at distance `r >= 0`.
    fn phi(&self, r: f64) -> f64;

    #[inline(always)]
    fn evaluate(&self, target: RowRef<f64>, source: RowRef<f64>) -> f64 {
        self.phi(crate::get_distance(target, source))
    }
}
