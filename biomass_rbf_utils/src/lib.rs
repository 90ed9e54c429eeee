/////////////////////////////////////////////////////////////////////////////////////////////
//
// Re-exports kernel utilities and helper functions used across the biomass_rbf crates.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

//! # Utilities for the [`biomass_rbf`] crate
//!
//! Radial kernels expressed as functions of Euclidean distance, together with the
//! dense kernel-matrix builders used by the direct RBF solver.
mod rbf_kernels;
mod traits;
mod utils;

/// Implemented radial kernels for use in the [`biomass_rbf`] crate.
pub mod kernels {
    pub use super::rbf_kernels::*;
}

pub use {
    traits::KernelFunction,
    utils::{
        KernelType, get_a_matrix_symmetric_solver, get_distance,
        get_pointarray_extents, kernel_phi, select_mat_rows,
    },
};
