/////////////////////////////////////////////////////////////////////////////////////////////
//
// Provides a KD-tree over training inputs for locating coincident and near-coincident points.
//
// Created on: 15 Nov 2025     Author: Daniel Owen
//
// Copyright (c) 2025, Maptek Pty Ltd. All rights reserved. Licensed under the MIT License.
//
/////////////////////////////////////////////////////////////////////////////////////////////

use faer::{Mat, RowRef};
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceMetric {
    #[cfg(test)]
    Euclidean,
    InfinityNorm,
}

impl DistanceMetric {
    fn distance(&self, a: RowRef<f64>, b: RowRef<f64>) -> f64 {
        let diffs = a.iter().zip(b.iter()).map(|(x, y)| (x - y).abs());

        match self {
            #[cfg(test)]
            DistanceMetric::Euclidean => diffs.map(|d| d * d).sum::<f64>().sqrt(),
            DistanceMetric::InfinityNorm => diffs.fold(0.0_f64, f64::max),
        }
    }
}

#[derive(Debug)]
struct Node {
    row: usize,
    axis: usize,
    left: Option<usize>,
    right: Option<usize>,
}

/// Balanced KD-tree that borrows the point matrix it indexes.
///
/// Nodes are stored in a flat vector with the root at index `0`; each node refers
/// to a row of the source matrix rather than owning a copy of its coordinates.
#[derive(Debug)]
pub struct KDTree<'a> {
    points: &'a Mat<f64>,
    nodes: Vec<Node>,
}

impl<'a> KDTree<'a> {
    pub fn new(points: &'a Mat<f64>) -> Self {
        let mut rows: Vec<usize> = (0..points.nrows()).collect();
        let mut tree = KDTree {
            points,
            nodes: Vec::with_capacity(points.nrows()),
        };

        tree.build_tree(&mut rows, 0);
        tree
    }

    fn build_tree(&mut self, rows: &mut [usize], depth: usize) -> Option<usize> {
        if rows.is_empty() || self.points.ncols() == 0 {
            return None;
        }

        let axis = depth % self.points.ncols();
        let points = self.points;

        rows.sort_by(|&a, &b| {
            points[(a, axis)]
                .partial_cmp(&points[(b, axis)])
                .unwrap_or(Ordering::Equal)
        });

        let mid = rows.len() / 2;
        let node_index = self.nodes.len();
        self.nodes.push(Node {
            row: rows[mid],
            axis,
            left: None,
            right: None,
        });

        let (lower, upper) = rows.split_at_mut(mid);
        self.nodes[node_index].left = self.build_tree(lower, depth + 1);
        self.nodes[node_index].right = self.build_tree(&mut upper[1..], depth + 1);

        Some(node_index)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the rows lying within `radius` of `target` (inclusive), in tree order.
    pub fn radius_search(&self, target: RowRef<f64>, radius: f64, metric: DistanceMetric) -> Vec<usize> {
        let mut result = Vec::new();

        if !self.is_empty() {
            self.radius_search_impl(0, target, radius, metric, &mut result);
        }

        result
    }

    fn radius_search_impl(
        &self,
        node_index: usize,
        target: RowRef<f64>,
        radius: f64,
        metric: DistanceMetric,
        result: &mut Vec<usize>,
    ) {
        let node = &self.nodes[node_index];
        let node_point = self.points.row(node.row);

        if metric.distance(target, node_point) <= radius {
            result.push(node.row);
        }

        // |diff| <= radius means the search ball straddles the splitting plane.
        let diff = target[node.axis] - node_point[node.axis];
        let visit_left = diff <= radius;
        let visit_right = diff >= -radius;

        if let (true, Some(left)) = (visit_left, node.left) {
            self.radius_search_impl(left, target, radius, metric, result);
        }
        if let (true, Some(right)) = (visit_right, node.right) {
            self.radius_search_impl(right, target, radius, metric, result);
        }
    }

    /// Returns every unordered pair `(i, j)` with `i < j` whose points lie within
    /// `radius` of each other, sorted ascending.
    pub fn pairs_within(&self, radius: f64, metric: DistanceMetric) -> Vec<(usize, usize)> {
        let mut pairs: Vec<(usize, usize)> = (0..self.points.nrows())
            .flat_map(|i| {
                self.radius_search(self.points.row(i), radius, metric)
                    .into_iter()
                    .filter(move |&j| j > i)
                    .map(move |j| (i, j))
            })
            .collect();

        pairs.sort_unstable();
        pairs
    }
}
