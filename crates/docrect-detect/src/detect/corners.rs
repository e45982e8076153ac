// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Corner derivation: intersect every pair-A boundary line with every pair-B
// boundary line.

use docrect_core::{DetectionFailure, Point};
use tracing::debug;

use super::boundary::BoundaryLineSet;

/// Intersect the boundary lines into the four document corners.
///
/// Corner `i` is the intersection of slot `i / 2` (pair A) with slot
/// `i % 2 + 2` (pair B). The result is unordered; see
/// [`crate::rectify::order_corners`].
///
/// Fails if the boundary is incomplete, if two intersected lines are
/// parallel, or if a corner falls outside `[0, width] x [0, height]`.
/// Out-of-bounds corners are rejected, never clamped.
pub fn derive_corners(
    boundary: &BoundaryLineSet,
    width: f64,
    height: f64,
) -> Result<[Point; 4], DetectionFailure> {
    let lines = boundary.lines().ok_or(DetectionFailure::IncompleteBoundary {
        sides: boundary.len(),
    })?;

    let mut corners = [Point::default(); 4];
    for (corner, slot) in corners.iter_mut().enumerate() {
        let a = &lines[corner / 2];
        let b = &lines[corner % 2 + 2];
        let point = a
            .intersection(b)
            .ok_or(DetectionFailure::ParallelLines { corner })?;
        if !(0.0..=width).contains(&point.x) || !(0.0..=height).contains(&point.y) {
            debug!(corner, x = point.x, y = point.y, width, height, "Corner outside image");
            return Err(DetectionFailure::CornerOutOfBounds {
                corner,
                x: point.x,
                y: point.y,
            });
        }
        *slot = point;
    }
    Ok(corners)
}
