// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document boundary detection: from Hough line candidates to four corners.

pub mod boundary;
pub mod corners;

pub use boundary::{BoundaryLineSet, LineSelector, select_boundary_lines};
pub use corners::derive_corners;

use docrect_core::config::LineConfig;
use docrect_core::{DetectionFailure, Point};

use crate::geometry::HoughLine;

/// Run boundary selection and corner derivation on one candidate list.
///
/// `width` and `height` are the dimensions of the image the candidates were
/// extracted from; the corners are in that coordinate space.
pub fn locate_document(
    candidates: &[HoughLine],
    width: f64,
    height: f64,
    config: &LineConfig,
) -> Result<[Point; 4], DetectionFailure> {
    if candidates.is_empty() {
        return Err(DetectionFailure::NoLines);
    }
    let boundary = select_boundary_lines(candidates, config);
    derive_corners(&boundary, width, height)
}
