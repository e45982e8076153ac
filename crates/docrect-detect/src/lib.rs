// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// docrect-detect: find a photographed document and unwarp it.
//
// Line candidates in Hough normal form are clustered into two pairs of
// roughly parallel page sides, intersected into four corners, and the page
// is warped onto an upright rectangle of fixed aspect ratio.

pub mod detect;
pub mod extract;
pub mod geometry;
pub mod image;
pub mod rectify;
pub mod scanner;

// Re-export the primary entry points so callers can use `docrect_detect::DocumentScanner` etc.
pub use detect::{BoundaryLineSet, LineSelector, derive_corners, locate_document, select_boundary_lines};
pub use extract::{HoughExtractor, LineExtractor};
pub use geometry::{HoughLine, Line};
pub use image::processor::ImageProcessor;
pub use rectify::{OrderedCorners, order_corners, rectify, rectify_with};
pub use scanner::{DocumentScanner, ScanOutcome};
