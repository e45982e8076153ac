// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edge map and line candidate extraction.
//
// The detector only needs an ordered list of Hough-form line candidates. The
// `LineExtractor` trait is the seam where that list is produced; the default
// implementation runs Canny and the Hough transform from `imageproc`.

pub mod hough;

pub use hough::HoughExtractor;

use image::{DynamicImage, GrayImage};

use crate::geometry::HoughLine;

/// Source of line candidates for the boundary selector.
///
/// Implementations must be deterministic for a given input. Lines should be
/// returned strongest first.
pub trait LineExtractor {
    /// Produce a single-channel edge map (non-zero = edge) for `image`.
    fn extract_edge_map(&self, image: &DynamicImage) -> GrayImage;

    /// Detect straight lines in an edge map.
    fn extract_lines(&self, edges: &GrayImage) -> Vec<HoughLine>;
}

impl<E: LineExtractor + ?Sized> LineExtractor for &E {
    fn extract_edge_map(&self, image: &DynamicImage) -> GrayImage {
        (**self).extract_edge_map(image)
    }

    fn extract_lines(&self, edges: &GrayImage) -> Vec<HoughLine> {
        (**self).extract_lines(edges)
    }
}
