// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Perspective rectification. Order the four document corners, size the
// output page from its width and the target aspect ratio, and warp the
// quadrilateral onto an upright rectangle.

use std::cmp::Ordering;

use docrect_core::config::{Interpolation, OutputConfig};
use docrect_core::error::{DocrectError, Result};
use docrect_core::Point;
use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage, Rgba, RgbaImage};
use imageproc::geometric_transformations::{self, Projection, warp_into};
use tracing::{debug, instrument};

/// Document corners labelled by position on the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderedCorners {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

impl OrderedCorners {
    /// Corners in tl, tr, br, bl order.
    pub fn to_array(&self) -> [Point; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }

    /// Length of the longer of the top and bottom edges.
    pub fn max_width(&self) -> f64 {
        let top = self.top_left.distance(&self.top_right);
        let bottom = self.bottom_left.distance(&self.bottom_right);
        top.max(bottom)
    }

    fn has_repeated_corner(&self) -> bool {
        let corners = self.to_array();
        (0..4).any(|i| (i + 1..4).any(|j| corners[i] == corners[j]))
    }
}

/// Label four unordered corners with the sum/difference heuristic.
///
/// Top-left has the smallest `x + y`, bottom-right the largest. Top-right has
/// the smallest `y - x`, bottom-left the largest. Ties are broken on the
/// coordinates themselves, so the labelling depends only on the set of
/// points, never on their input order. Quadrilaterals rotated by more than
/// about 45 degrees are mislabelled.
pub fn order_corners(points: &[Point; 4]) -> OrderedCorners {
    let sum = |p: &Point| p.x + p.y;
    let diff = |p: &Point| p.y - p.x;
    OrderedCorners {
        top_left: extreme(points, sum, Ordering::Less),
        top_right: extreme(points, diff, Ordering::Less),
        bottom_right: extreme(points, sum, Ordering::Greater),
        bottom_left: extreme(points, diff, Ordering::Greater),
    }
}

fn extreme(points: &[Point; 4], key: impl Fn(&Point) -> f64, wanted: Ordering) -> Point {
    let mut best = points[0];
    for p in &points[1..] {
        let ord = key(p)
            .total_cmp(&key(&best))
            .then(p.x.total_cmp(&best.x))
            .then(p.y.total_cmp(&best.y));
        if ord == wanted {
            best = *p;
        }
    }
    best
}

/// Output canvas size for an ordered quadrilateral.
///
/// The width is the longer horizontal edge. The height is never measured:
/// it is `round(width * aspect_ratio)`.
pub fn output_size(corners: &OrderedCorners, aspect_ratio: f64) -> Result<(u32, u32)> {
    let max_width = corners.max_width();
    if !max_width.is_finite() || max_width < 2.0 || max_width > u32::MAX as f64 {
        return Err(DocrectError::DegenerateQuad(format!(
            "page width {:.2} px is unusable",
            max_width
        )));
    }
    let width = max_width as u32;
    let height = (width as f64 * aspect_ratio).round();
    if !height.is_finite() || height < 2.0 || height > u32::MAX as f64 {
        return Err(DocrectError::DegenerateQuad(format!(
            "page height {} px from aspect ratio {} is unusable",
            height, aspect_ratio
        )));
    }
    Ok((width, height as u32))
}

/// Projective transform taking the ordered corners onto the
/// `width x height` output rectangle.
pub fn perspective_transform(
    corners: &OrderedCorners,
    width: u32,
    height: u32,
) -> Result<Projection> {
    let (w, h) = (width.saturating_sub(1) as f32, height.saturating_sub(1) as f32);
    let src = corners.to_array().map(|p| (p.x as f32, p.y as f32));
    let dst = [(0.0, 0.0), (w, 0.0), (w, h), (0.0, h)];
    Projection::from_control_points(src, dst).ok_or_else(|| {
        DocrectError::DegenerateQuad("corners admit no projective transform".into())
    })
}

/// Warp the document bounded by `corners` onto an upright page whose height
/// is `aspect_ratio` times its width. Uses the default output settings.
pub fn rectify(image: &DynamicImage, corners: &[Point; 4], aspect_ratio: f64) -> Result<DynamicImage> {
    rectify_with(image, corners, aspect_ratio, &OutputConfig::default())
}

/// [`rectify`] with explicit interpolation and background.
#[instrument(skip(image, output), fields(width = image.width(), height = image.height()))]
pub fn rectify_with(
    image: &DynamicImage,
    corners: &[Point; 4],
    aspect_ratio: f64,
    output: &OutputConfig,
) -> Result<DynamicImage> {
    let ordered = order_corners(corners);
    if ordered.has_repeated_corner() {
        return Err(DocrectError::DegenerateQuad(
            "two page corners received the same point".into(),
        ));
    }
    let (out_w, out_h) = output_size(&ordered, aspect_ratio)?;
    let projection = perspective_transform(&ordered, out_w, out_h)?;
    debug!(
        top_left = ?ordered.top_left,
        top_right = ?ordered.top_right,
        bottom_right = ?ordered.bottom_right,
        bottom_left = ?ordered.bottom_left,
        out_w,
        out_h,
        "Warping document"
    );

    let interpolation = match output.interpolation {
        Interpolation::Nearest => geometric_transformations::Interpolation::Nearest,
        Interpolation::Bilinear => geometric_transformations::Interpolation::Bilinear,
        Interpolation::Bicubic => geometric_transformations::Interpolation::Bicubic,
    };
    let [r, g, b, a] = output.background;

    let warped = match image {
        DynamicImage::ImageLuma8(gray) => {
            let mut out = GrayImage::new(out_w, out_h);
            warp_into(gray, &projection, interpolation, Luma([r]), &mut out);
            DynamicImage::ImageLuma8(out)
        }
        DynamicImage::ImageRgb8(rgb) => {
            let mut out = RgbImage::new(out_w, out_h);
            warp_into(rgb, &projection, interpolation, Rgb([r, g, b]), &mut out);
            DynamicImage::ImageRgb8(out)
        }
        other => {
            let rgba = other.to_rgba8();
            let mut out = RgbaImage::new(out_w, out_h);
            warp_into(&rgba, &projection, interpolation, Rgba([r, g, b, a]), &mut out);
            DynamicImage::ImageRgba8(out)
        }
    };
    Ok(warped)
}
