// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Default line extractor: morphological closing, unsharp masking, Canny with
// median-based thresholds, and the Hough line transform from `imageproc`.

use std::cmp::Reverse;

use docrect_core::config::EdgeConfig;
use image::{DynamicImage, GrayImage, ImageBuffer, Luma};
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::hough::{LineDetectionOptions, PolarLine, detect_lines};
use imageproc::morphology::{Mask, grayscale_dilate, grayscale_erode};
use tracing::{debug, instrument};

use super::LineExtractor;
use crate::geometry::HoughLine;

/// Canny + Hough line extractor with a 1 px / 1 degree accumulator.
#[derive(Debug, Clone, Default)]
pub struct HoughExtractor {
    config: EdgeConfig,
}

impl HoughExtractor {
    pub fn new(config: EdgeConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EdgeConfig {
        &self.config
    }
}

impl LineExtractor for HoughExtractor {
    /// Build the edge map.
    ///
    /// 1. Grayscale
    /// 2. Closing (dilate then erode, `closing_iterations` times each) to
    ///    flatten text and texture on the page into one bright region
    /// 3. Unsharp mask to steepen the page border
    /// 4. Gaussian smoothing
    /// 5. Canny with thresholds derived from the median intensity
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    fn extract_edge_map(&self, image: &DynamicImage) -> GrayImage {
        let cfg = &self.config;
        let gray = image.to_luma8();

        let closed = close(&gray, cfg.closing_radius, cfg.closing_iterations);
        let sharpened = unsharp_mask(&closed, cfg.unsharp_sigma, cfg.unsharp_amount);
        let smoothed = gaussian_blur_f32(&sharpened, cfg.smoothing_sigma);

        let (low, high) = canny_thresholds(&smoothed, cfg.canny_sigma);
        debug!(low, high, "Canny thresholds from median intensity");
        canny(&smoothed, low, high)
    }

    /// Run the Hough transform and return the lines strongest first.
    ///
    /// `imageproc` reports accumulator peaks in (angle, distance) order, so
    /// the peaks are re-ranked by how many edge pixels actually lie on them.
    #[instrument(skip_all)]
    fn extract_lines(&self, edges: &GrayImage) -> Vec<HoughLine> {
        let options = LineDetectionOptions {
            vote_threshold: self.config.vote_threshold,
            suppression_radius: self.config.suppression_radius,
        };
        let mut lines = detect_lines(edges, options);
        lines.sort_by_cached_key(|line| Reverse(edge_support(edges, line)));
        debug!(
            line_count = lines.len(),
            vote_threshold = self.config.vote_threshold,
            "Hough lines detected"
        );

        lines
            .into_iter()
            .map(|line| {
                HoughLine::new(
                    line.r as f64,
                    (line.angle_in_degrees as f64).to_radians(),
                )
            })
            .collect()
    }
}

/// Grayscale closing with a square structuring element, repeated.
fn close(image: &GrayImage, radius: u8, iterations: u32) -> GrayImage {
    if radius == 0 || iterations == 0 {
        return image.clone();
    }
    let mask = Mask::square(radius);
    let mut out = image.clone();
    for _ in 0..iterations {
        out = grayscale_dilate(&out, &mask);
    }
    for _ in 0..iterations {
        out = grayscale_erode(&out, &mask);
    }
    out
}

/// `out = (1 + amount) * image - amount * blur(image, sigma)`, saturated.
fn unsharp_mask(image: &GrayImage, sigma: f32, amount: f32) -> GrayImage {
    let blurred = gaussian_blur_f32(image, sigma);
    ImageBuffer::from_fn(image.width(), image.height(), |x, y| {
        let orig = image.get_pixel(x, y).0[0] as f32;
        let blur = blurred.get_pixel(x, y).0[0] as f32;
        let val = (1.0 + amount) * orig - amount * blur;
        Luma([val.round().clamp(0.0, 255.0) as u8])
    })
}

/// Median intensity of a grayscale image.
fn median_intensity(image: &GrayImage) -> u8 {
    let mut histogram = [0u64; 256];
    for pixel in image.pixels() {
        histogram[pixel.0[0] as usize] += 1;
    }
    let total = image.width() as u64 * image.height() as u64;
    let half = total.div_ceil(2);
    let mut seen = 0u64;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count;
        if seen >= half && seen > 0 {
            return value as u8;
        }
    }
    0
}

/// Canny thresholds `((1 - sigma) * median, (1 + sigma) * median)`.
fn canny_thresholds(image: &GrayImage, sigma: f32) -> (f32, f32) {
    let median = median_intensity(image) as f32;
    let low = ((1.0 - sigma) * median).max(0.0);
    let high = ((1.0 + sigma) * median).min(255.0).max(low).max(1.0);
    (low, high)
}

/// Number of positions along `line` with an edge pixel within one pixel.
///
/// The line is walked along its dominant axis, one sample per column (for
/// near-horizontal lines) or per row.
fn edge_support(edges: &GrayImage, line: &PolarLine) -> u32 {
    let (width, height) = edges.dimensions();
    let theta = (line.angle_in_degrees as f32).to_radians();
    let (sin, cos) = theta.sin_cos();
    let is_edge = |x: i64, y: i64| {
        x >= 0
            && y >= 0
            && x < width as i64
            && y < height as i64
            && edges.get_pixel(x as u32, y as u32).0[0] > 0
    };

    let mut support = 0;
    if sin.abs() >= cos.abs() {
        for x in 0..width as i64 {
            let y = ((line.r - x as f32 * cos) / sin).round() as i64;
            if (y - 1..=y + 1).any(|yy| is_edge(x, yy)) {
                support += 1;
            }
        }
    } else {
        for y in 0..height as i64 {
            let x = ((line.r - y as f32 * sin) / cos).round() as i64;
            if (x - 1..=x + 1).any(|xx| is_edge(xx, y)) {
                support += 1;
            }
        }
    }
    support
}
