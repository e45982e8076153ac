// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// End-to-end document scanner: working-scale detection, corner scale-back,
// failure policy, and rectification of the full-resolution photo.

use docrect_core::config::FailurePolicy;
use docrect_core::error::{DocrectError, Result};
use docrect_core::{Detection, DetectionFailure, ScanConfig};
use image::DynamicImage;
use tracing::{debug, info, instrument, warn};

use crate::detect::locate_document;
use crate::extract::{HoughExtractor, LineExtractor};
use crate::image::processor::{ImageProcessor, resize_to_height};
use crate::rectify::rectify_with;

/// Detection plus the rectified page.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub detection: Detection,
    pub document: DynamicImage,
}

/// Finds a document in a photo and unwarps it.
///
/// Detection runs on a copy down-scaled to `working_height`; corners are
/// reported in the coordinates of the photo that was passed in.
#[derive(Debug, Clone)]
pub struct DocumentScanner<E = HoughExtractor> {
    config: ScanConfig,
    extractor: E,
}

impl DocumentScanner<HoughExtractor> {
    /// Scanner with the default Canny/Hough extractor.
    pub fn new(config: ScanConfig) -> Result<Self> {
        let extractor = HoughExtractor::new(config.edges);
        Self::with_extractor(config, extractor)
    }
}

impl<E: LineExtractor> DocumentScanner<E> {
    /// Scanner with a custom line extractor. The configuration is validated.
    pub fn with_extractor(config: ScanConfig, extractor: E) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, extractor })
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn extractor(&self) -> &E {
        &self.extractor
    }

    /// Locate the document's four corners.
    ///
    /// When no boundary is found the failure policy decides: `Fallback`
    /// returns the image bounds with `failure` set, `Strict` returns
    /// `DocrectError::NoDocumentDetected`.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn detect(&self, image: &DynamicImage) -> Result<Detection> {
        let (width, height) = (image.width(), image.height());
        if width == 0 || height == 0 {
            return Err(DocrectError::ImageError(format!(
                "cannot scan an empty {}x{} image",
                width, height
            )));
        }

        let scaled;
        let working = if height > self.config.working_height {
            scaled = resize_to_height(image, self.config.working_height);
            &scaled
        } else {
            image
        };
        let (work_w, work_h) = (working.width(), working.height());

        let edges = self.extractor.extract_edge_map(working);
        let candidates = self.extractor.extract_lines(&edges);
        debug!(candidates = candidates.len(), work_w, work_h, "Line candidates extracted");

        match locate_document(&candidates, work_w as f64, work_h as f64, &self.config.lines) {
            Ok(corners) => {
                let (sx, sy) = (width as f64 / work_w as f64, height as f64 / work_h as f64);
                let corners = corners.map(|p| p.scaled(sx, sy));
                info!(?corners, "Document boundary found");
                Ok(Detection::found(corners, width, height))
            }
            Err(failure) => self.on_failure(width, height, failure),
        }
    }

    /// Detect and rectify.
    ///
    /// If the detected corners cannot be rectified (a collapsed or sliver
    /// quadrilateral), the failure policy is applied again with
    /// `DetectionFailure::Unrectifiable` and, under `Fallback`, the whole
    /// photo is rectified instead.
    #[instrument(skip_all, fields(width = image.width(), height = image.height()))]
    pub fn scan(&self, image: &DynamicImage) -> Result<ScanOutcome> {
        let mut detection = self.detect(image)?;
        let ratio = self.config.aspect_ratio;
        let output = &self.config.output;

        let document = match rectify_with(image, &detection.corners, ratio, output) {
            Ok(document) => document,
            Err(DocrectError::DegenerateQuad(reason)) if detection.is_found() => {
                warn!(%reason, "Detected corners cannot be rectified");
                detection =
                    self.on_failure(detection.width, detection.height, DetectionFailure::Unrectifiable)?;
                rectify_with(image, &detection.corners, ratio, output)?
            }
            Err(err) => return Err(err),
        };

        let document = match output.max_height {
            Some(max_height) => ImageProcessor::from_dynamic(document)
                .fit_height(max_height)
                .into_dynamic(),
            None => document,
        };
        info!(
            found = detection.is_found(),
            out_w = document.width(),
            out_h = document.height(),
            "Scan complete"
        );
        Ok(ScanOutcome {
            detection,
            document,
        })
    }

    fn on_failure(&self, width: u32, height: u32, failure: DetectionFailure) -> Result<Detection> {
        warn!(%failure, policy = ?self.config.failure_policy, "No document boundary");
        match self.config.failure_policy {
            FailurePolicy::Strict => Err(DocrectError::NoDocumentDetected(failure)),
            FailurePolicy::Fallback => Ok(Detection::full_image(width, height, failure)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::HoughLine;
    use crate::rectify::order_corners;
    use docrect_core::Point;
    use docrect_core::config::LineConfig;
    use image::{GrayImage, Luma, Rgb, RgbImage};
    use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
    use imageproc::point::Point as PixelPoint;
    use imageproc::rect::Rect;
    use std::f64::consts::FRAC_PI_2;

    /// Extractor that ignores the image and replays a fixed candidate list.
    struct FixedLines(Vec<HoughLine>);

    impl LineExtractor for FixedLines {
        fn extract_edge_map(&self, image: &DynamicImage) -> GrayImage {
            GrayImage::new(image.width(), image.height())
        }

        fn extract_lines(&self, _edges: &GrayImage) -> Vec<HoughLine> {
            self.0.clone()
        }
    }

    const TILT_DEG: f64 = 10.0;
    const CENTER: (f64, f64) = (300.0, 400.0);
    const HALF_W: f64 = 180.0;
    const HALF_H: f64 = 260.0;

    /// A 360x520 page centred in a 600x800 photo, rotated by 10 degrees.
    /// Returns its corners in tl, tr, br, bl order and its four border lines.
    fn tilted_page() -> ([Point; 4], [HoughLine; 4]) {
        let theta = TILT_DEG.to_radians();
        let u = (theta.cos(), theta.sin());
        let v = (-theta.sin(), theta.cos());
        let corner = |su: f64, sv: f64| {
            Point::new(
                CENTER.0 + su * HALF_W * u.0 + sv * HALF_H * v.0,
                CENTER.1 + su * HALF_W * u.1 + sv * HALF_H * v.1,
            )
        };
        let corners = [
            corner(-1.0, -1.0),
            corner(1.0, -1.0),
            corner(1.0, 1.0),
            corner(-1.0, 1.0),
        ];
        let du = CENTER.0 * u.0 + CENTER.1 * u.1;
        let dv = CENTER.0 * v.0 + CENTER.1 * v.1;
        let lines = [
            HoughLine::new(du - HALF_W, theta),
            HoughLine::new(du + HALF_W, theta),
            HoughLine::new(dv - HALF_H, theta + FRAC_PI_2),
            HoughLine::new(dv + HALF_H, theta + FRAC_PI_2),
        ];
        (corners, lines)
    }

    /// Dark photo with the tilted white page and a few dark text bars on it.
    fn tilted_page_photo() -> DynamicImage {
        let (corners, _) = tilted_page();
        let mut img = RgbImage::from_pixel(600, 800, Rgb([40, 40, 40]));
        let poly = corners.map(|p| PixelPoint::new(p.x.round() as i32, p.y.round() as i32));
        draw_polygon_mut(&mut img, &poly, Rgb([250, 250, 250]));
        for row in 0..6 {
            let rect = Rect::at(220, 260 + row * 40).of_size(160, 4);
            draw_filled_rect_mut(&mut img, rect, Rgb([20, 20, 20]));
        }
        DynamicImage::ImageRgb8(img)
    }

    fn config_at_full_scale() -> ScanConfig {
        ScanConfig {
            working_height: 800,
            ..ScanConfig::default()
        }
    }

    fn assert_corners_near(found: &[Point; 4], expected: &[Point; 4], tolerance: f64) {
        let found = order_corners(found).to_array();
        for (f, e) in found.iter().zip(expected) {
            assert!(
                f.distance(e) <= tolerance,
                "corner {:?} is {:.2} px from {:?}",
                f,
                f.distance(e),
                e
            );
        }
    }

    fn bright_fraction(image: &DynamicImage, margin: u32) -> f64 {
        let gray = image.to_luma8();
        let (w, h) = gray.dimensions();
        let mut bright = 0usize;
        let mut total = 0usize;
        for y in margin..h - margin {
            for x in margin..w - margin {
                total += 1;
                if gray.get_pixel(x, y).0[0] > 200 {
                    bright += 1;
                }
            }
        }
        bright as f64 / total as f64
    }

    #[test]
    fn strongest_lines_give_the_page_corners() {
        let (expected, border) = tilted_page();
        let mut candidates = border.to_vec();
        // Interior clutter after the borders is never consulted.
        candidates.extend([
            HoughLine::new(300.0, TILT_DEG.to_radians()),
            HoughLine::new(420.0, TILT_DEG.to_radians()),
            HoughLine::new(250.0, TILT_DEG.to_radians() + FRAC_PI_2),
            HoughLine::new(400.0, TILT_DEG.to_radians() + FRAC_PI_2),
            HoughLine::new(350.0, 0.9),
        ]);
        let scanner =
            DocumentScanner::with_extractor(config_at_full_scale(), FixedLines(candidates)).unwrap();

        let outcome = scanner.scan(&tilted_page_photo()).unwrap();
        assert!(outcome.detection.is_found());
        assert_corners_near(&outcome.detection.corners, &expected, 1e-6);

        let (w, h) = (outcome.document.width(), outcome.document.height());
        assert!((359..=360).contains(&w), "width {}", w);
        assert_eq!(h, (w as f64 * 1.545).round() as u32);
        let bright = bright_fraction(&outcome.document, 10);
        assert!(bright > 0.95, "only {:.3} of the page is white", bright);
    }

    #[test]
    fn interleaved_clutter_without_early_exit() {
        let (expected, [a_min, a_max, b_min, b_max]) = tilted_page();
        let theta = TILT_DEG.to_radians();
        let candidates = vec![
            HoughLine::new(300.0, theta),
            HoughLine::new(250.0, theta + FRAC_PI_2),
            a_min,
            HoughLine::new(350.0, theta + 0.8),
            b_max,
            HoughLine::new(450.0, theta),
            a_max,
            HoughLine::new(400.0, theta + FRAC_PI_2),
            b_min,
        ];
        let mut config = config_at_full_scale();
        config.lines = LineConfig {
            stop_when_found: false,
            ..LineConfig::default()
        };
        let scanner = DocumentScanner::with_extractor(config, FixedLines(candidates)).unwrap();

        let detection = scanner.detect(&tilted_page_photo()).unwrap();
        assert!(detection.is_found());
        assert_corners_near(&detection.corners, &expected, 1e-6);
    }

    #[test]
    fn hough_pipeline_finds_the_tilted_page() {
        let (expected, _) = tilted_page();
        let scanner = DocumentScanner::new(ScanConfig::default()).unwrap();

        let detection = scanner.detect(&tilted_page_photo()).unwrap();
        assert!(detection.is_found(), "failed with {:?}", detection.failure);
        assert_eq!((detection.width, detection.height), (600, 800));
        assert_corners_near(&detection.corners, &expected, 8.0);
    }

    #[test]
    fn corners_are_scaled_back_per_axis() {
        // 400x1200 photo, 200x600 working copy.
        let lines = vec![
            HoughLine::new(20.0, 0.0),
            HoughLine::new(180.0, 0.0),
            HoughLine::new(30.0, FRAC_PI_2),
            HoughLine::new(570.0, FRAC_PI_2),
        ];
        let scanner =
            DocumentScanner::with_extractor(ScanConfig::default(), FixedLines(lines)).unwrap();
        let photo = DynamicImage::ImageLuma8(GrayImage::new(400, 1200));

        let detection = scanner.detect(&photo).unwrap();
        let expected = [
            Point::new(40.0, 60.0),
            Point::new(360.0, 60.0),
            Point::new(360.0, 1140.0),
            Point::new(40.0, 1140.0),
        ];
        assert_corners_near(&detection.corners, &expected, 1e-6);
    }

    #[test]
    fn blank_photo_falls_back_to_full_image() {
        let scanner = DocumentScanner::new(ScanConfig::default()).unwrap();
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(200, 300, Luma([180])));

        let outcome = scanner.scan(&photo).unwrap();
        assert_eq!(outcome.detection.failure, Some(DetectionFailure::NoLines));
        assert_eq!(
            outcome.detection.corners,
            docrect_core::full_image_corners(200, 300)
        );
        assert_eq!(outcome.document.width(), 200);
        assert_eq!(outcome.document.height(), 309);
    }

    #[test]
    fn strict_policy_reports_the_failure() {
        let config = ScanConfig {
            failure_policy: FailurePolicy::Strict,
            ..ScanConfig::default()
        };
        let scanner = DocumentScanner::with_extractor(config, FixedLines(Vec::new())).unwrap();
        let photo = DynamicImage::ImageLuma8(GrayImage::new(100, 100));

        match scanner.detect(&photo) {
            Err(DocrectError::NoDocumentDetected(DetectionFailure::NoLines)) => {}
            other => panic!("expected NoDocumentDetected, got {:?}", other),
        }
    }

    #[test]
    fn out_of_bounds_corner_falls_back() {
        let lines = vec![
            HoughLine::new(10.0, 0.0),
            HoughLine::new(90.0, 0.0),
            HoughLine::new(10.0, FRAC_PI_2),
            HoughLine::new(250.0, FRAC_PI_2),
        ];
        let scanner =
            DocumentScanner::with_extractor(ScanConfig::default(), FixedLines(lines)).unwrap();
        let photo = DynamicImage::ImageLuma8(GrayImage::new(100, 200));

        let detection = scanner.detect(&photo).unwrap();
        assert!(matches!(
            detection.failure,
            Some(DetectionFailure::CornerOutOfBounds { corner: 1, .. })
        ));
        assert_eq!(detection.corners, docrect_core::full_image_corners(100, 200));
    }

    #[test]
    fn sliver_quad_is_unrectifiable() {
        // Two vertical borders one pixel apart: corners exist, the page
        // is too narrow to warp.
        let lines = vec![
            HoughLine::new(10.0, 0.0),
            HoughLine::new(11.0, 0.0),
            HoughLine::new(10.0, FRAC_PI_2),
            HoughLine::new(150.0, FRAC_PI_2),
        ];
        let mut config = ScanConfig::default();
        config.lines.distance_dedup_tolerance = 0.5;
        let photo = DynamicImage::ImageLuma8(GrayImage::from_pixel(100, 200, Luma([255])));

        let scanner = DocumentScanner::with_extractor(config, FixedLines(lines.clone())).unwrap();
        let outcome = scanner.scan(&photo).unwrap();
        assert_eq!(outcome.detection.failure, Some(DetectionFailure::Unrectifiable));
        assert_eq!(outcome.document.width(), 100);

        config.failure_policy = FailurePolicy::Strict;
        let strict = DocumentScanner::with_extractor(config, FixedLines(lines)).unwrap();
        assert!(matches!(
            strict.scan(&photo),
            Err(DocrectError::NoDocumentDetected(DetectionFailure::Unrectifiable))
        ));
    }

    #[test]
    fn output_is_capped_at_max_height() {
        let mut config = ScanConfig::default();
        config.output.max_height = Some(100);
        let scanner = DocumentScanner::with_extractor(config, FixedLines(Vec::new())).unwrap();
        let photo = DynamicImage::ImageLuma8(GrayImage::new(300, 400));

        let outcome = scanner.scan(&photo).unwrap();
        assert_eq!(outcome.document.height(), 100);
        assert_eq!(outcome.document.width(), 65);
    }

    #[test]
    fn empty_image_is_an_error() {
        let scanner = DocumentScanner::new(ScanConfig::default()).unwrap();
        let empty = DynamicImage::ImageLuma8(GrayImage::new(0, 0));
        assert!(matches!(scanner.detect(&empty), Err(DocrectError::ImageError(_))));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ScanConfig {
            aspect_ratio: -1.0,
            ..ScanConfig::default()
        };
        assert!(matches!(
            DocumentScanner::new(config),
            Err(DocrectError::InvalidConfig(_))
        ));
    }
}
