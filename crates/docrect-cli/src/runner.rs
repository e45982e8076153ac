// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sequential scan of a list of photos. Each photo is decoded, scanned and
// saved on a blocking worker; the cancel flag is checked between photos.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use docrect_core::error::{DocrectError, Result};
use docrect_core::human_errors::{humanize_error, humanize_failure};
use docrect_core::{DetectionFailure, Point};
use docrect_detect::{DocumentScanner, ImageProcessor};
use serde::Serialize;
use tracing::{info, instrument, warn};

/// One line of the JSON report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub path: PathBuf,
    pub found: bool,
    pub failure: Option<DetectionFailure>,
    /// Corners in the photo's pixel coordinates. Absent when the photo could
    /// not be scanned at all.
    pub corners: Option<[Point; 4]>,
    /// Where the rectified page was written.
    pub output: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Report {
    fn failed(path: PathBuf, err: &DocrectError) -> Self {
        let failure = match err {
            DocrectError::NoDocumentDetected(failure) => Some(*failure),
            _ => None,
        };
        Self {
            path,
            found: false,
            failure,
            corners: None,
            output: None,
            error: Some(err.to_string()),
        }
    }
}

/// Totals over one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Summary {
    pub scanned: usize,
    pub found: usize,
    pub errors: usize,
}

/// Scan `paths` in order, handing each report to `emit` as soon as it is
/// ready.
///
/// A photo that fails (unreadable, or no page under the strict policy) is
/// reported and counted; the run continues. If `cancel` is set the run stops
/// before the next photo with `DocrectError::Cancelled`.
pub async fn scan_all(
    scanner: Arc<DocumentScanner>,
    paths: Vec<PathBuf>,
    output_dir: Option<PathBuf>,
    cancel: Arc<AtomicBool>,
    mut emit: impl FnMut(&Report),
) -> Result<Summary> {
    let mut summary = Summary::default();
    for path in paths {
        if cancel.load(Ordering::SeqCst) {
            warn!(remaining_from = %path.display(), "Cancelled before photo");
            return Err(DocrectError::Cancelled);
        }

        let worker = Arc::clone(&scanner);
        let out_dir = output_dir.clone();
        let job_path = path.clone();
        let joined =
            tokio::task::spawn_blocking(move || scan_one(&worker, &job_path, out_dir.as_deref()))
                .await;
        let report = match joined {
            Ok(Ok(report)) => report,
            Ok(Err(err)) => {
                let human = humanize_error(&err);
                warn!(path = %path.display(), error = %err, suggestion = %human.suggestion, "Scan failed");
                Report::failed(path, &err)
            }
            Err(join_err) => {
                let err = DocrectError::ImageError(format!("scan worker failed: {}", join_err));
                warn!(path = %path.display(), error = %err, "Scan worker failed");
                Report::failed(path, &err)
            }
        };

        summary.scanned += 1;
        if report.found {
            summary.found += 1;
        }
        if report.error.is_some() {
            summary.errors += 1;
        }
        emit(&report);
    }
    Ok(summary)
}

/// Decode, scan and optionally save one photo. Blocking.
#[instrument(skip(scanner, output_dir), fields(path = %path.display()))]
pub fn scan_one(
    scanner: &DocumentScanner,
    path: &Path,
    output_dir: Option<&Path>,
) -> Result<Report> {
    let photo = ImageProcessor::open(path)?;
    let outcome = scanner.scan(photo.as_dynamic())?;
    let detection = &outcome.detection;

    if let Some(failure) = &detection.failure {
        let human = humanize_failure(failure);
        warn!(%failure, message = %human.message, suggestion = %human.suggestion, "Page not found");
    }

    let output = match output_dir {
        Some(dir) => {
            let target = output_path(dir, path);
            ImageProcessor::from_dynamic(outcome.document).save(&target)?;
            info!(output = %target.display(), "Rectified page written");
            Some(target)
        }
        None => None,
    };

    Ok(Report {
        path: path.to_path_buf(),
        found: detection.is_found(),
        failure: detection.failure,
        corners: Some(detection.corners),
        output,
        error: None,
    })
}

/// `<dir>/<photo stem>.png`.
fn output_path(dir: &Path, photo: &Path) -> PathBuf {
    let stem = photo
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "page".to_string());
    dir.join(format!("{}.png", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docrect_core::ScanConfig;
    use docrect_core::config::FailurePolicy;
    use image::{DynamicImage, GrayImage, Luma};

    fn blank_photo(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        let img = GrayImage::from_pixel(120, 160, Luma([190u8]));
        DynamicImage::ImageLuma8(img).save(&path).unwrap();
        path
    }

    fn scanner(policy: FailurePolicy) -> Arc<DocumentScanner> {
        let config = ScanConfig {
            failure_policy: policy,
            ..ScanConfig::default()
        };
        Arc::new(DocumentScanner::new(config).unwrap())
    }

    #[test]
    fn output_path_uses_the_photo_stem() {
        assert_eq!(
            output_path(Path::new("/out"), Path::new("/photos/receipt.jpeg")),
            PathBuf::from("/out/receipt.png")
        );
        assert_eq!(
            output_path(Path::new("/out"), Path::new("")),
            PathBuf::from("/out/page.png")
        );
    }

    #[test]
    fn blank_photo_is_cropped_to_the_whole_image() {
        let dir = tempfile::tempdir().unwrap();
        let photo = blank_photo(dir.path(), "blank.png");
        let out_dir = dir.path().join("out");
        std::fs::create_dir_all(&out_dir).unwrap();

        let report = scan_one(&scanner(FailurePolicy::Fallback), &photo, Some(&out_dir)).unwrap();
        assert!(!report.found);
        assert_eq!(report.failure, Some(DetectionFailure::NoLines));
        assert_eq!(report.corners, Some(docrect_core::full_image_corners(120, 160)));

        let written = report.output.expect("crop written");
        let crop = ImageProcessor::open(&written).unwrap();
        assert_eq!((crop.width(), crop.height()), (120, 185));
    }

    #[test]
    fn report_serialises_as_one_json_object() {
        let report = Report {
            path: PathBuf::from("a.jpg"),
            found: false,
            failure: Some(DetectionFailure::IncompleteBoundary { sides: 3 }),
            corners: None,
            output: None,
            error: None,
        };
        let json: serde_json::Value = serde_json::to_value(&report).unwrap();
        assert_eq!(json["path"], "a.jpg");
        assert_eq!(json["failure"]["kind"], "incomplete_boundary");
        assert_eq!(json["failure"]["sides"], 3);
        assert!(json.get("error").is_none());
    }

    #[tokio::test]
    async fn failures_are_reported_and_the_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let blank = blank_photo(dir.path(), "blank.png");
        let missing = dir.path().join("missing.png");

        let mut reports = Vec::new();
        let summary = scan_all(
            scanner(FailurePolicy::Strict),
            vec![missing.clone(), blank.clone()],
            None,
            Arc::new(AtomicBool::new(false)),
            |r| reports.push(r.clone()),
        )
        .await
        .unwrap();

        assert_eq!(
            summary,
            Summary {
                scanned: 2,
                found: 0,
                errors: 2
            }
        );
        assert_eq!(reports[0].path, missing);
        assert!(reports[0].error.is_some());
        assert_eq!(reports[1].failure, Some(DetectionFailure::NoLines));
    }

    #[tokio::test]
    async fn cancellation_stops_before_the_next_photo() {
        let dir = tempfile::tempdir().unwrap();
        let photo = blank_photo(dir.path(), "blank.png");

        let mut emitted = 0;
        let result = scan_all(
            scanner(FailurePolicy::Fallback),
            vec![photo],
            None,
            Arc::new(AtomicBool::new(true)),
            |_| emitted += 1,
        )
        .await;
        assert!(matches!(result, Err(DocrectError::Cancelled)));
        assert_eq!(emitted, 0);
    }
}
