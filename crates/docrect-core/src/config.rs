// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Scanner configuration. Every tunable of the detection pipeline lives here.

use std::f64::consts::PI;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{DocrectError, Result};
use crate::types::PaperSize;

/// Angular tolerance used when two candidate lines count as duplicates.
const DEFAULT_ANGULAR_DEDUP: f64 = PI / 45.0;

/// What the scanner does when no document boundary can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Use the full image bounds as the document corners.
    #[default]
    Fallback,
    /// Return `DocrectError::NoDocumentDetected`.
    Strict,
}

/// Resampling filter used when warping the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interpolation {
    Nearest,
    #[default]
    Bilinear,
    Bicubic,
}

/// Parameters of the boundary line selector.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineConfig {
    /// Maximum angle (radians) between a line and a pair's first member for
    /// the line to join that pair.
    pub angular_cluster_tolerance: f64,
    /// Distance (pixels) below which two candidates may be duplicates.
    pub distance_dedup_tolerance: f64,
    /// Angle (radians) below which two candidates may be duplicates.
    pub angular_dedup_tolerance: f64,
    /// Stop consuming candidates once both pairs are complete.
    pub stop_when_found: bool,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            angular_cluster_tolerance: 5.0 * DEFAULT_ANGULAR_DEDUP,
            distance_dedup_tolerance: 25.0,
            angular_dedup_tolerance: DEFAULT_ANGULAR_DEDUP,
            stop_when_found: true,
        }
    }
}

/// Parameters of the edge map and Hough line extraction.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeConfig {
    /// Radius of the square structuring element used for closing (2 = 5x5).
    pub closing_radius: u8,
    /// Number of closing passes that merge text and texture into flat regions.
    pub closing_iterations: u32,
    /// Sigma of the blur subtracted by the unsharp mask.
    pub unsharp_sigma: f32,
    /// Unsharp weight: `out = (1 + amount) * img - amount * blur`.
    pub unsharp_amount: f32,
    /// Sigma of the blur applied right before Canny.
    pub smoothing_sigma: f32,
    /// Canny thresholds are `(1 - s) * median` and `(1 + s) * median`.
    pub canny_sigma: f32,
    /// Minimum Hough accumulator votes for a line.
    pub vote_threshold: u32,
    /// Non-maximum suppression radius in the Hough accumulator.
    pub suppression_radius: u32,
}

impl Default for EdgeConfig {
    fn default() -> Self {
        Self {
            closing_radius: 2,
            closing_iterations: 5,
            unsharp_sigma: 3.0,
            unsharp_amount: 1.0,
            smoothing_sigma: 2.0,
            canny_sigma: 0.33,
            vote_threshold: 60,
            suppression_radius: 8,
        }
    }
}

/// Parameters of the rectified output image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub interpolation: Interpolation,
    /// RGBA fill for output pixels that map outside the photo.
    pub background: [u8; 4],
    /// Down-scale the crop to at most this height. `None` keeps it as warped.
    pub max_height: Option<u32>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            interpolation: Interpolation::Bilinear,
            background: [255, 255, 255, 255],
            max_height: None,
        }
    }
}

/// Complete scanner configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Height the photo is down-scaled to before edge extraction.
    pub working_height: u32,
    /// Output height divided by output width.
    pub aspect_ratio: f64,
    pub failure_policy: FailurePolicy,
    pub lines: LineConfig,
    pub edges: EdgeConfig,
    pub output: OutputConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            working_height: 600,
            aspect_ratio: 1.545,
            failure_policy: FailurePolicy::Fallback,
            lines: LineConfig::default(),
            edges: EdgeConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Defaults with the aspect ratio taken from `paper`.
    ///
    /// A custom size with a zero width keeps the default ratio.
    pub fn for_paper(paper: PaperSize) -> Self {
        let mut config = Self::default();
        if let Some(ratio) = paper.aspect_ratio() {
            config.aspect_ratio = ratio;
        }
        config
    }

    /// Check every tunable for a usable value.
    pub fn validate(&self) -> Result<()> {
        if self.working_height == 0 {
            return Err(invalid("working_height must be at least 1"));
        }
        positive("aspect_ratio", self.aspect_ratio)?;
        positive(
            "lines.angular_cluster_tolerance",
            self.lines.angular_cluster_tolerance,
        )?;
        non_negative(
            "lines.distance_dedup_tolerance",
            self.lines.distance_dedup_tolerance,
        )?;
        non_negative(
            "lines.angular_dedup_tolerance",
            self.lines.angular_dedup_tolerance,
        )?;
        positive("edges.unsharp_sigma", self.edges.unsharp_sigma as f64)?;
        non_negative("edges.unsharp_amount", self.edges.unsharp_amount as f64)?;
        positive("edges.smoothing_sigma", self.edges.smoothing_sigma as f64)?;
        non_negative("edges.canny_sigma", self.edges.canny_sigma as f64)?;
        if self.output.max_height == Some(0) {
            return Err(invalid("output.max_height must be at least 1"));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file. Missing fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&data)?;
        config.validate()?;
        debug!(path = %path.as_ref().display(), "Scan config loaded");
        Ok(config)
    }

    /// Write the configuration as pretty-printed JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), json)?;
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> DocrectError {
    DocrectError::InvalidConfig(msg.into())
}

fn positive(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(invalid(format!("{} must be positive, got {}", name, value)));
    }
    Ok(())
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(format!(
            "{} must be zero or positive, got {}",
            name, value
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ScanConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.working_height, 600);
        assert_eq!(config.failure_policy, FailurePolicy::Fallback);
        assert!((config.lines.angular_cluster_tolerance - 5.0 * PI / 45.0).abs() < 1e-12);
    }

    #[test]
    fn for_paper_sets_ratio() {
        let config = ScanConfig::for_paper(PaperSize::A4);
        assert!((config.aspect_ratio - 297.0 / 210.0).abs() < 1e-12);
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = ScanConfig::default();
        config.aspect_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(DocrectError::InvalidConfig(_))
        ));

        let mut config = ScanConfig::default();
        config.edges.smoothing_sigma = f32::NAN;
        assert!(config.validate().is_err());

        let mut config = ScanConfig::default();
        config.working_height = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_json_takes_defaults() {
        let json = r#"{ "aspect_ratio": 1.3, "lines": { "stop_when_found": false } }"#;
        let config: ScanConfig = serde_json::from_str(json).unwrap();
        assert!((config.aspect_ratio - 1.3).abs() < 1e-12);
        assert!(!config.lines.stop_when_found);
        assert_eq!(config.lines.distance_dedup_tolerance, 25.0);
        assert_eq!(config.working_height, 600);
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");

        let mut config = ScanConfig::for_paper(PaperSize::Letter);
        config.failure_policy = FailurePolicy::Strict;
        config.output.max_height = Some(1200);
        config.save(&path).unwrap();

        let loaded = ScanConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scan.json");
        std::fs::write(&path, r#"{ "working_height": 0 }"#).unwrap();
        assert!(matches!(
            ScanConfig::load(&path),
            Err(DocrectError::InvalidConfig(_))
        ));
    }
}
