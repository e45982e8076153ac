// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core value types shared by the detector, the rectifier and the CLI.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in image-pixel space. `x` grows to the right, `y` grows downwards.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Scale `x` by `sx` and `y` by `sy`.
    pub fn scaled(&self, sx: f64, sy: f64) -> Point {
        Point::new(self.x * sx, self.y * sy)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self::new(x, y)
    }
}

/// Standard paper sizes, used to derive the output aspect ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSize {
    A4,
    A3,
    A5,
    Letter,
    Legal,
    Tabloid,
    Custom { width_mm: u32, height_mm: u32 },
}

impl PaperSize {
    /// Dimensions in millimetres (width, height).
    pub fn dimensions_mm(&self) -> (u32, u32) {
        match self {
            Self::A4 => (210, 297),
            Self::A3 => (297, 420),
            Self::A5 => (148, 210),
            Self::Letter => (216, 279),
            Self::Legal => (216, 356),
            Self::Tabloid => (279, 432),
            Self::Custom {
                width_mm,
                height_mm,
            } => (*width_mm, *height_mm),
        }
    }

    /// Portrait aspect ratio (height / width) of the sheet.
    ///
    /// Returns `None` for a custom size with a zero width.
    pub fn aspect_ratio(&self) -> Option<f64> {
        let (w, h) = self.dimensions_mm();
        if w == 0 {
            return None;
        }
        Some(h as f64 / w as f64)
    }
}

impl std::str::FromStr for PaperSize {
    type Err = String;

    /// Parse a named size (`a4`, `letter`, ...) or a custom `WxH` in millimetres.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "a4" => Ok(Self::A4),
            "a3" => Ok(Self::A3),
            "a5" => Ok(Self::A5),
            "letter" => Ok(Self::Letter),
            "legal" => Ok(Self::Legal),
            "tabloid" => Ok(Self::Tabloid),
            other => {
                let (w, h) = other
                    .split_once('x')
                    .ok_or_else(|| format!("unknown paper size '{}'", s))?;
                let width_mm = w
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid paper width in '{}'", s))?;
                let height_mm = h
                    .trim()
                    .parse()
                    .map_err(|_| format!("invalid paper height in '{}'", s))?;
                Ok(Self::Custom {
                    width_mm,
                    height_mm,
                })
            }
        }
    }
}

/// Why a detection fell back to the full image.
///
/// This is a diagnostic value, not a hard error: the scanner still produces
/// corners (the image bounds) unless it runs with the strict failure policy.
#[derive(Debug, Clone, Copy, PartialEq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DetectionFailure {
    /// The edge map produced no line candidates at all.
    #[error("no lines detected")]
    NoLines,

    /// Candidates never filled both orientation pairs; `sides` boundary
    /// lines were kept.
    #[error("boundary incomplete: {sides} of 4 sides found")]
    IncompleteBoundary { sides: usize },

    /// The two lines meeting at `corner` are parallel.
    #[error("boundary lines at corner {corner} are parallel")]
    ParallelLines { corner: usize },

    /// The intersection for `corner` lies outside the image.
    #[error("corner {corner} at ({x:.1}, {y:.1}) lies outside the image")]
    CornerOutOfBounds { corner: usize, x: f64, y: f64 },

    /// The corners were found but cannot be ordered into a usable quadrilateral.
    #[error("detected corners do not form a usable quadrilateral")]
    Unrectifiable,
}

/// The result of one detection call.
///
/// `corners` always holds four points in the coordinate space of the image
/// that was passed in. When `failure` is set they are the image bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub corners: [Point; 4],
    pub width: u32,
    pub height: u32,
    pub failure: Option<DetectionFailure>,
}

impl Detection {
    /// A successful detection.
    pub fn found(corners: [Point; 4], width: u32, height: u32) -> Self {
        Self {
            corners,
            width,
            height,
            failure: None,
        }
    }

    /// The fallback: treat the whole photo as the document.
    pub fn full_image(width: u32, height: u32, failure: DetectionFailure) -> Self {
        Self {
            corners: full_image_corners(width, height),
            width,
            height,
            failure: Some(failure),
        }
    }

    pub fn is_found(&self) -> bool {
        self.failure.is_none()
    }
}

/// The four image bounds in tl, tr, br, bl order.
pub fn full_image_corners(width: u32, height: u32) -> [Point; 4] {
    let (w, h) = (width as f64, height as f64);
    [
        Point::new(0.0, 0.0),
        Point::new(w, 0.0),
        Point::new(w, h),
        Point::new(0.0, h),
    ]
}
