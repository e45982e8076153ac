// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Lines in Hough (normal) form: `x * cos(angle) + y * sin(angle) = distance`.

use std::f64::consts::PI;

use docrect_core::Point;

/// Below this determinant two lines are treated as parallel.
const PARALLEL_EPSILON: f64 = 1e-6;

/// A raw line candidate as produced by a line transform.
///
/// `distance` may be negative; see [`normalize`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoughLine {
    pub distance: f64,
    /// Angle of the line normal in radians.
    pub angle: f64,
}

impl HoughLine {
    pub const fn new(distance: f64, angle: f64) -> Self {
        Self { distance, angle }
    }
}

/// Bring a `(distance, angle)` pair into canonical form: `distance >= 0` and
/// `angle` in `[-PI, PI)`. The geometric line is unchanged.
pub fn normalize(distance: f64, angle: f64) -> (f64, f64) {
    let (distance, angle) = if distance < 0.0 {
        (-distance, angle - PI)
    } else {
        (distance, angle)
    };
    (distance, wrap_angle(angle))
}

fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// A normalized line with its normal vector cached.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Line {
    distance: f64,
    angle: f64,
    cos: f64,
    sin: f64,
}

impl Line {
    /// Build a line from any `(distance, angle)` pair, normalizing it first.
    pub fn new(distance: f64, angle: f64) -> Self {
        let (distance, angle) = normalize(distance, angle);
        let (sin, cos) = angle.sin_cos();
        Self {
            distance,
            angle,
            cos,
            sin,
        }
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn angle(&self) -> f64 {
        self.angle
    }

    pub fn cos(&self) -> f64 {
        self.cos
    }

    pub fn sin(&self) -> f64 {
        self.sin
    }

    /// Angle in `[0, PI]` between the two unit normals.
    ///
    /// The dot product is clamped before `acos` so rounding near parallel
    /// and anti-parallel normals never yields NaN.
    pub fn angular_separation(&self, other: &Line) -> f64 {
        let dot = self.cos * other.cos + self.sin * other.sin;
        dot.clamp(-1.0, 1.0).acos()
    }

    /// True when both the distances and the raw angles are within tolerance.
    pub fn is_near(&self, other: &Line, distance_tolerance: f64, angle_tolerance: f64) -> bool {
        (self.distance - other.distance).abs() <= distance_tolerance
            && (self.angle - other.angle).abs() <= angle_tolerance
    }

    /// Intersection point of two lines, or `None` when they are parallel.
    pub fn intersection(&self, other: &Line) -> Option<Point> {
        let d = self.cos * other.sin - other.cos * self.sin;
        if d.abs() < PARALLEL_EPSILON {
            return None;
        }
        let x = (self.distance * other.sin - other.distance * self.sin) / d;
        let y = (self.cos * other.distance - other.cos * self.distance) / d;
        let point = Point::new(x, y);
        point.is_finite().then_some(point)
    }
}

impl From<HoughLine> for Line {
    fn from(raw: HoughLine) -> Self {
        Line::new(raw.distance, raw.angle)
    }
}
