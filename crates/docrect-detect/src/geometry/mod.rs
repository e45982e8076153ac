// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Geometry primitives: Hough-form lines, normalization and intersections.

pub mod line;

pub use line::{HoughLine, Line, normalize};
