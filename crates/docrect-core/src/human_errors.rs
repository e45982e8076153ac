// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Human-readable messages for scan problems.
//
// Detection failures are not errors: the page is still cropped (to the whole
// photo). These messages let a caller warn the user that the crop may be off.

use crate::error::DocrectError;
use crate::types::DetectionFailure;

/// Severity of a problem from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Output was produced, but probably not the crop the user wanted.
    Warning,
    /// User must do something (retake the photo, fix a setting).
    ActionRequired,
    /// Cannot be fixed by retrying: unreadable file and the like.
    Permanent,
}

/// A human-readable problem with a plain English message and a suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain English summary.
    pub message: String,
    /// What the user should try.
    pub suggestion: String,
    /// Severity level.
    pub severity: Severity,
}

/// Explain a detection fallback in plain English.
pub fn humanize_failure(failure: &DetectionFailure) -> HumanError {
    match failure {
        DetectionFailure::NoLines => HumanError {
            message: "We couldn't see any page edges in this photo.".into(),
            suggestion: "The whole photo was used. Try a darker background behind the page.".into(),
            severity: Severity::Warning,
        },

        DetectionFailure::IncompleteBoundary { .. } => HumanError {
            message: "We only found the edges on one side of the page.".into(),
            suggestion: "The whole photo was used. Make sure all four edges of the page are in the picture.".into(),
            severity: Severity::Warning,
        },

        DetectionFailure::ParallelLines { .. }
        | DetectionFailure::CornerOutOfBounds { .. }
        | DetectionFailure::Unrectifiable => {
            HumanError {
                message: "The page corners didn't line up.".into(),
                suggestion: "The whole photo was used. Try taking the photo from straight above the page.".into(),
                severity: Severity::Warning,
            }
        }
    }
}

/// Convert a `DocrectError` into a `HumanError`.
pub fn humanize_error(err: &DocrectError) -> HumanError {
    match err {
        DocrectError::NoDocumentDetected(failure) => HumanError {
            severity: Severity::ActionRequired,
            ..humanize_failure(failure)
        },

        DocrectError::ImageError(_) => HumanError {
            message: "There's a problem with this image.".into(),
            suggestion: "The image may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        DocrectError::DegenerateQuad(_) => HumanError {
            message: "The page outline was too thin to straighten.".into(),
            suggestion: "Try taking the photo again with the whole page visible.".into(),
            severity: Severity::ActionRequired,
        },

        DocrectError::InvalidConfig(detail) => HumanError {
            message: "A scan setting has an impossible value.".into(),
            suggestion: format!("Fix the configuration and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        DocrectError::Cancelled => HumanError {
            message: "The scan was stopped.".into(),
            suggestion: "Start it again when you're ready.".into(),
            severity: Severity::Warning,
        },

        DocrectError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Check the path and try again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "We don't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Try again. If this keeps happening, your disk may be full.".into(),
                    severity: Severity::Permanent,
                }
            }
        }

        DocrectError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check that the configuration file is valid JSON.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
