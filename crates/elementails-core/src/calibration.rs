//! Interactive calibration of a map image's hex layout.
//!
//! The operator clicks the pixel centers of axial `(0, 0)`, `(1, 0)` and
//! `(0, 1)` in that order. The first two clicks fix the radius and origin;
//! the third is only used to check the estimate. Nothing is committed until
//! all three points have been collected, so a cancelled or half-finished
//! session never disturbs the current layout.

use crate::hex::{HexLayout, LayoutError, PixelPoint};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Number of clicks the protocol needs.
pub const CALIBRATION_POINTS: usize = 3;

/// Errors from calibration input, settings, or persistence.
#[derive(Debug, Error)]
pub enum CalibrationError {
    #[error("calibration point must be finite, got ({0}, {1})")]
    NonFinitePoint(f64, f64),
    #[error("invalid calibrated layout: {0}")]
    Layout(#[from] LayoutError),
    #[error("failed to access calibration file: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed calibration data: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Bounds and tolerances applied while deriving a layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalibrationSettings {
    /// Smallest accepted radius in pixels.
    pub radius_min: f64,
    /// Largest accepted radius in pixels.
    pub radius_max: f64,
    /// Allowed distance between predicted and clicked `(0, 1)`, as a ratio of the radius.
    pub misalignment_tolerance: f64,
}

impl Default for CalibrationSettings {
    fn default() -> Self {
        Self {
            radius_min: 10.0,
            radius_max: 120.0,
            misalignment_tolerance: 0.6,
        }
    }
}

/// Result of a completed calibration.
#[derive(Clone, Debug, PartialEq)]
pub struct CalibrationOutcome {
    /// The derived layout (radius already clamped).
    pub layout: HexLayout,
    /// The three clicked points, in protocol order.
    pub points: [PixelPoint; CALIBRATION_POINTS],
    /// Where `(0, 1)` should be under the derived layout.
    pub predicted_third: PixelPoint,
    /// Distance between the predicted and clicked `(0, 1)`.
    pub error: f64,
    /// The error exceeded the tolerance; the layout is a best-effort estimate.
    pub misaligned: bool,
    /// The raw radius fell outside the accepted range and was clamped.
    pub clamped: bool,
}

/// Derive a layout from three clicks.
///
/// `origin = P0`. Neighbors one `q` step apart sit `1.5 * radius` apart
/// horizontally, so `radius = |P1.x - P0.x| / 1.5`. Misalignment of the
/// third point is reported, never rejected.
pub fn derive_calibration(
    points: [PixelPoint; CALIBRATION_POINTS],
    settings: &CalibrationSettings,
) -> Result<CalibrationOutcome, CalibrationError> {
    if let Some(bad) = points.iter().find(|p| !p.is_finite()) {
        return Err(CalibrationError::NonFinitePoint(bad.x, bad.y));
    }
    let [p0, p1, p2] = points;

    let raw_radius = (p1.x - p0.x).abs() / 1.5;
    let radius = raw_radius.max(settings.radius_min).min(settings.radius_max);
    let clamped = radius != raw_radius;
    let layout = HexLayout::new(radius, p0)?;

    let predicted_third = PixelPoint::new(p0.x, p0.y + layout.step_y());
    let error = predicted_third.distance(&p2);
    let misaligned = error > settings.misalignment_tolerance * radius;

    if clamped {
        warn!(raw_radius, radius, "calibration radius out of range, clamped");
    }
    if misaligned {
        warn!(
            error,
            tolerance = settings.misalignment_tolerance * radius,
            "calibration points misaligned, using best-effort estimate"
        );
    }

    Ok(CalibrationOutcome {
        layout,
        points,
        predicted_third,
        error,
        misaligned,
        clamped,
    })
}

/// Progress of a calibration session.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum CalibrationState {
    #[default]
    AwaitingFirst,
    AwaitingSecond {
        first: PixelPoint,
    },
    AwaitingThird {
        first: PixelPoint,
        second: PixelPoint,
    },
}

impl CalibrationState {
    /// Number of points collected so far.
    pub fn collected(&self) -> usize {
        match self {
            CalibrationState::AwaitingFirst => 0,
            CalibrationState::AwaitingSecond { .. } => 1,
            CalibrationState::AwaitingThird { .. } => 2,
        }
    }
}

/// What happened after feeding one point.
#[derive(Clone, Debug, PartialEq)]
pub enum CalibrationStep {
    /// More points are needed.
    Pending { collected: usize },
    /// All points collected; the new layout has been committed.
    Complete(CalibrationOutcome),
}

/// Three-click calibration state machine holding the committed layout.
#[derive(Clone, Debug)]
pub struct CalibrationEngine {
    layout: HexLayout,
    state: CalibrationState,
    settings: CalibrationSettings,
}

impl CalibrationEngine {
    /// Start from an existing (default or previously saved) layout.
    pub fn new(layout: HexLayout, settings: CalibrationSettings) -> Self {
        Self {
            layout,
            state: CalibrationState::AwaitingFirst,
            settings,
        }
    }

    /// The last committed layout.
    pub fn layout(&self) -> &HexLayout {
        &self.layout
    }

    pub fn state(&self) -> CalibrationState {
        self.state
    }

    pub fn is_in_progress(&self) -> bool {
        self.state != CalibrationState::AwaitingFirst
    }

    /// Feed the next clicked point (image-local coordinates).
    ///
    /// A non-finite point is rejected and leaves the session where it was.
    pub fn push_point(&mut self, point: PixelPoint) -> Result<CalibrationStep, CalibrationError> {
        if !point.is_finite() {
            return Err(CalibrationError::NonFinitePoint(point.x, point.y));
        }

        match self.state {
            CalibrationState::AwaitingFirst => {
                self.state = CalibrationState::AwaitingSecond { first: point };
                Ok(CalibrationStep::Pending { collected: 1 })
            }
            CalibrationState::AwaitingSecond { first } => {
                self.state = CalibrationState::AwaitingThird {
                    first,
                    second: point,
                };
                Ok(CalibrationStep::Pending { collected: 2 })
            }
            CalibrationState::AwaitingThird { first, second } => {
                let outcome = derive_calibration([first, second, point], &self.settings)?;
                self.layout = outcome.layout;
                self.state = CalibrationState::AwaitingFirst;
                info!(
                    radius = outcome.layout.radius(),
                    origin_x = outcome.layout.origin().x,
                    origin_y = outcome.layout.origin().y,
                    "calibration committed"
                );
                Ok(CalibrationStep::Complete(outcome))
            }
        }
    }

    /// Drop any collected points; the committed layout is untouched.
    pub fn cancel(&mut self) {
        self.state = CalibrationState::AwaitingFirst;
    }
}

/// On-disk form of a calibration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SavedCalibration {
    pub radius: f64,
    pub origin: PixelPoint,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<[PixelPoint; CALIBRATION_POINTS]>,
}

impl SavedCalibration {
    pub fn from_layout(layout: &HexLayout) -> Self {
        Self {
            radius: layout.radius(),
            origin: layout.origin(),
            points: None,
        }
    }

    pub fn from_outcome(outcome: &CalibrationOutcome) -> Self {
        Self {
            points: Some(outcome.points),
            ..Self::from_layout(&outcome.layout)
        }
    }

    /// Validate and turn back into a layout.
    pub fn to_layout(&self) -> Result<HexLayout, CalibrationError> {
        Ok(HexLayout::new(self.radius, self.origin)?)
    }

    pub fn to_json(&self) -> Result<String, CalibrationError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, CalibrationError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CalibrationError> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, CalibrationError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }
}
