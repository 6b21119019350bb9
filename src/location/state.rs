use std::fmt::Display;

use crate::models::Coordinate;

/// Progress of acquiring a device location
#[derive(Debug, Clone, PartialEq, Default)]
pub enum LocationState {
    #[default]
    Idle,
    PermissionRequired,
    PermissionGranted,
    PermissionDenied,
    Loading,
    Success(Coordinate),
    Error(String),
}

impl LocationState {
    /// State after the host reports whether location access is allowed
    #[must_use]
    pub fn from_permission(granted: bool) -> Self {
        if granted {
            Self::PermissionGranted
        } else {
            Self::PermissionDenied
        }
    }

    /// Final state of an acquisition attempt
    #[must_use]
    pub fn from_fix(fix: Option<Coordinate>) -> Self {
        match fix {
            Some(coordinate) if coordinate.is_valid() => Self::Success(coordinate),
            Some(coordinate) => Self::Error(format!(
                "Provider returned an out-of-range coordinate ({})",
                coordinate.format_coordinates()
            )),
            None => Self::Error("Location is not available".to_string()),
        }
    }

    #[must_use]
    pub fn coordinate(&self) -> Option<Coordinate> {
        match self {
            Self::Success(coordinate) => Some(*coordinate),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Success(_) | Self::Error(_) | Self::PermissionDenied
        )
    }
}

impl Display for LocationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PermissionRequired => write!(f, "permission required"),
            Self::PermissionGranted => write!(f, "permission granted"),
            Self::PermissionDenied => write!(f, "permission denied"),
            Self::Loading => write!(f, "locating..."),
            Self::Success(coordinate) => write!(f, "{}", coordinate.format_coordinates()),
            Self::Error(message) => write!(f, "error: {message}"),
        }
    }
}
