//! Error types for highway_planner

use std::fmt;

/// Main error type for the planning pipeline and its collaborators
#[derive(Debug)]
pub enum PlannerError {
    /// Waypoint table missing, empty or inconsistent
    MapError(String),
    /// Trajectory synthesis failed
    PlanningError(String),
    /// Numerical computation failed (singular spline system, etc.)
    NumericalError(String),
    /// Invalid parameter
    InvalidParameter(String),
    /// Inbound frame could not be interpreted
    ProtocolError(String),
    /// I/O error
    IoError(std::io::Error),
    /// Waypoint file parse error
    CsvError(csv::Error),
    /// Telemetry payload parse error
    JsonError(serde_json::Error),
    /// Visualization error
    VisualizationError(String),
}

impl fmt::Display for PlannerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlannerError::MapError(msg) => write!(f, "Map error: {}", msg),
            PlannerError::PlanningError(msg) => write!(f, "Planning error: {}", msg),
            PlannerError::NumericalError(msg) => write!(f, "Numerical error: {}", msg),
            PlannerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
            PlannerError::ProtocolError(msg) => write!(f, "Protocol error: {}", msg),
            PlannerError::IoError(e) => write!(f, "I/O error: {}", e),
            PlannerError::CsvError(e) => write!(f, "CSV error: {}", e),
            PlannerError::JsonError(e) => write!(f, "JSON error: {}", e),
            PlannerError::VisualizationError(msg) => write!(f, "Visualization error: {}", msg),
        }
    }
}

impl std::error::Error for PlannerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PlannerError::IoError(e) => Some(e),
            PlannerError::CsvError(e) => Some(e),
            PlannerError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for PlannerError {
    fn from(e: std::io::Error) -> Self {
        PlannerError::IoError(e)
    }
}

impl From<csv::Error> for PlannerError {
    fn from(e: csv::Error) -> Self {
        PlannerError::CsvError(e)
    }
}

impl From<serde_json::Error> for PlannerError {
    fn from(e: serde_json::Error) -> Self {
        PlannerError::JsonError(e)
    }
}

/// Result type alias for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PlannerError::PlanningError("anchors not monotonic".to_string());
        assert_eq!(format!("{}", err), "Planning error: anchors not monotonic");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: PlannerError = io_err.into();
        assert!(matches!(err, PlannerError::IoError(_)));
    }

    #[test]
    fn test_error_from_json() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: PlannerError = json_err.into();
        assert!(matches!(err, PlannerError::JsonError(_)));
        assert!(std::error::Error::source(&err).is_some());
    }
}
