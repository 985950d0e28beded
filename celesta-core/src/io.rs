//! Performance file loading.
//!
//! Performances are stored as JSON renderings of
//! [`Performance`](celesta_types::Performance); decoding from container
//! formats such as standard MIDI files happens upstream.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use celesta_types::Performance;

/// Error type for performance loading.
#[derive(Debug)]
pub enum PerformanceLoadError {
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl From<std::io::Error> for PerformanceLoadError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for PerformanceLoadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

impl std::fmt::Display for PerformanceLoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "IO error: {}", e),
            Self::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for PerformanceLoadError {}

/// Read a performance from a JSON file.
pub fn load_performance(path: &Path) -> Result<Performance, PerformanceLoadError> {
    let file = File::open(path)?;
    let performance = serde_json::from_reader(BufReader::new(file))?;
    Ok(performance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use celesta_types::{PerformanceTrack, TimedEvent, ToneId, TrackEvent};
    use std::io::Write;

    #[test]
    fn load_round_trips_a_written_performance() {
        let performance = Performance::new(vec![PerformanceTrack::new(vec![
            TimedEvent::new(
                0,
                TrackEvent::NoteOn {
                    tone: ToneId::new(60),
                    velocity: 80,
                },
            ),
            TimedEvent::new(12, TrackEvent::NoteOff { tone: ToneId::new(60) }),
        ])]);

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&performance).unwrap().as_bytes())
            .unwrap();

        let loaded = load_performance(file.path()).unwrap();
        assert_eq!(loaded, performance);
    }

    #[test]
    fn missing_file_reports_io_error() {
        let err = load_performance(Path::new("/nonexistent/performance.json")).unwrap_err();
        assert!(matches!(err, PerformanceLoadError::Io(_)));
    }

    #[test]
    fn malformed_json_reports_json_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let err = load_performance(file.path()).unwrap_err();
        assert!(matches!(err, PerformanceLoadError::Json(_)));
    }
}
