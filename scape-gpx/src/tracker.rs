//! GPX tracker
//!
//! Records live fixes while tracking is on and saves them as two GPX files
//! when it is switched off: the raw sensor fixes and the smoothed ones.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

use scape_common::time::{filename_stamp, now};

use crate::document::{GpxDocument, GpxLocation};
use crate::error::Result;
use crate::files::GpxFileManager;

const CREATOR: &str = "scape-gpx tracker";

#[derive(Default)]
struct TrackerState {
    is_tracking: bool,
    raw: Vec<GpxLocation>,
    smooth: Vec<GpxLocation>,
}

pub struct GpxTracker {
    files: GpxFileManager,
    state: Mutex<TrackerState>,
}

impl GpxTracker {
    pub fn new(files: GpxFileManager) -> Self {
        Self {
            files,
            state: Mutex::new(TrackerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TrackerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_tracking(&self) -> bool {
        self.lock().is_tracking
    }

    /// Discard anything recorded so far and start recording
    pub fn start_tracking(&self) {
        let mut state = self.lock();
        *state = TrackerState::default();
        state.is_tracking = true;
        info!("GPX tracking started");
    }

    /// Record a fix; ignored while not tracking
    pub fn track(&self, location: GpxLocation, raw: bool) {
        let mut state = self.lock();
        if !state.is_tracking {
            return;
        }
        if raw {
            state.raw.push(location);
        } else {
            state.smooth.push(location);
        }
    }

    pub fn recorded_counts(&self) -> (usize, usize) {
        let state = self.lock();
        (state.raw.len(), state.smooth.len())
    }

    /// Stop recording and save the fixes
    ///
    /// Returns the files written. An empty list is not saved. The recorded
    /// fixes are discarded even when saving fails.
    pub fn stop_tracking(&self) -> Result<Vec<PathBuf>> {
        let (raw, smooth) = {
            let mut state = self.lock();
            let taken = std::mem::take(&mut *state);
            (taken.raw, taken.smooth)
        };
        info!("GPX tracking stopped");

        let mut saved = Vec::new();
        for (locations, suffix) in [(raw, "raw"), (smooth, "smooth")] {
            if let Some(path) = self.save(&locations, suffix)? {
                saved.push(path);
            }
        }
        Ok(saved)
    }

    fn save(&self, locations: &[GpxLocation], suffix: &str) -> Result<Option<PathBuf>> {
        let Some(first) = locations.first() else {
            info!("No {} locations tracked, not saving GPX file", suffix);
            return Ok(None);
        };

        let started = first.location.timestamp.unwrap_or_else(now);
        let filename = format!("{}-{}", filename_stamp(&started), suffix);
        let content = GpxDocument::from_locations(locations, CREATOR).to_gpx_string()?;

        match self.files.create(&content, &filename) {
            Ok(path) => {
                debug!("Saved {} {} locations to {}", locations.len(), suffix, path.display());
                Ok(Some(path))
            }
            Err(e) => {
                error!("Error saving GPX file {}: {}", filename, e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use scape_common::Location;
    use tempfile::TempDir;

    fn fix(lat: f64, secs: u32) -> GpxLocation {
        let time = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, secs).unwrap();
        GpxLocation::new(Location::new(lat, 10.0).with_timestamp(time))
    }

    #[test]
    fn test_ignores_fixes_while_not_tracking() {
        let dir = TempDir::new().unwrap();
        let tracker = GpxTracker::new(GpxFileManager::new(dir.path()));

        tracker.track(fix(1.0, 0), true);
        assert_eq!(tracker.recorded_counts(), (0, 0));
        assert!(tracker.stop_tracking().unwrap().is_empty());
    }

    #[test]
    fn test_saves_raw_and_smooth() {
        let dir = TempDir::new().unwrap();
        let tracker = GpxTracker::new(GpxFileManager::new(dir.path()));

        tracker.start_tracking();
        tracker.track(fix(1.0, 5), true);
        tracker.track(fix(1.0001, 6), true);
        tracker.track(fix(1.00005, 7), false);
        assert_eq!(tracker.recorded_counts(), (2, 1));

        let saved = tracker.stop_tracking().unwrap();
        assert_eq!(
            saved,
            vec![
                dir.path().join("2024-05-01 09-30-05-raw.gpx"),
                dir.path().join("2024-05-01 09-30-07-smooth.gpx"),
            ]
        );
        assert!(!tracker.is_tracking());
        assert_eq!(tracker.recorded_counts(), (0, 0));
    }

    #[test]
    fn test_restart_discards_previous_fixes() {
        let dir = TempDir::new().unwrap();
        let tracker = GpxTracker::new(GpxFileManager::new(dir.path()));

        tracker.start_tracking();
        tracker.track(fix(1.0, 0), true);
        tracker.start_tracking();
        tracker.track(fix(2.0, 1), false);

        let saved = tracker.stop_tracking().unwrap();
        assert_eq!(saved.len(), 1);
        assert!(saved[0].to_string_lossy().ends_with("-smooth.gpx"));
    }
}
