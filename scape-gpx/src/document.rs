//! GPX document model
//!
//! Only the parts of GPX 1.1 the simulator and tracker use are modelled:
//! metadata, tracks, segments and track points with their Garmin and
//! Soundscape extensions. Numeric values that GPX files commonly store as `-1`
//! for "unknown" are normalized to `None` when converted to a [`Location`].

use chrono::{DateTime, Utc};
use scape_common::geo::{is_valid_direction, is_valid_speed};
use scape_common::{Coordinate, Location};

use crate::index::GpxIndex;
use crate::provider::SimulatedActivity;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxDocument {
    pub creator: Option<String>,
    pub metadata: Option<GpxMetadata>,
    pub tracks: Vec<GpxTrack>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxMetadata {
    pub name: Option<String>,
    pub desc: Option<String>,
    pub time: Option<DateTime<Utc>>,
    /// Free-form keywords; the simulator reads `activity:` and `time_interval:` from them
    pub keywords: Option<String>,
    pub bounds: Option<GpxBounds>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GpxBounds {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl GpxBounds {
    /// Smallest box around `locations`, `None` when empty
    pub fn around<'a>(locations: impl IntoIterator<Item = &'a Location>) -> Option<Self> {
        locations.into_iter().fold(None, |bounds, location| {
            let Coordinate { latitude, longitude } = location.coordinate;
            Some(match bounds {
                None => GpxBounds {
                    min_latitude: latitude,
                    min_longitude: longitude,
                    max_latitude: latitude,
                    max_longitude: longitude,
                },
                Some(b) => GpxBounds {
                    min_latitude: b.min_latitude.min(latitude),
                    min_longitude: b.min_longitude.min(longitude),
                    max_latitude: b.max_latitude.max(latitude),
                    max_longitude: b.max_longitude.max(longitude),
                },
            })
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxTrack {
    pub name: Option<String>,
    pub segments: Vec<GpxSegment>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxSegment {
    pub points: Vec<GpxTrackPoint>,
}

/// Garmin `TrackPointExtension` values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GarminExtension {
    pub speed: Option<f64>,
    pub course: Option<f64>,
}

/// Values recorded by the Soundscape tracker
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SoundscapeExtension {
    pub horizontal_accuracy: Option<f64>,
    pub vertical_accuracy: Option<f64>,
    pub device_heading: Option<f64>,
    /// Older recordings store headings here instead of `device_heading`
    pub true_heading: Option<f64>,
    pub magnetic_heading: Option<f64>,
    pub heading_accuracy: Option<f64>,
    pub activity: Option<String>,
}

impl SoundscapeExtension {
    /// Device heading, falling back to the legacy true or magnetic heading
    pub fn resolved_device_heading(&self) -> Option<f64> {
        if self.device_heading.is_some() {
            return self.device_heading;
        }

        if let Some(heading) = self.true_heading.filter(|h| *h >= 0.0) {
            return Some(heading);
        }

        // Magnetic heading only counts when its accuracy is known
        match self.heading_accuracy {
            Some(accuracy) if accuracy >= 0.0 => self.magnetic_heading,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GpxExtensions {
    /// `<speed>` written directly under `<extensions>` by old recordings
    pub legacy_speed: Option<f64>,
    /// `<course>` written directly under `<extensions>` by old recordings
    pub legacy_course: Option<f64>,
    pub garmin: Option<GarminExtension>,
    pub soundscape: Option<SoundscapeExtension>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GpxTrackPoint {
    pub latitude: f64,
    pub longitude: f64,
    pub elevation: Option<f64>,
    pub time: Option<DateTime<Utc>>,
    pub course: Option<f64>,
    pub speed: Option<f64>,
    pub hdop: Option<f64>,
    pub vdop: Option<f64>,
    pub extensions: GpxExtensions,
}

/// A track point as a fix plus the values [`Location`] has no room for
#[derive(Debug, Clone, PartialEq)]
pub struct GpxLocation {
    pub location: Location,
    pub device_heading: Option<f64>,
    pub activity: Option<String>,
}

impl GpxLocation {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            device_heading: None,
            activity: None,
        }
    }

    pub fn with_device_heading(mut self, heading: f64) -> Self {
        self.device_heading = Some(heading);
        self
    }

    pub fn with_activity(mut self, activity: SimulatedActivity) -> Self {
        self.activity = Some(activity.as_str().to_string());
        self
    }
}

fn non_negative(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v >= 0.0)
}

impl GpxTrackPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            elevation: None,
            time: None,
            course: None,
            speed: None,
            hdop: None,
            vdop: None,
            extensions: GpxExtensions::default(),
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = Some(time);
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    pub fn has_soundscape_extension(&self) -> bool {
        self.extensions.soundscape.is_some()
    }

    /// Speed recorded in the file: explicit, then Garmin
    pub fn recorded_speed(&self) -> Option<f64> {
        self.speed
            .filter(|s| is_valid_speed(*s))
            .or_else(|| {
                self.extensions
                    .garmin
                    .as_ref()
                    .and_then(|g| g.speed)
                    .filter(|s| is_valid_speed(*s))
            })
    }

    /// Course recorded in the file: explicit, then Garmin
    pub fn recorded_course(&self) -> Option<f64> {
        self.course
            .filter(|c| is_valid_direction(*c))
            .or_else(|| {
                self.extensions
                    .garmin
                    .as_ref()
                    .and_then(|g| g.course)
                    .filter(|c| is_valid_direction(*c))
            })
    }

    /// Fix described by this point, without any synthesized values
    ///
    /// Accuracy comes from the dilution values unless the Soundscape extension
    /// carries it; speed and course from the legacy extension values unless
    /// the Garmin extension carries them.
    pub fn gpx_location(&self) -> GpxLocation {
        let extensions = &self.extensions;

        let mut speed = extensions.legacy_speed;
        let mut course = extensions.legacy_course;
        if let Some(garmin) = &extensions.garmin {
            speed = garmin.speed.or(speed);
            course = garmin.course.or(course);
        }

        let mut horizontal_accuracy = self.hdop;
        let mut vertical_accuracy = self.vdop;
        let mut device_heading = None;
        let mut activity = None;
        if let Some(soundscape) = &extensions.soundscape {
            horizontal_accuracy = soundscape.horizontal_accuracy.or(horizontal_accuracy);
            vertical_accuracy = soundscape.vertical_accuracy.or(vertical_accuracy);
            device_heading = soundscape.resolved_device_heading();
            activity = soundscape.activity.clone();
        }

        let location = Location {
            coordinate: self.coordinate(),
            altitude: self.elevation,
            horizontal_accuracy: non_negative(horizontal_accuracy),
            vertical_accuracy: non_negative(vertical_accuracy),
            course: course.filter(|c| is_valid_direction(*c)),
            speed: speed.filter(|s| is_valid_speed(*s)),
            timestamp: self.time,
        };

        GpxLocation {
            location,
            device_heading,
            activity,
        }
    }

    /// Track point recording a live fix, with Garmin and Soundscape extensions
    pub fn from_gpx_location(gpx_location: &GpxLocation) -> Self {
        let location = &gpx_location.location;

        let garmin = GarminExtension {
            speed: location.speed,
            course: location.course,
        };
        let soundscape = SoundscapeExtension {
            horizontal_accuracy: location.horizontal_accuracy,
            vertical_accuracy: location.vertical_accuracy,
            device_heading: gpx_location.device_heading,
            activity: gpx_location.activity.clone(),
            ..SoundscapeExtension::default()
        };

        Self {
            latitude: location.coordinate.latitude,
            longitude: location.coordinate.longitude,
            elevation: location.altitude,
            time: location.timestamp,
            course: None,
            speed: None,
            hdop: None,
            vdop: None,
            extensions: GpxExtensions {
                legacy_speed: None,
                legacy_course: None,
                garmin: Some(garmin),
                soundscape: Some(soundscape),
            },
        }
    }
}

impl GpxDocument {
    /// Single track, single segment document for a recording
    pub fn from_locations(locations: &[GpxLocation], creator: impl Into<String>) -> Self {
        let metadata = GpxMetadata {
            time: Some(scape_common::time::now()),
            bounds: GpxBounds::around(locations.iter().map(|l| &l.location)),
            ..GpxMetadata::default()
        };

        let segment = GpxSegment {
            points: locations.iter().map(GpxTrackPoint::from_gpx_location).collect(),
        };

        Self {
            creator: Some(creator.into()),
            metadata: Some(metadata),
            tracks: vec![GpxTrack {
                name: None,
                segments: vec![segment],
            }],
        }
    }

    /// Bounds-checked point lookup
    pub fn track_point(&self, index: GpxIndex) -> Option<&GpxTrackPoint> {
        self.tracks
            .get(index.track)?
            .segments
            .get(index.segment)?
            .points
            .get(index.point)
    }

    pub fn segment(&self, track: usize, segment: usize) -> Option<&GpxSegment> {
        self.tracks.get(track)?.segments.get(segment)
    }

    pub fn keywords(&self) -> Option<&str> {
        self.metadata.as_ref()?.keywords.as_deref()
    }

    /// Every track point, in track, segment, point order
    pub fn all_track_points(&self) -> Vec<&GpxTrackPoint> {
        self.indexed_points().map(|(_, point)| point).collect()
    }

    pub fn point_count(&self) -> usize {
        self.indexed_points().count()
    }

    pub fn indexed_points(&self) -> impl Iterator<Item = (GpxIndex, &GpxTrackPoint)> {
        self.tracks.iter().enumerate().flat_map(|(t, track)| {
            track.segments.iter().enumerate().flat_map(move |(s, segment)| {
                segment
                    .points
                    .iter()
                    .enumerate()
                    .map(move |(p, point)| (GpxIndex::new(t, s, p), point))
            })
        })
    }
}
