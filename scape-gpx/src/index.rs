//! Position of a track point within a GPX document

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::document::GpxDocument;

/// `(track, segment, point)` coordinates of a track point
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GpxIndex {
    pub track: usize,
    pub segment: usize,
    pub point: usize,
}

impl GpxIndex {
    pub const ZERO: GpxIndex = GpxIndex {
        track: 0,
        segment: 0,
        point: 0,
    };

    pub fn new(track: usize, segment: usize, point: usize) -> Self {
        Self {
            track,
            segment,
            point,
        }
    }

    pub fn next_point(&self) -> Self {
        Self::new(self.track, self.segment, self.point + 1)
    }

    pub fn next_segment(&self) -> Self {
        Self::new(self.track, self.segment + 1, 0)
    }

    pub fn next_track(&self) -> Self {
        Self::new(self.track + 1, 0, 0)
    }

    /// Same segment, `points` further along (saturating at zero)
    pub fn adding_points(&self, points: i64) -> Self {
        let point = if points < 0 {
            self.point.saturating_sub(points.unsigned_abs() as usize)
        } else {
            self.point.saturating_add(points as usize)
        };
        Self::new(self.track, self.segment, point)
    }

    /// Index `points` away within `document`
    ///
    /// Jumping before the segment start clamps to point 0. Jumping past the
    /// segment end lands on the first point of the next segment, then of the
    /// next track, skipping segments without points. Returns `None` past the
    /// last point or when `self` does not name an existing segment.
    pub fn jumped(&self, document: &GpxDocument, points: i64) -> Option<Self> {
        let track = document.tracks.get(self.track)?;
        let segment = track.segments.get(self.segment)?;

        if points < 0 {
            return Some(self.adding_points(points));
        }
        // Overflow counts as past the end of the segment
        let target = usize::try_from(points)
            .ok()
            .and_then(|step| self.point.checked_add(step));
        if let Some(target) = target.filter(|t| *t < segment.points.len()) {
            return Some(Self::new(self.track, self.segment, target));
        }
        self.next_non_empty_segment(document)
    }

    /// First point of the next segment holding points, in this track or a later one
    fn next_non_empty_segment(&self, document: &GpxDocument) -> Option<Self> {
        document
            .tracks
            .iter()
            .enumerate()
            .skip(self.track)
            .find_map(|(t, track)| {
                let from = if t == self.track { self.segment + 1 } else { 0 };
                track
                    .segments
                    .iter()
                    .enumerate()
                    .skip(from)
                    .find(|(_, segment)| !segment.points.is_empty())
                    .map(|(s, _)| Self::new(t, s, 0))
            })
    }
}

impl fmt::Display for GpxIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.track, self.segment, self.point)
    }
}
