//! Significant-change gate
//!
//! While significant-change monitoring is on, a fix is only reported once the
//! user has left the place they were in: the footprint containing the origin
//! fix when there is one, otherwise a circle around the origin fix.

use scape_common::geo::Polygon;
use scape_common::Location;
use tracing::trace;

#[derive(Debug, Clone, PartialEq)]
pub enum SignificantChangeOrigin {
    /// Report once the user leaves this footprint
    Region(Polygon),
    /// Report once the user is more than `threshold_m` from this fix
    Location { location: Location, threshold_m: f64 },
}

impl SignificantChangeOrigin {
    /// Origin for `location`, preferring the first footprint that contains it
    pub fn new(location: &Location, regions: &[Polygon], threshold_m: f64) -> Self {
        match regions.iter().find(|r| r.contains(&location.coordinate)) {
            Some(region) => SignificantChangeOrigin::Region(region.clone()),
            None => SignificantChangeOrigin::Location {
                location: location.clone(),
                threshold_m,
            },
        }
    }

    pub fn should_update(&self, location: &Location) -> bool {
        match self {
            SignificantChangeOrigin::Region(region) => !region.contains(&location.coordinate),
            SignificantChangeOrigin::Location {
                location: origin,
                threshold_m,
            } => {
                let distance = origin.distance_to(location);
                trace!("Significant change check: {:.1} m of {:.1} m", distance, threshold_m);
                distance > *threshold_m
            }
        }
    }
}
