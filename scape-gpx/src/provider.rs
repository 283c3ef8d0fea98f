//! Location provider contract
//!
//! Sensor values reach consumers as [`SensorEvent`]s on a broadcast channel.
//! Location, course and device heading updates are switched on and off
//! independently; a provider only produces the kinds that are switched on.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::sync::broadcast;

use scape_common::Location;

/// Motion activity reported while a track is replayed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulatedActivity {
    Stationary,
    Walking,
    Automotive,
}

impl SimulatedActivity {
    pub fn as_str(&self) -> &'static str {
        match self {
            SimulatedActivity::Stationary => "stationary",
            SimulatedActivity::Walking => "walking",
            SimulatedActivity::Automotive => "automotive",
        }
    }
}

impl fmt::Display for SimulatedActivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimulatedActivity {
    type Err = scape_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stationary" => Ok(SimulatedActivity::Stationary),
            "walking" => Ok(SimulatedActivity::Walking),
            "automotive" => Ok(SimulatedActivity::Automotive),
            other => Err(scape_common::Error::Parse(format!("unknown activity '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SensorEvent {
    Location(Location),
    /// Direction of travel; `None` when the fix has no valid course
    Course {
        course: Option<f64>,
        speed: Option<f64>,
    },
    /// Direction the device points; `None` when unknown
    DeviceHeading(Option<f64>),
    Activity(SimulatedActivity),
    /// No more fixes will follow unless the provider is moved back
    SimulationEnded,
}

/// Source of location, course and device heading updates
pub trait LocationProvider: Send + Sync {
    fn start_location_updates(&self);
    fn stop_location_updates(&self);

    fn start_course_updates(&self);
    fn stop_course_updates(&self);

    fn start_device_heading_updates(&self);
    fn stop_device_heading_updates(&self);

    /// Only report fixes that moved significantly; `false` if unsupported right now
    fn start_monitoring_significant_location_changes(&self) -> bool;
    fn stop_monitoring_significant_location_changes(&self);

    fn subscribe(&self) -> broadcast::Receiver<SensorEvent>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_names() {
        for activity in [
            SimulatedActivity::Stationary,
            SimulatedActivity::Walking,
            SimulatedActivity::Automotive,
        ] {
            assert_eq!(activity.as_str().parse::<SimulatedActivity>().unwrap(), activity);
        }
        assert!("cycling".parse::<SimulatedActivity>().is_err());
        assert_eq!(SimulatedActivity::Automotive.to_string(), "automotive");
    }
}
