//! Intersection callouts
//!
//! Far from the intersection only its name is announced. Once the user is
//! within [`ARRIVAL_DISTANCE_M`], each road leaving the intersection is called
//! out from the direction it goes, skipping the road the user arrived on.

use scape_common::geo::add_degrees;
use scape_common::Location;

use crate::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutMeta, CalloutOrigin};
use crate::sound::{Glyph, Sound, Sounds};

/// Within this distance the full road layout is announced
pub const ARRIVAL_DISTANCE_M: f64 = 35.0;

/// Road leaving an intersection
#[derive(Debug, Clone, PartialEq)]
pub struct IntersectionRoad {
    pub name: String,
    /// Degrees clockwise from north, measured from the intersection
    pub bearing: f64,
}

impl IntersectionRoad {
    pub fn new(name: impl Into<String>, bearing: f64) -> Self {
        Self {
            name: name.into(),
            bearing,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Intersection {
    pub name: String,
    pub location: Location,
    pub roads: Vec<IntersectionRoad>,
}

/// Coarse direction of a road relative to the user's heading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDirection {
    Ahead,
    Right,
    Behind,
    Left,
    Unknown,
}

impl RelativeDirection {
    /// Four 90° windows centered on ahead, right, behind and left
    pub fn from_relative_angle(angle: f64) -> Self {
        if angle.is_nan() || angle < 0.0 {
            return RelativeDirection::Unknown;
        }

        let angle = angle % 360.0;
        if angle > 315.0 || angle <= 45.0 {
            RelativeDirection::Ahead
        } else if angle <= 135.0 {
            RelativeDirection::Right
        } else if angle <= 225.0 {
            RelativeDirection::Behind
        } else {
            RelativeDirection::Left
        }
    }

    fn string_key(&self) -> Option<&'static str> {
        match self {
            RelativeDirection::Ahead => Some("directions.name_continues_ahead"),
            RelativeDirection::Right => Some("directions.name_goes_right"),
            RelativeDirection::Left => Some("directions.name_goes_left"),
            RelativeDirection::Behind | RelativeDirection::Unknown => None,
        }
    }

    /// Compass heading the road's callout is rendered from
    fn compass(&self, heading: f64) -> f64 {
        match self {
            RelativeDirection::Right => add_degrees(heading, 90.0),
            RelativeDirection::Left => add_degrees(heading, 270.0),
            _ => heading,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntersectionCallout {
    meta: CalloutMeta,
    intersection: Intersection,
    /// User heading when the callout was generated
    heading: f64,
}

impl IntersectionCallout {
    pub fn new(origin: CalloutOrigin, intersection: Intersection, heading: f64) -> Self {
        Self {
            meta: CalloutMeta::new(origin),
            intersection,
            heading,
        }
    }

    pub fn intersection(&self) -> &Intersection {
        &self.intersection
    }

    fn road_sounds(&self, heading: f64, env: &CalloutEnvironment, sounds: &mut Vec<Box<dyn Sound>>) {
        for road in &self.intersection.roads {
            let direction = RelativeDirection::from_relative_angle(add_degrees(road.bearing, -heading));
            let Some(key) = direction.string_key() else {
                continue;
            };

            let text = env.string(key, &[&road.name]);
            sounds.push(Box::new(env.tts(text).compass(direction.compass(heading))));
        }
    }
}

impl Callout for IntersectionCallout {
    fn meta(&self) -> &CalloutMeta {
        &self.meta
    }

    fn log_category(&self) -> &'static str {
        "intersection"
    }

    fn include_in_history(&self) -> bool {
        true
    }

    fn prefix_sound(&self, env: &CalloutEnvironment) -> Option<Box<dyn Sound>> {
        Some(Box::new(env.glyph(Glyph::PoiSense).relative(0.0)))
    }

    fn sounds(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds {
        let mut sounds: Vec<Box<dyn Sound>> = Vec::new();
        let location = self.intersection.location.clone();

        if ctx.is_repeat {
            let Some(user) = ctx.location.as_ref() else {
                return Sounds::empty();
            };

            if user.distance_to(&location) > ARRIVAL_DISTANCE_M {
                let text = env.string("intersection.named_intersection", &[&self.intersection.name]);
                sounds.push(Box::new(env.tts(text).localized(location)));
                return Sounds::new(sounds);
            }
        }

        let approaching = format!("{}.", env.string("intersection.approaching_intersection", &[]));
        sounds.push(Box::new(env.tts(approaching).localized(location)));

        let heading = ctx.heading.unwrap_or(self.heading);
        self.road_sounds(heading, env, &mut sounds);

        Sounds::new(sounds)
    }

    fn debug_description(&self) -> String {
        format!("[IntersectionCallout] {}", self.intersection.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::test_support::environment;
    use crate::sound::SoundType;

    fn crossing() -> Intersection {
        Intersection {
            name: "Main and 1st".to_string(),
            location: Location::new(0.0, 0.0),
            roads: vec![
                IntersectionRoad::new("Main Street", 0.0),
                IntersectionRoad::new("1st Avenue", 90.0),
                IntersectionRoad::new("Main Street", 180.0),
                IntersectionRoad::new("Old Road", 270.0),
            ],
        }
    }

    #[test]
    fn test_relative_direction_windows() {
        assert_eq!(RelativeDirection::from_relative_angle(0.0), RelativeDirection::Ahead);
        assert_eq!(RelativeDirection::from_relative_angle(45.0), RelativeDirection::Ahead);
        assert_eq!(RelativeDirection::from_relative_angle(46.0), RelativeDirection::Right);
        assert_eq!(RelativeDirection::from_relative_angle(200.0), RelativeDirection::Behind);
        assert_eq!(RelativeDirection::from_relative_angle(300.0), RelativeDirection::Left);
        assert_eq!(RelativeDirection::from_relative_angle(316.0), RelativeDirection::Ahead);
        assert_eq!(RelativeDirection::from_relative_angle(-1.0), RelativeDirection::Unknown);
    }

    #[test]
    fn test_road_layout() {
        let env = environment();
        let callout = IntersectionCallout::new(CalloutOrigin::Intersection, crossing(), 0.0);
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.0001, 0.0)), &env);

        assert_eq!(
            sounds.descriptions(),
            vec![
                "\"Approaching intersection.\"",
                "\"Main Street continues ahead\"",
                "\"1st Avenue goes right\"",
                "\"Old Road goes left\"",
            ]
        );

        sounds.next();
        sounds.next();
        let right = sounds.next().unwrap();
        assert!(matches!(right.sound_type(), SoundType::Compass(h, _) if *h == 90.0));
        let left = sounds.next().unwrap();
        assert!(matches!(left.sound_type(), SoundType::Compass(h, _) if *h == 270.0));
    }

    #[test]
    fn test_context_heading_wins() {
        let env = environment();
        let callout = IntersectionCallout::new(CalloutOrigin::Intersection, crossing(), 0.0);
        let ctx = CalloutContext::at(Location::new(0.0, 0.0)).with_heading(90.0);

        let sounds = callout.sounds(&ctx, &env);
        assert_eq!(sounds.descriptions()[1], "\"Main Street goes left\"");
        assert_eq!(sounds.len(), 4);
    }

    #[test]
    fn test_repeat_from_afar() {
        let env = environment();
        let callout = IntersectionCallout::new(CalloutOrigin::Intersection, crossing(), 0.0);

        let far = CalloutContext::at(Location::new(0.01, 0.0)).repeated();
        assert_eq!(
            callout.sounds(&far, &env).descriptions(),
            vec!["\"Main and 1st intersection\""]
        );

        let nowhere = CalloutContext::default().repeated();
        assert!(callout.sounds(&nowhere, &env).is_empty());

        let near = CalloutContext::at(Location::new(0.0001, 0.0)).repeated();
        assert_eq!(callout.sounds(&near, &env).len(), 4);
    }

    #[test]
    fn test_prefix_is_relative_sense() {
        let env = environment();
        let callout = IntersectionCallout::new(CalloutOrigin::Intersection, crossing(), 0.0);
        let prefix = callout.prefix_sound(&env).unwrap();
        assert_eq!(prefix.description(), "[sense_poi]");
        assert!(matches!(prefix.sound_type(), SoundType::Relative(d, _) if *d == 0.0));
    }
}
