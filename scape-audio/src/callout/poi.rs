//! Point-of-interest callouts

use scape_common::geo::Polygon;
use scape_common::Location;

use crate::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutMeta, CalloutOrigin};
use crate::localization::{formatted_distance, name_with_distance};
use crate::sound::{Glyph, Sound, Sounds};

/// Minimal view of a place callouts can speak about
#[derive(Debug, Clone, PartialEq)]
pub struct PointOfInterest {
    pub name: String,
    pub location: Location,
    /// Area the place covers, when known
    pub footprint: Option<Polygon>,
    /// Earcon for the place's category
    pub glyph: Glyph,
    /// User note spoken after the name
    pub annotation: Option<String>,
}

impl PointOfInterest {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            name: name.into(),
            location,
            footprint: None,
            glyph: Glyph::PoiSense,
            annotation: None,
        }
    }

    pub fn with_footprint(mut self, footprint: Polygon) -> Self {
        self.footprint = Some(footprint);
        self
    }

    pub fn with_glyph(mut self, glyph: Glyph) -> Self {
        self.glyph = glyph;
        self
    }

    pub fn with_annotation(mut self, annotation: impl Into<String>) -> Self {
        self.annotation = Some(annotation.into());
        self
    }

    pub fn contains(&self, location: &Location) -> bool {
        self.footprint
            .as_ref()
            .is_some_and(|f| f.contains(&location.coordinate))
    }

    pub fn distance_from(&self, location: &Location) -> f64 {
        self.location.distance_to(location)
    }

    /// Spoken name, falling back to a generic label
    pub(crate) fn spoken_name(&self, env: &CalloutEnvironment) -> String {
        if self.name.is_empty() {
            env.string("location", &[])
        } else {
            self.name.clone()
        }
    }
}

#[derive(Debug, Clone)]
pub struct PoiCallout {
    meta: CalloutMeta,
    poi: PointOfInterest,
    /// Where the user was when the callout was generated
    location: Option<Location>,
    /// Speak the distance even on a first automatic callout
    include_distance: bool,
}

impl PoiCallout {
    pub fn new(origin: CalloutOrigin, poi: PointOfInterest, location: Option<Location>) -> Self {
        Self {
            meta: CalloutMeta::new(origin),
            poi,
            location,
            include_distance: !matches!(origin, CalloutOrigin::Auto),
        }
    }

    pub fn poi(&self) -> &PointOfInterest {
        &self.poi
    }
}

impl Callout for PoiCallout {
    fn meta(&self) -> &CalloutMeta {
        &self.meta
    }

    fn log_category(&self) -> &'static str {
        "poi"
    }

    fn include_in_history(&self) -> bool {
        true
    }

    fn sounds(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds {
        let Some(user) = ctx.location.as_ref().or(self.location.as_ref()) else {
            return Sounds::empty();
        };

        let sound_location = self.poi.location.clone();
        let distance = self.poi.distance_from(user);
        let name = self.poi.spoken_name(env);

        let mut sounds: Vec<Box<dyn Sound>> = Vec::with_capacity(3);
        if self.include_prefix_sound() {
            sounds.push(Box::new(env.glyph(self.poi.glyph).localized(sound_location.clone())));
        }

        let text = if !self.include_distance && !ctx.is_repeat {
            if self.poi.contains(user) {
                env.string("directions.at_poi", &[&name])
            } else {
                name
            }
        } else {
            name_with_distance(&name, distance, user.horizontal_accuracy, env.strings.as_ref())
        };
        sounds.push(Box::new(env.tts(text).localized(sound_location.clone())));

        if let Some(annotation) = self.poi.annotation.as_ref().filter(|a| !a.is_empty()) {
            sounds.push(Box::new(env.tts(annotation.clone()).localized(sound_location)));
        }

        Sounds::new(sounds)
    }

    fn distance_description(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Option<String> {
        let user = ctx.location.as_ref()?;
        Some(formatted_distance(self.poi.distance_from(user), env.strings.as_ref()))
    }

    fn debug_description(&self) -> String {
        format!("[PoiCallout] {}", self.poi.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::test_support::environment;
    use scape_common::Coordinate;

    fn cafe() -> PointOfInterest {
        // About 111 m north of the origin
        PointOfInterest::new("Cafe", Location::new(0.001, 0.0))
    }

    #[test]
    fn test_auto_callout_speaks_name_only() {
        let env = environment();
        let callout = PoiCallout::new(CalloutOrigin::Auto, cafe(), None);
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.0, 0.0)), &env);

        assert_eq!(sounds.descriptions(), vec!["[sense_poi]", "\"Cafe\""]);
    }

    #[test]
    fn test_explore_callout_speaks_distance() {
        let env = environment();
        let callout = PoiCallout::new(CalloutOrigin::Explore, cafe(), None);
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.0, 0.0)), &env);

        assert_eq!(sounds.descriptions(), vec!["[sense_poi]", "\"Cafe, 110 meters\""]);
        assert_eq!(
            callout.distance_description(&CalloutContext::at(Location::new(0.0, 0.0)), &env),
            Some("110 meters".to_string())
        );
    }

    #[test]
    fn test_inside_footprint_and_annotation() {
        let env = environment();
        let square = Polygon::new(vec![
            Coordinate::new(-0.01, -0.01),
            Coordinate::new(-0.01, 0.01),
            Coordinate::new(0.01, 0.01),
            Coordinate::new(0.01, -0.01),
        ]);
        let park = PointOfInterest::new("Park", Location::new(0.0, 0.0))
            .with_footprint(square)
            .with_annotation("Dog friendly");

        let callout = PoiCallout::new(CalloutOrigin::Auto, park, None);
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.001, 0.001)), &env);

        assert_eq!(
            sounds.descriptions(),
            vec!["[sense_poi]", "\"At Park\"", "\"Dog friendly\""]
        );
    }

    #[test]
    fn test_no_location_means_no_sounds() {
        let env = environment();
        let callout = PoiCallout::new(CalloutOrigin::Explore, cafe(), None);
        assert!(callout.sounds(&CalloutContext::default(), &env).is_empty());

        // Falls back to the location captured when the callout was made
        let callout = PoiCallout::new(CalloutOrigin::Explore, cafe(), Some(Location::new(0.0, 0.0)));
        assert_eq!(callout.sounds(&CalloutContext::default(), &env).len(), 2);
    }

    #[test]
    fn test_unnamed_poi() {
        let env = environment();
        let callout = PoiCallout::new(CalloutOrigin::Auto, PointOfInterest::new("", Location::new(0.001, 0.0)), None);
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.0, 0.0)), &env);
        assert_eq!(sounds.descriptions()[1], "\"Location\"");
    }
}
