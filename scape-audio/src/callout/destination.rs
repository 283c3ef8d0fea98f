//! Beacon destination callouts

use tracing::debug;

use crate::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutMeta, CalloutOrigin, PointOfInterest};
use crate::localization::{formatted_distance, name_with_distance};
use crate::sound::{Glyph, LayeredSound, Sound, Sounds};

/// Distance at which the user counts as having reached the beacon
pub const IMMEDIATE_VICINITY_M: f64 = 15.0;

#[derive(Debug, Clone)]
pub struct DestinationCallout {
    meta: CalloutMeta,
    destination: PointOfInterest,
    /// Reaching the geofence muted the audio beacon
    caused_audio_disabled: bool,
}

impl DestinationCallout {
    pub fn new(origin: CalloutOrigin, destination: PointOfInterest) -> Self {
        Self {
            meta: CalloutMeta::new(origin),
            destination,
            caused_audio_disabled: false,
        }
    }

    /// Geofence callout for a beacon that was just reached
    pub fn arrived(destination: PointOfInterest, caused_audio_disabled: bool) -> Self {
        Self {
            caused_audio_disabled,
            ..Self::new(CalloutOrigin::BeaconGeofence, destination)
        }
    }

    pub fn destination(&self) -> &PointOfInterest {
        &self.destination
    }

    fn geofence_sounds(&self, env: &CalloutEnvironment) -> Sounds {
        let location = self.destination.location.clone();
        let distance = formatted_distance(IMMEDIATE_VICINITY_M, env.strings.as_ref());

        if !self.caused_audio_disabled {
            let text = env.string("beacon.beacon_location_within", &[&distance]);
            return Sounds::single(Box::new(env.tts(text).localized(location)));
        }

        let text = env.string("beacon.beacon_location_within_audio_beacon_muted", &[&distance]);
        let layers: Vec<Box<dyn Sound>> = vec![
            Box::new(env.glyph(Glyph::BeaconFound)),
            Box::new(env.tts(text.clone()).localized(location.clone())),
        ];

        match LayeredSound::new(layers) {
            Some(layered) => Sounds::single(Box::new(layered)),
            None => {
                debug!("Earcon and speech differ in placement, playing them in sequence");
                Sounds::new(vec![
                    Box::new(env.glyph(Glyph::BeaconFound)),
                    Box::new(env.tts(text).localized(location)),
                ])
            }
        }
    }
}

impl Callout for DestinationCallout {
    fn meta(&self) -> &CalloutMeta {
        &self.meta
    }

    fn log_category(&self) -> &'static str {
        "destination"
    }

    fn prefix_sound(&self, env: &CalloutEnvironment) -> Option<Box<dyn Sound>> {
        Some(Box::new(env.glyph(Glyph::StartJourney)))
    }

    fn sounds(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds {
        match self.origin() {
            CalloutOrigin::Auto | CalloutOrigin::BeaconChanged | CalloutOrigin::Preview => {
                let Some(user) = ctx.location.as_ref() else {
                    return Sounds::empty();
                };

                let location = self.destination.location.clone();
                let name = env.string("beacon.generic_name", &[]);
                let text = name_with_distance(
                    &name,
                    self.destination.distance_from(user),
                    user.horizontal_accuracy,
                    env.strings.as_ref(),
                );

                Sounds::new(vec![
                    Box::new(env.glyph(self.destination.glyph).localized(location.clone())),
                    Box::new(env.tts(text).localized(location)),
                ])
            }
            CalloutOrigin::BeaconGeofence => self.geofence_sounds(env),
            _ => Sounds::empty(),
        }
    }

    fn distance_description(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Option<String> {
        let user = ctx.location.as_ref()?;
        Some(formatted_distance(self.destination.distance_from(user), env.strings.as_ref()))
    }

    fn debug_description(&self) -> String {
        format!("[DestinationCallout] {} ({})", self.destination.name, self.origin())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::test_support::environment;
    use scape_common::Location;

    fn beacon() -> PointOfInterest {
        PointOfInterest::new("Library", Location::new(0.001, 0.0))
    }

    #[test]
    fn test_beacon_changed() {
        let env = environment();
        let callout = DestinationCallout::new(CalloutOrigin::BeaconChanged, beacon());
        let sounds = callout.sounds(&CalloutContext::at(Location::new(0.0, 0.0)), &env);

        assert_eq!(sounds.descriptions(), vec!["[sense_poi]", "\"Audio beacon, 110 meters\""]);
        assert_eq!(callout.prefix_sound(&env).unwrap().description(), "[journey_start]");
    }

    #[test]
    fn test_geofence_without_mute() {
        let env = environment();
        let callout = DestinationCallout::arrived(beacon(), false);
        let sounds = callout.sounds(&CalloutContext::default(), &env);
        assert_eq!(sounds.descriptions(), vec!["\"Beacon within 15 meters\""]);
    }

    #[test]
    fn test_geofence_with_mute_plays_in_sequence() {
        let env = environment();
        let callout = DestinationCallout::arrived(beacon(), true);
        let sounds = callout.sounds(&CalloutContext::default(), &env);

        assert_eq!(
            sounds.descriptions(),
            vec!["[beacon_found]", "\"Beacon within 15 meters. Audio beacon muted.\""]
        );
    }

    #[test]
    fn test_other_origins_are_silent() {
        let env = environment();
        let callout = DestinationCallout::new(CalloutOrigin::Explore, beacon());
        assert!(callout.sounds(&CalloutContext::at(Location::new(0.0, 0.0)), &env).is_empty());
    }
}
