//! Free-text callouts with an optional leading earcon

use scape_common::Location;

use crate::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutMeta, CalloutOrigin};
use crate::sound::{Glyph, Sound, Sounds};

/// Where a string callout is rendered
#[derive(Debug, Clone, PartialEq)]
pub enum Placement {
    /// Plain 2D speech
    Unpositioned,
    /// Absolute compass heading
    Compass(f64),
    /// Bearing relative to the user's heading
    Relative(f64),
    /// Geographic point
    Location(Location),
}

#[derive(Debug, Clone)]
pub struct StringCallout {
    meta: CalloutMeta,
    text: String,
    glyph: Option<Glyph>,
    placement: Placement,
}

impl StringCallout {
    pub fn new(origin: CalloutOrigin, text: impl Into<String>) -> Self {
        Self {
            meta: CalloutMeta::new(origin),
            text: text.into(),
            glyph: None,
            placement: Placement::Unpositioned,
        }
    }

    /// Speech at a bearing relative to the user's heading
    ///
    /// Relative callouts never play a glyph.
    pub fn relative(origin: CalloutOrigin, text: impl Into<String>, position: f64) -> Self {
        Self::new(origin, text).placed(Placement::Relative(position))
    }

    pub fn with_glyph(mut self, glyph: Glyph) -> Self {
        self.glyph = Some(glyph);
        self
    }

    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }
}

impl Callout for StringCallout {
    fn meta(&self) -> &CalloutMeta {
        &self.meta
    }

    fn log_category(&self) -> &'static str {
        "string"
    }

    fn sounds(&self, _ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds {
        let mut sounds: Vec<Box<dyn Sound>> = Vec::with_capacity(2);

        match &self.placement {
            Placement::Unpositioned => {
                if let Some(glyph) = self.glyph {
                    sounds.push(Box::new(env.glyph(glyph)));
                }
                sounds.push(Box::new(env.tts(&self.text)));
            }
            Placement::Compass(position) => {
                if let Some(glyph) = self.glyph {
                    sounds.push(Box::new(env.glyph(glyph).compass(*position)));
                }
                sounds.push(Box::new(env.tts(&self.text).compass(*position)));
            }
            Placement::Relative(position) => {
                sounds.push(Box::new(env.tts(&self.text).relative(*position)));
            }
            Placement::Location(location) => {
                if let Some(glyph) = self.glyph {
                    sounds.push(Box::new(env.glyph(glyph).localized(location.clone())));
                }
                sounds.push(Box::new(env.tts(&self.text).localized(location.clone())));
            }
        }

        Sounds::new(sounds)
    }

    fn debug_description(&self) -> String {
        format!("[StringCallout] {}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::test_support::environment;

    #[test]
    fn test_glyph_then_speech() {
        let env = environment();
        let callout = StringCallout::new(CalloutOrigin::System, "Ready").with_glyph(Glyph::EnterMode);

        let sounds = callout.sounds(&CalloutContext::default(), &env);
        assert_eq!(sounds.descriptions(), vec!["[mode_enter]", "\"Ready\""]);
        assert_eq!(callout.log_category(), "string");
        assert!(!callout.include_in_history());
    }

    #[test]
    fn test_compass_placement() {
        let env = environment();
        let callout = StringCallout::new(CalloutOrigin::Orient, "North")
            .with_glyph(Glyph::PoiSense)
            .placed(Placement::Compass(0.0));

        let sounds = callout.sounds(&CalloutContext::default(), &env);
        let first = sounds.next().unwrap();
        assert!(matches!(first.sound_type(), crate::sound::SoundType::Compass(h, _) if *h == 0.0));
        assert_eq!(sounds.len(), 1);
    }

    #[test]
    fn test_relative_drops_glyph() {
        let env = environment();
        let callout = StringCallout::relative(CalloutOrigin::Onboarding, "Over here", 90.0).with_glyph(Glyph::PoiSense);

        let sounds = callout.sounds(&CalloutContext::default(), &env);
        assert_eq!(sounds.len(), 1);
        let only = sounds.next().unwrap();
        assert!(matches!(only.sound_type(), crate::sound::SoundType::Relative(d, _) if *d == 90.0));
    }
}
