//! Earcon-only callouts

use crate::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutMeta, CalloutOrigin};
use crate::sound::{Glyph, Sounds};

#[derive(Debug, Clone)]
pub struct GlyphCallout {
    meta: CalloutMeta,
    glyph: Glyph,
    /// Bearing relative to the user's heading, for relative glyph callouts
    position: Option<f64>,
}

impl GlyphCallout {
    pub fn new(origin: CalloutOrigin, glyph: Glyph) -> Self {
        Self {
            meta: CalloutMeta::new(origin),
            glyph,
            position: None,
        }
    }

    /// Glyph rendered at a bearing relative to the user's heading
    pub fn relative(origin: CalloutOrigin, glyph: Glyph, position: f64) -> Self {
        Self {
            position: Some(position),
            ..Self::new(origin, glyph)
        }
    }

    pub fn glyph(&self) -> Glyph {
        self.glyph
    }
}

impl Callout for GlyphCallout {
    fn meta(&self) -> &CalloutMeta {
        &self.meta
    }

    fn log_category(&self) -> &'static str {
        "glyph"
    }

    fn sounds(&self, _ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds {
        let sound = env.glyph(self.glyph);
        match self.position {
            Some(position) => Sounds::single(Box::new(sound.relative(position))),
            None => Sounds::single(Box::new(sound)),
        }
    }

    fn debug_description(&self) -> String {
        format!("[GlyphCallout] {}", self.glyph.asset_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callout::test_support::environment;
    use crate::sound::SoundType;

    #[test]
    fn test_glyph_callouts() {
        let env = environment();
        let ctx = CalloutContext::default();

        let plain = GlyphCallout::new(CalloutOrigin::Onboarding, Glyph::ExitMode);
        let sound = plain.sounds(&ctx, &env).next().unwrap();
        assert_eq!(sound.sound_type(), &SoundType::Standard);
        assert_eq!(sound.description(), "[mode_exit]");

        let relative = GlyphCallout::relative(CalloutOrigin::Onboarding, Glyph::MobilitySense, 270.0);
        let sound = relative.sounds(&ctx, &env).next().unwrap();
        assert!(matches!(sound.sound_type(), SoundType::Relative(d, _) if *d == 270.0));
        assert_ne!(plain.id(), relative.id());
    }
}
