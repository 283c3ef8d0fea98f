//! Callouts
//!
//! A callout is a semantic event (a point of interest nearby, an intersection
//! ahead, the beacon reached) that turns into a [`Sounds`] playlist when it is
//! about to be spoken. Everything a callout needs at that moment is passed in
//! explicitly: the user's [`CalloutContext`] and the [`CalloutEnvironment`]
//! holding the asset loader, speech backend and string table.
//!
//! Ordering callouts into a queue is the caller's business.

pub mod destination;
pub mod glyph;
pub mod intersection;
pub mod poi;
pub mod string;

pub use destination::DestinationCallout;
pub use glyph::GlyphCallout;
pub use intersection::{Intersection, IntersectionCallout, IntersectionRoad, RelativeDirection};
pub use poi::{PoiCallout, PointOfInterest};
pub use string::{Placement, StringCallout};

use chrono::{DateTime, Utc};
use scape_common::Location;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::audio::{AssetLoader, VoiceFilters};
use crate::localization::LocalizedStrings;
use crate::sound::{Glyph, GlyphSound, Sound, Sounds, SpeechSynthesizer, TtsSound};

/// What triggered a callout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CalloutOrigin {
    Auto,
    Intersection,
    Explore,
    Orient,
    NearbyMarkers,
    Locate,
    BeaconChanged,
    BeaconGeofence,
    System,
    Preview,
    Onboarding,
}

impl CalloutOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            CalloutOrigin::Auto => "auto",
            CalloutOrigin::Intersection => "intersection",
            CalloutOrigin::Explore => "explore",
            CalloutOrigin::Orient => "orient",
            CalloutOrigin::NearbyMarkers => "nearby_markers",
            CalloutOrigin::Locate => "locate",
            CalloutOrigin::BeaconChanged => "beacon_changed",
            CalloutOrigin::BeaconGeofence => "beacon_geofence",
            CalloutOrigin::System => "system",
            CalloutOrigin::Preview => "preview",
            CalloutOrigin::Onboarding => "onboarding",
        }
    }
}

impl fmt::Display for CalloutOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User state at the moment a callout is rendered
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CalloutContext {
    pub location: Option<Location>,
    /// Degrees clockwise from north
    pub heading: Option<f64>,
    /// The user asked to hear this callout again
    pub is_repeat: bool,
    pub automotive: bool,
}

impl CalloutContext {
    pub fn at(location: Location) -> Self {
        Self {
            location: Some(location),
            ..Self::default()
        }
    }

    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    pub fn repeated(mut self) -> Self {
        self.is_repeat = true;
        self
    }
}

/// Collaborators callouts build their sounds with
#[derive(Clone)]
pub struct CalloutEnvironment {
    pub assets: Arc<dyn AssetLoader>,
    pub speech: Arc<dyn SpeechSynthesizer>,
    pub strings: Arc<dyn LocalizedStrings>,
    pub voice: Option<String>,
    pub voice_filters: Arc<VoiceFilters>,
}

impl CalloutEnvironment {
    pub fn new(
        assets: Arc<dyn AssetLoader>,
        speech: Arc<dyn SpeechSynthesizer>,
        strings: Arc<dyn LocalizedStrings>,
    ) -> Self {
        Self {
            assets,
            speech,
            strings,
            voice: None,
            voice_filters: Arc::new(VoiceFilters::default()),
        }
    }

    pub fn with_voice(mut self, voice: Option<String>, filters: Arc<VoiceFilters>) -> Self {
        self.voice = voice;
        self.voice_filters = filters;
        self
    }

    pub fn glyph(&self, glyph: Glyph) -> GlyphSound {
        GlyphSound::new(self.assets.as_ref(), glyph)
    }

    pub fn tts(&self, text: impl Into<String>) -> TtsSound {
        TtsSound::new(text, Arc::clone(&self.speech))
            .with_voice(self.voice.clone())
            .with_voice_filters(Arc::clone(&self.voice_filters))
    }

    pub fn string(&self, key: &str, args: &[&str]) -> String {
        self.strings.string(key, args)
    }
}

/// Identity shared by every callout
#[derive(Debug, Clone, PartialEq)]
pub struct CalloutMeta {
    pub id: Uuid,
    pub origin: CalloutOrigin,
    pub timestamp: DateTime<Utc>,
}

impl CalloutMeta {
    pub fn new(origin: CalloutOrigin) -> Self {
        Self {
            id: Uuid::new_v4(),
            origin,
            timestamp: scape_common::time::now(),
        }
    }
}

/// Semantic event that renders to a playlist
pub trait Callout: Send + Sync {
    fn meta(&self) -> &CalloutMeta;

    fn id(&self) -> Uuid {
        self.meta().id
    }

    fn origin(&self) -> CalloutOrigin {
        self.meta().origin
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.meta().timestamp
    }

    /// Category used when logging this callout
    fn log_category(&self) -> &'static str;

    fn include_in_history(&self) -> bool {
        false
    }

    /// Whether the callout opens with its earcon
    fn include_prefix_sound(&self) -> bool {
        true
    }

    /// Earcon played ahead of a batch of callouts of this kind
    fn prefix_sound(&self, _env: &CalloutEnvironment) -> Option<Box<dyn Sound>> {
        None
    }

    /// Playlist for the current context
    fn sounds(&self, ctx: &CalloutContext, env: &CalloutEnvironment) -> Sounds;

    /// Spoken distance to the callout's subject
    fn distance_description(&self, _ctx: &CalloutContext, _env: &CalloutEnvironment) -> Option<String> {
        None
    }

    fn debug_description(&self) -> String;

    fn same_callout(&self, other: &dyn Callout) -> bool {
        self.id() == other.id()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::audio::{MemoryAssetLoader, PcmBuffer, PcmFormat};
    use crate::error::SynthesisError;
    use crate::localization::KeyedStrings;
    use crate::sound::tts::SpeechStream;
    use futures::StreamExt;

    /// Synthesizer that never produces audio
    pub struct SilentSpeech;

    impl SpeechSynthesizer for SilentSpeech {
        fn synthesize(&self, _text: &str, _voice: Option<&str>) -> Result<SpeechStream, SynthesisError> {
            Ok(futures::stream::empty().boxed())
        }
    }

    pub fn environment() -> CalloutEnvironment {
        let mut assets = MemoryAssetLoader::new();
        for glyph in Glyph::ALL {
            assets.insert(glyph.asset_name(), PcmBuffer::silent(PcmFormat::mono_f32(8_000), 8));
        }
        CalloutEnvironment::new(Arc::new(assets), Arc::new(SilentSpeech), Arc::new(KeyedStrings::english()))
    }
}
