//! Earcons ("glyphs")
//!
//! A [`GlyphSound`] is a [`GenericSound`] built from one of the fixed earcon
//! assets. It only differs in how it describes itself.

use scape_common::Location;

use crate::audio::{AssetLoader, EqParameters, GainSettings};
use crate::sound::{BufferFuture, GenericSound, Sound, SoundType};

/// Fixed earcon assets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Glyph {
    PoiSense,
    MobilitySense,
    LocationSense,
    StartJourney,
    StopJourney,
    BeaconFound,
    FlagFound,
    StreetFound,
    EnterMode,
    ExitMode,
    HuntComplete,
    Hush,
    TravelStart,
    TravelEnd,
    TravelInter,
    TravelReverse,
    PreviewStart,
    PreviewEnd,
    RoadFinderError,
    CalibrationSuccess,
    ConnectionSuccess,
    InvalidFunction,
}

impl Glyph {
    pub const ALL: [Glyph; 22] = [
        Glyph::PoiSense,
        Glyph::MobilitySense,
        Glyph::LocationSense,
        Glyph::StartJourney,
        Glyph::StopJourney,
        Glyph::BeaconFound,
        Glyph::FlagFound,
        Glyph::StreetFound,
        Glyph::EnterMode,
        Glyph::ExitMode,
        Glyph::HuntComplete,
        Glyph::Hush,
        Glyph::TravelStart,
        Glyph::TravelEnd,
        Glyph::TravelInter,
        Glyph::TravelReverse,
        Glyph::PreviewStart,
        Glyph::PreviewEnd,
        Glyph::RoadFinderError,
        Glyph::CalibrationSuccess,
        Glyph::ConnectionSuccess,
        Glyph::InvalidFunction,
    ];

    /// Asset name passed to the loader
    pub fn asset_name(&self) -> &'static str {
        match self {
            Glyph::PoiSense => "sense_poi",
            Glyph::MobilitySense => "sense_mobility",
            Glyph::LocationSense => "sense_location",
            Glyph::StartJourney => "journey_start",
            Glyph::StopJourney => "journey_stop",
            Glyph::BeaconFound => "beacon_found",
            Glyph::FlagFound => "flag_found",
            Glyph::StreetFound => "street_found",
            Glyph::EnterMode => "mode_enter",
            Glyph::ExitMode => "mode_exit",
            Glyph::HuntComplete => "hunt_complete",
            Glyph::Hush => "hush",
            Glyph::TravelStart => "travel_start",
            Glyph::TravelEnd => "travel_end",
            Glyph::TravelInter => "travel_inter",
            Glyph::TravelReverse => "travel_reverse",
            Glyph::PreviewStart => "preview_start",
            Glyph::PreviewEnd => "preview_end",
            Glyph::RoadFinderError => "road_finder_error",
            Glyph::CalibrationSuccess => "calibration_success",
            Glyph::ConnectionSuccess => "connection_success",
            Glyph::InvalidFunction => "invalid_function",
        }
    }
}

/// Earcon sound
#[derive(Debug)]
pub struct GlyphSound {
    glyph: Glyph,
    inner: GenericSound,
}

impl GlyphSound {
    pub fn new(loader: &dyn AssetLoader, glyph: Glyph) -> Self {
        Self {
            glyph,
            inner: GenericSound::from_asset(loader, glyph.asset_name()),
        }
    }

    pub fn localized(self, location: Location) -> Self {
        Self {
            glyph: self.glyph,
            inner: self.inner.localized(location),
        }
    }

    pub fn relative(self, direction: f64) -> Self {
        Self {
            glyph: self.glyph,
            inner: self.inner.relative(direction),
        }
    }

    pub fn compass(self, heading: f64) -> Self {
        Self {
            glyph: self.glyph,
            inner: self.inner.compass(heading),
        }
    }

    pub fn glyph(&self) -> Glyph {
        self.glyph
    }

    pub fn duration(&self) -> Option<f64> {
        self.inner.duration()
    }
}

impl Sound for GlyphSound {
    fn sound_type(&self) -> &SoundType {
        self.inner.sound_type()
    }

    fn layer_count(&self) -> usize {
        1
    }

    fn description(&self) -> String {
        format!("[{}]", self.inner.source_name())
    }

    fn next_buffer(&self, layer: usize) -> BufferFuture {
        self.inner.next_buffer(layer)
    }

    fn equalizer_params(&self, layer: usize, gains: &GainSettings) -> Option<EqParameters> {
        self.inner.equalizer_params(layer, gains)
    }
}
