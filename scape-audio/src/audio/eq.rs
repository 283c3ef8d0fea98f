//! Equalizer parameters attached to sounds
//!
//! Sounds do not apply EQ themselves. They describe the EQ the audio engine
//! should place on each layer, computed from the caller's [`GainSettings`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::Result;

/// Filter shape of one EQ band
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    Parametric,
    LowPass,
    HighPass,
    ResonantLowPass,
    ResonantHighPass,
    BandPass,
    BandStop,
    LowShelf,
    HighShelf,
    ResonantLowShelf,
    ResonantHighShelf,
}

/// One EQ band
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterBandParameters {
    /// Bandwidth in octaves
    pub bandwidth: f32,
    pub bypass: bool,
    pub filter_type: FilterType,
    /// Hertz
    pub frequency: f32,
    /// Decibels
    pub gain: f32,
}

/// EQ for a single layer: a global gain plus zero or more bands
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqParameters {
    /// Decibels
    pub global_gain: f32,
    #[serde(default)]
    pub band_parameters: Vec<FilterBandParameters>,
}

impl EqParameters {
    pub fn new(global_gain: f32, band_parameters: Vec<FilterBandParameters>) -> Self {
        Self {
            global_gain,
            band_parameters,
        }
    }

    /// Gain-only EQ, or `None` when the gain is neutral
    pub fn from_gain(gain: f32) -> Option<Self> {
        if gain == 0.0 {
            None
        } else {
            Some(Self::new(gain, Vec::new()))
        }
    }
}

#[derive(Debug, Deserialize)]
struct VoiceEq {
    id: String,
    filter: EqParameters,
}

/// Per-voice TTS filter table, keyed by voice identifier
#[derive(Debug, Clone, Default)]
pub struct VoiceFilters {
    filters: HashMap<String, EqParameters>,
}

impl VoiceFilters {
    /// Parse a `[{"id": ..., "filter": {...}}]` list
    pub fn from_json(json: &str) -> Result<Self> {
        let list: Vec<VoiceEq> = serde_json::from_str(json)?;
        Ok(Self {
            filters: list.into_iter().map(|v| (v.id, v.filter)).collect(),
        })
    }

    /// Parse a filter file, falling back to an empty table
    pub fn load_or_empty(path: &std::path::Path) -> Self {
        let parsed = std::fs::read_to_string(path)
            .map_err(crate::Error::from)
            .and_then(|json| Self::from_json(&json));

        match parsed {
            Ok(filters) => filters,
            Err(e) => {
                warn!("Unable to load voice filters from {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn get(&self, voice_id: &str) -> Option<&EqParameters> {
        self.filters.get(voice_id)
    }

    pub fn insert(&mut self, voice_id: impl Into<String>, filter: EqParameters) {
        self.filters.insert(voice_id.into(), filter);
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }
}

/// User gain preferences, in decibels
///
/// Passed explicitly wherever EQ parameters are computed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GainSettings {
    pub afx_gain: f32,
    pub beacon_gain: f32,
    pub tts_gain: f32,
    /// Selected voice, if the user picked one
    pub voice_id: Option<String>,
}

impl GainSettings {
    pub fn from_config(config: &scape_common::config::AudioConfig) -> Self {
        Self {
            afx_gain: config.afx_gain,
            beacon_gain: config.beacon_gain,
            tts_gain: config.tts_gain,
            voice_id: config.voice_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILTERS: &str = r#"[
        {
            "id": "voice.alex",
            "filter": {
                "globalGain": 2.0,
                "bandParameters": [
                    { "bandwidth": 1.0, "bypass": false, "filterType": "highShelf", "frequency": 4000.0, "gain": -3.0 }
                ]
            }
        }
    ]"#;

    #[test]
    fn test_voice_filters_parse() {
        let filters = VoiceFilters::from_json(FILTERS).unwrap();
        let eq = filters.get("voice.alex").unwrap();
        assert_eq!(eq.global_gain, 2.0);
        assert_eq!(eq.band_parameters.len(), 1);
        assert_eq!(eq.band_parameters[0].filter_type, FilterType::HighShelf);
        assert!(filters.get("voice.other").is_none());
    }

    #[test]
    fn test_unknown_filter_type_is_rejected() {
        let json = r#"[{"id":"v","filter":{"globalGain":0,"bandParameters":[
            {"bandwidth":1,"bypass":false,"filterType":"wobble","frequency":1,"gain":1}]}}]"#;
        assert!(VoiceFilters::from_json(json).is_err());
    }

    #[test]
    fn test_from_gain() {
        assert!(EqParameters::from_gain(0.0).is_none());
        assert_eq!(EqParameters::from_gain(3.0).unwrap().global_gain, 3.0);
    }

    #[test]
    fn test_load_or_empty_missing_file() {
        let filters = VoiceFilters::load_or_empty(std::path::Path::new("/nonexistent/voiceFilters.json"));
        assert!(filters.is_empty());
    }
}
