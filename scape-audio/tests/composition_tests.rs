//! Integration tests for sound composition
//!
//! Covers concatenation across streamed speech and earcons, layering rules and
//! the drain helper consuming a full callout playlist.

use futures::StreamExt;
use std::sync::Arc;

use scape_audio::audio::{GainSettings, MemoryAssetLoader, PcmBuffer, PcmFormat, VoiceFilters};
use scape_audio::callout::{Callout, CalloutContext, CalloutEnvironment, CalloutOrigin, StringCallout};
use scape_audio::localization::KeyedStrings;
use scape_audio::playback::{drain_sound, drain_sounds};
use scape_audio::sound::{
    ConcatenatedSound, GenericSound, Glyph, LayeredSound, Sound, SpeechStream, SpeechSynthesizer,
    TtsSound,
};
use scape_audio::SynthesisError;
use scape_common::Location;

const RATE: u32 = 16_000;

/// Synthesizer producing one buffer per word
struct WordSpeech;

impl SpeechSynthesizer for WordSpeech {
    fn synthesize(&self, text: &str, _voice: Option<&str>) -> Result<SpeechStream, SynthesisError> {
        let buffers: Vec<_> = text
            .split_whitespace()
            .map(|word| Ok(PcmBuffer::silent(PcmFormat::mono_f32(RATE), word.len() * 100)))
            .collect();
        Ok(futures::stream::iter(buffers).boxed())
    }

    fn default_voice(&self) -> Option<String> {
        Some("test-voice".to_string())
    }
}

fn speech(text: &str) -> Box<dyn Sound> {
    Box::new(TtsSound::new(text, Arc::new(WordSpeech)))
}

fn earcon(name: &str) -> Box<dyn Sound> {
    Box::new(GenericSound::from_buffer(
        name,
        PcmBuffer::silent(PcmFormat::mono_f32(RATE), 400),
    ))
}

#[tokio::test]
async fn test_concatenation_yields_every_buffer_then_ends() {
    // 3 + 1 + 2 buffers
    let sound = ConcatenatedSound::new(vec![
        speech("one two three"),
        earcon("chime"),
        speech("four five"),
    ])
    .unwrap();

    let mut lengths = Vec::new();
    while let Some(buffer) = sound.next_buffer(0).await {
        assert!(!buffer.is_empty());
        lengths.push(buffer.frame_length());
    }

    assert_eq!(lengths, vec![300, 300, 500, 400, 400, 400]);
    assert!(sound.next_buffer(0).await.is_none());
    assert!(sound.next_buffer(1).await.is_none());
}

#[tokio::test]
async fn test_layering_rejects_mixed_placement() {
    let here = Location::new(47.6, -122.3);
    let localized: Box<dyn Sound> =
        Box::new(TtsSound::new("over there", Arc::new(WordSpeech)).localized(here));

    assert!(LayeredSound::new(vec![earcon("chime"), localized]).is_none());
    assert!(ConcatenatedSound::new(vec![speech("a"), earcon("b")]).is_some());

    let nested = LayeredSound::new(vec![earcon("x"), earcon("y")]).unwrap();
    assert!(LayeredSound::new(vec![Box::new(nested), earcon("z")]).is_none());
}

#[tokio::test]
async fn test_layered_drain_and_eq() {
    let sound = LayeredSound::new(vec![earcon("bed"), speech("hello there")]).unwrap();
    let drained = drain_sound(&sound).await;

    assert_eq!(drained.layers[0].len(), 1);
    assert_eq!(drained.layers[1].len(), 2);

    let gains = GainSettings {
        afx_gain: -3.0,
        ..GainSettings::default()
    };
    let eq = sound.equalizer_params(0, &gains).unwrap();
    assert_eq!(eq.global_gain, -3.0);
    assert!(sound.equalizer_params(1, &gains).is_none());
}

#[tokio::test]
async fn test_callout_playlist_drains_in_order() {
    let mut assets = MemoryAssetLoader::new();
    assets.insert(
        Glyph::EnterMode.asset_name(),
        PcmBuffer::silent(PcmFormat::mono_f32(RATE), 800),
    );
    let env = CalloutEnvironment::new(
        Arc::new(assets),
        Arc::new(WordSpeech),
        Arc::new(KeyedStrings::english()),
    )
    .with_voice(None, Arc::new(VoiceFilters::default()));

    let callout = StringCallout::new(CalloutOrigin::System, "Tracking started").with_glyph(Glyph::EnterMode);
    let sounds = callout.sounds(&CalloutContext::default(), &env);
    let played = drain_sounds(&sounds).await;

    assert_eq!(played.len(), 2);
    assert_eq!(played[0].description, "[mode_enter]");
    assert_eq!(played[0].buffer_count(), 1);
    assert_eq!(played[1].description, "\"Tracking started\"");
    assert_eq!(played[1].buffer_count(), 2);
}
