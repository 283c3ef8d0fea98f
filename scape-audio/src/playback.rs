//! Playback drain
//!
//! The audio engine itself lives outside this crate. These helpers are the
//! minimal consumer: they pull every buffer of every layer until each layer
//! reports the end of its audio.

use futures::future::join_all;
use tracing::debug;

use crate::audio::PcmBuffer;
use crate::sound::{Sound, Sounds};

/// Buffers pulled from one sound, indexed by layer
#[derive(Debug, Clone, Default)]
pub struct DrainedSound {
    pub description: String,
    pub layers: Vec<Vec<PcmBuffer>>,
}

impl DrainedSound {
    pub fn buffer_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// Seconds of audio in the longest layer
    pub fn duration(&self) -> f64 {
        self.layers
            .iter()
            .map(|layer| layer.iter().map(PcmBuffer::duration).sum::<f64>())
            .fold(0.0, f64::max)
    }
}

async fn drain_layer(sound: &dyn Sound, layer: usize) -> Vec<PcmBuffer> {
    let mut buffers = Vec::new();
    while let Some(buffer) = sound.next_buffer(layer).await {
        buffers.push(buffer);
    }
    buffers
}

/// Pull all layers of `sound` concurrently until each ends
pub async fn drain_sound(sound: &dyn Sound) -> DrainedSound {
    let layers = join_all((0..sound.layer_count()).map(|layer| drain_layer(sound, layer))).await;

    let drained = DrainedSound {
        description: sound.description(),
        layers,
    };
    debug!(
        "Drained {}: {} buffers over {} layers",
        drained.description,
        drained.buffer_count(),
        drained.layers.len()
    );
    drained
}

/// Play a playlist to completion, one sound after another
pub async fn drain_sounds(sounds: &Sounds) -> Vec<DrainedSound> {
    let mut played = Vec::new();
    while let Some(sound) = sounds.next() {
        played.push(drain_sound(sound.as_ref()).await);
    }
    played
}
