//! Sounds playlist
//!
//! Ordered queue of the sounds making up one callout. The consumer pops sounds
//! off the front with [`Sounds::next`]. A playlist can also be replenished: sounds
//! that need a slow computation are appended later, when a notification arrives
//! on the channel handed to [`Sounds::with_replenishment`].
//!
//! The queue is the only state touched from two sides (consumer pop, replenishment
//! push), so every mutation happens under its mutex. The replenishment task lives
//! exactly as long as the playlist.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::sound::Sound;

type SoundQueue = Arc<Mutex<VecDeque<Box<dyn Sound>>>>;

fn lock(queue: &SoundQueue) -> std::sync::MutexGuard<'_, VecDeque<Box<dyn Sound>>> {
    queue.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
pub struct Sounds {
    queue: SoundQueue,
    replenisher: Option<JoinHandle<()>>,
}

impl Sounds {
    pub fn new(sounds: Vec<Box<dyn Sound>>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(sounds.into())),
            replenisher: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn single(sound: Box<dyn Sound>) -> Self {
        Self::new(vec![sound])
    }

    /// Playlist that appends `handler(notification)` for every notification received
    ///
    /// The handler may return no sounds. Listening stops when the sender side is
    /// dropped or the playlist is dropped. Must be called within a Tokio runtime
    /// for replenishment to happen; otherwise only `sounds` are played.
    pub fn with_replenishment<N, F>(
        sounds: Vec<Box<dyn Sound>>,
        mut notifications: mpsc::UnboundedReceiver<N>,
        mut handler: F,
    ) -> Self
    where
        N: Send + 'static,
        F: FnMut(N) -> Vec<Box<dyn Sound>> + Send + 'static,
    {
        let mut playlist = Self::new(sounds);

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!("Sounds replenishment unavailable without a Tokio runtime: {}", e);
                return playlist;
            }
        };

        let queue = Arc::clone(&playlist.queue);
        playlist.replenisher = Some(runtime.spawn(async move {
            while let Some(notification) = notifications.recv().await {
                let more = handler(notification);
                if more.is_empty() {
                    continue;
                }
                debug!("Appending {} sounds to playlist", more.len());
                lock(&queue).extend(more);
            }
        }));

        playlist
    }

    /// Pop the front sound
    #[allow(clippy::should_implement_trait)]
    pub fn next(&self) -> Option<Box<dyn Sound>> {
        lock(&self.queue).pop_front()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.queue).is_empty()
    }

    pub fn len(&self) -> usize {
        lock(&self.queue).len()
    }

    /// Descriptions of the queued sounds, front first
    pub fn descriptions(&self) -> Vec<String> {
        lock(&self.queue).iter().map(|s| s.description()).collect()
    }
}

impl From<Vec<Box<dyn Sound>>> for Sounds {
    fn from(sounds: Vec<Box<dyn Sound>>) -> Self {
        Self::new(sounds)
    }
}

impl Drop for Sounds {
    fn drop(&mut self) {
        if let Some(task) = self.replenisher.take() {
            task.abort();
        }
    }
}
