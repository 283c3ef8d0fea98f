//! Directional beacon sounds
//!
//! A beacon is a family of looping assets, each meant for a range of angles
//! between the user's heading and the beacon. The audio engine asks the beacon
//! which asset (and volume) fits the user's current heading or location, then
//! fetches that asset's buffer. Angles with no asset play a silent buffer of
//! the same format and length so the loop never gaps.
//!
//! Selection is delegated to a [`DirectionalAssetSelector`] supplied when the
//! beacon is built.

use scape_common::geo::add_degrees;
use scape_common::Location;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;
use tracing::{debug, warn};

use crate::audio::{AssetLoader, EqParameters, GainSettings, PcmBuffer, PcmFormat};
use crate::error::{Error, Result};
use crate::sound::{RingMode, SoundType};

/// Member of an enumerated beacon asset family
pub trait BeaconAsset: Copy + Eq + Hash + Debug + Send + Sync + 'static {
    /// Every member, in selector order (most on-axis first)
    fn all() -> &'static [Self];

    fn asset_name(&self) -> &'static str;

    fn family_name() -> &'static str;

    /// Beats in one loop of the family's assets
    fn beats_in_phrase() -> usize;

    /// Selector used when the caller does not supply one
    fn default_selector() -> Option<Box<dyn DirectionalAssetSelector<Self>>> {
        RegionSelector::<Self>::for_family()
            .map(|s| Box::new(s) as Box<dyn DirectionalAssetSelector<Self>>)
    }
}

/// What a selector decides from
#[derive(Debug, Clone, PartialEq)]
pub enum SelectorInput {
    /// Heading-based selection while navigating
    Heading {
        user_heading: Option<f64>,
        bearing_to_beacon: f64,
    },
    /// Location-only selection, e.g. geofence entry
    Location {
        user: Option<Location>,
        beacon: Location,
    },
}

/// Strategy choosing `(asset, volume)` for a beacon family
pub trait DirectionalAssetSelector<A>: Send + Sync {
    fn select(&self, input: &SelectorInput) -> Option<(A, f32)>;
}

/// Angle-window selector for families of two, three or four assets
///
/// The angle is the user's heading minus the bearing to the beacon. Windows:
/// - 2 assets: on-axis within 22.5° of the beacon
/// - 3 assets: on-axis within 15°, offset out to 125°, behind beyond
/// - 4 assets: on-axis within 15°, offset to 55°, side to 125°, behind beyond
///
/// Without a heading the last (behind) asset plays.
#[derive(Debug, Clone)]
pub struct RegionSelector<A> {
    assets: Vec<A>,
}

impl<A: BeaconAsset> RegionSelector<A> {
    /// Selector over `assets`, `None` unless there are two to four of them
    pub fn new(assets: Vec<A>) -> Option<Self> {
        if (2..=4).contains(&assets.len()) {
            Some(Self { assets })
        } else {
            None
        }
    }

    pub fn for_family() -> Option<Self> {
        Self::new(A::all().to_vec())
    }

    fn region(&self, angle: f64) -> usize {
        match self.assets.len() {
            2 => {
                if angle >= 337.5 || angle <= 22.5 {
                    0
                } else {
                    1
                }
            }
            3 => {
                if angle >= 345.0 || angle <= 15.0 {
                    0
                } else if (235.0..=345.0).contains(&angle) || (15.0..=125.0).contains(&angle) {
                    1
                } else {
                    2
                }
            }
            _ => {
                if angle >= 345.0 || angle <= 15.0 {
                    0
                } else if (305.0..=345.0).contains(&angle) || (15.0..=55.0).contains(&angle) {
                    1
                } else if (235.0..=305.0).contains(&angle) || (55.0..=125.0).contains(&angle) {
                    2
                } else {
                    3
                }
            }
        }
    }
}

impl<A: BeaconAsset> DirectionalAssetSelector<A> for RegionSelector<A> {
    fn select(&self, input: &SelectorInput) -> Option<(A, f32)> {
        let SelectorInput::Heading {
            user_heading,
            bearing_to_beacon,
        } = input
        else {
            return None;
        };

        let index = match user_heading {
            Some(heading) => self.region(add_degrees(*heading, -bearing_to_beacon)),
            None => self.assets.len() - 1,
        };

        Some((self.assets[index], 1.0))
    }
}

/// Distance-based selector for near/far families
///
/// Within `near_distance` the near asset plays, within `far_distance` the far
/// asset plays, and beyond that the far asset plays muted.
#[derive(Debug, Clone)]
pub struct ProximitySelector<A> {
    pub near: A,
    pub far: A,
    pub near_distance: f64,
    pub far_distance: f64,
}

impl<A: BeaconAsset> ProximitySelector<A> {
    pub fn new(near: A, far: A) -> Self {
        Self {
            near,
            far,
            near_distance: 20.0,
            far_distance: 30.0,
        }
    }
}

impl<A: BeaconAsset> DirectionalAssetSelector<A> for ProximitySelector<A> {
    fn select(&self, input: &SelectorInput) -> Option<(A, f32)> {
        let SelectorInput::Location { user, beacon } = input else {
            return None;
        };

        let Some(user) = user else {
            return Some((self.far, 0.0));
        };

        let distance = user.distance_to(beacon);
        if distance < self.near_distance {
            Some((self.near, 1.0))
        } else if distance < self.far_distance {
            Some((self.far, 1.0))
        } else {
            Some((self.far, 0.0))
        }
    }
}

/// Melodies played when a route beacon starts or ends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BeaconAccent {
    Start,
    End,
}

impl BeaconAccent {
    pub fn asset_name(&self) -> &'static str {
        match self {
            BeaconAccent::Start => "Route_Start",
            BeaconAccent::End => "Route_End",
        }
    }
}

/// Beacon over asset family `A`
pub struct BeaconSound<A: BeaconAsset> {
    sound_type: SoundType,
    reference: Location,
    selector: Box<dyn DirectionalAssetSelector<A>>,
    buffers: HashMap<A, PcmBuffer>,
    silent: PcmBuffer,
    accents: HashMap<BeaconAccent, PcmBuffer>,
    intro: Option<BeaconAccent>,
    outro: Option<BeaconAccent>,
    common_format: PcmFormat,
}

impl<A: BeaconAsset> BeaconSound<A> {
    /// Load every asset of the family and validate their formats
    ///
    /// The beacon is localized at `reference`. Fails if any asset is missing or
    /// if the assets disagree on PCM format.
    pub fn new(
        loader: &dyn AssetLoader,
        reference: Location,
        selector: Box<dyn DirectionalAssetSelector<A>>,
    ) -> Result<Self> {
        let assets = A::all();
        let Some(first) = assets.first() else {
            return Err(Error::EmptyFamily(A::family_name().to_string()));
        };

        let mut buffers = HashMap::with_capacity(assets.len());
        for asset in assets {
            let buffer = loader.load(asset.asset_name())?;
            debug!(
                "Loaded {} ({} frames)",
                asset.asset_name(),
                buffer.frame_length()
            );
            buffers.insert(*asset, buffer);
        }

        let reference_buffer = &buffers[first];
        let common_format = reference_buffer.format();
        for asset in assets {
            let found = buffers[asset].format();
            if found != common_format {
                return Err(Error::FormatMismatch {
                    asset: asset.asset_name().to_string(),
                    expected: common_format,
                    found,
                });
            }
        }

        let silent = PcmBuffer::silent(common_format, reference_buffer.frame_length());

        Ok(Self {
            sound_type: SoundType::Localized(reference.clone(), RingMode::Ring),
            reference,
            selector,
            buffers,
            silent,
            accents: HashMap::new(),
            intro: None,
            outro: None,
            common_format,
        })
    }

    /// Build with the family's default selector
    pub fn with_default_selector(loader: &dyn AssetLoader, reference: Location) -> Result<Self> {
        let selector =
            A::default_selector().ok_or_else(|| Error::NoSelector(A::family_name().to_string()))?;
        Self::new(loader, reference, selector)
    }

    /// Play without spatialization
    pub fn standard(mut self) -> Self {
        self.sound_type = SoundType::Standard;
        self
    }

    /// Play at a bearing relative to the user's heading
    pub fn relative(mut self, direction: f64) -> Self {
        self.sound_type = SoundType::Relative(direction, RingMode::Ring);
        self
    }

    /// Play at an absolute compass heading
    pub fn compass(mut self, heading: f64) -> Self {
        self.sound_type = SoundType::Compass(heading, RingMode::Ring);
        self
    }

    /// Attach a start or end melody
    ///
    /// A missing accent asset is skipped; one in a different format is an error.
    pub fn with_accent(mut self, loader: &dyn AssetLoader, accent: BeaconAccent) -> Result<Self> {
        match accent {
            BeaconAccent::Start => self.intro = Some(accent),
            BeaconAccent::End => self.outro = Some(accent),
        }

        let buffer = match loader.load(accent.asset_name()) {
            Ok(buffer) => buffer,
            Err(Error::AssetNotFound(name)) => {
                warn!("Beacon accent {} not found, skipping", name);
                return Ok(self);
            }
            Err(e) => return Err(e),
        };

        if buffer.format() != self.common_format {
            return Err(Error::FormatMismatch {
                asset: accent.asset_name().to_string(),
                expected: self.common_format,
                found: buffer.format(),
            });
        }

        self.accents.insert(accent, buffer);
        Ok(self)
    }

    pub fn sound_type(&self) -> &SoundType {
        &self.sound_type
    }

    pub fn description(&self) -> String {
        A::family_name().to_string()
    }

    pub fn reference_location(&self) -> &Location {
        &self.reference
    }

    pub fn common_format(&self) -> PcmFormat {
        self.common_format
    }

    pub fn beats_in_phrase(&self) -> usize {
        A::beats_in_phrase()
    }

    pub fn intro(&self) -> Option<BeaconAccent> {
        self.intro
    }

    pub fn outro(&self) -> Option<BeaconAccent> {
        self.outro
    }

    /// Asset and volume for the user's heading, bearing measured from `user_location`
    pub fn asset_for_heading(&self, user_heading: Option<f64>, user_location: &Location) -> Option<(A, f32)> {
        self.selector.select(&SelectorInput::Heading {
            user_heading,
            bearing_to_beacon: user_location.bearing_to(&self.reference),
        })
    }

    /// Asset and volume from the user's location alone
    pub fn asset_for_location(&self, user_location: Option<&Location>) -> Option<(A, f32)> {
        self.selector.select(&SelectorInput::Location {
            user: user_location.cloned(),
            beacon: self.reference.clone(),
        })
    }

    /// Buffer for a selected asset, silence when nothing was selected
    pub fn buffer_for(&self, asset: Option<A>) -> PcmBuffer {
        asset
            .and_then(|a| self.buffers.get(&a))
            .unwrap_or(&self.silent)
            .clone()
    }

    /// Accent melody, silence when it was not loaded
    pub fn accent_buffer(&self, accent: BeaconAccent) -> PcmBuffer {
        self.accents.get(&accent).unwrap_or(&self.silent).clone()
    }

    pub fn silent_buffer(&self) -> PcmBuffer {
        self.silent.clone()
    }

    pub fn equalizer_params(&self, gains: &GainSettings) -> Option<EqParameters> {
        EqParameters::from_gain(gains.beacon_gain)
    }
}
