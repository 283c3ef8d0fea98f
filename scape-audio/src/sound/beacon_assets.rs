//! Beacon asset families
//!
//! Members are listed most on-axis first, which is the order
//! [`RegionSelector`](crate::sound::RegionSelector) maps angle windows onto.

use crate::sound::beacon::{BeaconAsset, DirectionalAssetSelector, ProximitySelector};

macro_rules! beacon_family {
    ($(#[$meta:meta])* $name:ident, beats = $beats:expr, { $($variant:ident => $asset:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl BeaconAsset for $name {
            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn asset_name(&self) -> &'static str {
                match self {
                    $($name::$variant => $asset),+
                }
            }

            fn family_name() -> &'static str {
                stringify!($name)
            }

            fn beats_in_phrase() -> usize {
                $beats
            }
        }
    };
}

beacon_family!(
    /// Original two-tone beacon
    ClassicBeacon, beats = 2, {
        BeatOn => "Classic_OnAxis",
        BeatOff => "Classic_OffAxis",
    }
);

beacon_family!(
    /// Default beacon
    V2Beacon, beats = 6, {
        Center => "Current_A+",
        Offset => "Current_A",
        Side => "Current_B",
        Behind => "Current_Behind",
    }
);

beacon_family!(TactileBeacon, beats = 6, {
    Center => "Tactile_OnAxis",
    Offset => "Tactile_OffAxis",
    Behind => "Tactile_Behind",
});

beacon_family!(FlareBeacon, beats = 6, {
    Center => "Flare_A+",
    Offset => "Flare_A",
    Side => "Flare_B",
    Behind => "Flare_Behind",
});

beacon_family!(ShimmerBeacon, beats = 6, {
    Center => "Shimmer_A+",
    Offset => "Shimmer_A",
    Side => "Shimmer_B",
    Behind => "Shimmer_Behind",
});

beacon_family!(PingBeacon, beats = 6, {
    Center => "Ping_A+",
    Offset => "Ping_A",
    Side => "Ping_B",
    Behind => "Tactile_Behind",
});

beacon_family!(DropBeacon, beats = 6, {
    Center => "Drop_A+",
    Offset => "Drop_A",
    Behind => "Drop_Behind",
});

beacon_family!(SignalBeacon, beats = 6, {
    Center => "Signal_A+",
    Offset => "Signal_A",
    Behind => "Drop_Behind",
});

beacon_family!(SignalSlowBeacon, beats = 12, {
    Center => "Signal_Slow_A+",
    Offset => "Signal_Slow_A",
    Behind => "Signal_Slow_Behind",
});

beacon_family!(SignalVerySlowBeacon, beats = 18, {
    Center => "Signal_Very_Slow_A+",
    Offset => "Signal_Very_Slow_A",
    Behind => "Signal_Very_Slow_Behind",
});

beacon_family!(MalletBeacon, beats = 6, {
    Center => "Mallet_A+",
    Offset => "Mallet_A",
    Behind => "Mallet_Behind",
});

beacon_family!(MalletSlowBeacon, beats = 12, {
    Center => "Mallet_Slow_A+",
    Offset => "Mallet_Slow_A",
    Behind => "Mallet_Slow_Behind",
});

beacon_family!(MalletVerySlowBeacon, beats = 18, {
    Center => "Mallet_Very_Slow_A+",
    Offset => "Mallet_Very_Slow_A",
    Behind => "Mallet_Very_Slow_Behind",
});

/// Near/far beacon driven by distance rather than heading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProximityBeacon {
    Far,
    Near,
}

impl BeaconAsset for ProximityBeacon {
    fn all() -> &'static [Self] {
        &[ProximityBeacon::Far, ProximityBeacon::Near]
    }

    fn asset_name(&self) -> &'static str {
        match self {
            ProximityBeacon::Far => "Proximity_Far",
            ProximityBeacon::Near => "Proximity_Close",
        }
    }

    fn family_name() -> &'static str {
        "ProximityBeacon"
    }

    fn beats_in_phrase() -> usize {
        6
    }

    fn default_selector() -> Option<Box<dyn DirectionalAssetSelector<Self>>> {
        Some(Box::new(ProximitySelector::new(
            ProximityBeacon::Near,
            ProximityBeacon::Far,
        )))
    }
}

/// Beacon families selectable by name, e.g. from configuration
pub const BEACON_FAMILIES: [&str; 14] = [
    "ClassicBeacon",
    "V2Beacon",
    "TactileBeacon",
    "FlareBeacon",
    "ShimmerBeacon",
    "PingBeacon",
    "DropBeacon",
    "SignalBeacon",
    "SignalSlowBeacon",
    "SignalVerySlowBeacon",
    "MalletBeacon",
    "MalletSlowBeacon",
    "MalletVerySlowBeacon",
    "ProximityBeacon",
];
