//! Localized strings and spoken distance formatting
//!
//! String tables are an external concern; callouts only see the
//! [`LocalizedStrings`] trait. [`KeyedStrings`] is a map-backed implementation
//! with `{0}`-style positional arguments and a built-in English table.

use std::collections::HashMap;
use tracing::trace;

/// Source of localized strings
pub trait LocalizedStrings: Send + Sync {
    /// String for `key` with `{0}`, `{1}`, ... replaced by `args`
    fn string(&self, key: &str, args: &[&str]) -> String;
}

/// Map-backed string table
///
/// Unknown keys resolve to the key itself so missing translations stay audible.
#[derive(Debug, Clone, Default)]
pub struct KeyedStrings {
    strings: HashMap<String, String>,
}

const ENGLISH: &[(&str, &str)] = &[
    ("distance.format.meters", "{0} meters"),
    ("distance.format.kilometers", "{0} kilometers"),
    ("directions.name_distance", "{0}, {1}"),
    ("directions.name_close_by", "{0}, close by"),
    ("directions.name_about_distance", "{0}, about {1}"),
    ("directions.name_around_distance", "{0}, around {1}"),
    ("directions.at_poi", "At {0}"),
    ("directions.name_goes_left", "{0} goes left"),
    ("directions.name_goes_right", "{0} goes right"),
    ("directions.name_continues_ahead", "{0} continues ahead"),
    ("intersection.approaching_intersection", "Approaching intersection"),
    ("intersection.named_intersection", "{0} intersection"),
    ("location", "Location"),
    ("beacon.generic_name", "Audio beacon"),
    ("beacon.beacon_location_within", "Beacon within {0}"),
    (
        "beacon.beacon_location_within_audio_beacon_muted",
        "Beacon within {0}. Audio beacon muted.",
    ),
];

impl KeyedStrings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Built-in English table covering every key callouts use
    pub fn english() -> Self {
        Self {
            strings: ENGLISH
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.strings.insert(key.into(), value.into());
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }
}

impl LocalizedStrings for KeyedStrings {
    fn string(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.strings.get(key) else {
            trace!("Missing localized string: {}", key);
            return key.to_string();
        };

        args.iter()
            .enumerate()
            .fold(template.clone(), |text, (i, arg)| {
                text.replace(&format!("{{{}}}", i), arg)
            })
    }
}

/// How confidently a distance is phrased
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistanceStyle {
    Default,
    Close,
    About,
    Around,
}

impl DistanceStyle {
    const CLOSE_BY_M: f64 = 15.0;
    const FAR_AWAY_M: f64 = 200.0;
    const GOOD_ACCURACY_M: f64 = 10.0;
    const AVERAGE_ACCURACY_M: f64 = 20.0;

    /// Style for a distance given the fix's horizontal accuracy
    ///
    /// Unknown accuracy is treated as good.
    pub fn new(distance: f64, accuracy: Option<f64>) -> Self {
        if distance.round() <= Self::CLOSE_BY_M {
            return DistanceStyle::Close;
        }
        if distance >= Self::FAR_AWAY_M {
            return DistanceStyle::Default;
        }

        match accuracy {
            None => DistanceStyle::Default,
            Some(a) if a <= Self::GOOD_ACCURACY_M => DistanceStyle::Default,
            Some(a) if a <= Self::AVERAGE_ACCURACY_M => DistanceStyle::About,
            Some(_) => DistanceStyle::Around,
        }
    }
}

/// Spoken metric distance
///
/// Under a kilometer rounds to the nearest 5 m, beyond that to the nearest 50 m
/// and is spoken in kilometers.
pub fn formatted_distance(meters: f64, strings: &dyn LocalizedStrings) -> String {
    let meters = meters.max(0.0);
    let rounded = (meters / 5.0).round() * 5.0;

    if rounded < 1000.0 {
        let number = format!("{}", rounded as u64);
        return strings.string("distance.format.meters", &[&number]);
    }

    let rounded = (meters / 50.0).round() * 50.0;
    let number = trim_number(rounded / 1000.0);
    strings.string("distance.format.kilometers", &[&number])
}

/// `name` with its distance, phrased by [`DistanceStyle`]
pub fn name_with_distance(
    name: &str,
    meters: f64,
    accuracy: Option<f64>,
    strings: &dyn LocalizedStrings,
) -> String {
    let distance = formatted_distance(meters, strings);
    match DistanceStyle::new(meters, accuracy) {
        DistanceStyle::Default => strings.string("directions.name_distance", &[name, &distance]),
        DistanceStyle::Close => strings.string("directions.name_close_by", &[name]),
        DistanceStyle::About => strings.string("directions.name_about_distance", &[name, &distance]),
        DistanceStyle::Around => strings.string("directions.name_around_distance", &[name, &distance]),
    }
}

/// Up to two decimals, no trailing zeros
fn trim_number(value: f64) -> String {
    let text = format!("{:.2}", value);
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitution_and_fallback() {
        let strings = KeyedStrings::new().with("greeting", "{0} meets {1}, then {0} again");
        assert_eq!(strings.string("greeting", &["Ann", "Bo"]), "Ann meets Bo, then Ann again");
        assert_eq!(strings.string("missing.key", &["x"]), "missing.key");
    }

    #[test]
    fn test_formatted_distance() {
        let strings = KeyedStrings::english();
        assert_eq!(formatted_distance(42.0, &strings), "40 meters");
        assert_eq!(formatted_distance(43.0, &strings), "45 meters");
        assert_eq!(formatted_distance(1_234.0, &strings), "1.25 kilometers");
        assert_eq!(formatted_distance(2_000.0, &strings), "2 kilometers");
    }

    #[test]
    fn test_distance_style() {
        assert_eq!(DistanceStyle::new(12.0, Some(50.0)), DistanceStyle::Close);
        assert_eq!(DistanceStyle::new(250.0, Some(50.0)), DistanceStyle::Default);
        assert_eq!(DistanceStyle::new(80.0, Some(5.0)), DistanceStyle::Default);
        assert_eq!(DistanceStyle::new(80.0, Some(15.0)), DistanceStyle::About);
        assert_eq!(DistanceStyle::new(80.0, Some(65.0)), DistanceStyle::Around);
        assert_eq!(DistanceStyle::new(80.0, None), DistanceStyle::Default);
    }

    #[test]
    fn test_name_with_distance() {
        let strings = KeyedStrings::english();
        assert_eq!(name_with_distance("Cafe", 80.0, Some(5.0), &strings), "Cafe, 80 meters");
        assert_eq!(name_with_distance("Cafe", 80.0, Some(15.0), &strings), "Cafe, about 80 meters");
        assert_eq!(name_with_distance("Cafe", 8.0, None, &strings), "Cafe, close by");
    }
}
