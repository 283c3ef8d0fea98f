//! GPX reader
//!
//! Streams the document with `quick_xml`'s namespace-aware reader. Extension
//! values are attributed by the namespace of the element that carries them:
//! Garmin's `TrackPointExtension` namespace, the Soundscape namespace, or no
//! extension namespace at all for the legacy `<speed>`/`<course>` values.
//!
//! Unknown elements are skipped. Unparseable optional values are dropped with
//! a warning; a track point without a valid `lat`/`lon` fails the parse.

use chrono::{DateTime, Utc};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::NsReader;
use std::path::Path;
use tracing::{debug, warn};

use crate::document::{
    GarminExtension, GpxBounds, GpxDocument, GpxMetadata, GpxSegment, GpxTrack, GpxTrackPoint,
    SoundscapeExtension,
};
use crate::error::{Error, Result};

pub const GPX_NS: &str = "http://www.topografix.com/GPX/1/1";
pub const GARMIN_NS: &str = "http://www.garmin.com/xmlschemas/TrackPointExtension/v1";
pub const SOUNDSCAPE_NS: &str = "https://microsoft.com/Soundscape";

/// Which extension family an element belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Family {
    Plain,
    Garmin,
    Soundscape,
}

impl Family {
    fn of(ns: &ResolveResult) -> Self {
        let ResolveResult::Bound(Namespace(uri)) = ns else {
            return Family::Plain;
        };
        let uri = String::from_utf8_lossy(uri);

        // Garmin has published the schema under both http and https, v1 and v2
        if uri.contains("garmin.com/xmlschemas/TrackPointExtension") {
            Family::Garmin
        } else if uri.eq_ignore_ascii_case(SOUNDSCAPE_NS) {
            Family::Soundscape
        } else {
            Family::Plain
        }
    }
}

#[derive(Debug)]
struct Element {
    name: String,
    family: Family,
}

/// Parser state while walking the event stream
#[derive(Default)]
struct Builder {
    document: GpxDocument,
    stack: Vec<Element>,
    track: Option<GpxTrack>,
    segment: Option<GpxSegment>,
    point: Option<GpxTrackPoint>,
    saw_root: bool,
}

fn local_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

fn attribute(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(attr.unescape_value()?.into_owned())),
        None => Ok(None),
    }
}

fn required_coordinate(e: &BytesStart<'_>, name: &str) -> Result<f64> {
    let value = attribute(e, name)?
        .ok_or_else(|| Error::InvalidDocument(format!("track point without '{}'", name)))?;
    value
        .trim()
        .parse()
        .map_err(|_| Error::InvalidDocument(format!("track point '{}' is not a number: {}", name, value)))
}

fn number(element: &str, text: &str) -> Option<f64> {
    match text.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            warn!("Ignoring non-numeric <{}>: {}", element, text);
            None
        }
    }
}

fn timestamp(text: &str) -> Option<DateTime<Utc>> {
    match DateTime::parse_from_rfc3339(text.trim()) {
        Ok(time) => Some(time.with_timezone(&Utc)),
        Err(e) => {
            warn!("Ignoring invalid <time> {}: {}", text, e);
            None
        }
    }
}

impl Builder {
    fn parent(&self) -> Option<&str> {
        let len = self.stack.len();
        len.checked_sub(2).map(|i| self.stack[i].name.as_str())
    }

    fn inside(&self, name: &str) -> bool {
        self.stack.iter().any(|e| e.name == name)
    }

    fn open(&mut self, e: &BytesStart<'_>, family: Family) -> Result<()> {
        let name = local_name(e);

        if !self.saw_root {
            if name != "gpx" {
                return Err(Error::InvalidDocument(format!("root element is <{}>, expected <gpx>", name)));
            }
            self.saw_root = true;
            self.document.creator = attribute(e, "creator")?;
            return Ok(());
        }

        match name.as_str() {
            "metadata" => self.document.metadata = Some(GpxMetadata::default()),
            "bounds" => {
                if let Some(metadata) = self.document.metadata.as_mut() {
                    metadata.bounds = Self::bounds(e)?;
                }
            }
            "trk" => self.track = Some(GpxTrack::default()),
            "trkseg" => self.segment = Some(GpxSegment::default()),
            "trkpt" => {
                let latitude = required_coordinate(e, "lat")?;
                let longitude = required_coordinate(e, "lon")?;
                self.point = Some(GpxTrackPoint::new(latitude, longitude));
            }
            _ => {}
        }

        // Any Soundscape element inside a point marks the point as recorded by the tracker
        if family == Family::Soundscape {
            if let Some(point) = self.point.as_mut() {
                point.extensions.soundscape.get_or_insert_with(SoundscapeExtension::default);
            }
        }

        Ok(())
    }

    fn bounds(e: &BytesStart<'_>) -> Result<Option<GpxBounds>> {
        let value = |name: &str| -> Result<Option<f64>> {
            Ok(attribute(e, name)?.and_then(|v| number(name, &v)))
        };

        match (value("minlat")?, value("minlon")?, value("maxlat")?, value("maxlon")?) {
            (Some(min_latitude), Some(min_longitude), Some(max_latitude), Some(max_longitude)) => {
                Ok(Some(GpxBounds {
                    min_latitude,
                    min_longitude,
                    max_latitude,
                    max_longitude,
                }))
            }
            _ => Ok(None),
        }
    }

    fn close(&mut self, name: &str) {
        match name {
            "trkpt" => {
                if let (Some(point), Some(segment)) = (self.point.take(), self.segment.as_mut()) {
                    segment.points.push(point);
                }
            }
            "trkseg" => {
                if let (Some(segment), Some(track)) = (self.segment.take(), self.track.as_mut()) {
                    track.segments.push(segment);
                }
            }
            "trk" => {
                if let Some(track) = self.track.take() {
                    self.document.tracks.push(track);
                }
            }
            _ => {}
        }
    }

    fn text(&mut self, text: &str) {
        let Some(current) = self.stack.last() else {
            return;
        };
        let name = current.name.clone();
        let family = current.family;
        let parent = self.parent().unwrap_or_default().to_string();

        if self.point.is_some() && self.inside("extensions") {
            self.extension_text(&name, family, text);
            return;
        }

        if let Some(point) = self.point.as_mut().filter(|_| parent == "trkpt") {
            match name.as_str() {
                "ele" => point.elevation = number(&name, text),
                "time" => point.time = timestamp(text),
                "course" => point.course = number(&name, text),
                "speed" => point.speed = number(&name, text),
                "hdop" => point.hdop = number(&name, text),
                "vdop" => point.vdop = number(&name, text),
                _ => {}
            }
            return;
        }

        if parent == "trk" && name == "name" {
            if let Some(track) = self.track.as_mut() {
                track.name = Some(text.to_string());
            }
            return;
        }

        if parent == "metadata" {
            if let Some(metadata) = self.document.metadata.as_mut() {
                match name.as_str() {
                    "name" => metadata.name = Some(text.to_string()),
                    "desc" => metadata.desc = Some(text.to_string()),
                    "time" => metadata.time = timestamp(text),
                    "keywords" => metadata.keywords = Some(text.to_string()),
                    _ => {}
                }
            }
        }
    }

    fn extension_text(&mut self, name: &str, family: Family, text: &str) {
        let Some(point) = self.point.as_mut() else {
            return;
        };
        let extensions = &mut point.extensions;

        match family {
            Family::Garmin => {
                let garmin = extensions.garmin.get_or_insert_with(GarminExtension::default);
                match name {
                    "speed" => garmin.speed = number(name, text),
                    "course" => garmin.course = number(name, text),
                    _ => {}
                }
            }
            Family::Soundscape => {
                let soundscape = extensions
                    .soundscape
                    .get_or_insert_with(SoundscapeExtension::default);
                match name {
                    "horizontalAccuracy" => soundscape.horizontal_accuracy = number(name, text),
                    "verticalAccuracy" => soundscape.vertical_accuracy = number(name, text),
                    "deviceHeading" => soundscape.device_heading = number(name, text),
                    "trueHeading" => soundscape.true_heading = number(name, text),
                    "magneticHeading" => soundscape.magnetic_heading = number(name, text),
                    "headingAccuracy" => soundscape.heading_accuracy = number(name, text),
                    "activity" => soundscape.activity = Some(text.to_string()),
                    _ => {}
                }
            }
            Family::Plain => match name {
                "speed" => extensions.legacy_speed = number(name, text),
                "course" => extensions.legacy_course = number(name, text),
                _ => {}
            },
        }
    }
}

/// Parse a GPX document from text
pub fn parse_str(xml: &str) -> Result<GpxDocument> {
    let mut reader = NsReader::from_str(xml);
    reader.trim_text(true);

    let mut builder = Builder::default();
    loop {
        match reader.read_resolved_event()? {
            (ns, Event::Start(e)) => {
                let family = Family::of(&ns);
                builder.open(&e, family)?;
                builder.stack.push(Element {
                    name: local_name(&e),
                    family,
                });
            }
            (ns, Event::Empty(e)) => {
                let name = local_name(&e);
                builder.open(&e, Family::of(&ns))?;
                builder.close(&name);
            }
            (_, Event::End(_)) => {
                if let Some(element) = builder.stack.pop() {
                    builder.close(&element.name);
                }
            }
            (_, Event::Text(t)) => {
                let text = t.unescape()?;
                builder.text(&text);
            }
            (_, Event::CData(t)) => {
                let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                builder.text(&text);
            }
            (_, Event::Eof) => break,
            _ => {}
        }
    }

    if !builder.saw_root {
        return Err(Error::InvalidDocument("no <gpx> element".to_string()));
    }

    let document = builder.document;
    debug!(
        "Parsed GPX document: {} tracks, {} points",
        document.tracks.len(),
        document.point_count()
    );
    Ok(document)
}

/// Read and parse a GPX file
pub fn parse_file(path: &Path) -> Result<GpxDocument> {
    let xml = std::fs::read_to_string(path)?;
    parse_str(&xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::GpxIndex;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="unit test"
     xmlns="http://www.topografix.com/GPX/1/1"
     xmlns:gpxtpx="http://www.garmin.com/xmlschemas/TrackPointExtension/v1"
     xmlns:gpxsc="https://microsoft.com/Soundscape">
  <metadata>
    <name>Morning walk</name>
    <keywords>activity:walking, time_interval:0.5</keywords>
    <bounds minlat="47.0" minlon="-122.5" maxlat="47.7" maxlon="-122.0"/>
  </metadata>
  <trk>
    <name>Loop</name>
    <trkseg>
      <trkpt lat="47.6" lon="-122.3">
        <ele>12.5</ele>
        <time>2024-05-01T12:00:00Z</time>
        <hdop>6</hdop>
        <extensions>
          <gpxtpx:TrackPointExtension>
            <gpxtpx:speed>1.4</gpxtpx:speed>
            <gpxtpx:course>90</gpxtpx:course>
          </gpxtpx:TrackPointExtension>
          <gpxsc:trkex>
            <gpxsc:horizontalAccuracy>5</gpxsc:horizontalAccuracy>
            <gpxsc:deviceHeading>80</gpxsc:deviceHeading>
            <gpxsc:activity>walking</gpxsc:activity>
          </gpxsc:trkex>
        </extensions>
      </trkpt>
      <trkpt lat="47.601" lon="-122.3">
        <extensions>
          <speed>2.0</speed>
          <course>not a number</course>
        </extensions>
      </trkpt>
      <trkpt lat="47.602" lon="-122.3"/>
    </trkseg>
  </trk>
</gpx>"#;

    #[test]
    fn test_parse_sample() {
        let doc = parse_str(SAMPLE).unwrap();
        assert_eq!(doc.creator.as_deref(), Some("unit test"));

        let metadata = doc.metadata.as_ref().unwrap();
        assert_eq!(metadata.name.as_deref(), Some("Morning walk"));
        assert_eq!(doc.keywords(), Some("activity:walking, time_interval:0.5"));
        assert_eq!(metadata.bounds.unwrap().max_latitude, 47.7);

        assert_eq!(doc.tracks.len(), 1);
        assert_eq!(doc.tracks[0].name.as_deref(), Some("Loop"));
        assert_eq!(doc.point_count(), 3);

        let first = doc.track_point(GpxIndex::ZERO).unwrap();
        assert_eq!(first.elevation, Some(12.5));
        assert_eq!(first.hdop, Some(6.0));
        assert!(first.time.is_some());
        let garmin = first.extensions.garmin.as_ref().unwrap();
        assert_eq!((garmin.speed, garmin.course), (Some(1.4), Some(90.0)));

        let location = first.gpx_location();
        assert_eq!(location.location.horizontal_accuracy, Some(5.0));
        assert_eq!(location.device_heading, Some(80.0));
        assert_eq!(location.activity.as_deref(), Some("walking"));

        let second = doc.track_point(GpxIndex::new(0, 0, 1)).unwrap();
        assert_eq!(second.extensions.legacy_speed, Some(2.0));
        assert_eq!(second.extensions.legacy_course, None);
        assert!(!second.has_soundscape_extension());

        let third = doc.track_point(GpxIndex::new(0, 0, 2)).unwrap();
        assert_eq!(third.latitude, 47.602);
    }

    #[test]
    fn test_rejects_other_documents() {
        assert!(matches!(parse_str("<kml></kml>"), Err(Error::InvalidDocument(_))));
        assert!(matches!(parse_str(""), Err(Error::InvalidDocument(_))));
        assert!(parse_str("<gpx><trk><trkseg><trkpt lat=\"1\"/></trkseg></trk></gpx>").is_err());
        assert!(parse_str("<gpx><trk></gpx>").is_err());
    }

    #[test]
    fn test_document_without_points() {
        let doc = parse_str(r#"<gpx version="1.1"><metadata><name>Empty</name></metadata></gpx>"#).unwrap();
        assert!(doc.tracks.is_empty());
        assert_eq!(doc.point_count(), 0);
    }
}
