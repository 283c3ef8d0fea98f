//! GPX writer
//!
//! Serializes a [`GpxDocument`] as GPX 1.1. Track point extensions are written
//! in the Garmin and Soundscape namespaces so recordings read back with the
//! same values.

use chrono::{DateTime, SecondsFormat, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;

use crate::document::{GpxDocument, GpxMetadata, GpxTrackPoint};
use crate::error::{Error, Result};
use crate::parser::{GARMIN_NS, GPX_NS, SOUNDSCAPE_NS};

fn time_text(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn number_element<W: Write>(writer: &mut Writer<W>, name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(value) => text_element(writer, name, &value.to_string()),
        None => Ok(()),
    }
}

fn write_metadata<W: Write>(writer: &mut Writer<W>, metadata: &GpxMetadata) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new("metadata")))?;

    if let Some(name) = &metadata.name {
        text_element(writer, "name", name)?;
    }
    if let Some(desc) = &metadata.desc {
        text_element(writer, "desc", desc)?;
    }
    if let Some(time) = &metadata.time {
        text_element(writer, "time", &time_text(time))?;
    }
    if let Some(keywords) = &metadata.keywords {
        text_element(writer, "keywords", keywords)?;
    }
    if let Some(bounds) = &metadata.bounds {
        let (min_lat, min_lon) = (bounds.min_latitude.to_string(), bounds.min_longitude.to_string());
        let (max_lat, max_lon) = (bounds.max_latitude.to_string(), bounds.max_longitude.to_string());
        writer.write_event(Event::Empty(BytesStart::new("bounds").with_attributes([
            ("minlat", min_lat.as_str()),
            ("minlon", min_lon.as_str()),
            ("maxlat", max_lat.as_str()),
            ("maxlon", max_lon.as_str()),
        ])))?;
    }

    writer.write_event(Event::End(BytesEnd::new("metadata")))?;
    Ok(())
}

fn write_point<W: Write>(writer: &mut Writer<W>, point: &GpxTrackPoint) -> Result<()> {
    let (lat, lon) = (point.latitude.to_string(), point.longitude.to_string());
    writer.write_event(Event::Start(
        BytesStart::new("trkpt").with_attributes([("lat", lat.as_str()), ("lon", lon.as_str())]),
    ))?;

    number_element(writer, "ele", point.elevation)?;
    if let Some(time) = &point.time {
        text_element(writer, "time", &time_text(time))?;
    }
    number_element(writer, "course", point.course)?;
    number_element(writer, "speed", point.speed)?;
    number_element(writer, "hdop", point.hdop)?;
    number_element(writer, "vdop", point.vdop)?;

    let extensions = &point.extensions;
    let has_legacy = extensions.legacy_speed.is_some() || extensions.legacy_course.is_some();
    if has_legacy || extensions.garmin.is_some() || extensions.soundscape.is_some() {
        writer.write_event(Event::Start(BytesStart::new("extensions")))?;

        number_element(writer, "speed", extensions.legacy_speed)?;
        number_element(writer, "course", extensions.legacy_course)?;

        if let Some(garmin) = &extensions.garmin {
            writer.write_event(Event::Start(BytesStart::new("gpxtpx:TrackPointExtension")))?;
            number_element(writer, "gpxtpx:speed", garmin.speed)?;
            number_element(writer, "gpxtpx:course", garmin.course)?;
            writer.write_event(Event::End(BytesEnd::new("gpxtpx:TrackPointExtension")))?;
        }

        if let Some(soundscape) = &extensions.soundscape {
            writer.write_event(Event::Start(BytesStart::new("gpxsc:trkex")))?;
            number_element(writer, "gpxsc:horizontalAccuracy", soundscape.horizontal_accuracy)?;
            number_element(writer, "gpxsc:verticalAccuracy", soundscape.vertical_accuracy)?;
            number_element(writer, "gpxsc:deviceHeading", soundscape.device_heading)?;
            number_element(writer, "gpxsc:trueHeading", soundscape.true_heading)?;
            number_element(writer, "gpxsc:magneticHeading", soundscape.magnetic_heading)?;
            number_element(writer, "gpxsc:headingAccuracy", soundscape.heading_accuracy)?;
            if let Some(activity) = &soundscape.activity {
                text_element(writer, "gpxsc:activity", activity)?;
            }
            writer.write_event(Event::End(BytesEnd::new("gpxsc:trkex")))?;
        }

        writer.write_event(Event::End(BytesEnd::new("extensions")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("trkpt")))?;
    Ok(())
}

/// Serialize `document` to GPX 1.1 text
pub fn to_string(document: &GpxDocument) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let creator = document.creator.as_deref().unwrap_or("scape-gpx");
    writer.write_event(Event::Start(BytesStart::new("gpx").with_attributes([
        ("version", "1.1"),
        ("creator", creator),
        ("xmlns", GPX_NS),
        ("xmlns:gpxtpx", GARMIN_NS),
        ("xmlns:gpxsc", SOUNDSCAPE_NS),
    ])))?;

    if let Some(metadata) = &document.metadata {
        write_metadata(&mut writer, metadata)?;
    }

    for track in &document.tracks {
        writer.write_event(Event::Start(BytesStart::new("trk")))?;
        if let Some(name) = &track.name {
            text_element(&mut writer, "name", name)?;
        }
        for segment in &track.segments {
            writer.write_event(Event::Start(BytesStart::new("trkseg")))?;
            for point in &segment.points {
                write_point(&mut writer, point)?;
            }
            writer.write_event(Event::End(BytesEnd::new("trkseg")))?;
        }
        writer.write_event(Event::End(BytesEnd::new("trk")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("gpx")))?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| Error::InvalidDocument(format!("writer produced invalid UTF-8: {}", e)))
}

impl GpxDocument {
    /// GPX 1.1 text for this document
    pub fn to_gpx_string(&self) -> Result<String> {
        to_string(self)
    }
}
