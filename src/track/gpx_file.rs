// src/track/gpx_file.rs
//! Reading track points from GPX and writing densified tracks back out

use super::{Track, TrackPoint};
use crate::error::{Result, TrackError};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{BufReader, Read, Write};
use std::path::Path;

/// Load every `trkpt` of every track segment in file order
pub fn load_track(path: &Path) -> Result<Track> {
    let file = File::open(path)?;
    let mut track = read_track(BufReader::new(file))?;

    if track.name.is_none() {
        track.name = path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned());
    }

    Ok(track)
}

pub fn read_track<R: Read>(reader: R) -> Result<Track> {
    let doc = gpx::read(reader)?;

    let mut points = Vec::new();
    for trk in &doc.tracks {
        for segment in &trk.segments {
            for waypoint in &segment.points {
                let position = waypoint.point();
                let timestamp = match &waypoint.time {
                    Some(time) => Some(parse_time(&time.format()?)?),
                    None => None,
                };

                points.push(TrackPoint {
                    lat: position.y(),
                    lon: position.x(),
                    elevation_m: waypoint.elevation.unwrap_or(0.0),
                    timestamp,
                });
            }
        }
    }

    if points.is_empty() {
        return Err(TrackError::EmptyTrack);
    }

    let name = doc.tracks.iter().find_map(|trk| trk.name.clone());
    Ok(Track { name, points })
}

/// Accepts RFC 3339 and the ISO 8601 variant with an hour-only offset (`+02`)
fn parse_time(text: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%#z"))
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| TrackError::Parse(format!("Invalid timestamp {:?}: {}", text, e)))
}

/// Serialize a track as a single-segment GPX 1.1 document
pub fn to_gpx(track: &Track) -> String {
    let mut gpx = String::from(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<gpx version="1.1" creator="route-replay" xmlns="http://www.topografix.com/GPX/1/1">
  <trk>
"#,
    );

    if let Some(ref name) = track.name {
        gpx.push_str(&format!("    <name>{}</name>\n", escape_xml(name)));
    }

    gpx.push_str("    <trkseg>\n");
    for point in &track.points {
        gpx.push_str(&format!(
            "      <trkpt lat=\"{:.6}\" lon=\"{:.6}\">\n",
            point.lat, point.lon
        ));
        gpx.push_str(&format!("        <ele>{:.1}</ele>\n", point.elevation_m));

        if let Some(time) = point.timestamp {
            gpx.push_str(&format!(
                "        <time>{}</time>\n",
                time.to_rfc3339_opts(SecondsFormat::Millis, true)
            ));
        }

        gpx.push_str("      </trkpt>\n");
    }
    gpx.push_str("    </trkseg>\n  </trk>\n</gpx>\n");
    gpx
}

pub fn write_gpx<W: Write>(track: &Track, mut writer: W) -> Result<()> {
    writer.write_all(to_gpx(track).as_bytes())?;
    writer.flush()?;
    Ok(())
}

pub fn save_track(track: &Track, path: &Path) -> Result<()> {
    let file = File::create(path)?;
    write_gpx(track, file)
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
