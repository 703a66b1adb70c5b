#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Domain record types shared across the incident-map system.
//!
//! Two integer encodings run through everything here: clock times are
//! stored as `HHMM` integers (14:30 → `1430`) and calendar dates as Unix
//! epoch seconds at midnight UTC of the incident date. Both the direct
//! submission path and the moderation promotion path must produce the same
//! encodings.

use serde::{Deserialize, Serialize};

/// A canonical crime marker as stored in the `crime_markers` table.
///
/// Immutable once created; there is no update or delete path for markers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrimeMarker {
    /// Primary key, owned by storage.
    pub id: i64,
    /// Police case number. Intended unique but not enforced at write time.
    pub case_number: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Clock time of the incident, encoded as an `HHMM` integer.
    pub time: i32,
    /// Date of the incident, encoded as epoch seconds at midnight UTC.
    pub date: i64,
    /// Primary classification (e.g. "THEFT").
    pub primary_type: String,
    /// Free-text description.
    pub description: String,
    /// Legal act / section reference.
    pub act: String,
    /// Station jurisdiction. Refers to [`AreaPolygon::station_id`]; not
    /// enforced as a foreign key.
    pub station_id: i32,
    /// Identifier of the pending report this marker was promoted from.
    /// `None` for directly-submitted markers. Unique where present; this
    /// is the idempotency key for promotion.
    pub source_report_id: Option<i64>,
}

/// A crime marker ready for insertion, before storage assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCrimeMarker {
    /// Police case number.
    pub case_number: String,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Clock time encoded as an `HHMM` integer.
    pub time: i32,
    /// Date encoded as epoch seconds at midnight UTC.
    pub date: i64,
    /// Primary classification.
    pub primary_type: String,
    /// Free-text description.
    pub description: String,
    /// Legal act / section reference.
    pub act: String,
    /// Station jurisdiction.
    pub station_id: i32,
    /// Source pending report for promoted markers, `None` for direct
    /// submissions.
    pub source_report_id: Option<i64>,
}

/// An unverified crowd-sourced report awaiting moderation.
///
/// Consumed exactly once: accept derives a [`CrimeMarker`] and removes the
/// report, reject removes it outright. Never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingReport {
    /// Primary key, owned by storage.
    pub id: i64,
    /// Reporter first name.
    pub first_name: String,
    /// Reporter last name.
    pub last_name: String,
    /// Reporter phone number.
    pub phone: String,
    /// Reporter contact address.
    pub address: String,
    /// Free-text description as originally submitted.
    pub description: String,
    /// Evidence image reference (URL or object key).
    pub photo: String,
    /// Whether the reporter's contact details were verified.
    pub verified: bool,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Clock time encoded as an `HHMM` integer.
    pub time: i32,
    /// Date encoded as epoch seconds at midnight UTC.
    pub date: i64,
    /// Station jurisdiction.
    pub station_id: i32,
    /// Case number supplied by the reporter, if any.
    pub case_number: String,
    /// Legal act / section reference supplied by the reporter.
    pub act: String,
    /// Primary classification supplied by the reporter.
    pub primary_type: String,
}

/// A pending report ready for insertion, before storage assigns an id.
///
/// Produced by the report normalizer; a partial record is never built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPendingReport {
    /// Reporter first name.
    pub first_name: String,
    /// Reporter last name.
    pub last_name: String,
    /// Reporter phone number.
    pub phone: String,
    /// Reporter contact address.
    pub address: String,
    /// Synthesized description: reporter identity plus the original free
    /// text.
    pub description: String,
    /// Evidence image reference.
    pub photo: String,
    /// Whether the reporter's contact details were verified.
    pub verified: bool,
    /// Latitude (WGS84).
    pub lat: f64,
    /// Longitude (WGS84).
    pub lng: f64,
    /// Clock time encoded as an `HHMM` integer.
    pub time: i32,
    /// Date encoded as epoch seconds at midnight UTC.
    pub date: i64,
    /// Station jurisdiction.
    pub station_id: i32,
    /// Case number supplied by the reporter.
    pub case_number: String,
    /// Legal act / section reference.
    pub act: String,
    /// Primary classification.
    pub primary_type: String,
}

/// A police-station jurisdiction polygon.
///
/// Read-only for the moderation core; created and listed through the
/// boundary CRUD endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaPolygon {
    /// Primary key, owned by storage.
    pub gid: i64,
    /// Kind of area (e.g. "Major crime").
    #[serde(rename = "type")]
    pub kind: String,
    /// Station identifier markers refer to.
    pub station_id: i32,
    /// Station name.
    pub name: String,
    /// District the station belongs to.
    pub district: String,
    /// GeoJSON Feature payload (geometry plus properties), stored verbatim.
    pub geo_json: serde_json::Value,
}

/// An area polygon ready for insertion, before storage assigns a gid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAreaPolygon {
    /// Kind of area.
    #[serde(rename = "type")]
    pub kind: String,
    /// Station identifier.
    pub station_id: i32,
    /// Station name.
    pub name: String,
    /// District.
    pub district: String,
    /// GeoJSON Feature payload.
    pub geo_json: serde_json::Value,
}
