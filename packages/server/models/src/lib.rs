#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the incident map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the domain record types to allow independent evolution of the API
//! contract; the promotion bookkeeping column, for example, never leaves
//! the server.

use incident_map_incident_models::{AreaPolygon, CrimeMarker, NewCrimeMarker, PendingReport};
use serde::{Deserialize, Serialize};

/// A crime marker as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiMarker {
    /// Unique marker ID.
    pub id: i64,
    /// Police case number.
    pub case_number: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Clock time as an `HHMM` integer.
    pub time: i32,
    /// Date as epoch seconds at midnight UTC.
    pub date: i64,
    /// Primary classification.
    pub primary_type: String,
    /// Free-text description.
    pub description: String,
    /// Legal act / section reference.
    pub act: String,
    /// Station jurisdiction.
    pub station_id: i32,
}

impl From<CrimeMarker> for ApiMarker {
    fn from(marker: CrimeMarker) -> Self {
        Self {
            id: marker.id,
            case_number: marker.case_number,
            lat: marker.lat,
            lng: marker.lng,
            time: marker.time,
            date: marker.date,
            primary_type: marker.primary_type,
            description: marker.description,
            act: marker.act,
            station_id: marker.station_id,
        }
    }
}

/// Body of a direct typed marker submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewMarkerRequest {
    /// Police case number.
    pub case_number: String,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Clock time as an `HHMM` integer.
    pub time: i32,
    /// Date as epoch seconds at midnight UTC.
    pub date: i64,
    /// Primary classification.
    pub primary_type: String,
    /// Free-text description.
    pub description: String,
    /// Legal act / section reference.
    pub act: String,
    /// Station jurisdiction.
    pub station_id: i32,
}

impl From<NewMarkerRequest> for NewCrimeMarker {
    fn from(request: NewMarkerRequest) -> Self {
        Self {
            case_number: request.case_number,
            lat: request.lat,
            lng: request.lng,
            time: request.time,
            date: request.date,
            primary_type: request.primary_type,
            description: request.description,
            act: request.act,
            station_id: request.station_id,
            source_report_id: None,
        }
    }
}

/// An area polygon as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiArea {
    /// Unique polygon ID.
    pub gid: i64,
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

impl From<AreaPolygon> for ApiArea {
    fn from(area: AreaPolygon) -> Self {
        Self {
            gid: area.gid,
            kind: area.kind,
            station_id: area.station_id,
            name: area.name,
            district: area.district,
            geo_json: area.geo_json,
        }
    }
}

/// Body of an area polygon submission.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAreaRequest {
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

/// A pending crowd report as returned to moderators.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPendingReport {
    /// Unique report ID.
    pub id: i64,
    /// Reporter first name.
    pub first_name: String,
    /// Reporter last name.
    pub last_name: String,
    /// Reporter phone number.
    pub phone: String,
    /// Reporter contact address.
    pub address: String,
    /// Synthesized description.
    pub description: String,
    /// Evidence image reference.
    pub photo: String,
    /// Whether the reporter was verified.
    pub verified: bool,
    /// Latitude.
    pub lat: f64,
    /// Longitude.
    pub lng: f64,
    /// Clock time as an `HHMM` integer.
    pub time: i32,
    /// Date as epoch seconds at midnight UTC.
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

impl From<PendingReport> for ApiPendingReport {
    fn from(report: PendingReport) -> Self {
        Self {
            id: report.id,
            first_name: report.first_name,
            last_name: report.last_name,
            phone: report.phone,
            address: report.address,
            description: report.description,
            photo: report.photo,
            verified: report.verified,
            lat: report.lat,
            lng: report.lng,
            time: report.time,
            date: report.date,
            station_id: report.station_id,
            case_number: report.case_number,
            act: report.act,
            primary_type: report.primary_type,
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
}
