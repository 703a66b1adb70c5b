#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Normalization of raw crowd submissions into typed pending reports.
//!
//! Crowd clients submit every field as a string. The normalizer coerces
//! each one, collects every failure instead of stopping at the first, and
//! synthesizes the human-readable description line from the reporter's
//! identity. A partial record is never produced.

use incident_map_filter::parsing::{parse_clock_time, parse_date};
use incident_map_filter::YearWindow;
use incident_map_incident_models::NewPendingReport;
use serde::{Deserialize, Serialize};

/// A crowd submission exactly as it arrives over the wire: every field a
/// string, absent fields defaulting to empty.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawReportSubmission {
    /// Reporter first name.
    pub first_name: String,
    /// Reporter last name.
    pub last_name: String,
    /// Reporter phone number.
    pub phone: String,
    /// Reporter contact address.
    pub address: String,
    /// Free-text description of the incident.
    pub description: String,
    /// Evidence image reference.
    pub photo: String,
    /// Incident date as `DD/MM/YYYY`.
    pub date: String,
    /// Incident clock time as `HH:MM`.
    pub time: String,
    /// Station identifier.
    pub station_id: String,
    /// Case number, if the reporter knows it.
    pub case_number: String,
    /// Legal act / section reference.
    pub act: String,
    /// Primary classification.
    pub primary_type: String,
    /// Latitude as a decimal string.
    pub lat: String,
    /// Longitude as a decimal string.
    pub lng: String,
}

/// One field-level problem found while normalizing a submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldIssue {
    /// Name of the offending submission field.
    pub field: &'static str,
    /// What was wrong with it.
    pub message: String,
}

/// Error carrying every field issue found in a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeError {
    /// All field-level problems, in submission field order.
    pub issues: Vec<FieldIssue>,
}

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid report submission:")?;
        for issue in &self.issues {
            write!(f, " [{}: {}]", issue.field, issue.message)?;
        }
        Ok(())
    }
}

impl std::error::Error for NormalizeError {}

/// Normalizes a raw crowd submission into a typed [`NewPendingReport`].
///
/// Latitude/longitude coerce to `f64`, the station id to an integer, the
/// clock time to its `HHMM` encoding, and the date to midnight-epoch
/// seconds with the year honored as supplied (no year-window heuristic on
/// the submission path). The description is synthesized from the
/// reporter's name, phone, and original free text.
///
/// # Errors
///
/// Returns [`NormalizeError`] listing every missing or non-coercible
/// field.
#[allow(clippy::missing_panics_doc)] // unwraps only run when no issue was recorded
pub fn normalize_report(raw: &RawReportSubmission) -> Result<NewPendingReport, NormalizeError> {
    let mut issues = Vec::new();

    let first_name = require(&mut issues, "firstName", &raw.first_name);
    let last_name = require(&mut issues, "lastName", &raw.last_name);
    let phone = require(&mut issues, "phone", &raw.phone);
    let address = require(&mut issues, "address", &raw.address);
    let description = require(&mut issues, "description", &raw.description);
    let photo = require(&mut issues, "photo", &raw.photo);
    let case_number = require(&mut issues, "caseNumber", &raw.case_number);
    let act = require(&mut issues, "act", &raw.act);
    let primary_type = require(&mut issues, "primaryType", &raw.primary_type);

    let lat = coerce(&mut issues, "lat", &raw.lat, |v| {
        v.parse::<f64>().map_err(|_| "not a decimal number")
    });
    let lng = coerce(&mut issues, "lng", &raw.lng, |v| {
        v.parse::<f64>().map_err(|_| "not a decimal number")
    });
    let station_id = coerce(&mut issues, "stationId", &raw.station_id, |v| {
        v.parse::<i32>().map_err(|_| "not an integer")
    });
    let time = coerce(&mut issues, "time", &raw.time, |v| {
        parse_clock_time(v).map_err(|_| "expected HH:MM")
    });
    let date = coerce(&mut issues, "date", &raw.date, |v| {
        parse_date(v, YearWindow::Literal).map_err(|_| "expected DD/MM/YYYY")
    });

    if !issues.is_empty() {
        return Err(NormalizeError { issues });
    }

    let first_name = first_name.unwrap();
    let last_name = last_name.unwrap();
    let phone = phone.unwrap();

    Ok(NewPendingReport {
        description: synthesize_description(first_name, last_name, phone, description.unwrap()),
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        phone: phone.to_string(),
        address: address.unwrap().to_string(),
        photo: photo.unwrap().to_string(),
        verified: false,
        lat: lat.unwrap(),
        lng: lng.unwrap(),
        time: time.unwrap(),
        date: date.unwrap(),
        station_id: station_id.unwrap(),
        case_number: case_number.unwrap().to_string(),
        act: act.unwrap().to_string(),
        primary_type: primary_type.unwrap().to_string(),
    })
}

/// Formats the reporter identity and original free text into the single
/// human-readable description line stored on the pending report.
fn synthesize_description(first_name: &str, last_name: &str, phone: &str, text: &str) -> String {
    format!("Reported by {first_name} {last_name} ({phone}): {text}")
}

fn require<'a>(
    issues: &mut Vec<FieldIssue>,
    field: &'static str,
    value: &'a str,
) -> Option<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        issues.push(FieldIssue {
            field,
            message: "missing".to_string(),
        });
        return None;
    }
    Some(value)
}

fn coerce<T>(
    issues: &mut Vec<FieldIssue>,
    field: &'static str,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, &'static str>,
) -> Option<T> {
    let value = require(issues, field, value)?;
    match parse(value) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            issues.push(FieldIssue {
                field,
                message: message.to_string(),
            });
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn well_formed() -> RawReportSubmission {
        RawReportSubmission {
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            phone: "+91-98100-12345".to_string(),
            address: "14 Rajpur Road".to_string(),
            description: "two men snatched a phone near the metro gate".to_string(),
            photo: "uploads/report-831.jpg".to_string(),
            date: "15/08/2021".to_string(),
            time: "21:40".to_string(),
            station_id: "7".to_string(),
            case_number: "FIR-2021-0831".to_string(),
            act: "IPC 379".to_string(),
            primary_type: "THEFT".to_string(),
            lat: "28.6519".to_string(),
            lng: "77.2315".to_string(),
        }
    }

    #[test]
    fn normalizes_well_formed_submission() {
        let report = normalize_report(&well_formed()).unwrap();

        assert_eq!(report.time, 2140);
        assert_eq!(report.station_id, 7);
        assert!((report.lat - 28.6519).abs() < f64::EPSILON);
        assert!((report.lng - 77.2315).abs() < f64::EPSILON);
        assert!(!report.verified);
    }

    #[test]
    fn description_contains_reporter_name_and_phone_verbatim() {
        let report = normalize_report(&well_formed()).unwrap();

        assert!(report.description.contains("Asha"));
        assert!(report.description.contains("Verma"));
        assert!(report.description.contains("+91-98100-12345"));
        assert!(
            report
                .description
                .contains("two men snatched a phone near the metro gate")
        );
    }

    #[test]
    fn submission_date_honors_literal_year() {
        let report = normalize_report(&well_formed()).unwrap();

        let expected = chrono_midnight(2021, 8, 15);
        assert_eq!(report.date, expected);
    }

    #[test]
    fn aggregates_every_field_issue() {
        let raw = RawReportSubmission {
            first_name: String::new(),
            lat: "not-a-number".to_string(),
            time: "9 pm".to_string(),
            ..well_formed()
        };

        let err = normalize_report(&raw).unwrap_err();
        let fields: Vec<&str> = err.issues.iter().map(|i| i.field).collect();
        assert!(fields.contains(&"firstName"));
        assert!(fields.contains(&"lat"));
        assert!(fields.contains(&"time"));
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn missing_everything_reports_every_field() {
        let err = normalize_report(&RawReportSubmission::default()).unwrap_err();
        assert_eq!(err.issues.len(), 14);
        assert!(err.issues.iter().all(|i| i.message == "missing"));
    }

    fn chrono_midnight(year: i32, month: u32, day: u32) -> i64 {
        chrono::NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_time(chrono::NaiveTime::MIN)
            .and_utc()
            .timestamp()
    }
}
