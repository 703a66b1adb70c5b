//! Database query functions for markers, area polygons, and pending
//! reports.
//!
//! Everything goes through `query_raw_params()` / `exec_raw_params()` with
//! `$n` placeholders. Compiled [`FilterSet`]s are rendered into WHERE
//! clauses here; the predicate column names come from a closed set, so the
//! dynamic SQL never interpolates client-controlled identifiers.

use std::fmt::Write as _;

use incident_map_filter::compiler::{FilterSet, Predicate, PredicateValue};
use incident_map_incident_models::{
    AreaPolygon, CrimeMarker, NewAreaPolygon, NewCrimeMarker, NewPendingReport, PendingReport,
};
use moosicbox_json_utils::database::ToValue as _;
use switchy_database::{Database, DatabaseValue};

use crate::DbError;

/// Column list selected for every marker query.
const MARKER_COLUMNS: &str = "id, case_number, lat, lng, time, date, \
                              primary_type, description, act, station_id, source_report_id";

/// Column list selected for every pending report query.
const PENDING_COLUMNS: &str = "id, first_name, last_name, phone, address, description, photo, \
                               verified, lat, lng, time, date, station_id, case_number, act, \
                               primary_type";

/// Column list selected for every area polygon query.
const AREA_COLUMNS: &str = "gid, type, station_id, name, district, geo_json";

fn marker_from_row(row: &switchy_database::Row) -> CrimeMarker {
    CrimeMarker {
        id: row.to_value("id").unwrap_or(0),
        case_number: row.to_value("case_number").unwrap_or_default(),
        lat: row.to_value("lat").unwrap_or(0.0),
        lng: row.to_value("lng").unwrap_or(0.0),
        time: row.to_value("time").unwrap_or(0),
        date: row.to_value("date").unwrap_or(0),
        primary_type: row.to_value("primary_type").unwrap_or_default(),
        description: row.to_value("description").unwrap_or_default(),
        act: row.to_value("act").unwrap_or_default(),
        station_id: row.to_value("station_id").unwrap_or(0),
        source_report_id: row.to_value("source_report_id").unwrap_or(None),
    }
}

fn pending_from_row(row: &switchy_database::Row) -> PendingReport {
    PendingReport {
        id: row.to_value("id").unwrap_or(0),
        first_name: row.to_value("first_name").unwrap_or_default(),
        last_name: row.to_value("last_name").unwrap_or_default(),
        phone: row.to_value("phone").unwrap_or_default(),
        address: row.to_value("address").unwrap_or_default(),
        description: row.to_value("description").unwrap_or_default(),
        photo: row.to_value("photo").unwrap_or_default(),
        verified: row.to_value("verified").unwrap_or(false),
        lat: row.to_value("lat").unwrap_or(0.0),
        lng: row.to_value("lng").unwrap_or(0.0),
        time: row.to_value("time").unwrap_or(0),
        date: row.to_value("date").unwrap_or(0),
        station_id: row.to_value("station_id").unwrap_or(0),
        case_number: row.to_value("case_number").unwrap_or_default(),
        act: row.to_value("act").unwrap_or_default(),
        primary_type: row.to_value("primary_type").unwrap_or_default(),
    }
}

fn area_from_row(row: &switchy_database::Row) -> Result<AreaPolygon, DbError> {
    let geo_json_text: String = row.to_value("geo_json").unwrap_or_default();
    Ok(AreaPolygon {
        gid: row.to_value("gid").unwrap_or(0),
        kind: row.to_value("type").unwrap_or_default(),
        station_id: row.to_value("station_id").unwrap_or(0),
        name: row.to_value("name").unwrap_or_default(),
        district: row.to_value("district").unwrap_or_default(),
        geo_json: serde_json::from_str(&geo_json_text)?,
    })
}

fn marker_insert_params(marker: &NewCrimeMarker) -> Vec<DatabaseValue> {
    vec![
        DatabaseValue::String(marker.case_number.clone()),
        DatabaseValue::Real64(marker.lat),
        DatabaseValue::Real64(marker.lng),
        DatabaseValue::Int32(marker.time),
        DatabaseValue::Int64(marker.date),
        DatabaseValue::String(marker.primary_type.clone()),
        DatabaseValue::String(marker.description.clone()),
        DatabaseValue::String(marker.act.clone()),
        DatabaseValue::Int32(marker.station_id),
        marker
            .source_report_id
            .map_or(DatabaseValue::Null, DatabaseValue::Int64),
    ]
}

/// Inserts a directly-submitted crime marker.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_marker(
    db: &dyn Database,
    marker: &NewCrimeMarker,
) -> Result<CrimeMarker, DbError> {
    let sql = format!(
        "INSERT INTO crime_markers (
            case_number, lat, lng, time, date,
            primary_type, description, act, station_id, source_report_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING {MARKER_COLUMNS}"
    );
    let rows = db
        .query_raw_params(&sql, &marker_insert_params(marker))
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Marker insert returned no row".to_string(),
    })?;

    Ok(marker_from_row(row))
}

/// Inserts a marker promoted from a pending report.
///
/// The `source_report_id` unique key makes this idempotent: if a marker
/// derived from the same pending report already exists, nothing is
/// inserted and `None` is returned. This is what keeps a racing second
/// accept from double-promoting.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_promoted_marker(
    db: &dyn Database,
    marker: &NewCrimeMarker,
) -> Result<Option<CrimeMarker>, DbError> {
    let sql = format!(
        "INSERT INTO crime_markers (
            case_number, lat, lng, time, date,
            primary_type, description, act, station_id, source_report_id
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (source_report_id) WHERE source_report_id IS NOT NULL DO NOTHING
        RETURNING {MARKER_COLUMNS}"
    );
    let rows = db
        .query_raw_params(&sql, &marker_insert_params(marker))
        .await?;

    Ok(rows.first().map(marker_from_row))
}

/// Queries crime markers matching a compiled filter predicate set.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn query_markers(
    db: &dyn Database,
    filters: &FilterSet,
) -> Result<Vec<CrimeMarker>, DbError> {
    let mut sql = format!("SELECT {MARKER_COLUMNS} FROM crime_markers WHERE 1=1");

    let mut params: Vec<DatabaseValue> = Vec::new();
    let mut param_idx = 1u32;

    for predicate in filters.predicates() {
        match predicate {
            Predicate::Eq { column, value } => {
                write!(sql, " AND {column} = ${param_idx}").unwrap();
                params.push(match value {
                    PredicateValue::Text(text) => DatabaseValue::String(text.clone()),
                    PredicateValue::Integer(int) => DatabaseValue::Int64(*int),
                });
                param_idx += 1;
            }
            Predicate::Between {
                column,
                lower,
                upper,
            } => {
                write!(
                    sql,
                    " AND {column} BETWEEN ${param_idx} AND ${}",
                    param_idx + 1
                )
                .unwrap();
                params.push(DatabaseValue::Int64(*lower));
                params.push(DatabaseValue::Int64(*upper));
                param_idx += 2;
            }
        }
    }

    sql.push_str(" ORDER BY date DESC, time DESC");

    let rows = db.query_raw_params(&sql, &params).await?;

    Ok(rows.iter().map(marker_from_row).collect())
}

/// Gets a single marker by id.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_marker(db: &dyn Database, id: i64) -> Result<Option<CrimeMarker>, DbError> {
    let sql = format!("SELECT {MARKER_COLUMNS} FROM crime_markers WHERE id = $1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::Int64(id)])
        .await?;

    Ok(rows.first().map(marker_from_row))
}

/// Gets a single marker by case number.
///
/// Case numbers are intended unique but not enforced; if duplicates exist
/// the first match is returned.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_marker_by_case_number(
    db: &dyn Database,
    case_number: &str,
) -> Result<Option<CrimeMarker>, DbError> {
    let sql = format!("SELECT {MARKER_COLUMNS} FROM crime_markers WHERE case_number = $1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::String(case_number.to_string())])
        .await?;

    Ok(rows.first().map(marker_from_row))
}

/// Inserts an area polygon.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails or the GeoJSON
/// payload cannot be serialized.
pub async fn insert_area(db: &dyn Database, area: &NewAreaPolygon) -> Result<AreaPolygon, DbError> {
    let sql = format!(
        "INSERT INTO area_polygons (type, station_id, name, district, geo_json)
         VALUES ($1, $2, $3, $4, $5)
         RETURNING {AREA_COLUMNS}"
    );
    let rows = db
        .query_raw_params(
            &sql,
            &[
                DatabaseValue::String(area.kind.clone()),
                DatabaseValue::Int32(area.station_id),
                DatabaseValue::String(area.name.clone()),
                DatabaseValue::String(area.district.clone()),
                DatabaseValue::String(serde_json::to_string(&area.geo_json)?),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Area insert returned no row".to_string(),
    })?;

    area_from_row(row)
}

/// Lists all area polygons.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_areas(db: &dyn Database) -> Result<Vec<AreaPolygon>, DbError> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM area_polygons ORDER BY gid");
    let rows = db.query_raw_params(&sql, &[]).await?;

    rows.iter().map(area_from_row).collect()
}

/// Gets a single area polygon by gid.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_area(db: &dyn Database, gid: i64) -> Result<Option<AreaPolygon>, DbError> {
    let sql = format!("SELECT {AREA_COLUMNS} FROM area_polygons WHERE gid = $1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::Int64(gid)])
        .await?;

    rows.first().map(area_from_row).transpose()
}

/// Inserts a normalized pending report.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn insert_pending_report(
    db: &dyn Database,
    report: &NewPendingReport,
) -> Result<PendingReport, DbError> {
    let sql = format!(
        "INSERT INTO pending_reports (
            first_name, last_name, phone, address, description, photo, verified,
            lat, lng, time, date, station_id, case_number, act, primary_type
        ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        RETURNING {PENDING_COLUMNS}"
    );
    let rows = db
        .query_raw_params(
            &sql,
            &[
                DatabaseValue::String(report.first_name.clone()),
                DatabaseValue::String(report.last_name.clone()),
                DatabaseValue::String(report.phone.clone()),
                DatabaseValue::String(report.address.clone()),
                DatabaseValue::String(report.description.clone()),
                DatabaseValue::String(report.photo.clone()),
                DatabaseValue::Bool(report.verified),
                DatabaseValue::Real64(report.lat),
                DatabaseValue::Real64(report.lng),
                DatabaseValue::Int32(report.time),
                DatabaseValue::Int64(report.date),
                DatabaseValue::Int32(report.station_id),
                DatabaseValue::String(report.case_number.clone()),
                DatabaseValue::String(report.act.clone()),
                DatabaseValue::String(report.primary_type.clone()),
            ],
        )
        .await?;

    let row = rows.first().ok_or_else(|| DbError::Conversion {
        message: "Pending report insert returned no row".to_string(),
    })?;

    Ok(pending_from_row(row))
}

/// Lists all pending reports, oldest first.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn list_pending_reports(db: &dyn Database) -> Result<Vec<PendingReport>, DbError> {
    let sql = format!("SELECT {PENDING_COLUMNS} FROM pending_reports ORDER BY id");
    let rows = db.query_raw_params(&sql, &[]).await?;

    Ok(rows.iter().map(pending_from_row).collect())
}

/// Gets a single pending report by id.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn get_pending_report(
    db: &dyn Database,
    id: i64,
) -> Result<Option<PendingReport>, DbError> {
    let sql = format!("SELECT {PENDING_COLUMNS} FROM pending_reports WHERE id = $1");
    let rows = db
        .query_raw_params(&sql, &[DatabaseValue::Int64(id)])
        .await?;

    Ok(rows.first().map(pending_from_row))
}

/// Deletes a pending report by id, reporting whether a record matched.
///
/// # Errors
///
/// Returns [`DbError`] if the database operation fails.
pub async fn delete_pending_report(db: &dyn Database, id: i64) -> Result<bool, DbError> {
    let deleted = db
        .exec_raw_params(
            "DELETE FROM pending_reports WHERE id = $1",
            &[DatabaseValue::Int64(id)],
        )
        .await?;

    Ok(deleted > 0)
}
