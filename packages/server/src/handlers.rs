//! HTTP handler functions for the incident map API.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use incident_map_database::queries;
use incident_map_filter::compiler::FilterSet;
use incident_map_incident_models::NewAreaPolygon;
use incident_map_moderation::{AcceptOverrides, ModerationError};
use incident_map_report::{RawReportSubmission, normalize_report};
use incident_map_server_models::{
    ApiArea, ApiHealth, ApiMarker, ApiPendingReport, NewAreaRequest, NewMarkerRequest,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health() -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// `POST /api/markers`
///
/// Creates a marker from a direct typed submission.
pub async fn create_marker(
    state: web::Data<AppState>,
    body: web::Json<NewMarkerRequest>,
) -> HttpResponse {
    let marker = body.into_inner().into();
    match queries::insert_marker(state.db.as_ref(), &marker).await {
        Ok(created) => HttpResponse::Created().json(ApiMarker::from(created)),
        Err(e) => {
            log::error!("Failed to insert marker: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to insert marker"
            }))
        }
    }
}

/// `GET /api/markers`
pub async fn list_markers(state: web::Data<AppState>) -> HttpResponse {
    match queries::query_markers(state.db.as_ref(), &FilterSet::default()).await {
        Ok(rows) => {
            let markers: Vec<ApiMarker> = rows.into_iter().map(ApiMarker::from).collect();
            HttpResponse::Ok().json(markers)
        }
        Err(e) => {
            log::error!("Failed to list markers: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list markers"
            }))
        }
    }
}

/// `POST /api/markers/filter`
///
/// Compiles the client's raw filter map into predicates and queries the
/// marker table with them.
pub async fn filter_markers(
    state: web::Data<AppState>,
    body: web::Json<BTreeMap<String, String>>,
) -> HttpResponse {
    let filters = match state.compiler.compile(&body) {
        Ok(filters) => filters,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            }));
        }
    };

    match queries::query_markers(state.db.as_ref(), &filters).await {
        Ok(rows) => {
            let markers: Vec<ApiMarker> = rows.into_iter().map(ApiMarker::from).collect();
            HttpResponse::Ok().json(markers)
        }
        Err(e) => {
            log::error!("Failed to filter markers: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to filter markers"
            }))
        }
    }
}

/// `GET /api/markers/{id}`
pub async fn get_marker(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    match queries::get_marker(state.db.as_ref(), id).await {
        Ok(Some(marker)) => HttpResponse::Ok().json(ApiMarker::from(marker)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Marker {id} not found")
        })),
        Err(e) => {
            log::error!("Failed to get marker {id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to get marker"
            }))
        }
    }
}

/// `GET /api/markers/case/{case_number}`
pub async fn get_marker_by_case(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let case_number = path.into_inner();
    match queries::get_marker_by_case_number(state.db.as_ref(), &case_number).await {
        Ok(Some(marker)) => HttpResponse::Ok().json(ApiMarker::from(marker)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Marker {case_number} not found")
        })),
        Err(e) => {
            log::error!("Failed to get marker {case_number}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to get marker"
            }))
        }
    }
}

/// `POST /api/areas`
pub async fn create_area(
    state: web::Data<AppState>,
    body: web::Json<NewAreaRequest>,
) -> HttpResponse {
    let request = body.into_inner();
    let area = NewAreaPolygon {
        kind: request.kind,
        station_id: request.station_id,
        name: request.name,
        district: request.district,
        geo_json: request.geo_json,
    };
    match queries::insert_area(state.db.as_ref(), &area).await {
        Ok(created) => HttpResponse::Created().json(ApiArea::from(created)),
        Err(e) => {
            log::error!("Failed to insert area: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to insert area"
            }))
        }
    }
}

/// `GET /api/areas`
pub async fn list_areas(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_areas(state.db.as_ref()).await {
        Ok(rows) => {
            let areas: Vec<ApiArea> = rows.into_iter().map(ApiArea::from).collect();
            HttpResponse::Ok().json(areas)
        }
        Err(e) => {
            log::error!("Failed to list areas: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list areas"
            }))
        }
    }
}

/// `GET /api/areas/{gid}`
pub async fn get_area(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let gid = path.into_inner();
    match queries::get_area(state.db.as_ref(), gid).await {
        Ok(Some(area)) => HttpResponse::Ok().json(ApiArea::from(area)),
        Ok(None) => HttpResponse::NotFound().json(serde_json::json!({
            "error": format!("Area {gid} not found")
        })),
        Err(e) => {
            log::error!("Failed to get area {gid}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to get area"
            }))
        }
    }
}

/// `POST /api/reports`
///
/// Normalizes a raw crowd submission and stores it for moderation. A
/// validation failure returns every field issue at once.
pub async fn submit_report(
    state: web::Data<AppState>,
    body: web::Json<RawReportSubmission>,
) -> HttpResponse {
    let report = match normalize_report(&body) {
        Ok(report) => report,
        Err(e) => {
            return HttpResponse::BadRequest().json(serde_json::json!({
                "error": "Invalid report submission",
                "issues": e.issues,
            }));
        }
    };

    match queries::insert_pending_report(state.db.as_ref(), &report).await {
        Ok(created) => HttpResponse::Created().json(ApiPendingReport::from(created)),
        Err(e) => {
            log::error!("Failed to insert pending report: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to insert pending report"
            }))
        }
    }
}

/// `GET /api/reports`
///
/// Lists pending reports for the moderator view.
pub async fn list_reports(state: web::Data<AppState>) -> HttpResponse {
    match queries::list_pending_reports(state.db.as_ref()).await {
        Ok(rows) => {
            let reports: Vec<ApiPendingReport> =
                rows.into_iter().map(ApiPendingReport::from).collect();
            HttpResponse::Ok().json(reports)
        }
        Err(e) => {
            log::error!("Failed to list pending reports: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to list pending reports"
            }))
        }
    }
}

/// `POST /api/reports/{id}/accept`
///
/// Promotes a pending report into a canonical marker.
pub async fn accept_report(
    state: web::Data<AppState>,
    path: web::Path<i64>,
    body: web::Json<AcceptOverrides>,
) -> HttpResponse {
    let id = path.into_inner();
    match state.pipeline.accept(id, &body).await {
        Ok(marker) => HttpResponse::Created().json(ApiMarker::from(marker)),
        Err(ModerationError::NotFound { .. }) => HttpResponse::NotFound().json(
            serde_json::json!({ "error": format!("Pending report {id} not found") }),
        ),
        Err(e) => {
            log::error!("Failed to accept report {id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to accept report"
            }))
        }
    }
}

/// `POST /api/reports/{id}/reject`
///
/// Removes a pending report without promotion.
pub async fn reject_report(state: web::Data<AppState>, path: web::Path<i64>) -> HttpResponse {
    let id = path.into_inner();
    match state.pipeline.reject(id).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(ModerationError::NotFound { .. }) => HttpResponse::NotFound().json(
            serde_json::json!({ "error": format!("Pending report {id} not found") }),
        ),
        Err(e) => {
            log::error!("Failed to reject report {id}: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to reject report"
            }))
        }
    }
}
