use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::config::Permission;
use crate::predict::{predict_passes, Pass, TleEntry};
use crate::web::api::error::{ApiError, ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, Operator};

const DEFAULT_HOURS: u32 = 24;
const MAX_HOURS: u32 = 7 * 24;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PassesQuery {
    /// NORAD id or name; all loaded satellites when omitted.
    pub satellite: Option<String>,
    /// Look-ahead window in hours.
    pub hours: Option<u32>,
    pub min_elevation: Option<f64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PassesResponse {
    pub passes: Vec<Pass>,
    pub satellite_count: usize,
}

#[utoipa::path(
    get,
    path = "/api/passes",
    tag = "passes",
    params(PassesQuery),
    responses(
        (status = 200, description = "Upcoming passes sorted by AOS", body = PassesResponse),
        (status = 400, description = "Invalid parameters", body = ErrorResponse),
        (status = 404, description = "Unknown satellite", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    security(("api_key" = []))
)]
pub async fn list_passes(
    State(state): State<AppState>,
    operator: Operator,
    Query(query): Query<PassesQuery>,
) -> ApiResult<Json<PassesResponse>> {
    require_permission(&operator, Permission::View)?;
    passes_from(&state, &query, Utc::now()).map(Json)
}

fn passes_from(state: &AppState, query: &PassesQuery, start: DateTime<Utc>) -> ApiResult<PassesResponse> {
    let hours = query.hours.unwrap_or(DEFAULT_HOURS);
    if hours == 0 || hours > MAX_HOURS {
        return Err(ApiError::Validation(format!(
            "hours must be between 1 and {}",
            MAX_HOURS
        )));
    }
    let end = start + Duration::hours(hours as i64);
    let min_el = query.min_elevation.unwrap_or(0.0);

    let station = state
        .config
        .station
        .ground_station()
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    let tles = state.selector.tles();

    let satellites: Vec<&TleEntry> = match &query.satellite {
        Some(q) => vec![tles
            .find(q)
            .ok_or_else(|| ApiError::NotFound(format!("unknown satellite: {}", q)))?],
        None => tles.satellites(),
    };

    let mut passes = Vec::new();
    let mut satellite_count = 0;
    for sat in satellites {
        match predict_passes(&station, sat, start, end, min_el) {
            Ok(found) => {
                if !found.is_empty() {
                    satellite_count += 1;
                }
                passes.extend(found);
            }
            Err(e) => log::warn!("Failed to predict passes for {}: {}", sat.info.name, e),
        }
    }
    passes.sort_by_key(|p| p.aos);

    Ok(PassesResponse {
        passes,
        satellite_count,
    })
}
