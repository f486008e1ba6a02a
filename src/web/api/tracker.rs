use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::config::Permission;
use crate::predict::Pass;
use crate::tracker::{lock, Mode, SatelliteRef, TrackerStatus, TrackingController, Transponder};
use crate::web::api::error::{ApiResult, ErrorResponse};
use crate::web::auth::{require_permission, AppState, Operator};

#[derive(Debug, Deserialize, ToSchema)]
pub struct SelectRequest {
    /// NORAD id or satellite name.
    pub satellite: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SelectResponse {
    pub satellite: SatelliteRef,
    pub transponder: Transponder,
    pub pass: Pass,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ModeRequest {
    pub mode: Mode,
}

/// Absolute values win over steps; `clear` zeroes both before anything else.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct OffsetsRequest {
    #[serde(default)]
    pub clear: bool,
    pub rit_hz: Option<f64>,
    pub xit_hz: Option<f64>,
    #[serde(default)]
    pub rit_steps: i32,
    #[serde(default)]
    pub xit_steps: i32,
}

fn snapshot(ctl: &mut TrackingController) -> Json<TrackerStatus> {
    ctl.refresh_status(Utc::now());
    Json(ctl.status())
}

#[utoipa::path(
    get,
    path = "/api/tracker/status",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Tracker status", body = TrackerStatus),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn status(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::View)?;
    Ok(Json(lock(&state.controller).status()))
}

#[utoipa::path(
    post,
    path = "/api/tracker/select",
    request_body = SelectRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Satellite selected", body = SelectResponse),
        (status = 400, description = "Unusable transponder data", body = ErrorResponse),
        (status = 404, description = "Unknown satellite, no transponders or no pass", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn select(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<SelectRequest>,
) -> ApiResult<Json<SelectResponse>> {
    require_permission(&operator, Permission::Control)?;
    log::info!("{} selects {}", operator.name, request.satellite);
    tokio::task::block_in_place(|| select_at(&state, &request.satellite, Utc::now()))
}

fn select_at(state: &AppState, query: &str, now: DateTime<Utc>) -> ApiResult<Json<SelectResponse>> {
    let selection = state.selector.resolve(query, now)?;
    let response = SelectResponse {
        satellite: selection.satellite.clone(),
        transponder: selection.transponders.main.clone(),
        pass: selection.pass.clone(),
    };
    lock(&state.controller).select(selection);
    Ok(Json(response))
}

#[utoipa::path(
    post,
    path = "/api/tracker/engage",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Rig engaged", body = TrackerStatus),
        (status = 409, description = "No satellite selected", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn engage(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::Control)?;
    let mut ctl = lock(&state.controller);
    ctl.engage(true)?;
    Ok(snapshot(&mut ctl))
}

#[utoipa::path(
    post,
    path = "/api/tracker/disengage",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Rig disengaged", body = TrackerStatus),
        (status = 409, description = "No satellite selected", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn disengage(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::Control)?;
    let mut ctl = lock(&state.controller);
    ctl.engage(false)?;
    Ok(snapshot(&mut ctl))
}

#[utoipa::path(
    post,
    path = "/api/tracker/recenter",
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Downlink re-centered", body = TrackerStatus),
        (status = 409, description = "No satellite selected", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn recenter(
    State(state): State<AppState>,
    operator: Operator,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::Control)?;
    let mut ctl = lock(&state.controller);
    ctl.recenter()?;
    Ok(snapshot(&mut ctl))
}

#[utoipa::path(
    post,
    path = "/api/tracker/mode",
    request_body = ModeRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Mode changed", body = TrackerStatus),
        (status = 409, description = "No satellite selected", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn mode(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<ModeRequest>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::Control)?;
    let mut ctl = lock(&state.controller);
    ctl.set_mode(request.mode)?;
    Ok(snapshot(&mut ctl))
}

#[utoipa::path(
    post,
    path = "/api/tracker/offsets",
    request_body = OffsetsRequest,
    security(("api_key" = [])),
    responses(
        (status = 200, description = "Offsets changed", body = TrackerStatus),
        (status = 409, description = "No satellite selected", body = ErrorResponse),
        (status = 401, description = "Unauthorized", body = ErrorResponse)
    ),
    tag = "tracker"
)]
pub async fn offsets(
    State(state): State<AppState>,
    operator: Operator,
    Json(request): Json<OffsetsRequest>,
) -> ApiResult<Json<TrackerStatus>> {
    require_permission(&operator, Permission::Control)?;
    let mut ctl = lock(&state.controller);
    if request.clear {
        ctl.clear_offsets()?;
    }
    if request.rit_steps != 0 || request.xit_steps != 0 {
        ctl.step_offsets(request.rit_steps, request.xit_steps)?;
    }
    if request.rit_hz.is_some() || request.xit_hz.is_some() {
        ctl.set_offsets(request.rit_hz, request.xit_hz)?;
    }
    Ok(snapshot(&mut ctl))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::config::Config;
    use crate::predict::tle_loader::tests::iss_loader;
    use crate::predict::GroundStation;
    use crate::tracker::{ControllerSettings, Selector, TrackingController, TransponderCatalog};
    use crate::web::api::error::ApiError;
    use chrono::{Duration, TimeZone};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};

    const CONFIG: &str = r#"
station: { latitude: 45.0, longitude: 7.0, altitude_m: 300 }
catalog: { tle_folder: tle, transponder_folder: tx }
radio: { model: dummy }
"#;

    pub fn app_state(name: &str) -> AppState {
        let dir = std::env::temp_dir().join(format!("sat-tracker-web-{}-{}", name, std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("25544.yaml"),
            "transponders:\n  FM Voice Repeater:\n    down_low: 437800000\n    up_low: 145990000\n    mode: FM\n",
        )
        .unwrap();

        AppState {
            config: Arc::new(Config::from_yaml(CONFIG).unwrap()),
            controller: Arc::new(Mutex::new(TrackingController::new(
                ControllerSettings::default(),
            ))),
            selector: Arc::new(Selector::new(
                Arc::new(iss_loader()),
                TransponderCatalog::new(dir),
                GroundStation::new(45.0, 7.0, 300.0),
                Duration::seconds(10),
            )),
        }
    }

    pub fn operator(permissions: &[Permission]) -> Operator {
        Operator {
            name: "test".into(),
            permissions: permissions.iter().copied().collect::<HashSet<_>>(),
        }
    }

    fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 12, 30, 0).unwrap()
    }

    #[tokio::test]
    async fn controls_need_a_selection() {
        let state = app_state("nosel");
        let err = engage(State(state.clone()), operator(&[Permission::Control]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Conflict("no_satellite_selected")));

        let err = engage(State(state), operator(&[Permission::View]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Permission(_)));
    }

    #[tokio::test]
    async fn select_then_operate() {
        let state = app_state("operate");
        let Json(selected) = select_at(&state, "ISS", epoch()).unwrap();
        assert_eq!(selected.satellite.norad_id, 25544);
        assert_eq!(selected.transponder.name, "FM Voice Repeater");

        let Json(status) = engage(State(state.clone()), operator(&[Permission::Control]))
            .await
            .unwrap();
        assert!(status.engaged);

        let Json(status) = offsets(
            State(state.clone()),
            operator(&[Permission::Control]),
            Json(OffsetsRequest {
                rit_steps: 3,
                xit_hz: Some(-250.0),
                ..OffsetsRequest::default()
            }),
        )
        .await
        .unwrap();
        assert_eq!(status.rit_hz, 300.0);
        assert_eq!(status.xit_hz, -250.0);

        let Json(status) = mode(
            State(state.clone()),
            operator(&[Permission::Control]),
            Json(ModeRequest { mode: Mode::Usb }),
        )
        .await
        .unwrap();
        assert_eq!(status.mode, Some(Mode::Usb));

        let Json(status) = disengage(State(state), operator(&[Permission::Control]))
            .await
            .unwrap();
        assert!(!status.engaged);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn select_handler_resolves_on_a_worker_thread() {
        let state = app_state("select-handler");
        let err = select(
            State(state.clone()),
            operator(&[Permission::Control]),
            Json(SelectRequest {
                satellite: "NOPE".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = select(
            State(state),
            operator(&[Permission::View]),
            Json(SelectRequest {
                satellite: "ISS".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Permission(_)));
    }

    #[tokio::test]
    async fn unknown_satellite_is_not_found() {
        let state = app_state("unknown");
        let err = select_at(&state, "NOPE", epoch()).unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert!(lock(&state.controller).read_plan().is_none());
    }
}
