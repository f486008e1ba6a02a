use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify, OpenApi,
};

use super::api::error::ErrorResponse;
use super::api::passes::PassesResponse;
use super::api::tracker::{ModeRequest, OffsetsRequest, SelectRequest, SelectResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        super::api::tracker::status,
        super::api::tracker::select,
        super::api::tracker::engage,
        super::api::tracker::disengage,
        super::api::tracker::recenter,
        super::api::tracker::mode,
        super::api::tracker::offsets,
        super::api::passes::list_passes,
    ),
    components(
        schemas(
            ErrorResponse,
            SelectRequest,
            SelectResponse,
            ModeRequest,
            OffsetsRequest,
            PassesResponse,
            crate::tracker::TrackerStatus,
            crate::tracker::Transponder,
            crate::tracker::Mode,
            crate::tracker::RotorState,
            crate::predict::Pass,
            crate::predict::Observation,
        )
    ),
    modifiers(&SecurityAddon),
    info(
        title = "Satellite Tracker API",
        description = "Doppler and rotor tracking control for a ground station",
        version = "0.1.0"
    ),
    tags(
        (name = "tracker", description = "Satellite selection and rig control"),
        (name = "passes", description = "Pass predictions")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "api_key",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}
