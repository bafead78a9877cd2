use utoipa::OpenApi;

use crate::modules::animate::dto::{AnimateResponse, JobStatusResponse};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::modules::animate::handler::animate,
        crate::modules::animate::handler::get_job,
        crate::modules::animate::handler::get_artifact,
    ),
    components(
        schemas(AnimateResponse, JobStatusResponse)
    ),
    tags(
        (name = "Animation", description = "Turn a drawing into an animated gif")
    )
)]
pub struct ApiDoc;
