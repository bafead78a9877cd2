use serde::Serialize;
use utoipa::ToSchema;

use super::service::JobOutcome;
use crate::common::response::ApiResponse;

#[derive(Debug, Serialize, ToSchema)]
pub struct AnimateResponse {
    /// Job handle, also the name of the job workspace directory.
    #[schema(example = "aZ3kP9mN2qR7xT1y")]
    pub id: String,
    /// Expected animation file inside the workspace. Not checked on disk.
    #[schema(example = "portrait.gif")]
    pub filename: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct JobStatusResponse {
    pub id: String,
    pub files: Vec<String>,
}

impl From<JobOutcome> for ApiResponse<AnimateResponse> {
    fn from(outcome: JobOutcome) -> Self {
        let status = outcome.succeeded();
        ApiResponse::new(
            status,
            AnimateResponse {
                id: outcome.id.to_string(),
                filename: outcome.filename,
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::animate::job::JobId;
    use crate::modules::animate::pipeline::PipelineError;

    fn id() -> JobId {
        JobId::parse("aZ3kP9mN2qR7xT1y", &Default::default()).unwrap()
    }

    #[test]
    fn success_outcome_serializes_to_contract_shape() {
        let body: ApiResponse<AnimateResponse> = JobOutcome {
            id: id(),
            filename: "portrait.gif".into(),
            result: Ok(()),
        }
        .into();

        assert_eq!(
            serde_json::to_value(body).unwrap(),
            serde_json::json!({
                "status": true,
                "data": {"id": "aZ3kP9mN2qR7xT1y", "filename": "portrait.gif"}
            })
        );
    }

    #[test]
    fn failed_outcome_keeps_id_and_filename() {
        let body: ApiResponse<AnimateResponse> = JobOutcome {
            id: id(),
            filename: "portrait.gif".into(),
            result: Err(PipelineError::Interrupted("panicked".into())),
        }
        .into();

        let json = serde_json::to_value(body).unwrap();
        assert_eq!(json["status"], false);
        assert_eq!(json["data"]["id"], "aZ3kP9mN2qR7xT1y");
        assert_eq!(json["data"]["filename"], "portrait.gif");
        assert!(json.get("error").is_none());
    }
}
