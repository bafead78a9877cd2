use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

/// `{"status": bool, "data": ...}` on success, `{"status": false, "error": ...}` otherwise.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T>
where
    T: Serialize,
{
    pub fn new(status: bool, data: T) -> Self {
        Self {
            status,
            data: Some(data),
            error: None,
        }
    }

    pub fn success(data: T) -> Self {
        Self::new(true, data)
    }

    pub fn error(message: &str) -> Self {
        Self {
            status: false,
            data: None,
            error: Some(message.to_string()),
        }
    }
}

pub struct ApiSuccess<T>(pub T, pub StatusCode);

impl<T> IntoResponse for ApiSuccess<ApiResponse<T>>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        let (response, status) = (self.0, self.1);
        (status, Json(response)).into_response()
    }
}

pub struct ApiError(pub String, pub StatusCode);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (message, status) = (self.0, self.1);
        let response = ApiResponse::<()>::error(&message);
        (status, Json(response)).into_response()
    }
}
