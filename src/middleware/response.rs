use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::{json, Value};

/// Wrapper for API responses that adds the `{ success, data, count? }`
/// envelope. Bare acknowledgements carry a message instead of data.
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    data: Option<T>,
    message: Option<String>,
    count: Option<usize>,
    status_code: StatusCode,
}

impl ApiResponse<()> {
    /// `{ success: true, message }` acknowledgement with 200 OK
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            data: None,
            message: Some(message.into()),
            count: None,
            status_code: StatusCode::OK,
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    /// Successful response with default 200 status
    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            message: None,
            count: None,
            status_code: StatusCode::OK,
        }
    }

    /// 201 Created response
    pub fn created(data: T) -> Self {
        Self {
            status_code: StatusCode::CREATED,
            ..Self::success(data)
        }
    }

    /// List response carrying the item count alongside the data
    pub fn list(data: T, count: usize) -> Self {
        Self {
            count: Some(count),
            ..Self::success(data)
        }
    }

    /// Attach a message to a data-carrying response
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = json!({ "success": true });

        if let Some(count) = self.count {
            envelope["count"] = json!(count);
        }
        if let Some(message) = self.message {
            envelope["message"] = json!(message);
        }
        if let Some(data) = self.data {
            match serde_json::to_value(&data) {
                Ok(value) => envelope["data"] = value,
                Err(e) => {
                    tracing::error!("Failed to serialize response data: {}", e);
                    return (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(json!({
                            "success": false,
                            "message": "Failed to serialize response data"
                        })),
                    )
                        .into_response();
                }
            }
        }

        (self.status_code, Json(envelope)).into_response()
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, crate::error::ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn body_of<T: Serialize>(resp: ApiResponse<T>) -> Value {
        let (data, message, count) = (resp.data, resp.message, resp.count);
        let mut envelope = json!({ "success": true });
        if let Some(count) = count {
            envelope["count"] = json!(count);
        }
        if let Some(message) = message {
            envelope["message"] = json!(message);
        }
        if let Some(data) = data {
            envelope["data"] = serde_json::to_value(&data).unwrap();
        }
        envelope
    }

    #[test]
    fn list_envelope_carries_count() {
        let body = body_of(ApiResponse::list(vec![1, 2, 3], 3));
        assert_eq!(body["success"], true);
        assert_eq!(body["count"], 3);
        assert_eq!(body["data"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn message_envelope_has_no_data() {
        let body = body_of(ApiResponse::message("Task removed"));
        assert_eq!(body["message"], "Task removed");
        assert!(body.get("data").is_none());
    }
}
