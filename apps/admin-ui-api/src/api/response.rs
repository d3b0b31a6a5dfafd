// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Success half of the response envelope.

use axum::{
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::now_rfc3339;
use crate::middleware::request_log::RequestId;

/// `{success: true, data, message?, timestamp, requestId?}`
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// RFC 3339, millisecond precision
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T, request_id: RequestId) -> Self {
        Self {
            success: true,
            data,
            message: None,
            timestamp: now_rfc3339(),
            request_id: request_id.into_inner(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_shape() {
        let body = serde_json::to_value(
            ApiResponse::ok(vec![1, 2], RequestId(Some("req-1".into()))).with_message("done"),
        )
        .unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["data"], serde_json::json!([1, 2]));
        assert_eq!(body["message"], "done");
        assert_eq!(body["requestId"], "req-1");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn optional_members_are_omitted() {
        let body = serde_json::to_value(ApiResponse::ok("x", RequestId(None))).unwrap();
        let object = body.as_object().unwrap();
        assert!(!object.contains_key("message"));
        assert!(!object.contains_key("requestId"));
    }
}
