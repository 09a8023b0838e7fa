// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
//!
//! Every variant is non-fatal: on the event channel an error is rendered as
//! the operation's named error event and sent to the originating connection
//! only. The `IntoResponse` impl serves the HTTP bootstrap surface.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("User not found")]
    UserNotFound,

    #[error("Room not found")]
    RoomNotFound,

    #[error("Invalid invite code")]
    InvalidInviteCode,

    #[error("Message content cannot be empty")]
    EmptyContent,

    #[error("Only group rooms can invite others")]
    NotGroupRoom,

    #[error("You are not a member of this room")]
    NotRoomMember,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::UserNotFound | AppError::RoomNotFound => StatusCode::NOT_FOUND,
            AppError::NotGroupRoom | AppError::NotRoomMember => StatusCode::FORBIDDEN,
            AppError::InvalidInviteCode
            | AppError::EmptyContent
            | AppError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::UserNotFound => "USER_NOT_FOUND",
            AppError::RoomNotFound => "ROOM_NOT_FOUND",
            AppError::InvalidInviteCode => "INVALID_INVITE_CODE",
            AppError::EmptyContent => "EMPTY_CONTENT",
            AppError::NotGroupRoom => "NOT_GROUP_ROOM",
            AppError::NotRoomMember => "NOT_ROOM_MEMBER",
            AppError::InvalidArgument(_) => "INVALID_ARGUMENT",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "success": false,
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });
        (status, axum::Json(body)).into_response()
    }
}
