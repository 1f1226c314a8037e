//! Plain-text responses and error-to-status mapping.

use std::fmt;

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};

use pricedb_infra::StoreError;

use super::dto::InputError;

/// The store call a handler was making; names the failure in 500 bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    List,
    Find,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub fn verb(self) -> &'static str {
        match self {
            Operation::List => "listing",
            Operation::Find => "finding",
            Operation::Create => "creating",
            Operation::Update => "updating",
            Operation::Delete => "deleting",
        }
    }
}

/// `text/plain` response with `body` sent as-is.
pub fn text_body(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        body,
    )
        .into_response()
}

/// Single-line `text/plain` response, newline-terminated.
pub fn text_response(status: StatusCode, line: impl fmt::Display) -> Response {
    text_body(status, format!("{line}\n"))
}

pub fn input_error_to_response(err: InputError) -> Response {
    text_response(StatusCode::BAD_REQUEST, err)
}

pub fn store_error_to_response(op: Operation, err: StoreError) -> Response {
    match err {
        StoreError::NotFound(_) => text_response(StatusCode::NOT_FOUND, err),
        StoreError::AlreadyExists(_) => text_response(StatusCode::CONFLICT, err),
        StoreError::Backend(_) | StoreError::Timeout(_) => {
            tracing::error!(operation = op.verb(), error = %err, "store call failed");
            text_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error {} item: {err}", op.verb()),
            )
        }
    }
}
