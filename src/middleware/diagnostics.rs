//! Failure rendering stages.
//!
//! Handlers signal an unhandled failure by returning a 500 response carrying
//! an [`ErrorReport`] extension; panics are turned into the same shape by
//! [`panic_response`]. The stages below decide what the client sees.

use std::any::Any;

use axum::{
    extract::Request,
    http::{Method, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::utils::html::escape;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Database,
    Unhandled,
}

#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub kind: ErrorKind,
    pub message: String,
}

impl ErrorReport {
    pub fn database(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Database,
            message: message.into(),
        }
    }

    pub fn unhandled(message: impl Into<String>) -> Self {
        Self {
            kind: ErrorKind::Unhandled,
            message: message.into(),
        }
    }
}

impl IntoResponse for ErrorReport {
    fn into_response(self) -> Response {
        let mut response = (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "Internal server error" })),
        )
            .into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Converts a caught panic into an unhandled-failure response
pub fn panic_response(err: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic".to_string()
    };
    ErrorReport::unhandled(format!("Handler panicked: {}", message)).into_response()
}

/// Development only: full failure detail for any unhandled failure
pub async fn developer_exception_page(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let Some(report) = response.extensions().get::<ErrorReport>().cloned() else {
        return response;
    };

    tracing::error!("An unhandled failure occurred while executing {} {}: {}", method, path, report.message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_developer_page(&method, &path, &report)),
    )
        .into_response()
}

/// Development only: database failures get their own page
pub async fn database_error_page(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let report = match response.extensions().get::<ErrorReport>() {
        Some(report) if report.kind == ErrorKind::Database => report.clone(),
        _ => return response,
    };

    tracing::error!("A database operation failed while processing {} {}: {}", method, path, report.message);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_database_page(&method, &path, &report)),
    )
        .into_response()
}

/// Outside development: the generic error page, no failure detail
pub async fn exception_handler(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();

    let response = next.run(req).await;
    let Some(report) = response.extensions().get::<ErrorReport>() else {
        return response;
    };

    let request_id = uuid::Uuid::new_v4().to_string();
    tracing::error!(
        request_id = %request_id,
        "Unhandled failure on {} {}: {}",
        method,
        path,
        report.message
    );
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Html(render_error_page(&request_id)),
    )
        .into_response()
}

pub fn render_error_page(request_id: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Error</title></head><body>\
         <h1 class=\"text-danger\">Error.</h1>\
         <h2 class=\"text-danger\">An error occurred while processing your request.</h2>\
         <p><strong>Request ID:</strong> <code>{}</code></p>\
         </body></html>",
        escape(request_id)
    )
}

fn render_developer_page(method: &Method, path: &str, report: &ErrorReport) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Internal Server Error</title></head><body>\
         <h1>An unhandled failure occurred while processing the request.</h1>\
         <p><strong>{} {}</strong></p>\
         <pre>{}</pre>\
         </body></html>",
        escape(method.as_str()),
        escape(path),
        escape(&report.message)
    )
}

fn render_database_page(method: &Method, path: &str, report: &ErrorReport) -> String {
    format!(
        "<!DOCTYPE html>\n<html><head><title>Database Error</title></head><body>\
         <h1>A database operation failed while processing the request.</h1>\
         <p><strong>{} {}</strong></p>\
         <pre>{}</pre>\
         <p>Check that the database named by <code>DEFAULT_CONNECTION</code> is reachable. \
         The schema is applied at startup; restart the application after fixing the connection.</p>\
         </body></html>",
        escape(method.as_str()),
        escape(path),
        escape(&report.message)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_response_carries_extension() {
        let response = ErrorReport::database("no such table: users").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.kind, ErrorKind::Database);
    }

    #[test]
    fn panic_payloads_are_described() {
        let response = panic_response(Box::new("boom"));
        let report = response.extensions().get::<ErrorReport>().unwrap();
        assert_eq!(report.kind, ErrorKind::Unhandled);
        assert!(report.message.contains("boom"));

        let response = panic_response(Box::new(String::from("kaboom")));
        assert!(response.extensions().get::<ErrorReport>().unwrap().message.contains("kaboom"));
    }

    #[test]
    fn pages_escape_failure_text() {
        let page = render_developer_page(
            &Method::GET,
            "/x",
            &ErrorReport::unhandled("<script>alert(1)</script>"),
        );
        assert!(page.contains("&lt;script&gt;"));
        assert!(!page.contains("<script>"));
    }
}
