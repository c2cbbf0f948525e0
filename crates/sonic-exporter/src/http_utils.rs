// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{header, http, Response, StatusCode};
use serde_json::json;
use tracing::{debug, error};

pub type HttpResponse = Response<Full<Bytes>>;

const LANDING_PAGE: &str = r#"<html>
<head><title>SONiC Exporter</title></head>
<body>
<h1>SONiC Exporter</h1>
<p><a href="/metrics">Metrics</a></p>
</body>
</html>
"#;

/// Does two things:
/// 1. Logs the given message. A server error status code (within 500-599) will cause an error
///    log to be written, otherwise debug will be written.
/// 2. Returns the given message in the body of JSON response with the given status code.
///
/// Response body format:
/// {
///     "message": message
/// }
pub fn log_and_create_http_response(
    message: &str,
    status: StatusCode,
) -> http::Result<HttpResponse> {
    if status.is_server_error() {
        error!("{message}");
    } else {
        debug!("{message}");
    }
    let body = json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
}

pub fn create_metrics_response(
    body: Vec<u8>,
    content_type: &str,
) -> http::Result<HttpResponse> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .body(Full::new(Bytes::from(body)))
}

pub fn create_landing_page_response() -> http::Result<HttpResponse> {
    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/html; charset=utf-8")
        .body(Full::new(Bytes::from_static(LANDING_PAGE.as_bytes())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use tracing_test::traced_test;

    async fn get_response_body_as_string(response: HttpResponse) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    #[traced_test]
    async fn test_server_error_is_logged_and_returned() {
        let response = log_and_create_http_response(
            "Error rendering metrics: boom",
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .unwrap();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            get_response_body_as_string(response).await,
            "{\"message\":\"Error rendering metrics: boom\"}"
        );
        assert!(logs_contain("ERROR"));
        assert!(logs_contain("Error rendering metrics: boom"));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_client_errors_are_not_logged_as_errors() {
        let response =
            log_and_create_http_response("Not found: /nope", StatusCode::NOT_FOUND).unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(!logs_contain("ERROR"));
    }

    #[tokio::test]
    async fn test_landing_page_links_metrics() {
        let response = create_landing_page_response().unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/html; charset=utf-8"
        );
        let body = get_response_body_as_string(response).await;
        assert!(body.contains("<title>SONiC Exporter</title>"));
        assert!(body.contains("<a href=\"/metrics\">Metrics</a>"));
    }

    #[tokio::test]
    async fn test_metrics_response_keeps_body_and_content_type() {
        let response =
            create_metrics_response(b"node_load1 1\n".to_vec(), "text/plain; version=0.0.4")
                .unwrap();
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "text/plain; version=0.0.4"
        );
        assert_eq!(get_response_body_as_string(response).await, "node_load1 1\n");
    }
}
