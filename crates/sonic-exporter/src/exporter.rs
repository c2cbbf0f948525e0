// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper::{http, Method, Request, StatusCode};
use std::io;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::error::ExporterError;
use crate::exposition::{Exposition, CONTENT_TYPE};
use crate::http_utils::{
    create_landing_page_response, create_metrics_response, log_and_create_http_response,
    HttpResponse,
};

const METRICS_ENDPOINT_PATH: &str = "/metrics";
const LANDING_PAGE_PATH: &str = "/";

/// HTTP front of the exporter. Every `GET /metrics` runs one full collection cycle.
pub struct Exporter {
    exposition: Arc<Exposition>,
}

impl Exporter {
    pub fn new(exposition: Exposition) -> Self {
        Self {
            exposition: Arc::new(exposition),
        }
    }

    /// Serves requests on `listener` until accepting fails with a non-transient error.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ExporterError> {
        let exposition = Arc::clone(&self.exposition);
        let service = service_fn(move |req| {
            // called for each http request
            let exposition = Arc::clone(&exposition);
            Exporter::endpoint_handler(req, exposition)
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, _)) => conn,
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = hyper_util::rt::TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    debug!("Connection error: {e}");
                }
            });
        }
    }

    async fn endpoint_handler(
        req: Request<Incoming>,
        exposition: Arc<Exposition>,
    ) -> http::Result<HttpResponse> {
        match (req.method(), req.uri().path()) {
            (&Method::GET, METRICS_ENDPOINT_PATH) => Self::metrics_handler(&exposition).await,
            (&Method::GET, LANDING_PAGE_PATH) => create_landing_page_response(),
            (method, path @ (METRICS_ENDPOINT_PATH | LANDING_PAGE_PATH)) => {
                log_and_create_http_response(
                    &format!("Method {method} not allowed on {path}"),
                    StatusCode::METHOD_NOT_ALLOWED,
                )
            }
            (_, path) => log_and_create_http_response(
                &format!("Endpoint {path} not found"),
                StatusCode::NOT_FOUND,
            ),
        }
    }

    async fn metrics_handler(exposition: &Exposition) -> http::Result<HttpResponse> {
        let start = Instant::now();
        let rendered = exposition.render().await;
        info!(
            "Metrics reporting done, took {:.3} seconds",
            start.elapsed().as_secs_f64()
        );
        match rendered {
            Ok(body) => create_metrics_response(body, CONTENT_TYPE),
            Err(e) => log_and_create_http_response(
                &format!("Error rendering metrics: {e}"),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }
}
