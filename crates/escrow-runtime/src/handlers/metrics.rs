//! # Metrics Endpoint
//!
//! Serves `escrow-telemetry::encode_metrics()` as Prometheus text on
//! `GET /metrics`. Every other path is a 404.

use std::convert::Infallible;
use std::io;
use std::net::SocketAddr;

use bytes::Bytes;
use escrow_telemetry::{encode_metrics, log_event};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, warn};

const PROMETHEUS_CONTENT_TYPE: &str = "text/plain; version=0.0.4";

/// HTTP listener exposing the Prometheus registry.
pub struct MetricsEndpoint {
    listener: TcpListener,
}

impl MetricsEndpoint {
    /// Bind the listener. Port 0 picks a free port.
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Address actually bound.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections until the task is dropped.
    pub async fn run(self) {
        if let Ok(addr) = self.local_addr() {
            log_event!(info, "runtime", "metrics endpoint listening", addr = %addr);
        }

        loop {
            match self.listener.accept().await {
                Ok((stream, peer)) => {
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);
                        let service = service_fn(|req: Request<Incoming>| async move {
                            Ok::<_, Infallible>(respond(&req))
                        });
                        if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                            debug!("[runtime] Metrics connection from {} ended: {}", peer, e);
                        }
                    });
                }
                Err(e) => warn!("[runtime] Metrics accept failed: {}", e),
            }
        }
    }
}

/// Build the response for one request.
pub fn respond<B>(req: &Request<B>) -> Response<Full<Bytes>> {
    if *req.method() != Method::GET || req.uri().path() != "/metrics" {
        return status_only(StatusCode::NOT_FOUND, "not found");
    }

    match encode_metrics() {
        Ok(text) => {
            let mut response = Response::new(Full::new(Bytes::from(text)));
            response
                .headers_mut()
                .insert(CONTENT_TYPE, HeaderValue::from_static(PROMETHEUS_CONTENT_TYPE));
            response
        }
        Err(e) => {
            warn!("[runtime] Metrics encoding failed: {}", e);
            status_only(StatusCode::INTERNAL_SERVER_ERROR, "metrics unavailable")
        }
    }
}

fn status_only(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from_static(body.as_bytes())));
    *response.status_mut() = status;
    response
}
