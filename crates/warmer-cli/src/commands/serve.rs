//! Local function host.
//!
//! Serves the invoke API for a single function backed by one long-lived
//! [`Warmer`], so instance state carries over between requests the way it
//! does in a warm function instance. Fan-out requests from the hosted
//! warmer go back out through an [`HttpInvoker`], by default to this same
//! server.
//!
//! Shutdown stops accepting connections and returns without waiting for
//! open connections or background `Event` runs; in-flight warming work is
//! dropped with the runtime.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use warmer::Warmer;
use warmer_core::InvocationType;
use warmer_invoke::HttpInvoker;
use warmer_invoke::client::{FUNCTION_ERROR_HEADER, INVOCATION_TYPE_HEADER};

use super::WarmerArgs;
use super::handle::parse_event;

const INVOKE_PREFIX: &str = "/2015-03-31/functions/";
const INVOKE_SUFFIX: &str = "/invocations";

pub async fn serve(
    args: &WarmerArgs,
    bind: &str,
    port: u16,
    endpoint: Option<String>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind((bind, port))
        .await
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    let local_addr = listener.local_addr()?;
    let endpoint = endpoint.unwrap_or_else(|| local_addr.to_string());

    let invoker = HttpInvoker::new(endpoint.clone()).with_timeout(args.timeout());
    let warmer = Arc::new(args.build_warmer(Arc::new(invoker))?);
    info!(
        function = %warmer.function().qualified(),
        id = warmer.id(),
        %endpoint,
        "function host starting"
    );

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = tx.send(true);
        }
    });

    FunctionHost::new(warmer).serve(listener, rx).await
}

/// HTTP server exposing one warmer through the invoke API.
pub struct FunctionHost {
    warmer: Arc<Warmer>,
}

impl FunctionHost {
    pub fn new(warmer: Arc<Warmer>) -> Self {
        Self { warmer }
    }

    /// Accept connections until the shutdown signal flips.
    pub async fn serve(
        self,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let addr: SocketAddr = listener.local_addr()?;
        info!(%addr, "function host listening");

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    let (stream, peer_addr) = accepted.context("accept failed")?;
                    let warmer = self.warmer.clone();

                    tokio::spawn(async move {
                        let svc = service_fn(move |req: Request<Incoming>| {
                            let warmer = warmer.clone();
                            async move {
                                match route(warmer, req).await {
                                    Ok(resp) => Ok::<_, hyper::Error>(resp),
                                    Err(e) => {
                                        error!(%peer_addr, error = %e, "invoke handler failed");
                                        Ok(text(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error"))
                                    }
                                }
                            }
                        });

                        if let Err(e) = http1::Builder::new()
                            .serve_connection(TokioIo::new(stream), svc)
                            .await
                        {
                            debug!(%peer_addr, error = %e, "connection error");
                        }
                    });
                }
                _ = shutdown.changed() => {
                    info!("function host shutting down");
                    break;
                }
            }
        }

        Ok(())
    }
}

async fn route(warmer: Arc<Warmer>, req: Request<Incoming>) -> anyhow::Result<Response<Full<Bytes>>> {
    let Some(function) = invoked_function(req.uri().path()) else {
        return Ok(text(StatusCode::NOT_FOUND, "Not Found"));
    };
    if req.method() != Method::POST {
        return Ok(text(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed"));
    }
    let function = function.to_string();

    let invocation_type = match req.headers().get(INVOCATION_TYPE_HEADER) {
        None => InvocationType::RequestResponse,
        Some(v) => match v.to_str().ok().and_then(InvocationType::parse) {
            Some(t) => t,
            None => return Ok(text(StatusCode::BAD_REQUEST, "unsupported invocation type")),
        },
    };

    let body = req.into_body().collect().await?.to_bytes();
    let event = match std::str::from_utf8(&body).map_err(anyhow::Error::from).and_then(parse_event) {
        Ok(event) => event,
        Err(e) => return Ok(text(StatusCode::BAD_REQUEST, &e.to_string())),
    };
    debug!(%function, %invocation_type, "invocation received");

    match invocation_type {
        InvocationType::Event => {
            tokio::spawn(async move {
                if let Err(e) = warmer.handle(&event).await {
                    warn!(%function, error = %e, "async invocation failed");
                }
            });
            Ok(text(StatusCode::ACCEPTED, ""))
        }
        InvocationType::RequestResponse => match warmer.handle(&event).await {
            Ok(warmed) => Ok(json_response(StatusCode::OK, &Value::Bool(warmed))),
            Err(e) => {
                warn!(%function, error = %e, "invocation failed");
                let mut resp = json_response(
                    StatusCode::OK,
                    &json!({ "errorType": "InvokeError", "errorMessage": e.to_string() }),
                );
                resp.headers_mut().insert(
                    HeaderName::from_static(FUNCTION_ERROR_HEADER),
                    HeaderValue::from_static("Unhandled"),
                );
                Ok(resp)
            }
        },
    }
}

/// Function name from an invoke API path.
fn invoked_function(path: &str) -> Option<&str> {
    path.strip_prefix(INVOKE_PREFIX)?
        .strip_suffix(INVOKE_SUFFIX)
        .filter(|name| !name.is_empty())
}

fn text(status: StatusCode, body: &str) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(body.to_string())));
    *resp.status_mut() = status;
    resp
}

fn json_response(status: StatusCode, value: &Value) -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from(value.to_string())));
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}
