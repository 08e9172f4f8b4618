//! HTTP invoke API client.
//!
//! Speaks the function invoke REST shape over plain HTTP/1.1, as served by
//! local runtime emulators and by `warmer serve`. One connection per
//! invocation; the connection task is spawned and dropped with the request.

use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HOST, USER_AGENT};
use http::{Method, Request};
use http_body_util::{BodyExt, Full};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;
use tracing::debug;

use warmer_core::{FunctionRef, InvocationRequest};

use crate::{InvokeError, InvokeFuture, InvokeResult, RemoteInvoker};

pub const INVOCATION_TYPE_HEADER: &str = "x-amz-invocation-type";
pub const LOG_TYPE_HEADER: &str = "x-amz-log-type";
pub const FUNCTION_ERROR_HEADER: &str = "x-amz-function-error";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Path of the invoke API for `target`.
pub fn invocation_path(target: &FunctionRef) -> String {
    format!("/2015-03-31/functions/{target}/invocations")
}

/// Invokes functions through an HTTP invoke endpoint (`host:port`).
#[derive(Debug, Clone)]
pub struct HttpInvoker {
    endpoint: String,
    timeout: Duration,
}

impl HttpInvoker {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Upper bound for one invocation, including a synchronous run.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &InvocationRequest) -> InvokeResult<()> {
        let target = request.target.to_string();
        let payload = request.payload_bytes().map_err(|e| InvokeError::Encode {
            target: target.clone(),
            reason: e.to_string(),
        })?;

        let stream = TcpStream::connect(&self.endpoint)
            .await
            .map_err(|e| transport(&target, e))?;
        let io = TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| transport(&target, e))?;

        tokio::spawn(async move {
            if let Err(e) = conn.await {
                debug!(error = %e, "invoke connection closed with error");
            }
        });

        let req = Request::builder()
            .method(Method::POST)
            .uri(invocation_path(&request.target))
            .header(HOST, self.endpoint.as_str())
            .header(USER_AGENT, "warmer-invoke/0.1")
            .header(CONTENT_TYPE, "application/json")
            .header(INVOCATION_TYPE_HEADER, request.invocation_type.as_str())
            .header(LOG_TYPE_HEADER, "None")
            .body(Full::new(Bytes::from(payload)))
            .map_err(|e| InvokeError::Encode {
                target: target.clone(),
                reason: e.to_string(),
            })?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| transport(&target, e))?;

        let status = resp.status();
        let function_error = resp
            .headers()
            .get(FUNCTION_ERROR_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| transport(&target, e))?
            .to_bytes();
        let body = String::from_utf8_lossy(&body).into_owned();

        if !status.is_success() {
            return Err(InvokeError::Status {
                target,
                status: status.as_u16(),
                body,
            });
        }
        if let Some(kind) = function_error {
            return Err(InvokeError::Function { target, kind, body });
        }

        debug!(
            function = %target,
            invocation_type = %request.invocation_type,
            status = status.as_u16(),
            "invocation accepted"
        );
        Ok(())
    }
}

impl RemoteInvoker for HttpInvoker {
    fn invoke<'a>(&'a self, request: &'a InvocationRequest) -> InvokeFuture<'a> {
        Box::pin(async move {
            match tokio::time::timeout(self.timeout, self.send(request)).await {
                Ok(result) => result,
                Err(_) => Err(InvokeError::Timeout {
                    target: request.target.to_string(),
                    timeout_ms: self.timeout.as_millis() as u64,
                }),
            }
        })
    }
}

fn transport(target: &str, err: impl std::fmt::Display) -> InvokeError {
    InvokeError::Transport {
        target: target.to_string(),
        reason: err.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use hyper::body::Incoming;
    use hyper::server::conn::http1;
    use hyper::service::service_fn;
    use hyper::Response;
    use serde_json::Value;
    use tokio::net::TcpListener;
    use warmer_core::InvocationType;

    #[derive(Debug, Clone)]
    struct Captured {
        path: String,
        invocation_type: Option<String>,
        body: Value,
    }

    /// Serve every request with `status` (and `function_error`, if set),
    /// capturing what was received.
    async fn spawn_endpoint(
        status: u16,
        function_error: Option<&'static str>,
        delay: Duration,
    ) -> (SocketAddr, Arc<Mutex<Vec<Captured>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_srv = seen.clone();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let seen = seen_srv.clone();
                tokio::spawn(async move {
                    let svc = service_fn(move |req: Request<Incoming>| {
                        let seen = seen.clone();
                        async move {
                            let (parts, body) = req.into_parts();
                            let bytes = body.collect().await?.to_bytes();
                            seen.lock().unwrap().push(Captured {
                                path: parts.uri.path().to_string(),
                                invocation_type: parts
                                    .headers
                                    .get(INVOCATION_TYPE_HEADER)
                                    .map(|v| v.to_str().unwrap().to_string()),
                                body: serde_json::from_slice(&bytes).unwrap(),
                            });
                            tokio::time::sleep(delay).await;
                            let mut builder = Response::builder().status(status);
                            if let Some(kind) = function_error {
                                builder = builder.header(FUNCTION_ERROR_HEADER, kind);
                            }
                            Ok::<_, hyper::Error>(
                                builder.body(Full::new(Bytes::from("\"boom\""))).unwrap(),
                            )
                        }
                    });
                    let _ = http1::Builder::new()
                        .serve_connection(TokioIo::new(stream), svc)
                        .await;
                });
            }
        });

        (addr, seen)
    }

    fn request(invocation_type: InvocationType) -> InvocationRequest {
        InvocationRequest::warming(
            FunctionRef::from("f:$LATEST"),
            invocation_type,
            "warmer",
            2,
            3,
            "corr",
            false,
        )
    }

    #[test]
    fn path_embeds_target() {
        assert_eq!(
            invocation_path(&FunctionRef::from("other:2")),
            "/2015-03-31/functions/other:2/invocations"
        );
    }

    #[tokio::test]
    async fn posts_payload_with_invocation_type() {
        let (addr, seen) = spawn_endpoint(202, None, Duration::ZERO).await;
        let invoker = HttpInvoker::new(addr.to_string());

        invoker.invoke(&request(InvocationType::Event)).await.unwrap();

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].path, "/2015-03-31/functions/f:$LATEST/invocations");
        assert_eq!(seen[0].invocation_type.as_deref(), Some("Event"));
        assert_eq!(seen[0].body["__WARMER_INVOCATION__"], 2);
        assert_eq!(seen[0].body["warmer"], true);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let (addr, _) = spawn_endpoint(404, None, Duration::ZERO).await;
        let invoker = HttpInvoker::new(addr.to_string());

        let err = invoker
            .invoke(&request(InvocationType::RequestResponse))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Status { status: 404, .. }));
        assert_eq!(err.target(), Some("f:$LATEST"));
    }

    #[tokio::test]
    async fn function_error_header_is_an_error() {
        let (addr, _) = spawn_endpoint(200, Some("Unhandled"), Duration::ZERO).await;
        let invoker = HttpInvoker::new(addr.to_string());

        let err = invoker
            .invoke(&request(InvocationType::RequestResponse))
            .await
            .unwrap_err();
        match err {
            InvokeError::Function { kind, body, .. } => {
                assert_eq!(kind, "Unhandled");
                assert_eq!(body, "\"boom\"");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_a_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let invoker = HttpInvoker::new(addr.to_string());
        let err = invoker
            .invoke(&request(InvocationType::Event))
            .await
            .unwrap_err();
        assert!(matches!(err, InvokeError::Transport { .. }));
    }

    #[tokio::test]
    async fn slow_endpoint_times_out() {
        let (addr, _) = spawn_endpoint(200, None, Duration::from_millis(500)).await;
        let invoker =
            HttpInvoker::new(addr.to_string()).with_timeout(Duration::from_millis(50));

        let err = invoker
            .invoke(&request(InvocationType::RequestResponse))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            InvokeError::Timeout {
                target: "f:$LATEST".to_string(),
                timeout_ms: 50,
            }
        );
    }
}
