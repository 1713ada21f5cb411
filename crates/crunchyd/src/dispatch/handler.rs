//! Request handler that authenticates, routes and answers one request.

use std::any::Any;
use std::net::SocketAddr;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crunchy_config::{Config, Credentials};
use crunchy_plugins::{Method, Registries, Request, Response, Status};
use tracing::{debug, warn};

use crate::http::{self, Incoming, RequestTarget, auth};
use crate::transport::RequestHandler;

use super::{CANONICAL_PREFIXES, DISPATCH_TARGET};

const TEXT_PLAIN: &str = "text/plain; charset=utf-8";

/// Serves HTTP requests against a frozen set of registries.
#[derive(Debug)]
pub(crate) struct HttpRequestHandler {
    registries: Arc<Registries>,
    credentials: Credentials,
    max_body_bytes: usize,
    canonical_prefixes: Vec<String>,
}

impl HttpRequestHandler {
    pub(crate) fn new(registries: Arc<Registries>, config: &Config) -> Self {
        Self {
            registries,
            credentials: config.credentials(),
            max_body_bytes: config.max_body_bytes(),
            canonical_prefixes: CANONICAL_PREFIXES
                .iter()
                .map(|prefix| (*prefix).to_owned())
                .collect(),
        }
    }

    fn serve(&self, mut request: tiny_http::Request) {
        let peer = request.remote_addr().copied();
        let response = self.respond(Incoming::from_request(&mut request));
        if let Err(error) = request.respond(http::into_wire(&response)) {
            warn!(target: DISPATCH_TARGET, ?peer, %error, "failed to write response");
        }
    }

    /// Produces the response for one received request.
    pub(crate) fn respond(&self, incoming: Incoming<'_>) -> Response {
        let peer = incoming.peer;
        if !auth::is_authorised(incoming.header("authorization"), &self.credentials) {
            warn!(
                target: DISPATCH_TARGET,
                ?peer,
                method = %incoming.method,
                "authentication rejected"
            );
            return plain(Status::UNAUTHORIZED, "authentication required")
                .with_header("WWW-Authenticate", auth::challenge());
        }

        let method = match incoming.method.parse::<Method>() {
            Ok(method) => method,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, ?peer, %error, "unsupported method");
                return plain(Status::NOT_IMPLEMENTED, error.to_string());
            }
        };

        let body = match http::read_body(
            incoming.body,
            incoming.content_length,
            self.max_body_bytes,
        ) {
            Ok(body) => body,
            Err(error) => {
                warn!(target: DISPATCH_TARGET, ?peer, %error, "failed to read request body");
                return plain(error.status(), error.to_string());
            }
        };

        let request = self.build_request(method, &incoming.url, incoming.headers, body, peer);
        let response = self.dispatch(&request);
        debug!(
            target: DISPATCH_TARGET,
            %method,
            path = request.path(),
            status = response.status().code(),
            "request dispatched"
        );
        response
    }

    fn build_request(
        &self,
        method: Method,
        url: &str,
        headers: Vec<(String, String)>,
        body: Vec<u8>,
        peer: Option<SocketAddr>,
    ) -> Request {
        let RequestTarget { path, args } = http::parse_target(url);
        let path = self.canonical_path(path);

        let mut request = Request::new(method, path).with_body(body);
        for (key, value) in args {
            request = request.with_arg(key, value);
        }
        for (name, value) in headers {
            request = request.with_header(&name, value);
        }
        if let Some(peer) = peer {
            request = request.with_peer(peer);
        }
        request
    }

    fn canonical_path(&self, path: String) -> String {
        self.canonical_prefixes
            .iter()
            .find(|prefix| path.starts_with(prefix.as_str()))
            .cloned()
            .unwrap_or(path)
    }

    fn dispatch(&self, request: &Request) -> Response {
        let route = match self.registries.routes().route(request.path()) {
            Ok(route) => route,
            Err(error) => {
                debug!(target: DISPATCH_TARGET, %error, "no route; answering 204");
                return Response::no_content();
            }
        };
        let handler = route.handler();
        match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(request))) {
            Ok(Ok(response)) => response,
            Ok(Err(error)) => {
                warn!(
                    target: DISPATCH_TARGET,
                    path = request.path(),
                    error = %format_args!("{error:#}"),
                    "handler failed"
                );
                plain(Status::INTERNAL_SERVER_ERROR, format!("{error:?}"))
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(
                    target: DISPATCH_TARGET,
                    path = request.path(),
                    panic = message,
                    "handler panicked"
                );
                plain(
                    Status::INTERNAL_SERVER_ERROR,
                    format!("handler panicked: {message}"),
                )
            }
        }
    }
}

impl RequestHandler for HttpRequestHandler {
    fn handle(&self, request: tiny_http::Request) {
        self.serve(request);
    }
}

fn plain(status: Status, body: impl Into<Vec<u8>>) -> Response {
    Response::new(status, body).with_content_type(TEXT_PLAIN)
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&'static str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
