//! Crate-level tests exercising the public surface through the re-exports.

use std::sync::Arc;
use std::thread;

use crate::{
    CapabilitySet, Invocation, Method, Plugin, PluginHost, PluginLoader, Registries, Request,
    Response, SessionToken, Status,
};

struct Counter;

impl Plugin for Counter {
    fn name(&self) -> &str {
        "counter"
    }

    fn provides(&self) -> CapabilitySet {
        CapabilitySet::from_iter(["/count", "count_widget"])
    }

    fn register(&self, host: &mut PluginHost<'_>) -> anyhow::Result<()> {
        host.register_session_handler("/count", |request: &Request| -> anyhow::Result<Response> {
            let page = request
                .page_id()
                .ok_or_else(|| anyhow::anyhow!("uid argument missing"))?;
            Ok(Response::ok(format!("{page}:{}", request.body().len())))
        })?;
        host.register_service(
            "count_widget",
            |invocation: Invocation<'_>| -> anyhow::Result<()> {
                invocation.element.set_attribute("widget", "count");
                Ok(())
            },
        )?;
        Ok(())
    }
}

fn load() -> (Arc<Registries>, String) {
    let token = SessionToken::generate().expect("token");
    let path = token.scope("/count");
    let registries = PluginLoader::new()
        .with_plugin(Counter)
        .load(token)
        .expect("load");
    (Arc::new(registries), path)
}

#[test]
fn frozen_registries_serve_concurrent_readers() {
    let (registries, path) = load();

    let workers: Vec<_> = (0..8)
        .map(|index| {
            let registries = Arc::clone(&registries);
            let path = path.clone();
            thread::spawn(move || {
                let request = Request::new(Method::Post, path.as_str())
                    .with_arg("uid", format!("tab{index}:1"))
                    .with_body(vec![b'x'; index]);
                let matched = registries.routes().route(&path).expect("route");
                matched.handler().handle(&request).expect("handle")
            })
        })
        .collect();

    for (index, worker) in workers.into_iter().enumerate() {
        let response = worker.join().expect("worker");
        assert_eq!(response.status(), Status::OK);
        assert_eq!(response.body(), format!("tab{index}:{index}").as_bytes());
    }
}

#[test]
fn handler_errors_surface_to_the_caller() {
    let (registries, path) = load();
    let matched = registries.routes().route(&path).expect("route");
    let err = matched
        .handler()
        .handle(&Request::new(Method::Get, path.as_str()))
        .expect_err("missing uid");
    assert!(err.to_string().contains("uid"));
}

#[test]
fn registries_are_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Registries>();
}
