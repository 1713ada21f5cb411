//! Bootstrap sequencing observed through a mocked health reporter.

use std::net::SocketAddr;
use std::sync::Arc;

use crunchy_config::Config;
use mockall::mock;
use rstest::rstest;

use crate::bootstrap::{BootstrapError, bootstrap_with};
use crate::health::HealthReporter;

use super::support::{
    FailingConfigLoader, FixedConfigLoader, Route, RoutePlugin, echo_body,
    notebook_requiring_interpreter, test_config,
};

mock! {
    Reporter {}
    impl HealthReporter for Reporter {
        fn bootstrap_starting(&self);
        fn bootstrap_succeeded(&self, config: &Config);
        fn bootstrap_failed(&self, error: &BootstrapError);
        fn plugins_loaded(&self, order: &[String]);
        fn listener_ready(&self, addr: SocketAddr);
        fn shutdown_complete(&self);
    }
}

fn expect_failure(reporter: &mut MockReporter) {
    reporter.expect_bootstrap_starting().once().return_const(());
    reporter.expect_bootstrap_failed().once().return_const(());
    reporter.expect_plugins_loaded().never();
    reporter.expect_bootstrap_succeeded().never();
    reporter.expect_listener_ready().never();
}

#[rstest]
fn success_reports_each_stage_once() {
    let mut reporter = MockReporter::new();
    reporter.expect_bootstrap_starting().once().return_const(());
    reporter
        .expect_plugins_loaded()
        .once()
        .withf(|order| order == ["static_files", "echo", "exec"])
        .return_const(());
    reporter
        .expect_bootstrap_succeeded()
        .once()
        .withf(|config| config.port == 0)
        .return_const(());
    reporter.expect_bootstrap_failed().never();
    reporter.expect_listener_ready().never();

    let plugin = RoutePlugin::new("exec").with(Route::Session("/exec", echo_body));
    bootstrap_with(
        &FixedConfigLoader(test_config()),
        Arc::new(reporter),
        vec![Box::new(plugin)],
    )
    .expect("bootstrap succeeds");
}

#[rstest]
fn configuration_failure_is_reported_before_plugins_load() {
    let mut reporter = MockReporter::new();
    expect_failure(&mut reporter);
    let error = bootstrap_with(&FailingConfigLoader, Arc::new(reporter), Vec::new())
        .expect_err("bootstrap fails");
    assert!(matches!(error, BootstrapError::Configuration { .. }));
}

#[rstest]
fn plugin_failure_is_reported_once() {
    let mut reporter = MockReporter::new();
    expect_failure(&mut reporter);
    let error = bootstrap_with(
        &FixedConfigLoader(test_config()),
        Arc::new(reporter),
        vec![notebook_requiring_interpreter()],
    )
    .expect_err("bootstrap fails");
    assert!(matches!(error, BootstrapError::Plugins { .. }));
}
